//! TOML configuration deserialisation for the solver and opacity evaluator.
//!
//! Every field has a default, so an empty document is a valid configuration:
//!
//! ```toml
//! [solver]
//! escape_feedback = true
//! max_iterations = 100
//!
//! [solver.channels]
//! nonthermal_bound_bound = false
//!
//! [opacity]
//! doppler_beta = 1e-3
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IonisConfig {
    #[serde(default)]
    pub solver: SolverSettings,
    #[serde(default)]
    pub opacity: OpacitySettings,
}

impl IonisConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: IonisConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.solver.validate()?;
        self.opacity.validate()
    }
}

/// Load, parse and validate a TOML configuration file.
pub fn load_config(path: &Path) -> Result<IonisConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    IonisConfig::from_toml_str(&content)
}

/// Where line mean intensities come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineField {
    /// $J = W_l B_\nu(T)$ at each line's rest frequency.
    #[default]
    DilutePlanck,
    /// Values written into the workspace by the caller are kept.
    External,
}

/// Settings of the population solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Multiply radiative bound-bound rates by the Sobolev escape
    /// probability and iterate until the escape probabilities settle.
    #[serde(default = "default_true")]
    pub escape_feedback: bool,
    /// Drop radiative recombination into levels with zero excitation energy.
    #[serde(default)]
    pub suppress_ground_recombination: bool,
    /// Largest relative change of any escape probability still counted
    /// as converged.
    #[serde(default = "default_beta_tolerance")]
    pub beta_tolerance: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Dilution factor $W_l$ of the line radiation field.
    #[serde(default = "default_dilution")]
    pub line_dilution: f64,
    /// Dilution factor $W_c$ of the photoionizing continuum.
    #[serde(default = "default_dilution")]
    pub continuum_dilution: f64,
    #[serde(default)]
    pub line_field: LineField,
    #[serde(default)]
    pub channels: RateChannels,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            escape_feedback: true,
            suppress_ground_recombination: false,
            beta_tolerance: default_beta_tolerance(),
            max_iterations: default_max_iterations(),
            line_dilution: default_dilution(),
            continuum_dilution: default_dilution(),
            line_field: LineField::default(),
            channels: RateChannels::default(),
        }
    }
}

impl SolverSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.beta_tolerance > 0.0) || !self.beta_tolerance.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "beta_tolerance must be positive, got {}",
                self.beta_tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid("max_iterations must be at least 1".into()));
        }
        for (name, w) in [
            ("line_dilution", self.line_dilution),
            ("continuum_dilution", self.continuum_dilution),
        ] {
            if !(w >= 0.0) || !w.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "{} must be finite and non-negative, got {}",
                    name, w
                )));
            }
        }
        Ok(())
    }
}

/// Switches for the individual rate channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateChannels {
    #[serde(default = "default_true")]
    pub radiative_bound_bound: bool,
    #[serde(default = "default_true")]
    pub nonthermal_bound_bound: bool,
    #[serde(default = "default_true")]
    pub collisional_bound_bound: bool,
    /// Collisional ionization and three-body recombination.
    #[serde(default = "default_true")]
    pub collisional_bound_free: bool,
    /// Photoionization and radiative recombination.
    #[serde(default = "default_true")]
    pub radiative_bound_free: bool,
}

impl Default for RateChannels {
    fn default() -> Self {
        Self {
            radiative_bound_bound: true,
            nonthermal_bound_bound: true,
            collisional_bound_bound: true,
            collisional_bound_free: true,
            radiative_bound_free: true,
        }
    }
}

impl RateChannels {
    /// Only the collisional channels, which drive populations to LTE.
    pub fn collisional_only() -> Self {
        Self {
            radiative_bound_bound: false,
            nonthermal_bound_bound: false,
            collisional_bound_bound: true,
            collisional_bound_free: true,
            radiative_bound_free: false,
        }
    }
}

/// Settings of the opacity evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpacitySettings {
    /// Doppler width as a fraction of the line frequency, $\Delta\nu_D / \nu_0$.
    #[serde(default = "default_doppler_beta")]
    pub doppler_beta: f64,
    /// Lines whose peak extinction $\alpha_0 / (\nu_0^2 \Delta\nu_D)$ falls
    /// below this are skipped.
    #[serde(default = "default_minimum_extinction")]
    pub minimum_extinction: f64,
    /// Half-width of the profile window in Doppler widths.
    #[serde(default = "default_line_window_widths")]
    pub line_window_widths: f64,
}

impl Default for OpacitySettings {
    fn default() -> Self {
        Self {
            doppler_beta: default_doppler_beta(),
            minimum_extinction: default_minimum_extinction(),
            line_window_widths: default_line_window_widths(),
        }
    }
}

impl OpacitySettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.doppler_beta > 0.0) || !self.doppler_beta.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "doppler_beta must be positive, got {}",
                self.doppler_beta
            )));
        }
        if !(self.minimum_extinction >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "minimum_extinction must be non-negative, got {}",
                self.minimum_extinction
            )));
        }
        if !(self.line_window_widths > 0.0) || !self.line_window_widths.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "line_window_widths must be positive, got {}",
                self.line_window_widths
            )));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}
fn default_beta_tolerance() -> f64 {
    0.1
}
fn default_max_iterations() -> usize {
    100
}
fn default_dilution() -> f64 {
    1.0
}
fn default_doppler_beta() -> f64 {
    1e-3
}
fn default_minimum_extinction() -> f64 {
    1e-30
}
fn default_line_window_widths() -> f64 {
    5.0
}
