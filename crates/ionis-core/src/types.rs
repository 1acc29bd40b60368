//! Core types shared across the Ionis solver.
//!
//! This module defines the per-zone inputs (thermodynamic conditions) and
//! the result containers returned by the population solver and the opacity
//! evaluator.

use std::fmt;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::solver::NlteError;

/// Macroscopic state of one zone, supplied by the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneConditions {
    /// Gas (electron) temperature (K).
    pub temperature: f64,
    /// Free electron density (cm⁻³).
    pub electron_density: f64,
    /// Number density of the species (cm⁻³).
    pub number_density: f64,
    /// Time since explosion (s), the Sobolev length scale of homologous flow.
    pub time: f64,
    /// Non-thermal energy deposition rate (erg cm⁻³ s⁻¹).
    #[serde(default)]
    pub e_gamma: f64,
}

impl ZoneConditions {
    pub fn new(temperature: f64, electron_density: f64, number_density: f64, time: f64) -> Self {
        Self {
            temperature,
            electron_density,
            number_density,
            time,
            e_gamma: 0.0,
        }
    }

    /// Set the non-thermal deposition rate.
    pub fn with_e_gamma(mut self, e_gamma: f64) -> Self {
        self.e_gamma = e_gamma;
        self
    }

    /// Reject conditions no solve can be attempted with.
    pub fn validate(&self) -> Result<(), NlteError> {
        let positive = [
            ("temperature", self.temperature),
            ("number density", self.number_density),
            ("time", self.time),
        ];
        for (name, value) in positive {
            if !(value > 0.0) || !value.is_finite() {
                return Err(NlteError::InvalidConditions(format!(
                    "{} must be positive and finite, got {:e}",
                    name, value
                )));
            }
        }
        let non_negative = [
            ("electron density", self.electron_density),
            ("e_gamma", self.e_gamma),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(NlteError::InvalidConditions(format!(
                    "{} must be non-negative and finite, got {:e}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// How a population solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceStatus {
    /// Saha-Boltzmann populations, no rate equations solved.
    Lte,
    /// Escape feedback disabled: one linear solve.
    SinglePass,
    /// Escape probabilities settled within tolerance.
    Converged,
    /// Iteration cap reached; populations are those of the last pass.
    MaxIterationsExceeded,
}

/// Soft conditions met during a solve. None of these are errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolveDiagnostics {
    /// Lines found population-inverted on the last escape update.
    pub inverted_lines: Vec<usize>,
    /// Lines whose lower level was empty on the last escape update.
    pub empty_lower_lines: Vec<usize>,
    /// Inverted lines summed over every escape update of the solve, so
    /// inversions that resolve before the last pass are still counted.
    pub inversion_count: usize,
    /// Empty-lower lines summed over every escape update of the solve.
    pub empty_lower_count: usize,
    /// Levels whose departure coefficient came out negative and was clamped.
    pub clamped_levels: usize,
    /// Largest relative escape-probability change of the last iteration.
    pub max_beta_change: f64,
}

impl SolveDiagnostics {
    pub fn clear(&mut self) {
        self.inverted_lines.clear();
        self.empty_lower_lines.clear();
        self.inversion_count = 0;
        self.empty_lower_count = 0;
        self.clamped_levels = 0;
        self.max_beta_change = 0.0;
    }
}

/// Level populations of one species in one zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSolution {
    pub conditions: ZoneConditions,
    pub status: ConvergenceStatus,
    /// Number of rate-equation solves performed.
    pub iterations: usize,
    /// Fractional level populations (sum to one over the species).
    pub populations: Array1<f64>,
    /// Saha-Boltzmann level populations at the same conditions.
    pub lte_populations: Array1<f64>,
    /// Departure coefficients $b_i = n_i / n_i^{LTE}$.
    pub departure: Array1<f64>,
    /// Ionization-stage fractions.
    pub ion_fractions: Array1<f64>,
    /// Partition function of each ion.
    pub partition_functions: Array1<f64>,
    /// Ionization stage of each ion.
    pub ion_stages: Vec<u32>,
    /// Owning ion of each level.
    pub level_ions: Vec<usize>,
    /// Sobolev optical depth of each line.
    pub line_tau: Array1<f64>,
    /// Escape probability of each line.
    pub line_beta: Array1<f64>,
    pub diagnostics: SolveDiagnostics,
}

impl ZoneSolution {
    /// True only when the escape-probability iteration met its criterion.
    pub fn is_converged(&self) -> bool {
        self.status == ConvergenceStatus::Converged
    }

    /// Populations can be used: every status except an exhausted iteration cap.
    pub fn is_usable(&self) -> bool {
        self.status != ConvergenceStatus::MaxIterationsExceeded
    }

    /// Mean ionization stage, $\sum_i x_i \, \mathrm{stage}_i$.
    pub fn mean_ionization(&self) -> f64 {
        self.ion_fractions
            .iter()
            .zip(&self.ion_stages)
            .map(|(x, &stage)| x * f64::from(stage))
            .sum()
    }

    pub fn n_levels(&self) -> usize {
        self.populations.len()
    }

    pub fn n_lines(&self) -> usize {
        self.line_tau.len()
    }
}

impl fmt::Display for ZoneSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.conditions;
        writeln!(
            f,
            "zone: T = {:.4e} K, n_e = {:.4e} cm^-3, t = {:.4e} s ({:?}, {} iterations)",
            c.temperature, c.electron_density, c.time, self.status, self.iterations
        )?;
        writeln!(f, "{:>6} {:>12} {:>12}", "stage", "partition", "fraction")?;
        for ((stage, z), x) in self
            .ion_stages
            .iter()
            .zip(&self.partition_functions)
            .zip(&self.ion_fractions)
        {
            writeln!(f, "{:>6} {:>12.4e} {:>12.4e}", stage, z, x)?;
        }
        writeln!(f, "{:>6} {:>5} {:>12} {:>12}", "level", "ion", "population", "departure")?;
        for (i, ion) in self.level_ions.iter().enumerate() {
            writeln!(
                f,
                "{:>6} {:>5} {:>12.4e} {:>12.4e}",
                i, ion, self.populations[i], self.departure[i]
            )?;
        }
        if !self.diagnostics.inverted_lines.is_empty() {
            writeln!(f, "inverted lines: {:?}", self.diagnostics.inverted_lines)?;
        }
        Ok(())
    }
}

/// Per-bin extinction (cm⁻¹) and emissivity on the shared frequency grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    pub extinction: Array1<f64>,
    pub emissivity: Array1<f64>,
}

impl Spectrum {
    pub fn zeros(n_bins: usize) -> Self {
        Self {
            extinction: Array1::zeros(n_bins),
            emissivity: Array1::zeros(n_bins),
        }
    }

    pub fn len(&self) -> usize {
        self.extinction.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extinction.is_empty()
    }

    /// Add another spectrum on the same grid bin by bin.
    pub fn accumulate(&mut self, other: &Spectrum) {
        self.extinction += &other.extinction;
        self.emissivity += &other.emissivity;
    }
}
