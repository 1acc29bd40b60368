//! Immutable atomic structure of one species.
//!
//! A [`SpeciesSpec`] is the raw, serialisable description handed over by an
//! atomic data loader: ions, levels and lines addressed by plain indices. It
//! is validated and expanded into an [`AtomicStructure`], which carries the
//! derived quantities the solver needs (ionization targets, Einstein B
//! coefficients, oscillator strengths, line bins, cross-section and
//! recombination tables). The structure is built once and shared read-only
//! across every zone.

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::constants::{
    ev_to_hz, ANGSTROM_TO_CM, C, CM_TO_ANGSTROM, H, PI, SENTINEL_CHI_EV, SIGMA_CLASSICAL,
};
use crate::grid::FrequencyGrid;
use crate::hydrogenic;
use crate::provider::AtomicDataError;
use crate::recombination::{RecombinationTable, TemperatureGrid};
use crate::table::TabulatedCurve;

// ─────────────────────────────────────────────────────────────
// Raw specification
// ─────────────────────────────────────────────────────────────

/// An ionization stage as delivered by a loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IonSpec {
    /// Ionization stage (0 = neutral).
    pub stage: u32,
    /// Ionization energy to the next stage (eV).
    pub chi: f64,
    /// Index of this ion's ground level.
    pub ground: usize,
}

/// An energy level as delivered by a loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSpec {
    /// Index of the owning ion.
    pub ion: usize,
    /// Statistical weight; zero is read as one.
    pub g: u32,
    /// Excitation energy above the ion ground state (eV).
    pub energy: f64,
    /// Photoionization cross-section as `[energy_eV, sigma_cm2]` pairs.
    /// Empty means "use the hydrogenic approximation".
    #[serde(default)]
    pub photoionization: Vec<[f64; 2]>,
    /// Radiative recombination coefficient as `[T_K, alpha_cm3_s]` pairs.
    /// Empty means "derive from the cross-section via the Milne relation".
    #[serde(default)]
    pub recombination: Vec<[f64; 2]>,
}

impl LevelSpec {
    pub fn new(ion: usize, g: u32, energy: f64) -> Self {
        Self {
            ion,
            g,
            energy,
            photoionization: Vec::new(),
            recombination: Vec::new(),
        }
    }
}

/// A bound-bound transition as delivered by a loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSpec {
    pub lower: usize,
    pub upper: usize,
    /// Einstein A coefficient (s⁻¹).
    pub a_ul: f64,
}

/// Complete raw description of a species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesSpec {
    pub atomic_number: u32,
    pub ions: Vec<IonSpec>,
    pub levels: Vec<LevelSpec>,
    #[serde(default)]
    pub lines: Vec<LineSpec>,
}

impl SpeciesSpec {
    /// Append the fully ionized stage above the highest listed ion: a single
    /// level with g = 1 and an effectively infinite ionization energy.
    pub fn with_continuum_stage(mut self) -> Self {
        let stage = self.ions.last().map_or(0, |ion| ion.stage + 1);
        let ground = self.levels.len();
        self.ions.push(IonSpec {
            stage,
            chi: SENTINEL_CHI_EV,
            ground,
        });
        self.levels.push(LevelSpec::new(self.ions.len() - 1, 1, 0.0));
        self
    }
}

// ─────────────────────────────────────────────────────────────
// Built structure
// ─────────────────────────────────────────────────────────────

/// Options controlling how derived tables are generated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildOptions {
    /// Temperature knots for Milne recombination tables.
    pub recombination_grid: TemperatureGrid,
}

/// An ionization stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Ion {
    pub stage: u32,
    /// Ionization energy to the next stage (eV).
    pub chi: f64,
    /// Index of the ground level.
    pub ground: usize,
}

/// An energy level with its continuum data.
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    /// Index of the owning ion.
    pub ion: usize,
    /// Statistical weight (>= 1).
    pub g: u32,
    /// Excitation energy above the ion ground (eV).
    pub energy: f64,
    /// Energy needed to ionize from this level, $\chi_{ion} - E$ (eV).
    pub ionization_energy: f64,
    /// Level this one ionizes into; `None` for the top stage.
    pub continuum: Option<usize>,
    /// Photoionization cross-section over photon energy (eV → cm²).
    pub photoionization: TabulatedCurve,
    /// Radiative recombination coefficient into this level.
    pub recombination: RecombinationTable,
}

impl Level {
    /// Statistical weight as a float.
    #[inline]
    pub fn weight(&self) -> f64 {
        f64::from(self.g)
    }
}

/// A bound-bound transition with derived radiative constants.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub lower: usize,
    pub upper: usize,
    /// Einstein A (s⁻¹).
    pub a_ul: f64,
    /// Einstein B for stimulated emission (per unit $J_\nu$).
    pub b_ul: f64,
    /// Einstein B for absorption (per unit $J_\nu$).
    pub b_lu: f64,
    /// Absorption oscillator strength.
    pub f_lu: f64,
    /// Rest frequency (Hz).
    pub nu: f64,
    /// Rest wavelength (Å).
    pub wavelength: f64,
    /// Frequency-grid bin holding the line center.
    pub bin: usize,
}

impl Line {
    /// Rest wavelength in centimetres.
    #[inline]
    pub fn wavelength_cm(&self) -> f64 {
        self.wavelength * ANGSTROM_TO_CM
    }
}

/// Validated, immutable atomic data for one species.
#[derive(Debug, Clone)]
pub struct AtomicStructure {
    atomic_number: u32,
    ions: Vec<Ion>,
    levels: Vec<Level>,
    lines: Vec<Line>,
    grid: Arc<FrequencyGrid>,
}

impl AtomicStructure {
    /// Validate `spec` and derive all tables with default options.
    pub fn build(spec: &SpeciesSpec, grid: Arc<FrequencyGrid>) -> Result<Self, AtomicDataError> {
        Self::build_with(spec, grid, &BuildOptions::default())
    }

    /// Validate `spec` and derive all tables.
    pub fn build_with(
        spec: &SpeciesSpec,
        grid: Arc<FrequencyGrid>,
        options: &BuildOptions,
    ) -> Result<Self, AtomicDataError> {
        if spec.ions.is_empty() {
            return Err(AtomicDataError::EmptySpecies("ions"));
        }
        if spec.levels.is_empty() {
            return Err(AtomicDataError::EmptySpecies("levels"));
        }
        let ions = build_ions(spec)?;
        let levels = build_levels(spec, &ions, options)?;
        let lines = build_lines(spec, &levels, &grid)?;

        debug!(
            "built species Z={}: {} ions, {} levels, {} lines",
            spec.atomic_number,
            ions.len(),
            levels.len(),
            lines.len()
        );

        Ok(Self {
            atomic_number: spec.atomic_number,
            ions,
            levels,
            lines,
            grid,
        })
    }

    pub fn atomic_number(&self) -> u32 {
        self.atomic_number
    }

    pub fn ions(&self) -> &[Ion] {
        &self.ions
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn n_ions(&self) -> usize {
        self.ions.len()
    }

    pub fn n_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn n_lines(&self) -> usize {
        self.lines.len()
    }

    /// The shared frequency grid.
    pub fn grid(&self) -> &Arc<FrequencyGrid> {
        &self.grid
    }

    /// Ground level of the lowest ionization stage.
    pub fn ground_level(&self) -> usize {
        self.ions[0].ground
    }
}

fn build_ions(spec: &SpeciesSpec) -> Result<Vec<Ion>, AtomicDataError> {
    let n_levels = spec.levels.len();
    let mut ions = Vec::with_capacity(spec.ions.len());
    for (i, ion) in spec.ions.iter().enumerate() {
        if i > 0 && ion.stage <= spec.ions[i - 1].stage {
            return Err(AtomicDataError::InvalidValue(format!(
                "ion stages must increase (ion {} has stage {} after stage {})",
                i,
                ion.stage,
                spec.ions[i - 1].stage
            )));
        }
        if !(ion.chi > 0.0) || !ion.chi.is_finite() {
            return Err(AtomicDataError::InvalidValue(format!(
                "ion {} has ionization energy {} eV",
                i, ion.chi
            )));
        }
        if ion.ground >= n_levels {
            return Err(AtomicDataError::InvalidIndex {
                kind: "ground level",
                index: ion.ground,
                len: n_levels,
            });
        }
        if spec.levels[ion.ground].ion != i {
            return Err(AtomicDataError::InvalidValue(format!(
                "ground level {} of ion {} belongs to ion {}",
                ion.ground, i, spec.levels[ion.ground].ion
            )));
        }
        ions.push(Ion {
            stage: ion.stage,
            chi: ion.chi,
            ground: ion.ground,
        });
    }
    Ok(ions)
}

fn build_levels(
    spec: &SpeciesSpec,
    ions: &[Ion],
    options: &BuildOptions,
) -> Result<Vec<Level>, AtomicDataError> {
    // continuum target of each ion: ground of the stage directly above
    let targets: Vec<Option<usize>> = ions
        .iter()
        .map(|ion| {
            ions.iter()
                .find(|next| next.stage == ion.stage + 1)
                .map(|next| next.ground)
        })
        .collect();

    // statistical weights first, the Milne tables need the target's g
    let weights: Vec<u32> = spec.levels.iter().map(|l| l.g.max(1)).collect();

    let mut levels = Vec::with_capacity(spec.levels.len());
    for (i, lev) in spec.levels.iter().enumerate() {
        if lev.ion >= ions.len() {
            return Err(AtomicDataError::InvalidIndex {
                kind: "ion",
                index: lev.ion,
                len: ions.len(),
            });
        }
        if !(lev.energy >= 0.0) || !lev.energy.is_finite() {
            return Err(AtomicDataError::InvalidValue(format!(
                "level {} has excitation energy {} eV",
                i, lev.energy
            )));
        }
        let ion = &ions[lev.ion];
        let ionization_energy = ion.chi - lev.energy;
        let continuum = targets[lev.ion];

        let (photoionization, recombination) = match continuum {
            None => (TabulatedCurve::default(), RecombinationTable::zero()),
            Some(target) => {
                if !(ionization_energy > 0.0) {
                    return Err(AtomicDataError::InvalidValue(format!(
                        "level {} lies {} eV above its ionization limit",
                        i, -ionization_energy
                    )));
                }
                let sigma = if lev.photoionization.is_empty() {
                    hydrogenic::cross_section(ionization_energy, ion.chi, ion.stage)
                } else {
                    tabulated_cross_section(i, &lev.photoionization, ionization_energy)?
                };
                let recomb = if lev.recombination.is_empty() {
                    let weight_ratio = f64::from(weights[i]) / f64::from(weights[target]);
                    RecombinationTable::from_milne(
                        &sigma,
                        ionization_energy,
                        weight_ratio,
                        &options.recombination_grid,
                    )?
                } else {
                    let (ts, alphas): (Vec<f64>, Vec<f64>) =
                        lev.recombination.iter().map(|p| (p[0], p[1])).unzip();
                    RecombinationTable::from_samples(&ts, &alphas)?
                };
                (sigma, recomb)
            }
        };

        levels.push(Level {
            ion: lev.ion,
            g: weights[i],
            energy: lev.energy,
            ionization_energy,
            continuum,
            photoionization,
            recombination,
        });
    }
    Ok(levels)
}

/// Tabulated cross-section with points below threshold discarded.
fn tabulated_cross_section(
    level: usize,
    points: &[[f64; 2]],
    threshold: f64,
) -> Result<TabulatedCurve, AtomicDataError> {
    if points.iter().any(|p| !(p[1] >= 0.0) || !p[0].is_finite()) {
        return Err(AtomicDataError::InvalidValue(format!(
            "level {} has a negative or non-finite photoionization cross-section",
            level
        )));
    }
    let (xs, ys): (Vec<f64>, Vec<f64>) = points
        .iter()
        .filter(|p| p[0] >= threshold)
        .map(|p| (p[0], p[1]))
        .unzip();
    TabulatedCurve::new(xs, ys)
}

fn build_lines(
    spec: &SpeciesSpec,
    levels: &[Level],
    grid: &FrequencyGrid,
) -> Result<Vec<Line>, AtomicDataError> {
    let mut lines = Vec::with_capacity(spec.lines.len());
    for (i, line) in spec.lines.iter().enumerate() {
        for index in [line.lower, line.upper] {
            if index >= levels.len() {
                return Err(AtomicDataError::InvalidIndex {
                    kind: "line level",
                    index,
                    len: levels.len(),
                });
            }
        }
        if !(line.a_ul >= 0.0) || !line.a_ul.is_finite() {
            return Err(AtomicDataError::InvalidValue(format!(
                "line {} has Einstein A = {}",
                i, line.a_ul
            )));
        }
        let lower = &levels[line.lower];
        let upper = &levels[line.upper];
        let delta_e = upper.energy - lower.energy;
        if !(delta_e > 0.0) {
            return Err(AtomicDataError::InvalidValue(format!(
                "line {} ({} -> {}) has non-positive energy gap {} eV",
                i, line.lower, line.upper, delta_e
            )));
        }

        let nu = ev_to_hz(delta_e);
        let wavelength = C / nu * CM_TO_ANGSTROM;
        let (gl, gu) = (lower.weight(), upper.weight());

        let b_ul = line.a_ul * C * C / (2.0 * H * nu * nu * nu);
        let b_lu = b_ul * gu / gl;
        // Rutten, "Radiative Transfer in Stellar Atmospheres", eq. 2.64
        let lam_cm = wavelength * ANGSTROM_TO_CM;
        let f_lu = lam_cm * lam_cm * line.a_ul * gu / gl / (8.0 * PI * SIGMA_CLASSICAL);

        lines.push(Line {
            lower: line.lower,
            upper: line.upper,
            a_ul: line.a_ul,
            b_ul,
            b_lu,
            f_lu,
            nu,
            wavelength,
            bin: grid.locate_within_bounds(nu),
        });
    }
    Ok(lines)
}
