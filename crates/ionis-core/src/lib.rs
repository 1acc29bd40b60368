//! # Ionis Core
//!
//! Non-LTE level populations and opacities for one atomic species in one
//! zone of an expanding plasma. Given the temperature, electron density and
//! time since explosion supplied by an outer transport loop, the solver
//! returns level populations, ion fractions and per-frequency-bin
//! extinction and emissivity.
//!
//! ## Architecture
//!
//! [`solver::NlteSolver`] owns the shared, immutable
//! [`AtomicStructure`](ionis_atomic::AtomicStructure) and the settings; all
//! per-zone state lives in an [`workspace::NlteWorkspace`] passed by `&mut`,
//! so any number of zones can be solved concurrently
//! ([`batch::solve_zones`]).
//!
//! ## Modules
//!
//! - [`types`] — Zone conditions and result containers.
//! - [`config`] — Solver and opacity settings, loadable from TOML.
//! - [`workspace`] — Per-zone mutable state.
//! - [`solver`] — LTE baseline, rate matrix, linear solve, escape iteration.
//! - [`sobolev`] — Sobolev optical depths and escape probabilities.
//! - [`opacity`] — Bound-free and bound-bound extinction and emissivity.
//! - [`batch`] — Parallel solves over many zones.

pub mod batch;
pub mod config;
pub mod opacity;
pub mod sobolev;
pub mod solver;
pub mod types;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{IonisConfig, OpacitySettings, RateChannels, SolverSettings};
pub use opacity::OpacityEvaluator;
pub use solver::{NlteError, NlteSolver};
pub use types::{ConvergenceStatus, Spectrum, ZoneConditions, ZoneSolution};
pub use workspace::NlteWorkspace;
