//! Level-population solver.
//!
//! [`NlteSolver`] ties the pieces together for one species: the
//! Saha-Boltzmann baseline ([`lte`]), the rate matrix ([`rates`]), the
//! conservation-constrained linear solve ([`nlte`], [`direct`]) and the
//! escape-probability fixed point ([`convergence`]).

pub mod convergence;
pub mod direct;
pub mod lte;
pub mod nlte;
pub mod rates;

use std::sync::Arc;

use ionis_atomic::{AtomicDataError, AtomicStructure};
use log::warn;
use thiserror::Error;

use crate::config::{ConfigError, SolverSettings};
use crate::sobolev;
use crate::types::{ConvergenceStatus, ZoneConditions, ZoneSolution};
use crate::workspace::NlteWorkspace;
use convergence::{ConvergenceCriterion, RelativeBetaChange};

/// Errors that can occur during a population solve.
#[derive(Debug, Error)]
pub enum NlteError {
    #[error("Invalid zone conditions: {0}")]
    InvalidConditions(String),

    #[error("Singular rate matrix: {0}")]
    SingularMatrix(String),

    #[error("Linear algebra error: {0}")]
    LinAlgError(String),

    #[error("Compute backend error: {0}")]
    ComputeError(#[from] ionis_compute::ComputeError),

    #[error(transparent)]
    AtomicData(#[from] AtomicDataError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Workspace does not match species: {0}")]
    WorkspaceMismatch(String),
}

/// Population solver for one species.
///
/// Holds the shared atomic structure and the solver settings; all per-zone
/// state lives in an [`NlteWorkspace`] passed in by the caller.
#[derive(Debug, Clone)]
pub struct NlteSolver {
    atom: Arc<AtomicStructure>,
    settings: SolverSettings,
}

impl NlteSolver {
    pub fn new(atom: Arc<AtomicStructure>) -> Self {
        Self {
            atom,
            settings: SolverSettings::default(),
        }
    }

    /// Create a solver with explicit settings.
    pub fn with_settings(
        atom: Arc<AtomicStructure>,
        settings: SolverSettings,
    ) -> Result<Self, NlteError> {
        settings.validate()?;
        Ok(Self { atom, settings })
    }

    pub fn atom(&self) -> &Arc<AtomicStructure> {
        &self.atom
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Allocate a workspace sized for this solver's species.
    pub fn workspace(&self) -> NlteWorkspace {
        NlteWorkspace::new(&self.atom)
    }

    fn prepare(&self, ws: &mut NlteWorkspace, conditions: &ZoneConditions) -> Result<(), NlteError> {
        conditions.validate()?;
        ws.check_shape(&self.atom)?;
        ws.clear_zone_state();
        Ok(())
    }

    /// Saha-Boltzmann populations and the Sobolev depths they imply.
    pub fn solve_lte(
        &self,
        ws: &mut NlteWorkspace,
        conditions: &ZoneConditions,
    ) -> Result<ZoneSolution, NlteError> {
        self.prepare(ws, conditions)?;
        lte::solve_lte(&self.atom, ws, conditions);
        sobolev::update_escape(&self.atom, ws, conditions);
        Ok(ws.snapshot(&self.atom, *conditions, ConvergenceStatus::Lte, 0))
    }

    /// Fill the workspace rate matrix from its current populations, line
    /// field and escape probabilities.
    pub fn build_rates(
        &self,
        ws: &mut NlteWorkspace,
        conditions: &ZoneConditions,
    ) -> Result<(), NlteError> {
        conditions.validate()?;
        ws.check_shape(&self.atom)?;
        rates::build_rates(&self.atom, &self.settings, ws, conditions);
        Ok(())
    }

    /// Statistical-equilibrium populations, iterated over escape
    /// probabilities with the relative-change criterion of the settings.
    pub fn solve_nlte(
        &self,
        ws: &mut NlteWorkspace,
        conditions: &ZoneConditions,
    ) -> Result<ZoneSolution, NlteError> {
        let criterion = RelativeBetaChange::new(self.settings.beta_tolerance);
        self.solve_nlte_with(ws, conditions, &criterion)
    }

    /// As [`solve_nlte`](Self::solve_nlte) with a caller-supplied criterion.
    pub fn solve_nlte_with(
        &self,
        ws: &mut NlteWorkspace,
        conditions: &ZoneConditions,
        criterion: &dyn ConvergenceCriterion,
    ) -> Result<ZoneSolution, NlteError> {
        self.prepare(ws, conditions)?;
        let (status, iterations) =
            convergence::iterate(&self.atom, &self.settings, ws, conditions, criterion)?;

        let inverted = ws.diagnostics.inverted_lines.len();
        if ws.diagnostics.inversion_count > 0 {
            warn!(
                "{} of {} lines population-inverted at the end ({} over all passes, Z = {}, T = {:.3e} K); escape clamped to 1",
                inverted,
                self.atom.n_lines(),
                ws.diagnostics.inversion_count,
                self.atom.atomic_number(),
                conditions.temperature
            );
        }
        Ok(ws.snapshot(&self.atom, *conditions, status, iterations))
    }
}
