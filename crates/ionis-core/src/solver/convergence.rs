//! Fixed-point iteration over Sobolev escape probabilities.
//!
//! Rates depend on the escape probabilities, which depend on the populations
//! the rates produce. Starting from LTE, each pass rebuilds the rates with
//! the current β, re-solves the rate equations and recomputes β, until a
//! [`ConvergenceCriterion`] accepts the change or the iteration cap is hit.

use ionis_atomic::AtomicStructure;
use log::{debug, warn};
use ndarray::ArrayView1;

use super::{lte, nlte, rates, NlteError};
use crate::config::SolverSettings;
use crate::sobolev;
use crate::types::{ConvergenceStatus, ZoneConditions};
use crate::workspace::NlteWorkspace;

/// Decides whether two successive sets of escape probabilities agree.
pub trait ConvergenceCriterion: Send + Sync {
    fn converged(&self, previous: ArrayView1<'_, f64>, current: ArrayView1<'_, f64>) -> bool;
}

/// Every line satisfies $|\beta_{old} - \beta_{new}| / \beta_{new} \le$ `tolerance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelativeBetaChange {
    pub tolerance: f64,
}

impl RelativeBetaChange {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }
}

impl Default for RelativeBetaChange {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl ConvergenceCriterion for RelativeBetaChange {
    fn converged(&self, previous: ArrayView1<'_, f64>, current: ArrayView1<'_, f64>) -> bool {
        previous
            .iter()
            .zip(current.iter())
            .all(|(old, new)| (old - new).abs() / new <= self.tolerance)
    }
}

/// Largest $|\beta_{old} - \beta_{new}| / \beta_{new}$ over all lines.
pub fn max_relative_change(previous: ArrayView1<'_, f64>, current: ArrayView1<'_, f64>) -> f64 {
    previous
        .iter()
        .zip(current.iter())
        .map(|(old, new)| (old - new).abs() / new)
        .fold(0.0, f64::max)
}

/// Run the LTE initialisation and the escape-probability iteration.
///
/// Returns the final status and the number of rate-equation solves. With
/// escape feedback disabled exactly one solve is made. Reaching the cap is
/// not an error: the populations of the last pass are kept. A zone so cold
/// (or hot) that some LTE population underflows is rejected before any solve.
pub fn iterate(
    atom: &AtomicStructure,
    settings: &SolverSettings,
    ws: &mut NlteWorkspace,
    conditions: &ZoneConditions,
    criterion: &dyn ConvergenceCriterion,
) -> Result<(ConvergenceStatus, usize), NlteError> {
    lte::solve_lte(atom, ws, conditions);
    // rows are weighted by n_lte, so an underflowed level leaves a zero column
    if let Some(level) = ws.lte_population.iter().position(|&n| !(n > 0.0)) {
        return Err(NlteError::InvalidConditions(format!(
            "LTE population of level {} underflows to zero at T = {:.3e} K, n_e = {:.3e} cm^-3",
            level, conditions.temperature, conditions.electron_density
        )));
    }
    sobolev::update_escape(atom, ws, conditions);
    rates::fill_line_field(atom, settings, ws, conditions);

    let mut previous = ws.line_beta.clone();
    for iteration in 1..=settings.max_iterations {
        rates::build_rates(atom, settings, ws, conditions);
        nlte::equilibrium_step(atom, ws)?;

        previous.assign(&ws.line_beta);
        sobolev::update_escape(atom, ws, conditions);

        if !settings.escape_feedback {
            return Ok((ConvergenceStatus::SinglePass, 1));
        }

        let change = max_relative_change(previous.view(), ws.line_beta.view());
        ws.diagnostics.max_beta_change = change;
        debug!(
            "iteration {}: max relative escape change {:.3e}",
            iteration, change
        );
        if criterion.converged(previous.view(), ws.line_beta.view()) {
            return Ok((ConvergenceStatus::Converged, iteration));
        }
    }

    warn!(
        "NLTE populations not converged after {} iterations (Z = {}, T = {:.3e} K, max change {:.3e})",
        settings.max_iterations,
        atom.atomic_number(),
        conditions.temperature,
        ws.diagnostics.max_beta_change
    );
    Ok((ConvergenceStatus::MaxIterationsExceeded, settings.max_iterations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::testing::two_stage_species;
    use ndarray::{array, Array1};

    #[test]
    fn test_relative_change_criterion() {
        let c = RelativeBetaChange::new(0.1);
        assert!(c.converged(array![1.0, 0.5].view(), array![0.95, 0.52].view()));
        assert!(!c.converged(array![1.0, 0.5].view(), array![0.8, 0.5].view()));
        let none = Array1::<f64>::zeros(0);
        assert!(c.converged(none.view(), none.view()));
    }

    #[test]
    fn test_max_relative_change() {
        let change = max_relative_change(array![1.0, 0.3].view(), array![0.5, 0.3].view());
        assert_relative_eq!(change, 1.0);
    }

    #[test]
    fn test_underflowing_lte_population_is_rejected() {
        let atom = two_stage_species();
        let settings = SolverSettings::default();
        let mut ws = NlteWorkspace::new(&atom);
        let criterion = RelativeBetaChange::default();

        // chi / kT is about 870 at 400 K
        let cold = ZoneConditions::new(400.0, 1e8, 1e6, 1e6);
        match iterate(&atom, &settings, &mut ws, &cold, &criterion) {
            Err(NlteError::InvalidConditions(msg)) => assert!(msg.contains("underflows")),
            other => panic!("expected an underflow error, got {:?}", other),
        }

        let warm = ZoneConditions::new(1.0e4, 1e8, 1e6, 1e6);
        assert!(iterate(&atom, &settings, &mut ws, &warm, &criterion).is_ok());
    }
}
