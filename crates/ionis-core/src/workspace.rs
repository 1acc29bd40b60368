//! Mutable per-zone working state.
//!
//! An [`NlteWorkspace`] holds everything a population solve writes: level
//! and ion populations, line radiation and escape quantities, the rate
//! matrix and the linear-system buffers. It is sized for one species and
//! reused across zones, so a worker thread allocates once and solves many
//! zones.

use ionis_atomic::AtomicStructure;
use ndarray::{Array1, Array2, ArrayView1};

use crate::solver::NlteError;
use crate::types::{ConvergenceStatus, SolveDiagnostics, ZoneConditions, ZoneSolution};

/// Per-zone level, line and matrix storage for one species.
#[derive(Debug, Clone)]
pub struct NlteWorkspace {
    pub(crate) partition: Array1<f64>,
    pub(crate) ion_fraction: Array1<f64>,

    pub(crate) lte_population: Array1<f64>,
    pub(crate) population: Array1<f64>,
    pub(crate) departure: Array1<f64>,

    pub(crate) line_j: Array1<f64>,
    pub(crate) line_tau: Array1<f64>,
    pub(crate) line_exp_tau: Array1<f64>,
    pub(crate) line_beta: Array1<f64>,

    /// `rates[[i, j]]`: transitions i → j per unit departure coefficient.
    pub(crate) rates: Array2<f64>,
    pub(crate) matrix: Array2<f64>,
    pub(crate) rhs: Array1<f64>,

    pub(crate) diagnostics: SolveDiagnostics,
}

impl NlteWorkspace {
    /// Allocate storage matching `atom`.
    pub fn new(atom: &AtomicStructure) -> Self {
        let (n_ions, n_levels, n_lines) = (atom.n_ions(), atom.n_levels(), atom.n_lines());
        Self {
            partition: Array1::zeros(n_ions),
            ion_fraction: Array1::zeros(n_ions),
            lte_population: Array1::zeros(n_levels),
            population: Array1::zeros(n_levels),
            departure: Array1::ones(n_levels),
            line_j: Array1::zeros(n_lines),
            line_tau: Array1::zeros(n_lines),
            line_exp_tau: Array1::ones(n_lines),
            line_beta: Array1::ones(n_lines),
            rates: Array2::zeros((n_levels, n_levels)),
            matrix: Array2::zeros((n_levels, n_levels)),
            rhs: Array1::zeros(n_levels),
            diagnostics: SolveDiagnostics::default(),
        }
    }

    pub fn n_ions(&self) -> usize {
        self.partition.len()
    }

    pub fn n_levels(&self) -> usize {
        self.population.len()
    }

    pub fn n_lines(&self) -> usize {
        self.line_j.len()
    }

    /// Fail unless this workspace was allocated for a species shaped like `atom`.
    pub fn check_shape(&self, atom: &AtomicStructure) -> Result<(), NlteError> {
        let expected = (atom.n_ions(), atom.n_levels(), atom.n_lines());
        let found = (self.n_ions(), self.n_levels(), self.n_lines());
        if expected != found {
            return Err(NlteError::WorkspaceMismatch(format!(
                "workspace holds (ions, levels, lines) = {:?}, species has {:?}",
                found, expected
            )));
        }
        Ok(())
    }

    /// Clear all per-zone state, including any externally supplied line field.
    pub fn reset(&mut self) {
        self.clear_zone_state();
        self.line_j.fill(0.0);
    }

    /// Clear everything a solve recomputes. The line field is left alone.
    pub(crate) fn clear_zone_state(&mut self) {
        self.partition.fill(0.0);
        self.ion_fraction.fill(0.0);
        self.lte_population.fill(0.0);
        self.population.fill(0.0);
        self.departure.fill(1.0);
        self.line_tau.fill(0.0);
        self.line_exp_tau.fill(1.0);
        self.line_beta.fill(1.0);
        self.rates.fill(0.0);
        self.matrix.fill(0.0);
        self.rhs.fill(0.0);
        self.diagnostics.clear();
    }

    pub fn populations(&self) -> ArrayView1<'_, f64> {
        self.population.view()
    }

    pub fn lte_populations(&self) -> ArrayView1<'_, f64> {
        self.lte_population.view()
    }

    pub fn departure(&self) -> ArrayView1<'_, f64> {
        self.departure.view()
    }

    pub fn ion_fractions(&self) -> ArrayView1<'_, f64> {
        self.ion_fraction.view()
    }

    pub fn partition_functions(&self) -> ArrayView1<'_, f64> {
        self.partition.view()
    }

    pub fn line_j(&self) -> ArrayView1<'_, f64> {
        self.line_j.view()
    }

    pub fn line_tau(&self) -> ArrayView1<'_, f64> {
        self.line_tau.view()
    }

    pub fn line_exp_tau(&self) -> ArrayView1<'_, f64> {
        self.line_exp_tau.view()
    }

    pub fn line_beta(&self) -> ArrayView1<'_, f64> {
        self.line_beta.view()
    }

    /// The rate matrix of the last rate build (rows weighted by LTE population).
    pub fn rates(&self) -> &Array2<f64> {
        &self.rates
    }

    pub fn diagnostics(&self) -> &SolveDiagnostics {
        &self.diagnostics
    }

    /// Set the mean intensity of every line.
    ///
    /// Used together with [`LineField::External`](crate::config::LineField):
    /// the values survive into the next solve.
    pub fn set_line_field(&mut self, j: &[f64]) -> Result<(), NlteError> {
        if j.len() != self.n_lines() {
            return Err(NlteError::WorkspaceMismatch(format!(
                "line field has {} values for {} lines",
                j.len(),
                self.n_lines()
            )));
        }
        if let Some(bad) = j.iter().find(|v| !(**v >= 0.0) || !v.is_finite()) {
            return Err(NlteError::InvalidConditions(format!(
                "line mean intensity must be finite and non-negative, got {:e}",
                bad
            )));
        }
        self.line_j.assign(&ArrayView1::from(j));
        Ok(())
    }

    /// Overwrite the level populations, keeping the LTE reference.
    ///
    /// Departure coefficients and ion fractions are recomputed from the new
    /// values; escape probabilities are not.
    pub fn set_level_populations(
        &mut self,
        atom: &AtomicStructure,
        populations: &[f64],
    ) -> Result<(), NlteError> {
        self.check_shape(atom)?;
        if populations.len() != self.n_levels() {
            return Err(NlteError::WorkspaceMismatch(format!(
                "{} populations for {} levels",
                populations.len(),
                self.n_levels()
            )));
        }
        if populations.iter().any(|n| !(*n >= 0.0) || !n.is_finite()) {
            return Err(NlteError::InvalidConditions(
                "level populations must be finite and non-negative".into(),
            ));
        }
        self.population.assign(&ArrayView1::from(populations));
        for i in 0..self.n_levels() {
            let lte = self.lte_population[i];
            self.departure[i] = if lte > 0.0 { populations[i] / lte } else { 1.0 };
        }
        self.sum_ion_fractions(atom);
        Ok(())
    }

    /// Ion fractions as sums of their level populations.
    pub(crate) fn sum_ion_fractions(&mut self, atom: &AtomicStructure) {
        self.ion_fraction.fill(0.0);
        for (level, n) in atom.levels().iter().zip(self.population.iter()) {
            self.ion_fraction[level.ion] += n;
        }
    }

    /// Copy the current state into an owned result.
    pub fn snapshot(
        &self,
        atom: &AtomicStructure,
        conditions: ZoneConditions,
        status: ConvergenceStatus,
        iterations: usize,
    ) -> ZoneSolution {
        ZoneSolution {
            conditions,
            status,
            iterations,
            populations: self.population.clone(),
            lte_populations: self.lte_population.clone(),
            departure: self.departure.clone(),
            ion_fractions: self.ion_fraction.clone(),
            partition_functions: self.partition.clone(),
            ion_stages: atom.ions().iter().map(|ion| ion.stage).collect(),
            level_ions: atom.levels().iter().map(|level| level.ion).collect(),
            line_tau: self.line_tau.clone(),
            line_beta: self.line_beta.clone(),
            diagnostics: self.diagnostics.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::two_stage_species;

    #[test]
    fn test_allocation_matches_species() {
        let atom = two_stage_species();
        let ws = NlteWorkspace::new(&atom);
        assert_eq!(ws.n_levels(), atom.n_levels());
        assert_eq!(ws.n_lines(), atom.n_lines());
        assert_eq!(ws.rates().dim(), (atom.n_levels(), atom.n_levels()));
        assert!(ws.check_shape(&atom).is_ok());
    }

    #[test]
    fn test_line_field_length_is_checked() {
        let atom = two_stage_species();
        let mut ws = NlteWorkspace::new(&atom);
        assert!(ws.set_line_field(&[1.0, 2.0, 3.0, 4.0]).is_err());
        ws.set_line_field(&vec![2.5; atom.n_lines()]).unwrap();
        assert_eq!(ws.line_j()[0], 2.5);
        ws.reset();
        assert_eq!(ws.line_j()[0], 0.0);
    }

    #[test]
    fn test_clear_keeps_line_field() {
        let atom = two_stage_species();
        let mut ws = NlteWorkspace::new(&atom);
        ws.set_line_field(&vec![2.5; atom.n_lines()]).unwrap();
        ws.line_beta.fill(0.3);
        ws.clear_zone_state();
        assert_eq!(ws.line_j()[0], 2.5);
        assert_eq!(ws.line_beta()[0], 1.0);
    }
}
