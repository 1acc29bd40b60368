//! Opacity and emissivity of a solved zone.
//!
//! The [`OpacityEvaluator`] turns level populations into per-bin extinction
//! (cm⁻¹) and emissivity on the species' frequency grid, summing the
//! bound-free ([`bound_free`]) and bound-bound ([`bound_bound`])
//! contributions. Bound-free bins are independent and are scheduled on a
//! [`ComputeBackend`]; lines are scattered into their windows serially.

pub mod bound_bound;
pub mod bound_free;
pub mod voigt;

use std::sync::Arc;

use ionis_atomic::AtomicStructure;
use ionis_compute::{ComputeBackend, CpuBackend};
use ndarray::ArrayView1;

use crate::config::OpacitySettings;
use crate::solver::NlteError;
use crate::types::{Spectrum, ZoneConditions, ZoneSolution};

/// Evaluates extinction and emissivity spectra from level populations.
#[derive(Clone)]
pub struct OpacityEvaluator {
    settings: OpacitySettings,
    backend: Arc<dyn ComputeBackend>,
}

impl Default for OpacityEvaluator {
    fn default() -> Self {
        Self::new(OpacitySettings::default())
    }
}

impl std::fmt::Debug for OpacityEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpacityEvaluator")
            .field("settings", &self.settings)
            .field("backend", &self.backend.device_info().name)
            .finish()
    }
}

impl OpacityEvaluator {
    /// Create an evaluator on the Rayon CPU backend.
    pub fn new(settings: OpacitySettings) -> Self {
        Self::with_backend(settings, Arc::new(CpuBackend::new()))
    }

    pub fn with_backend(settings: OpacitySettings, backend: Arc<dyn ComputeBackend>) -> Self {
        Self { settings, backend }
    }

    pub fn settings(&self) -> &OpacitySettings {
        &self.settings
    }

    pub fn backend(&self) -> &Arc<dyn ComputeBackend> {
        &self.backend
    }

    /// Bound-free plus bound-bound spectrum for `populations` at `conditions`.
    ///
    /// Both parts of the emissivity are absolute: the per-electron
    /// bound-free emissivity of [`bound_free::bound_free`] is multiplied by
    /// $n_e$ before the lines are added.
    pub fn evaluate(
        &self,
        atom: &AtomicStructure,
        populations: ArrayView1<'_, f64>,
        conditions: &ZoneConditions,
    ) -> Result<Spectrum, NlteError> {
        self.settings.validate()?;
        conditions.validate()?;
        if populations.len() != atom.n_levels() {
            return Err(NlteError::WorkspaceMismatch(format!(
                "{} populations for {} levels",
                populations.len(),
                atom.n_levels()
            )));
        }

        let mut spectrum =
            bound_free::bound_free(atom, populations, conditions, self.backend.as_ref())?;
        spectrum.emissivity *= conditions.electron_density;
        spectrum.accumulate(&bound_bound::bound_bound(
            atom,
            populations,
            conditions,
            &self.settings,
        ));
        Ok(spectrum)
    }

    /// Spectrum of a finished solve.
    pub fn evaluate_solution(
        &self,
        atom: &AtomicStructure,
        solution: &ZoneSolution,
    ) -> Result<Spectrum, NlteError> {
        self.evaluate(atom, solution.populations.view(), &solution.conditions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::lte::solve_lte;
    use crate::testing::two_stage_species;
    use crate::workspace::NlteWorkspace;
    use approx::assert_relative_eq;
    use ionis_atomic::constants::planck_nu;
    use ionis_compute::SerialBackend;

    #[test]
    fn test_total_is_sum_of_parts() {
        let atom = two_stage_species();
        let cond = ZoneConditions::new(1.0e4, 1e8, 1e6, 1e6);
        let mut ws = NlteWorkspace::new(&atom);
        solve_lte(&atom, &mut ws, &cond);

        let settings = OpacitySettings::default();
        let evaluator = OpacityEvaluator::with_backend(settings.clone(), Arc::new(SerialBackend));
        let total = evaluator.evaluate(&atom, ws.populations(), &cond).unwrap();
        let bf = bound_free::bound_free(&atom, ws.populations(), &cond, &SerialBackend).unwrap();
        let bb = bound_bound::bound_bound(&atom, ws.populations(), &cond, &settings);
        for i in 0..total.len() {
            assert_relative_eq!(total.extinction[i], bf.extinction[i] + bb.extinction[i]);
            assert_relative_eq!(
                total.emissivity[i],
                cond.electron_density * bf.emissivity[i] + bb.emissivity[i]
            );
        }
    }

    #[test]
    fn test_backends_agree() {
        let atom = two_stage_species();
        let cond = ZoneConditions::new(1.0e4, 1e8, 1e6, 1e6);
        let mut ws = NlteWorkspace::new(&atom);
        solve_lte(&atom, &mut ws, &cond);

        let cpu = OpacityEvaluator::default()
            .evaluate(&atom, ws.populations(), &cond)
            .unwrap();
        let serial = OpacityEvaluator::with_backend(OpacitySettings::default(), Arc::new(SerialBackend))
            .evaluate(&atom, ws.populations(), &cond)
            .unwrap();
        assert_eq!(cpu, serial);
    }

    #[test]
    fn test_population_length_is_checked() {
        let atom = two_stage_species();
        let cond = ZoneConditions::new(1.0e4, 1e8, 1e6, 1e6);
        let pops = ndarray::Array1::<f64>::zeros(atom.n_levels() + 1);
        assert!(matches!(
            OpacityEvaluator::default().evaluate(&atom, pops.view(), &cond),
            Err(NlteError::WorkspaceMismatch(_))
        ));
    }

    #[test]
    fn test_total_spectrum_obeys_kirchhoff_in_lte() {
        let atom = two_stage_species();
        let t = 1.0e4;
        let cond = ZoneConditions::new(t, 1e8, 1e6, 1e6);
        let mut ws = NlteWorkspace::new(&atom);
        solve_lte(&atom, &mut ws, &cond);
        let spectrum = OpacityEvaluator::default()
            .evaluate(&atom, ws.populations(), &cond)
            .unwrap();

        let grid = atom.grid();
        let line_bin = atom.lines()[0].bin;
        let mut continuum_bins = 0;
        for i in 0..grid.len() {
            let k = spectrum.extinction[i];
            if k == 0.0 {
                continue;
            }
            let source = spectrum.emissivity[i] / k;
            let planck = planck_nu(t, grid.center(i));
            if i == line_bin {
                // the line's excitation temperature is set at its rest frequency
                assert_relative_eq!(source, planck, max_relative = 2e-2);
            } else {
                assert_relative_eq!(source, planck, max_relative = 1e-8);
                continuum_bins += 1;
            }
        }
        assert!(continuum_bins > 0);
    }
}
