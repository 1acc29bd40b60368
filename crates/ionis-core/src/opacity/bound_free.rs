//! Bound-free (photoionization) extinction and emissivity.
//!
//! For a level $l$ ionizing into $c$, the LTE population of $l$ relative to
//! the actual continuum population is
//! $n_c\, n_e\, (g_l/g_c)(\lambda_t^3/2)\, e^{E_{ion}/kT}$. Extinction is
//! corrected for stimulated recombination with that population,
//!
//! $$\kappa_\nu = \sum_l \sigma_l(\nu)\left[n\, n_l - \phi_l\, n_e\,
//!   e^{(E_{ion} - h\nu)/kT}\right], \qquad
//!   \phi_l = n\, n_c \frac{g_l}{g_c} \frac{\lambda_t^3}{2},$$
//!
//! and the emissivity is $(2h\nu^3/c^2)\, \sigma_l\, \phi_l\, e^{(E_{ion} - h\nu)/kT}$
//! per free electron: the caller multiplies by $n_e$.

use ionis_atomic::constants::{hz_to_ev, thermal_wavelength_cubed, C, H, K_B_EV};
use ionis_atomic::{AtomicStructure, TabulatedCurve};
use ionis_compute::ComputeBackend;
use ndarray::ArrayView1;

use crate::solver::NlteError;
use crate::types::{Spectrum, ZoneConditions};

/// Per-level quantities that do not depend on frequency.
struct Continuum<'a> {
    threshold_ev: f64,
    cross_section: &'a TabulatedCurve,
    /// $n\, n_l$ (cm⁻³).
    lower_density: f64,
    /// $\phi_l$ (cm⁻³ · cm³).
    phi: f64,
}

/// Bound-free spectrum at the bin centers of the species' frequency grid.
pub fn bound_free(
    atom: &AtomicStructure,
    populations: ArrayView1<'_, f64>,
    conditions: &ZoneConditions,
    backend: &dyn ComputeBackend,
) -> Result<Spectrum, NlteError> {
    let t = conditions.temperature;
    let ne = conditions.electron_density;
    let n_dens = conditions.number_density;
    let kt_ev = K_B_EV * t;
    let lambda_cubed = thermal_wavelength_cubed(t);
    let levels = atom.levels();

    let continua: Vec<Continuum<'_>> = levels
        .iter()
        .enumerate()
        .filter_map(|(j, level)| {
            let ic = level.continuum?;
            Some(Continuum {
                threshold_ev: level.ionization_energy,
                cross_section: &level.photoionization,
                lower_density: n_dens * populations[j],
                phi: n_dens * populations[ic] * level.weight() / levels[ic].weight() / 2.0
                    * lambda_cubed,
            })
        })
        .collect();

    let grid = atom.grid();
    let kernel = |i: usize| -> (f64, f64) {
        let nu = grid.center(i);
        let e = hz_to_ev(nu);
        let emis_fac = 2.0 * H * nu * nu * nu / (C * C);
        let mut opac = 0.0;
        let mut emis = 0.0;
        for c in continua.iter().filter(|c| e >= c.threshold_ev) {
            let sigma = c.cross_section.value_at_with_zero_edges(e);
            if sigma == 0.0 {
                continue;
            }
            let boltzmann = ((c.threshold_ev - e) / kt_ev).exp();
            opac += sigma * (c.lower_density - c.phi * ne * boltzmann);
            emis += emis_fac * sigma * c.phi * boltzmann;
        }
        (opac, emis)
    };

    let (extinction, emissivity) = backend.parallel_fill_pair(grid.len(), &kernel)?;
    Ok(Spectrum {
        extinction,
        emissivity,
    })
}
