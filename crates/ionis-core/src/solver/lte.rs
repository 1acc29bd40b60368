//! Saha-Boltzmann (LTE) populations.
//!
//! Within an ion, levels follow Boltzmann statistics,
//! $n_i \propto g_i e^{-E_i/kT}$, normalised by the partition function
//! $Z = \sum g_i e^{-E_i/kT}$. Successive ions follow the Saha equation
//!
//! $$\frac{x_{k+1}}{x_k} = \frac{Z_{k+1}}{Z_k} \frac{2}{n_e \lambda_t^3}
//!   e^{-\chi_k / kT}$$
//!
//! with $\lambda_t$ the electron thermal de Broglie wavelength. The chain is
//! accumulated in log space so that extreme temperatures and densities
//! neither overflow nor underflow before normalisation.

use ionis_atomic::constants::{thermal_wavelength_cubed, K_B_EV};
use ionis_atomic::AtomicStructure;

use crate::types::ZoneConditions;
use crate::workspace::NlteWorkspace;

/// Electron densities below this leave the species entirely in its lowest stage.
pub const MIN_ELECTRON_DENSITY: f64 = 1e-50;

/// Fill partition functions, ion fractions and LTE level populations.
///
/// Populations are fractional (they sum to one over the species); departure
/// coefficients are reset to one.
pub fn solve_lte(atom: &AtomicStructure, ws: &mut NlteWorkspace, conditions: &ZoneConditions) {
    let kt_ev = K_B_EV * conditions.temperature;

    ws.partition.fill(0.0);
    for level in atom.levels() {
        ws.partition[level.ion] += level.weight() * (-level.energy / kt_ev).exp();
    }

    saha_fractions(atom, ws, conditions);

    for (i, level) in atom.levels().iter().enumerate() {
        let boltzmann = level.weight() * (-level.energy / kt_ev).exp();
        let n = ws.ion_fraction[level.ion] * boltzmann / ws.partition[level.ion];
        ws.lte_population[i] = n;
        ws.population[i] = n;
        ws.departure[i] = 1.0;
    }
}

fn saha_fractions(atom: &AtomicStructure, ws: &mut NlteWorkspace, conditions: &ZoneConditions) {
    let n_ions = atom.n_ions();
    ws.ion_fraction.fill(0.0);
    if conditions.electron_density < MIN_ELECTRON_DENSITY {
        ws.ion_fraction[0] = 1.0;
        return;
    }

    let kt_ev = K_B_EV * conditions.temperature;
    let lambda_cubed = thermal_wavelength_cubed(conditions.temperature);
    let ln_fac = (2.0 / (conditions.electron_density * lambda_cubed)).ln();

    // ln x_k relative to x_0
    let ions = atom.ions();
    let mut ln_x = 0.0;
    let mut ln_max = 0.0_f64;
    for k in 1..n_ions {
        ln_x += ln_fac - ions[k - 1].chi / kt_ev + (ws.partition[k] / ws.partition[k - 1]).ln();
        ws.ion_fraction[k] = ln_x;
        ln_max = ln_max.max(ln_x);
    }

    let mut norm = 0.0;
    for k in 0..n_ions {
        let x = (ws.ion_fraction[k] - ln_max).exp();
        ws.ion_fraction[k] = x;
        norm += x;
    }
    ws.ion_fraction.mapv_inplace(|x| x / norm);
}
