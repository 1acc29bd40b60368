//! Rate matrix assembly.
//!
//! `rates[[i, j]]` is the rate (s⁻¹) of transitions from level i to level j,
//! summed over four channels:
//!
//! - radiative bound-bound (spontaneous and stimulated emission, absorption),
//!   optionally scaled by the Sobolev escape probability;
//! - non-thermal excitation out of the species ground level;
//! - collisional bound-bound (van Regemorter-type fit, same ion only);
//! - bound-free: collisional ionization and three-body recombination,
//!   photoionization and radiative recombination.
//!
//! Each row is finally weighted by the LTE population of its level, so the
//! linear system is solved for departure coefficients.

use ionis_atomic::constants::{
    ev_to_hz, planck_nu, thermal_wavelength_cubed, C, EV_TO_ERG, H, K_B, K_B_EV, PI,
};
use ionis_atomic::{AtomicStructure, Level, TabulatedCurve};

use crate::config::{LineField, SolverSettings};
use crate::types::ZoneConditions;
use crate::workspace::NlteWorkspace;

/// Collisional de-excitation fit coefficient.
const C_BB: f64 = 2.16;
/// Collisional ionization fit coefficient.
const C_ION: f64 = 2.7;

/// Set the mean intensity of every line from the settings.
///
/// With [`LineField::DilutePlanck`] each line sees $W_l B_\nu(T)$ at its rest
/// frequency; with [`LineField::External`] the workspace values are kept.
pub fn fill_line_field(
    atom: &AtomicStructure,
    settings: &SolverSettings,
    ws: &mut NlteWorkspace,
    conditions: &ZoneConditions,
) {
    if settings.line_field == LineField::External {
        return;
    }
    for (l, line) in atom.lines().iter().enumerate() {
        ws.line_j[l] = settings.line_dilution * planck_nu(conditions.temperature, line.nu);
    }
}

/// Fill `ws.rates` for the current populations, line field and escape
/// probabilities.
pub fn build_rates(
    atom: &AtomicStructure,
    settings: &SolverSettings,
    ws: &mut NlteWorkspace,
    conditions: &ZoneConditions,
) {
    ws.rates.fill(0.0);
    let channels = settings.channels;

    if channels.radiative_bound_bound {
        radiative_bound_bound(atom, settings, ws);
    }
    if channels.nonthermal_bound_bound && conditions.e_gamma > 0.0 {
        nonthermal_bound_bound(atom, ws, conditions);
    }
    if channels.collisional_bound_bound {
        collisional_bound_bound(atom, ws, conditions.temperature);
    }
    bound_free(atom, settings, ws, conditions);

    for (i, mut row) in ws.rates.rows_mut().into_iter().enumerate() {
        let n_lte = ws.lte_population[i];
        row.mapv_inplace(|r| r * n_lte);
    }
}

fn radiative_bound_bound(atom: &AtomicStructure, settings: &SolverSettings, ws: &mut NlteWorkspace) {
    for (l, line) in atom.lines().iter().enumerate() {
        let j = ws.line_j[l];
        let mut r_ul = line.a_ul + line.b_ul * j;
        let mut r_lu = line.b_lu * j;
        if settings.escape_feedback {
            r_ul *= ws.line_beta[l];
            r_lu *= ws.line_beta[l];
        }
        ws.rates[[line.lower, line.upper]] += r_lu;
        ws.rates[[line.upper, line.lower]] += r_ul;
    }
}

/// Every line out of the species ground level gets $e_\gamma / (n \Delta E)$,
/// independent of its oscillator strength.
fn nonthermal_bound_bound(atom: &AtomicStructure, ws: &mut NlteWorkspace, conditions: &ZoneConditions) {
    let ground = atom.ground_level();
    let levels = atom.levels();
    for line in atom.lines().iter().filter(|line| line.lower == ground) {
        let de = (levels[line.upper].energy - levels[line.lower].energy) * EV_TO_ERG;
        ws.rates[[line.lower, line.upper]] += conditions.e_gamma / (conditions.number_density * de);
    }
}

fn collisional_bound_bound(atom: &AtomicStructure, ws: &mut NlteWorkspace, temperature: f64) {
    let kt_ev = K_B_EV * temperature;
    let t_m15 = temperature.powf(-1.5);
    let levels = atom.levels();
    for (i, from) in levels.iter().enumerate() {
        for (j, to) in levels.iter().enumerate() {
            if i == j || from.ion != to.ion {
                continue;
            }
            let de = from.energy - to.energy;
            if de == 0.0 {
                continue;
            }
            let zeta = de.abs() / kt_ev;
            let mut c = C_BB * zeta.powf(-1.68) * t_m15;
            if de < 0.0 {
                // upward: detailed balance with the downward rate
                c *= to.weight() / from.weight() * (-zeta).exp();
            }
            ws.rates[[i, j]] += c;
        }
    }
}

fn bound_free(
    atom: &AtomicStructure,
    settings: &SolverSettings,
    ws: &mut NlteWorkspace,
    conditions: &ZoneConditions,
) {
    let channels = settings.channels;
    let t = conditions.temperature;
    let ne = conditions.electron_density;
    let kt_ev = K_B_EV * t;
    let t_m15 = t.powf(-1.5);
    // three-body recombination as the detailed-balance partner of the
    // ionization fit, with the same λ_t³ the Saha populations use
    let three_body = C_ION * t_m15 * thermal_wavelength_cubed(t) / 2.0;
    let levels = atom.levels();

    for (i, level) in levels.iter().enumerate() {
        let Some(ic) = level.continuum else {
            continue;
        };
        let zeta = level.ionization_energy / kt_ev;

        if channels.collisional_bound_free {
            let c_ion = C_ION / (zeta * zeta) * t_m15 * (-zeta).exp() * ne;
            let c_rec =
                three_body / (zeta * zeta) * level.weight() / levels[ic].weight() * ne * ne;
            ws.rates[[i, ic]] += c_ion;
            ws.rates[[ic, i]] += c_rec;
        }

        if channels.radiative_bound_free {
            ws.rates[[ic, i]] += radiative_recombination_rate(level, settings, t, ne);
            ws.rates[[i, ic]] += photoionization_rate(
                &level.photoionization,
                t,
                settings.continuum_dilution,
            );
        }
    }
}

fn radiative_recombination_rate(level: &Level, settings: &SolverSettings, t: f64, ne: f64) -> f64 {
    if settings.suppress_ground_recombination && level.energy == 0.0 {
        return 0.0;
    }
    ne * level.recombination.rate_at(t)
}

/// Photoionization rate (s⁻¹) in a diluted Planck continuum.
///
/// Integrates $4\pi \sigma J_\nu / (h\nu) (1 - e^{-h\nu/kT})$ with
/// $J_\nu = W B_\nu(T)$ by the trapezoid rule over the cross-section knots.
/// The stimulated-recombination factor cancels the Planck denominator, leaving
/// $8\pi W \sigma \nu^2 e^{-h\nu/kT} / c^2$.
pub fn photoionization_rate(cross_section: &TabulatedCurve, temperature: f64, dilution: f64) -> f64 {
    let h_over_kt = H / (K_B * temperature);
    let mut integral = 0.0;
    let mut prev: Option<(f64, f64)> = None;
    for (e, sigma) in cross_section.points() {
        let nu = ev_to_hz(e);
        let f = sigma * nu * nu * (-nu * h_over_kt).exp();
        if let Some((nu_0, f_0)) = prev {
            integral += 0.5 * (f + f_0) * (nu - nu_0);
        }
        prev = Some((nu, f));
    }
    8.0 * PI * dilution / (C * C) * integral
}
