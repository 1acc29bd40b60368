//! Sobolev optical depths and escape probabilities.
//!
//! In homologous expansion the Sobolev optical depth of a line is
//!
//! $$\tau = n_l\, n\, \sigma_{cl} f_{lu}\, t\, \lambda
//!   \left(1 - \frac{n_u g_l}{n_l g_u}\right)$$
//!
//! and a line photon escapes its resonance region with probability
//! $\beta = (1 - e^{-\tau}) / \tau$.

use ionis_atomic::constants::SIGMA_CLASSICAL;
use ionis_atomic::AtomicStructure;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::types::ZoneConditions;
use crate::workspace::NlteWorkspace;

/// Which branch produced an escape probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscapeRegime {
    Normal,
    /// Lower level population below the smallest normal double.
    EmptyLower,
    /// $n_u g_l > n_l g_u$.
    Inverted,
}

/// Sobolev quantities of one line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SobolevEscape {
    pub tau: f64,
    pub exp_tau: f64,
    pub beta: f64,
    pub regime: EscapeRegime,
}

impl SobolevEscape {
    fn transparent(regime: EscapeRegime) -> Self {
        Self {
            tau: 0.0,
            exp_tau: 1.0,
            beta: 1.0,
            regime,
        }
    }
}

/// $(1 - e^{-\tau}) / \tau$, accurate for small $\tau$ and equal to one at zero.
pub fn escape_probability(tau: f64) -> f64 {
    if tau > 0.0 {
        -(-tau).exp_m1() / tau
    } else {
        1.0
    }
}

/// Sobolev depth and escape probability of line `line` at `populations`.
///
/// # Arguments
/// * `atom` - Species the line belongs to.
/// * `line` - Index of the line.
/// * `populations` - Fractional level populations.
/// * `number_density` - Species number density (cm⁻³).
/// * `time` - Time since explosion (s).
pub fn line_escape(
    atom: &AtomicStructure,
    line: usize,
    populations: ArrayView1<'_, f64>,
    number_density: f64,
    time: f64,
) -> SobolevEscape {
    let line = &atom.lines()[line];
    let n_l = populations[line.lower];
    let n_u = populations[line.upper];
    let g_l = atom.levels()[line.lower].weight();
    let g_u = atom.levels()[line.upper].weight();

    if n_l < f64::MIN_POSITIVE {
        return SobolevEscape::transparent(EscapeRegime::EmptyLower);
    }
    if n_u * g_l > n_l * g_u {
        return SobolevEscape::transparent(EscapeRegime::Inverted);
    }

    let stimulated = 1.0 - n_u * g_l / (n_l * g_u);
    let tau = n_l * number_density * SIGMA_CLASSICAL * line.f_lu * time * line.wavelength_cm()
        * stimulated;
    SobolevEscape {
        tau,
        exp_tau: (-tau).exp(),
        beta: escape_probability(tau),
        regime: EscapeRegime::Normal,
    }
}

/// Recompute τ, e^{-τ} and β of every line from the workspace populations.
///
/// Inverted and empty-lower lines of this update replace the lists in the
/// workspace diagnostics; the running counts keep growing until the next solve.
pub fn update_escape(atom: &AtomicStructure, ws: &mut NlteWorkspace, conditions: &ZoneConditions) {
    ws.diagnostics.inverted_lines.clear();
    ws.diagnostics.empty_lower_lines.clear();
    for l in 0..atom.n_lines() {
        let escape = line_escape(
            atom,
            l,
            ws.population.view(),
            conditions.number_density,
            conditions.time,
        );
        ws.line_tau[l] = escape.tau;
        ws.line_exp_tau[l] = escape.exp_tau;
        ws.line_beta[l] = escape.beta;
        match escape.regime {
            EscapeRegime::Normal => {}
            EscapeRegime::EmptyLower => {
                ws.diagnostics.empty_lower_lines.push(l);
                ws.diagnostics.empty_lower_count += 1;
            }
            EscapeRegime::Inverted => {
                ws.diagnostics.inverted_lines.push(l);
                ws.diagnostics.inversion_count += 1;
            }
        }
    }
}
