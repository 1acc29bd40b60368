//! Bound-bound (line) extinction and emissivity.
//!
//! Each line is spread over a window of the frequency grid with a Voigt
//! profile of Doppler width $\Delta\nu_D = \beta_{dop} \nu_0$ and damping
//! $a = A_{ul} / (4\pi \Delta\nu_D)$.

use ionis_atomic::constants::{C, H, PI};
use ionis_atomic::AtomicStructure;
use log::debug;
use ndarray::ArrayView1;

use super::voigt;
use crate::config::OpacitySettings;
use crate::types::{Spectrum, ZoneConditions};

/// Line spectrum on the species' frequency grid.
///
/// Lines with an empty lower level, a non-positive (inverted) extinction or
/// a peak extinction below `settings.minimum_extinction` contribute nothing.
pub fn bound_bound(
    atom: &AtomicStructure,
    populations: ArrayView1<'_, f64>,
    conditions: &ZoneConditions,
    settings: &OpacitySettings,
) -> Spectrum {
    let grid = atom.grid();
    let n_bins = grid.len();
    let n_dens = conditions.number_density;
    let levels = atom.levels();
    let mut spectrum = Spectrum::zeros(n_bins);
    let mut skipped = 0usize;

    for line in atom.lines() {
        let n_l = populations[line.lower];
        let n_u = populations[line.upper];
        let g_l = levels[line.lower].weight();
        let g_u = levels[line.upper].weight();
        let nu_0 = line.nu;

        if n_l == 0.0 {
            skipped += 1;
            continue;
        }
        let dnu = settings.doppler_beta * nu_0;
        let a = line.a_ul / (4.0 * PI * dnu);

        let alpha_0 = n_l * n_dens * g_u / g_l * line.a_ul / (8.0 * PI) * C * C
            * (1.0 - n_u * g_l / (n_l * g_u));
        if alpha_0 <= 0.0 || alpha_0 / (nu_0 * nu_0 * dnu) < settings.minimum_extinction {
            skipped += 1;
            continue;
        }

        let nu_1 = nu_0 - settings.line_window_widths * dnu;
        let nu_2 = nu_0 + settings.line_window_widths * dnu;
        if nu_2 < grid.min() || nu_1 >= grid.max() {
            continue;
        }
        // bins from the one holding nu_1 through the one holding nu_2
        let first = grid.locate(nu_1);
        let last = (grid.locate(nu_2) + 1).min(n_bins);

        let line_emis = line.a_ul * n_u * n_dens * H / (4.0 * PI);
        for j in first..last {
            let nu = grid.center(j);
            let x = (nu_0 - nu) / dnu;
            let phi = voigt::profile(x, a, dnu);
            spectrum.extinction[j] += alpha_0 / (nu * nu) * phi;
            spectrum.emissivity[j] += line_emis * nu * phi;
        }
    }

    if skipped > 0 {
        debug!("{} of {} lines skipped in bound-bound opacity", skipped, atom.n_lines());
    }
    spectrum
}
