//! Hydrogenic photoionization cross-sections.
//!
//! Used for levels that come without tabulated photoionization data. The
//! Kramers-like shape $\sigma \propto (E/E_{ion})^{-3}$ is scaled by an
//! effective principal quantum number estimated from how far the level sits
//! below its ion's ionization potential.

use crate::table::TabulatedCurve;

/// Threshold cross-section of the hydrogenic fit (cm²).
pub const SIGMA_THRESHOLD: f64 = 6.3e-18;

/// Number of energy samples per level.
pub const N_POINTS: usize = 100;

/// Upper end of the table as a multiple of the threshold energy.
pub const MAX_THRESHOLD_MULTIPLE: f64 = 10.0;

/// Hydrogenic cross-section table for a level.
///
/// # Arguments
/// * `ionization_energy` - Level threshold $\chi - E$ (eV), must be positive.
/// * `ion_chi` - Ionization potential of the level's ion (eV).
/// * `stage` - Ionization stage of the level's ion (0 = neutral).
pub fn cross_section(ionization_energy: f64, ion_chi: f64, stage: u32) -> TabulatedCurve {
    let n_eff = (ion_chi / ionization_energy).sqrt();
    let z = f64::from(stage + 1);
    let scale = n_eff / (z * z);

    let de = (MAX_THRESHOLD_MULTIPLE - 1.0) * ionization_energy / N_POINTS as f64;
    TabulatedCurve::sample(ionization_energy, de, N_POINTS, |e| {
        SIGMA_THRESHOLD * scale * (e / ionization_energy).powi(-3)
    })
}
