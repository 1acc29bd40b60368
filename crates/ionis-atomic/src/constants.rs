//! Physical constants in CGS units.
//!
//! All rate and opacity formulae in Ionis are written in CGS (erg, cm, s, K)
//! with level energies carried in electron volts.

/// Pi.
pub const PI: f64 = std::f64::consts::PI;

/// Planck constant (erg s).
pub const H: f64 = 6.626_075_5e-27;

/// Speed of light (cm/s).
pub const C: f64 = 2.997_924_58e10;

/// Boltzmann constant (erg/K).
pub const K_B: f64 = 1.380_658e-16;

/// Electron mass (g).
pub const M_E: f64 = 9.109_389_7e-28;

/// Electron volts to ergs.
pub const EV_TO_ERG: f64 = 1.602_177_33e-12;

/// Boltzmann constant (eV/K), derived from [`K_B`] so that $E/kT$ agrees
/// whether the energy is carried in eV or as $h\nu$ in erg.
pub const K_B_EV: f64 = K_B / EV_TO_ERG;

/// Ergs to electron volts.
pub const ERG_TO_EV: f64 = 1.0 / EV_TO_ERG;

/// Ångström to centimetres.
pub const ANGSTROM_TO_CM: f64 = 1.0e-8;

/// Centimetres to Ångström.
pub const CM_TO_ANGSTROM: f64 = 1.0e8;

/// Classical line cross-section $\pi e^2 / (m_e c)$ (cm² Hz).
pub const SIGMA_CLASSICAL: f64 = 0.026_540_0;

/// Ionization energy assigned to the fully ionized sentinel stage (eV).
pub const SENTINEL_CHI_EV: f64 = 99_999.0;

/// Frequency (Hz) of a photon with energy `energy_ev`.
#[inline]
pub fn ev_to_hz(energy_ev: f64) -> f64 {
    energy_ev * EV_TO_ERG / H
}

/// Photon energy (eV) at frequency `nu` (Hz).
#[inline]
pub fn hz_to_ev(nu: f64) -> f64 {
    H * nu * ERG_TO_EV
}

/// Planck function $B_\nu(T)$ (erg s⁻¹ cm⁻² Hz⁻¹ sr⁻¹).
///
/// Uses `exp_m1` so the Rayleigh–Jeans limit stays accurate.
pub fn planck_nu(temperature: f64, nu: f64) -> f64 {
    let zeta = H * nu / (K_B * temperature);
    2.0 * H * nu * nu * nu / (C * C) / zeta.exp_m1()
}

/// Cube of the electron thermal de Broglie wavelength $\lambda_t^3$ (cm³).
pub fn thermal_wavelength_cubed(temperature: f64) -> f64 {
    (H * H / (2.0 * PI * M_E * K_B * temperature)).powf(1.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ev_hz_round_trip() {
        let nu = ev_to_hz(13.6);
        assert_relative_eq!(nu, 3.288e15, max_relative = 1e-3);
        assert_relative_eq!(hz_to_ev(nu), 13.6, max_relative = 1e-12);
    }

    #[test]
    fn test_planck_rayleigh_jeans_limit() {
        // hν << kT: B_ν → 2ν²kT/c²
        let t = 1.0e4;
        let nu = 1.0e9;
        let rj = 2.0 * nu * nu * K_B * t / (C * C);
        assert_relative_eq!(planck_nu(t, nu), rj, max_relative = 1e-4);
    }

    #[test]
    fn test_thermal_wavelength_scaling() {
        // λ_t³ ∝ T^{-3/2}
        let a = thermal_wavelength_cubed(1.0e4);
        let b = thermal_wavelength_cubed(4.0e4);
        assert_relative_eq!(a / b, 8.0, max_relative = 1e-12);
        assert_relative_eq!(a, 4.14e-22, max_relative = 1e-2);
    }

    #[test]
    fn test_boltzmann_exponent_agrees_across_units() {
        let t = 7.5e3;
        let e = 42.0;
        let from_ev = e / (K_B_EV * t);
        let from_hz = H * ev_to_hz(e) / (K_B * t);
        assert_relative_eq!(from_ev, from_hz, max_relative = 1e-14);
    }
}
