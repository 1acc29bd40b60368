//! Voigt line profile.
//!
//! The Voigt function $H(a, x) = \mathrm{Re}\, w(x + ia)$ is evaluated via
//! the Faddeeva function $w(z) = e^{-z^2} \mathrm{erfc}(-iz)$ using Humlicek's
//! W4 rational approximation (J. Quant. Spectrosc. Radiat. Transfer 27, 437,
//! 1982), accurate to about $10^{-4}$ everywhere in the upper half plane.

use ionis_atomic::constants::PI;
use num_complex::Complex64;

/// Faddeeva function $w(z)$ for $\mathrm{Im}\, z \ge 0$.
pub fn faddeeva(z: Complex64) -> Complex64 {
    let (x, y) = (z.re, z.im);
    let t = Complex64::new(y, -x);
    let s = x.abs() + y;

    if s >= 15.0 {
        // region I: asymptotic
        t * 0.564_189_6 / (t * t + 0.5)
    } else if s >= 5.5 {
        // region II
        let u = t * t;
        t * (u * 0.564_189_6 + 1.410_474) / (u * (u + 3.0) + 0.75)
    } else if y >= 0.195 * x.abs() - 0.176 {
        // region III
        (t * (t * (t * (t * 0.564_223_6 + 3.778_987) + 11.964_82) + 20.209_33) + 16.495_5)
            / (t * (t * (t * (t * (t + 6.699_398) + 21.692_74) + 39.271_21) + 38.823_63)
                + 16.495_5)
    } else {
        // region IV
        let u = t * t;
        let num = t
            * (36_183.31
                - u * (3_321.990_5
                    - u * (1_540.787
                        - u * (219.031_3 - u * (35.766_83 - u * (1.320_522 - u * 0.564_19))))));
        let den = 32_066.6
            - u * (24_322.84
                - u * (9_022.228
                    - u * (2_186.181 - u * (364.219_1 - u * (61.570_37 - u * (1.841_439 - u))))));
        u.exp() - num / den
    }
}

/// Voigt function $H(a, x)$, normalised so that $\int H\, dx = \sqrt{\pi}$.
#[inline]
pub fn voigt_h(a: f64, x: f64) -> f64 {
    faddeeva(Complex64::new(x, a)).re
}

/// Area-normalised line profile per unit frequency, $H(a, x) / (\sqrt{\pi} \Delta\nu_D)$.
///
/// # Arguments
/// * `x` - Offset from line center in Doppler widths.
/// * `a` - Damping parameter $\Gamma / (4\pi \Delta\nu_D)$.
/// * `doppler_width` - $\Delta\nu_D$ (Hz).
#[inline]
pub fn profile(x: f64, a: f64, doppler_width: f64) -> f64 {
    voigt_h(a, x) / (PI.sqrt() * doppler_width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_center_of_pure_gaussian() {
        assert_relative_eq!(voigt_h(0.0, 0.0), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_doppler_core() {
        for x in [0.5_f64, 1.0, 1.5, 2.0] {
            assert_relative_eq!(voigt_h(1e-8, x), (-x * x).exp(), epsilon = 2e-4);
        }
    }

    #[test]
    fn test_lorentz_wings() {
        // far from center H -> a / (sqrt(pi) x^2)
        let (a, x) = (0.01, 40.0);
        assert_relative_eq!(
            voigt_h(a, x),
            a / (PI.sqrt() * x * x),
            max_relative = 1e-3
        );
    }

    #[test]
    fn test_known_value() {
        // H(1, 0) = e erfc(1) = 0.4275836
        assert_relative_eq!(voigt_h(1.0, 0.0), 0.427_583_6, epsilon = 1e-4);
    }

    #[test]
    fn test_profile_is_normalised() {
        let (a, dnu) = (0.01, 2.0e11);
        let n = 200_000;
        let half_width = 100.0;
        let dx = 2.0 * half_width / n as f64;
        let area: f64 = (0..n)
            .map(|i| {
                let x = -half_width + (i as f64 + 0.5) * dx;
                profile(x, a, dnu) * dx * dnu
            })
            .sum();
        // Lorentz tails beyond |x| = 100 hold about 2a / (pi 100)
        assert_relative_eq!(area, 1.0, epsilon = 1e-3);
    }
}
