//! Radiative recombination coefficients.
//!
//! The spontaneous recombination coefficient $\alpha(T)$ of a level follows
//! from its photoionization cross-section through the Milne relation. Written
//! in frequency space it reduces to
//!
//! $$\alpha(T) = \frac{g_l}{g_c}\left(\frac{h}{m_e c}\right)^2
//!   \frac{4}{\sqrt{\pi}}\, v_{MB}^{-3}\, \frac{h}{m_e}
//!   \int \sigma(\nu)\,\nu^2 e^{-h(\nu-\nu_t)/kT}\, d\nu$$
//!
//! with $v_{MB} = \sqrt{2kT/m_e}$. The integral is a trapezoid sum over the
//! cross-section knots, the same nodes the photoionization rate integrates
//! over, so the two rates balance in a Planck field.
//!
//! Coefficients are tabulated on a logarithmic temperature grid when the
//! structure is built and interpolated in log-log space at solve time.

use crate::constants::{ev_to_hz, C, H, K_B, M_E, PI};
use crate::provider::AtomicDataError;
use crate::table::TabulatedCurve;

/// Temperature grid for recombination tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureGrid {
    /// Lowest tabulated temperature (K).
    pub t_min: f64,
    /// Highest tabulated temperature (K).
    pub t_max: f64,
    /// Knots per decade of temperature.
    pub points_per_decade: usize,
}

impl Default for TemperatureGrid {
    fn default() -> Self {
        Self {
            t_min: 1.0e3,
            t_max: 1.0e6,
            points_per_decade: 100,
        }
    }
}

impl TemperatureGrid {
    /// Temperatures of every knot.
    pub fn temperatures(&self) -> Vec<f64> {
        let decades = (self.t_max / self.t_min).log10();
        let n = ((decades * self.points_per_decade as f64).ceil() as usize).max(1);
        let step = (self.t_max / self.t_min).ln() / n as f64;
        (0..=n).map(|i| self.t_min * (step * i as f64).exp()).collect()
    }
}

/// Recombination coefficient $\alpha(T)$ (cm³ s⁻¹) tabulated in temperature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecombinationTable {
    /// Knots in ln T.
    curve: TabulatedCurve,
    /// True when `curve` holds ln α rather than α.
    logarithmic: bool,
}

impl RecombinationTable {
    /// A table that evaluates to zero (levels with no continuum).
    pub fn zero() -> Self {
        Self::default()
    }

    /// Build from `(T, α)` pairs.
    pub fn from_samples(
        temperatures: &[f64],
        coefficients: &[f64],
    ) -> Result<Self, AtomicDataError> {
        if temperatures.iter().any(|&t| !(t > 0.0)) {
            return Err(AtomicDataError::InvalidValue(
                "recombination table temperatures must be positive".into(),
            ));
        }
        if coefficients.iter().any(|&a| !(a >= 0.0) || !a.is_finite()) {
            return Err(AtomicDataError::InvalidValue(
                "recombination coefficients must be finite and non-negative".into(),
            ));
        }
        let ln_t: Vec<f64> = temperatures.iter().map(|t| t.ln()).collect();
        let logarithmic = !coefficients.is_empty() && coefficients.iter().all(|&a| a > 0.0);
        let ys = if logarithmic {
            coefficients.iter().map(|a| a.ln()).collect()
        } else {
            coefficients.to_vec()
        };
        Ok(Self {
            curve: TabulatedCurve::new(ln_t, ys)?,
            logarithmic,
        })
    }

    /// Tabulate the Milne coefficient of a level on `grid`.
    pub fn from_milne(
        cross_section: &TabulatedCurve,
        threshold_ev: f64,
        weight_ratio: f64,
        grid: &TemperatureGrid,
    ) -> Result<Self, AtomicDataError> {
        let temperatures = grid.temperatures();
        let coefficients: Vec<f64> = temperatures
            .iter()
            .map(|&t| milne_coefficient(cross_section, threshold_ev, weight_ratio, t))
            .collect();
        Self::from_samples(&temperatures, &coefficients)
    }

    pub fn is_empty(&self) -> bool {
        self.curve.is_empty()
    }

    /// $\alpha(T)$, held constant beyond the tabulated range.
    pub fn rate_at(&self, temperature: f64) -> f64 {
        if self.curve.is_empty() {
            return 0.0;
        }
        let y = self.curve.value_at(temperature.ln());
        if self.logarithmic {
            y.exp()
        } else {
            y.max(0.0)
        }
    }
}

/// Milne recombination coefficient at one temperature.
///
/// # Arguments
/// * `cross_section` - Photoionization cross-section over photon energy (eV, cm²).
/// * `threshold_ev` - Ionization threshold of the level (eV).
/// * `weight_ratio` - $g_l / g_c$.
/// * `temperature` - Electron temperature (K).
pub fn milne_coefficient(
    cross_section: &TabulatedCurve,
    threshold_ev: f64,
    weight_ratio: f64,
    temperature: f64,
) -> f64 {
    if cross_section.len() < 2 {
        return 0.0;
    }
    let nu_t = ev_to_hz(threshold_ev);
    let h_over_kt = H / (K_B * temperature);

    let mut integral = 0.0;
    let mut prev: Option<(f64, f64)> = None;
    for (e, sigma) in cross_section.points() {
        let nu = ev_to_hz(e);
        let f = sigma * nu * nu * (-(nu - nu_t) * h_over_kt).exp();
        if let Some((nu_0, f_0)) = prev {
            integral += 0.5 * (f + f_0) * (nu - nu_0);
        }
        prev = Some((nu, f));
    }

    let v_mb = (2.0 * K_B * temperature / M_E).sqrt();
    let milne = (H / (M_E * C)).powi(2);
    weight_ratio * milne * 4.0 / PI.sqrt() / v_mb.powi(3) * (H / M_E) * integral
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydrogenic;
    use approx::assert_relative_eq;

    #[test]
    fn test_hydrogen_ground_state_magnitude() {
        // Case-A recombination to the hydrogen ground state is ~1.6e-13 cm³/s
        // at 10^4 K; the Kramers-shaped fit lands within a factor of two.
        let cs = hydrogenic::cross_section(13.6, 13.6, 0);
        let alpha = milne_coefficient(&cs, 13.6, 2.0, 1.0e4);
        assert!(alpha > 0.8e-13 && alpha < 3.2e-13, "alpha = {:e}", alpha);
    }

    #[test]
    fn test_coefficient_falls_with_temperature() {
        let cs = hydrogenic::cross_section(13.6, 13.6, 0);
        let cold = milne_coefficient(&cs, 13.6, 1.0, 5.0e3);
        let hot = milne_coefficient(&cs, 13.6, 1.0, 5.0e4);
        assert!(cold > hot);
    }

    #[test]
    fn test_table_reproduces_knots_and_interpolates() {
        let cs = hydrogenic::cross_section(10.0, 10.0, 0);
        let grid = TemperatureGrid::default();
        let table = RecombinationTable::from_milne(&cs, 10.0, 1.0, &grid).unwrap();
        for &t in &[2.0e3, 1.0e4, 3.3e4, 2.0e5] {
            let exact = milne_coefficient(&cs, 10.0, 1.0, t);
            assert_relative_eq!(table.rate_at(t), exact, max_relative = 1e-3);
        }
        // clamped outside the grid
        assert_relative_eq!(table.rate_at(10.0), table.rate_at(1.0e3), max_relative = 1e-12);
    }

    #[test]
    fn test_zero_table() {
        assert_eq!(RecombinationTable::zero().rate_at(1.0e4), 0.0);
    }
}
