//! Piecewise-linear tabulated curves.
//!
//! Photoionization cross-sections are tabulated over photon energy and
//! recombination coefficients over temperature. Both are sampled far more
//! often than they are built, so lookups use a binary search on the knots.

use crate::provider::AtomicDataError;

/// A real-valued curve sampled at strictly increasing abscissae.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabulatedCurve {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl TabulatedCurve {
    /// Construct from sample points.
    ///
    /// An empty curve is allowed (it evaluates to zero everywhere); otherwise
    /// `xs` must be strictly increasing and match `ys` in length.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self, AtomicDataError> {
        if xs.len() != ys.len() {
            return Err(AtomicDataError::InvalidValue(format!(
                "tabulated curve has {} abscissae but {} ordinates",
                xs.len(),
                ys.len()
            )));
        }
        if let Some(i) = (1..xs.len()).find(|&i| !(xs[i] > xs[i - 1])) {
            return Err(AtomicDataError::InvalidValue(format!(
                "tabulated abscissae must be strictly increasing (index {})",
                i
            )));
        }
        Ok(Self { xs, ys })
    }

    /// Sample `f` at `n_points` evenly spaced abscissae starting at `x_min`
    /// with spacing `dx`.
    pub fn sample(x_min: f64, dx: f64, n_points: usize, f: impl Fn(f64) -> f64) -> Self {
        let xs: Vec<f64> = (0..n_points).map(|i| x_min + dx * i as f64).collect();
        let ys = xs.iter().map(|&x| f(x)).collect();
        Self { xs, ys }
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// Iterate over `(x, y)` knots.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }

    /// Linear interpolation, holding the end values outside the table.
    pub fn value_at(&self, x: f64) -> f64 {
        match self.xs.len() {
            0 => 0.0,
            1 => self.ys[0],
            n => {
                if x <= self.xs[0] {
                    self.ys[0]
                } else if x >= self.xs[n - 1] {
                    self.ys[n - 1]
                } else {
                    self.interpolate(x)
                }
            }
        }
    }

    /// Linear interpolation, zero outside the tabulated range.
    pub fn value_at_with_zero_edges(&self, x: f64) -> f64 {
        match self.xs.len() {
            0 => 0.0,
            1 => {
                if x == self.xs[0] {
                    self.ys[0]
                } else {
                    0.0
                }
            }
            n => {
                if x < self.xs[0] || x > self.xs[n - 1] {
                    0.0
                } else if x == self.xs[n - 1] {
                    self.ys[n - 1]
                } else {
                    self.interpolate(x)
                }
            }
        }
    }

    /// Interior interpolation; requires `xs[0] <= x < xs[n-1]`.
    fn interpolate(&self, x: f64) -> f64 {
        let hi = self.xs.partition_point(|&xi| xi <= x).max(1);
        let lo = hi - 1;
        let t = (x - self.xs[lo]) / (self.xs[hi] - self.xs[lo]);
        self.ys[lo] + t * (self.ys[hi] - self.ys[lo])
    }
}
