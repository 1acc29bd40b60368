//! Frequency grid shared by line and continuum calculations.
//!
//! The grid is a monotonically increasing set of bin edges. Bin `i` covers
//! $[\nu_i, \nu_{i+1})$ and is represented by its center. The transport layer
//! owns the grid; the solver only reads it, so it is shared behind an `Arc`.

use crate::provider::AtomicDataError;

/// Ordered frequency bins (Hz).
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyGrid {
    edges: Vec<f64>,
    centers: Vec<f64>,
}

impl FrequencyGrid {
    /// Build a grid from explicit bin edges.
    ///
    /// Requires at least two edges, all finite and strictly increasing.
    pub fn from_edges(edges: Vec<f64>) -> Result<Self, AtomicDataError> {
        if edges.len() < 2 {
            return Err(AtomicDataError::NonMonotonicGrid(
                "a frequency grid needs at least two edges".into(),
            ));
        }
        for (i, pair) in edges.windows(2).enumerate() {
            if !(pair[1] > pair[0]) || !pair[0].is_finite() || !pair[1].is_finite() {
                return Err(AtomicDataError::NonMonotonicGrid(format!(
                    "edge {} ({:e}) is not above edge {} ({:e})",
                    i + 1,
                    pair[1],
                    i,
                    pair[0]
                )));
            }
        }
        let centers = edges.windows(2).map(|p| 0.5 * (p[0] + p[1])).collect();
        Ok(Self { edges, centers })
    }

    /// `n_bins` equal-width bins between `nu_min` and `nu_max`.
    pub fn uniform(nu_min: f64, nu_max: f64, n_bins: usize) -> Result<Self, AtomicDataError> {
        let n = n_bins.max(1);
        let step = (nu_max - nu_min) / n as f64;
        Self::from_edges((0..=n).map(|i| nu_min + step * i as f64).collect())
    }

    /// `n_bins` logarithmically spaced bins between `nu_min` and `nu_max`.
    pub fn logarithmic(nu_min: f64, nu_max: f64, n_bins: usize) -> Result<Self, AtomicDataError> {
        if !(nu_min > 0.0) {
            return Err(AtomicDataError::NonMonotonicGrid(format!(
                "logarithmic grid needs a positive lower edge, got {:e}",
                nu_min
            )));
        }
        let n = n_bins.max(1);
        let ratio = (nu_max / nu_min).ln() / n as f64;
        Self::from_edges((0..=n).map(|i| nu_min * (ratio * i as f64).exp()).collect())
    }

    /// Number of bins.
    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// Bin edges (length `len() + 1`).
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Bin centers (length `len()`).
    pub fn centers(&self) -> &[f64] {
        &self.centers
    }

    /// Center frequency of bin `i`.
    pub fn center(&self, i: usize) -> f64 {
        self.centers[i]
    }

    /// Lowest edge.
    pub fn min(&self) -> f64 {
        self.edges[0]
    }

    /// Highest edge.
    pub fn max(&self) -> f64 {
        self.edges[self.edges.len() - 1]
    }

    /// Index of the bin holding `nu`.
    ///
    /// Returns 0 below the grid and `len()` at or above the upper edge, so the
    /// result can be used directly as a half-open range bound.
    pub fn locate(&self, nu: f64) -> usize {
        // number of edges <= nu, minus one
        let above = self.edges.partition_point(|&e| e <= nu);
        above.saturating_sub(1).min(self.len())
    }

    /// Like [`locate`](Self::locate) but clamped to a valid bin index.
    pub fn locate_within_bounds(&self, nu: f64) -> usize {
        self.locate(nu).min(self.len() - 1)
    }
}
