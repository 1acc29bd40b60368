//! Compute backend trait and device abstraction.
//!
//! The [`ComputeBackend`] trait abstracts over execution strategies so that
//! the spectral kernels in `ionis-core` stay device-agnostic. Kernels are
//! expressed as a per-bin closure; the backend decides how the bins are
//! scheduled.

use ndarray::Array1;
use thiserror::Error;

/// Errors originating from compute backends.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Backend not available: {0}")]
    Unavailable(String),

    #[error("Device error: {0}")]
    DeviceError(String),
}

/// Describes the capabilities of a compute backend.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub backend_type: BackendType,
    pub compute_units: Option<usize>,
}

/// The type of compute backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    Serial,
    Cpu,
}

/// Abstraction over compute backends.
///
/// A kernel fills one pair of values (extinction and emissivity) per
/// frequency bin, and bins are independent of each other.
pub trait ComputeBackend: Send + Sync {
    /// Return information about the device.
    fn device_info(&self) -> DeviceInfo;

    /// Evaluate `fill_fn` for every index in `0..len`, keeping index order.
    fn parallel_fill_pair(
        &self,
        len: usize,
        fill_fn: &(dyn Fn(usize) -> (f64, f64) + Send + Sync),
    ) -> Result<(Array1<f64>, Array1<f64>), ComputeError>;
}

/// Single-threaded backend. Always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialBackend;

impl ComputeBackend for SerialBackend {
    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: "Serial".into(),
            backend_type: BackendType::Serial,
            compute_units: Some(1),
        }
    }

    fn parallel_fill_pair(
        &self,
        len: usize,
        fill_fn: &(dyn Fn(usize) -> (f64, f64) + Send + Sync),
    ) -> Result<(Array1<f64>, Array1<f64>), ComputeError> {
        let (a, b): (Vec<f64>, Vec<f64>) = (0..len).map(fill_fn).unzip();
        Ok((Array1::from_vec(a), Array1::from_vec(b)))
    }
}
