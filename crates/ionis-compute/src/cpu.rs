//! CPU compute backend using Rayon for shared-memory parallelism.

use ndarray::Array1;
use rayon::prelude::*;

use crate::backend::{BackendType, ComputeBackend, ComputeError, DeviceInfo};

/// CPU backend that parallelises work across threads via Rayon.
#[derive(Debug, Clone)]
pub struct CpuBackend {
    num_threads: usize,
}

impl CpuBackend {
    /// Create a new CPU backend using all available threads.
    pub fn new() -> Self {
        Self {
            num_threads: rayon::current_num_threads(),
        }
    }

    /// Create a CPU backend with a specified thread count.
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads: num_threads.max(1),
        }
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Minimum number of indices handed to one task.
    fn min_chunk(&self, len: usize) -> usize {
        (len / (4 * self.num_threads)).max(1)
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeBackend for CpuBackend {
    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: format!("CPU ({} threads)", self.num_threads),
            backend_type: BackendType::Cpu,
            compute_units: Some(self.num_threads),
        }
    }

    fn parallel_fill_pair(
        &self,
        len: usize,
        fill_fn: &(dyn Fn(usize) -> (f64, f64) + Send + Sync),
    ) -> Result<(Array1<f64>, Array1<f64>), ComputeError> {
        let (a, b): (Vec<f64>, Vec<f64>) = (0..len)
            .into_par_iter()
            .with_min_len(self.min_chunk(len))
            .map(fill_fn)
            .unzip();
        if a.len() != len || b.len() != len {
            return Err(ComputeError::DeviceError(format!(
                "parallel fill produced {} / {} values for {} bins",
                a.len(),
                b.len(),
                len
            )));
        }
        Ok((Array1::from_vec(a), Array1::from_vec(b)))
    }
}
