//! Atomic data provider trait.
//!
//! Persisted atomic data formats live outside Ionis. Anything that can hand
//! over a [`SpeciesSpec`] per atomic number implements
//! [`AtomicDataProvider`] and gets validated [`AtomicStructure`]s back.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::grid::FrequencyGrid;
use crate::structure::{AtomicStructure, BuildOptions, SpeciesSpec};

/// Errors raised while validating or assembling atomic data.
///
/// These are configuration errors: they abort before any solve is attempted.
#[derive(Debug, Error)]
pub enum AtomicDataError {
    #[error("{kind} index {index} out of range (have {len})")]
    InvalidIndex {
        kind: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Invalid atomic data: {0}")]
    InvalidValue(String),

    #[error("Species has no {0}")]
    EmptySpecies(&'static str),

    #[error("Invalid frequency grid: {0}")]
    NonMonotonicGrid(String),

    #[error("No atomic data for Z = {0}")]
    MissingSpecies(u32),
}

/// Supplies validated atomic structure for a species.
pub trait AtomicDataProvider: Send + Sync {
    /// Human-readable name of the data source.
    fn name(&self) -> &str;

    /// Atomic numbers this provider has data for.
    fn available_species(&self) -> Vec<u32>;

    /// Build the structure for species `atomic_number` on `grid`.
    fn species(
        &self,
        atomic_number: u32,
        grid: &Arc<FrequencyGrid>,
    ) -> Result<AtomicStructure, AtomicDataError>;
}

/// Provider backed by species specifications held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    name: String,
    species: BTreeMap<u32, SpeciesSpec>,
    options: BuildOptions,
}

impl InMemoryProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            species: BTreeMap::new(),
            options: BuildOptions::default(),
        }
    }

    /// Use non-default build options for every species.
    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Register (or replace) a species keyed by its atomic number.
    pub fn insert(&mut self, spec: SpeciesSpec) {
        self.species.insert(spec.atomic_number, spec);
    }
}

impl AtomicDataProvider for InMemoryProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn available_species(&self) -> Vec<u32> {
        self.species.keys().copied().collect()
    }

    fn species(
        &self,
        atomic_number: u32,
        grid: &Arc<FrequencyGrid>,
    ) -> Result<AtomicStructure, AtomicDataError> {
        let spec = self
            .species
            .get(&atomic_number)
            .ok_or(AtomicDataError::MissingSpecies(atomic_number))?;
        AtomicStructure::build_with(spec, Arc::clone(grid), &self.options)
    }
}
