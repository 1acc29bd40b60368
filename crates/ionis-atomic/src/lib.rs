//! # Ionis Atomic
//!
//! Atomic data tables for the Ionis NLTE solver. This crate validates raw
//! species descriptions into immutable [`AtomicStructure`]s that are shared
//! read-only by every zone solve.
//!
//! ## Contents
//!
//! | Concern | Module |
//! |---------|--------|
//! | Physical constants (CGS, eV) | [`constants`] |
//! | Photon frequency bins | [`grid`] |
//! | Ions, levels, lines | [`structure`] |
//! | Hydrogenic cross-sections | [`hydrogenic`] |
//! | Milne recombination tables | [`recombination`] |
//! | Loader seam | [`provider`] |
//!
//! Persisted atomic data formats are out of scope: loaders implement
//! [`AtomicDataProvider`] and hand over [`SpeciesSpec`]s.

pub mod constants;
pub mod grid;
pub mod hydrogenic;
pub mod provider;
pub mod recombination;
pub mod structure;
pub mod table;

pub use grid::FrequencyGrid;
pub use provider::{AtomicDataError, AtomicDataProvider, InMemoryProvider};
pub use recombination::{RecombinationTable, TemperatureGrid};
pub use structure::{
    AtomicStructure, BuildOptions, Ion, IonSpec, Level, LevelSpec, Line, LineSpec, SpeciesSpec,
};
pub use table::TabulatedCurve;
