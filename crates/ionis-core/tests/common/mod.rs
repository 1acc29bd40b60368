//! Toy species shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use ionis_atomic::{AtomicStructure, FrequencyGrid, IonSpec, LevelSpec, LineSpec, SpeciesSpec};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn grid() -> Arc<FrequencyGrid> {
    Arc::new(FrequencyGrid::logarithmic(1.0e13, 1.0e17, 400).unwrap())
}

/// One level in the neutral stage (χ = 10 eV) and the bare ion above it.
pub fn single_level_species() -> Arc<AtomicStructure> {
    let spec = SpeciesSpec {
        atomic_number: 1,
        ions: vec![IonSpec {
            stage: 0,
            chi: 10.0,
            ground: 0,
        }],
        levels: vec![LevelSpec::new(0, 2, 0.0)],
        lines: vec![],
    };
    Arc::new(AtomicStructure::build(&spec.with_continuum_stage(), grid()).unwrap())
}

/// Ground and a g = 3 level 1 eV above it joined by one line, χ = 30 eV,
/// plus the bare ion.
pub fn line_species() -> Arc<AtomicStructure> {
    let spec = SpeciesSpec {
        atomic_number: 1,
        ions: vec![IonSpec {
            stage: 0,
            chi: 30.0,
            ground: 0,
        }],
        levels: vec![LevelSpec::new(0, 1, 0.0), LevelSpec::new(0, 3, 1.0)],
        lines: vec![LineSpec {
            lower: 0,
            upper: 1,
            a_ul: 1.0e6,
        }],
    };
    Arc::new(AtomicStructure::build(&spec.with_continuum_stage(), grid()).unwrap())
}
