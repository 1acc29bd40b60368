//! Toy species shared by the unit tests.

use std::sync::Arc;

use ionis_atomic::{AtomicStructure, FrequencyGrid, IonSpec, LevelSpec, LineSpec, SpeciesSpec};

pub(crate) fn grid() -> Arc<FrequencyGrid> {
    Arc::new(FrequencyGrid::logarithmic(1.0e13, 1.0e17, 400).unwrap())
}

/// Neutral stage (χ = 30 eV) with a ground level, one excited level at
/// 1 eV and a single line between them, plus the bare continuum stage.
pub(crate) fn two_stage_species() -> AtomicStructure {
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
    AtomicStructure::build(&spec.with_continuum_stage(), grid()).unwrap()
}

/// Three hydrogen-like levels (n = 1, 2, 3) with all three lines.
pub(crate) fn hydrogen_like() -> AtomicStructure {
    let spec = SpeciesSpec {
        atomic_number: 1,
        ions: vec![IonSpec {
            stage: 0,
            chi: 13.6,
            ground: 0,
        }],
        levels: vec![
            LevelSpec::new(0, 2, 0.0),
            LevelSpec::new(0, 8, 10.2),
            LevelSpec::new(0, 18, 12.09),
        ],
        lines: vec![
            LineSpec {
                lower: 0,
                upper: 1,
                a_ul: 4.699e8,
            },
            LineSpec {
                lower: 0,
                upper: 2,
                a_ul: 5.575e7,
            },
            LineSpec {
                lower: 1,
                upper: 2,
                a_ul: 4.410e7,
            },
        ],
    };
    AtomicStructure::build(&spec.with_continuum_stage(), grid()).unwrap()
}
