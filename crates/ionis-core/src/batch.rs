//! Parallel solves over many zones.
//!
//! Zones share nothing mutable: the atomic structure is read through an
//! `Arc` and each Rayon worker owns one [`NlteWorkspace`], allocated on
//! first use and reset by every solve.

use rayon::prelude::*;

use crate::opacity::OpacityEvaluator;
use crate::solver::{NlteError, NlteSolver};
use crate::types::{Spectrum, ZoneConditions, ZoneSolution};

/// Solve every zone, in parallel, in input order.
///
/// A failing zone does not stop the others; its slot holds the error.
pub fn solve_zones(
    solver: &NlteSolver,
    zones: &[ZoneConditions],
) -> Vec<Result<ZoneSolution, NlteError>> {
    zones
        .par_iter()
        .map_init(
            || solver.workspace(),
            |ws, conditions| solver.solve_nlte(ws, conditions),
        )
        .collect()
}

/// Solve every zone and evaluate its spectrum.
pub fn solve_zone_spectra(
    solver: &NlteSolver,
    evaluator: &OpacityEvaluator,
    zones: &[ZoneConditions],
) -> Vec<Result<(ZoneSolution, Spectrum), NlteError>> {
    zones
        .par_iter()
        .map_init(
            || solver.workspace(),
            |ws, conditions| {
                let solution = solver.solve_nlte(ws, conditions)?;
                let spectrum = evaluator.evaluate(solver.atom(), ws.populations(), conditions)?;
                Ok((solution, spectrum))
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::two_stage_species;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    #[test]
    fn test_batch_matches_sequential() {
        let solver = NlteSolver::new(Arc::new(two_stage_species()));
        let zones: Vec<ZoneConditions> = (0..16)
            .map(|i| ZoneConditions::new(6.0e3 + 1.0e3 * i as f64, 1e8, 1e6, 1e6))
            .collect();

        let batch = solve_zones(&solver, &zones);
        let mut ws = solver.workspace();
        for (zone, result) in zones.iter().zip(&batch) {
            let expected = solver.solve_nlte(&mut ws, zone).unwrap();
            let got = result.as_ref().unwrap();
            assert_eq!(got.iterations, expected.iterations);
            for (a, b) in got.populations.iter().zip(expected.populations.iter()) {
                assert_relative_eq!(*a, *b, max_relative = 1e-12);
            }
        }
    }

    #[test]
    fn test_bad_zone_does_not_poison_batch() {
        let solver = NlteSolver::new(Arc::new(two_stage_species()));
        let zones = [
            ZoneConditions::new(1.0e4, 1e8, 1e6, 1e6),
            ZoneConditions::new(-1.0, 1e8, 1e6, 1e6),
            ZoneConditions::new(1.2e4, 1e8, 1e6, 1e6),
        ];
        let results = solve_zones(&solver, &zones);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(NlteError::InvalidConditions(_))));
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_spectra_follow_solutions() {
        let solver = NlteSolver::new(Arc::new(two_stage_species()));
        let evaluator = OpacityEvaluator::default();
        let zones = [ZoneConditions::new(1.0e4, 1e8, 1e6, 1e6)];
        let results = solve_zone_spectra(&solver, &evaluator, &zones);
        let (solution, spectrum) = results[0].as_ref().unwrap();
        let direct = evaluator.evaluate_solution(solver.atom(), solution).unwrap();
        assert_eq!(spectrum, &direct);
    }
}
