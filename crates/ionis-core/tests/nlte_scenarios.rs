//! End-to-end population solves on toy species.

mod common;

use std::sync::Arc;

use approx::assert_relative_eq;
use common::{init_logging, line_species, single_level_species};
use ionis_core::config::{LineField, RateChannels};
use ionis_core::sobolev::{self, EscapeRegime};
use ionis_core::{
    ConvergenceStatus, IonisConfig, NlteError, NlteSolver, OpacityEvaluator, SolverSettings,
    ZoneConditions,
};

fn feedback_off() -> SolverSettings {
    SolverSettings {
        escape_feedback: false,
        ..SolverSettings::default()
    }
}

#[test]
fn test_single_level_ions_stay_in_lte() {
    init_logging();
    let solver = NlteSolver::with_settings(single_level_species(), feedback_off()).unwrap();
    let mut ws = solver.workspace();
    let cond = ZoneConditions::new(1.0e4, 1.0e8, 1.0e6, 1.0e6);

    let solution = solver.solve_nlte(&mut ws, &cond).unwrap();
    assert_eq!(solution.status, ConvergenceStatus::SinglePass);
    assert_eq!(solution.iterations, 1);
    for &b in solution.departure.iter() {
        assert_relative_eq!(b, 1.0, max_relative = 1e-10);
    }
    assert_relative_eq!(solution.ion_fractions.sum(), 1.0, epsilon = 1e-10);
}

#[test]
fn test_escape_feedback_iterates_to_convergence() {
    init_logging();
    let settings = SolverSettings {
        line_dilution: 0.01,
        ..SolverSettings::default()
    };
    let solver = NlteSolver::with_settings(line_species(), settings).unwrap();
    let mut ws = solver.workspace();
    let cond = ZoneConditions::new(1.0e4, 1.0e8, 1.0e6, 1.0e6);

    let lte = solver.solve_lte(&mut ws, &cond).unwrap();
    let nlte = solver.solve_nlte(&mut ws, &cond).unwrap();

    assert_eq!(nlte.status, ConvergenceStatus::Converged);
    assert!(nlte.iterations > 1 && nlte.iterations < 100);

    // the diluted field drains the upper level, deepening the line
    assert!(nlte.populations[0] > lte.populations[0]);
    assert!(nlte.line_tau[0] > lte.line_tau[0]);
    let change = (lte.line_beta[0] - nlte.line_beta[0]).abs() / nlte.line_beta[0];
    assert!(change > 0.1, "relative escape change {}", change);
    assert!(nlte.diagnostics.max_beta_change <= 0.1);
}

#[test]
fn test_only_a_met_criterion_counts_as_converged() {
    init_logging();
    let cond = ZoneConditions::new(1.0e4, 1.0e8, 1.0e6, 1.0e6);
    let diluted = SolverSettings {
        line_dilution: 0.01,
        ..SolverSettings::default()
    };

    let solver = NlteSolver::with_settings(line_species(), diluted.clone()).unwrap();
    let mut ws = solver.workspace();
    let lte = solver.solve_lte(&mut ws, &cond).unwrap();
    assert_eq!(lte.status, ConvergenceStatus::Lte);
    assert!(!lte.is_converged());
    assert!(lte.is_usable());

    let converged = solver.solve_nlte(&mut ws, &cond).unwrap();
    assert!(converged.is_converged());
    assert!(converged.is_usable());

    let single = NlteSolver::with_settings(line_species(), feedback_off()).unwrap();
    let mut ws = single.workspace();
    let solution = single.solve_nlte(&mut ws, &cond).unwrap();
    assert_eq!(solution.status, ConvergenceStatus::SinglePass);
    assert!(!solution.is_converged());
    assert!(solution.is_usable());

    let capped = SolverSettings {
        max_iterations: 1,
        ..diluted
    };
    let capped = NlteSolver::with_settings(line_species(), capped).unwrap();
    let mut ws = capped.workspace();
    let solution = capped.solve_nlte(&mut ws, &cond).unwrap();
    assert_eq!(solution.status, ConvergenceStatus::MaxIterationsExceeded);
    assert!(!solution.is_converged());
    assert!(!solution.is_usable());
}

#[test]
fn test_forced_inversion_is_flagged_not_fatal() {
    init_logging();
    let solver = NlteSolver::new(line_species());
    let atom = Arc::clone(solver.atom());
    let mut ws = solver.workspace();
    let cond = ZoneConditions::new(1.0e4, 1.0e8, 1.0e6, 1.0e6);
    solver.solve_lte(&mut ws, &cond).unwrap();

    // g_l = 1, g_u = 3: inverted once n_u > 3 n_l
    let inverted = [0.1, 0.5, 0.4];
    ws.set_level_populations(&atom, &inverted).unwrap();
    sobolev::update_escape(&atom, &mut ws, &cond);

    assert_eq!(ws.line_tau()[0], 0.0);
    assert_eq!(ws.line_beta()[0], 1.0);
    assert_eq!(ws.diagnostics().inverted_lines, vec![0]);

    let escape = sobolev::line_escape(&atom, 0, ws.populations(), 1.0e6, 1.0e6);
    assert_eq!(escape.regime, EscapeRegime::Inverted);

    let evaluator = OpacityEvaluator::default();
    let spectrum = evaluator.evaluate(&atom, ws.populations(), &cond).unwrap();
    let bound_bound = ionis_core::opacity::bound_bound::bound_bound(
        &atom,
        ws.populations(),
        &cond,
        evaluator.settings(),
    );
    assert!(bound_bound.extinction.iter().all(|&k| k == 0.0));
    assert!(spectrum.extinction.iter().all(|k| k.is_finite()));
}

#[test]
fn test_collisional_channels_reproduce_lte() {
    let settings = SolverSettings {
        escape_feedback: false,
        channels: RateChannels::collisional_only(),
        ..SolverSettings::default()
    };
    let solver = NlteSolver::with_settings(line_species(), settings).unwrap();
    let mut ws = solver.workspace();
    for t in [1.0e4, 2.0e4, 3.0e4] {
        let cond = ZoneConditions::new(t, 1.0e12, 1.0e6, 1.0e6);
        let lte = solver.solve_lte(&mut ws, &cond).unwrap();
        let nlte = solver.solve_nlte(&mut ws, &cond).unwrap();
        for &b in nlte.departure.iter() {
            assert_relative_eq!(b, 1.0, max_relative = 1e-10);
        }
        for (n, n_lte) in nlte.populations.iter().zip(lte.populations.iter()) {
            assert_relative_eq!(*n, *n_lte, max_relative = 1e-10);
        }
    }
}

#[test]
fn test_ion_fractions_sum_to_one() {
    let solver = NlteSolver::new(line_species());
    let mut ws = solver.workspace();
    for (t, ne) in [(6.0e3, 1.0e7), (1.5e4, 1.0e9), (4.0e4, 1.0e6)] {
        let cond = ZoneConditions::new(t, ne, 1.0e6, 1.0e6);
        let solution = solver.solve_nlte(&mut ws, &cond).unwrap();
        assert_relative_eq!(solution.ion_fractions.sum(), 1.0, epsilon = 1e-8);
        assert!(solution.populations.iter().all(|&n| n >= 0.0));
        let mean = solution.mean_ionization();
        assert!((0.0..=1.0).contains(&mean));
    }
}

#[test]
fn test_ionization_rises_with_temperature() {
    let solver = NlteSolver::with_settings(single_level_species(), feedback_off()).unwrap();
    let mut ws = solver.workspace();
    let cool = solver
        .solve_nlte(&mut ws, &ZoneConditions::new(6.0e3, 1.0e8, 1.0e6, 1.0e6))
        .unwrap();
    let hot = solver
        .solve_nlte(&mut ws, &ZoneConditions::new(2.0e4, 1.0e8, 1.0e6, 1.0e6))
        .unwrap();
    assert!(hot.mean_ionization() > cool.mean_ionization());
}

#[test]
fn test_external_line_field_is_kept() {
    let settings = SolverSettings {
        escape_feedback: false,
        line_field: LineField::External,
        ..SolverSettings::default()
    };
    let solver = NlteSolver::with_settings(line_species(), settings).unwrap();
    let mut ws = solver.workspace();
    let cond = ZoneConditions::new(1.0e4, 1.0e8, 1.0e6, 1.0e6);

    ws.set_line_field(&[0.0]).unwrap();
    let dark = solver.solve_nlte(&mut ws, &cond).unwrap();
    assert_eq!(ws.line_j()[0], 0.0);

    ws.set_line_field(&[1.0e-3]).unwrap();
    let lit = solver.solve_nlte(&mut ws, &cond).unwrap();
    assert!(lit.populations[1] > dark.populations[1]);
}

#[test]
fn test_invalid_conditions_are_rejected() {
    let solver = NlteSolver::new(line_species());
    let mut ws = solver.workspace();
    let bad = ZoneConditions::new(-1.0, 1.0e8, 1.0e6, 1.0e6);
    assert!(matches!(
        solver.solve_nlte(&mut ws, &bad),
        Err(NlteError::InvalidConditions(_))
    ));
}

#[test]
fn test_workspace_for_another_species_is_rejected() {
    let solver = NlteSolver::new(line_species());
    let mut ws = NlteSolver::new(single_level_species()).workspace();
    let cond = ZoneConditions::new(1.0e4, 1.0e8, 1.0e6, 1.0e6);
    assert!(matches!(
        solver.solve_nlte(&mut ws, &cond),
        Err(NlteError::WorkspaceMismatch(_))
    ));
}

#[test]
fn test_settings_from_config_drive_the_solver() {
    let config = IonisConfig::from_toml_str(
        r#"
        [solver]
        escape_feedback = false
        line_dilution = 0.5

        [opacity]
        doppler_beta = 3.0e-5
        "#,
    )
    .unwrap();
    let solver = NlteSolver::with_settings(line_species(), config.solver).unwrap();
    let mut ws = solver.workspace();
    let cond = ZoneConditions::new(1.0e4, 1.0e8, 1.0e6, 1.0e6);
    let solution = solver.solve_nlte(&mut ws, &cond).unwrap();
    assert_eq!(solution.status, ConvergenceStatus::SinglePass);

    let table = solution.to_string();
    assert!(table.contains("SinglePass"));
    assert!(table.contains("departure"));
}
