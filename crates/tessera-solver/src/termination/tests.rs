use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tessera_config::{TerminationCompositionStyle, TerminationConfig};
use tessera_core::{HardSoftScore, SimpleScore, TesseraError};

use super::*;

fn progress_with_best(score: i64) -> Progress<SimpleScore> {
    Progress {
        best_score: Some(SimpleScore::of(score)),
        ..Progress::default()
    }
}

#[test]
fn test_step_count_termination() {
    let term = StepCountTermination::new(3);
    let mut progress = Progress::<SimpleScore>::default();

    assert!(!term.is_terminated(&progress));
    progress.step_count = 2;
    assert!(!term.is_terminated(&progress));
    progress.step_count = 3;
    assert!(term.is_terminated(&progress));
}

#[test]
fn test_time_termination() {
    let term = TimeTermination::millis(50);
    let mut progress = Progress::<SimpleScore>::default();

    assert!(!term.is_terminated(&progress));
    progress.elapsed = Duration::from_millis(50);
    assert!(term.is_terminated(&progress));
}

#[test]
fn test_best_score_termination() {
    let term = BestScoreTermination::new(SimpleScore::of(0));

    assert!(!term.is_terminated(&Progress::default()));
    assert!(!term.is_terminated(&progress_with_best(-5)));
    assert!(term.is_terminated(&progress_with_best(0)));
    assert!(term.is_terminated(&progress_with_best(5)));
}

#[test]
fn test_best_score_feasible_termination() {
    let term = BestScoreFeasibleTermination;
    let infeasible = Progress {
        best_score: Some(HardSoftScore::of(-1, 10)),
        ..Progress::default()
    };
    let feasible = Progress {
        best_score: Some(HardSoftScore::of(0, -100)),
        ..Progress::default()
    };

    assert!(!term.is_terminated(&infeasible));
    assert!(term.is_terminated(&feasible));
}

#[test]
fn test_unimproved_terminations() {
    let steps = UnimprovedStepCountTermination::new(5);
    let time = UnimprovedTimeTermination::new(Duration::from_millis(20));
    let mut progress = Progress::<SimpleScore> {
        step_count: 100,
        unimproved_step_count: 4,
        ..Progress::default()
    };

    assert!(!steps.is_terminated(&progress));
    assert!(!time.is_terminated(&progress));

    progress.unimproved_step_count = 5;
    progress.unimproved_elapsed = Duration::from_millis(25);
    assert!(steps.is_terminated(&progress));
    assert!(time.is_terminated(&progress));
}

#[test]
fn test_external_termination() {
    let flag = Arc::new(AtomicBool::new(false));
    let term = ExternalTermination::new(Arc::clone(&flag));
    let progress = Progress::<SimpleScore>::default();

    assert!(!term.is_terminated(&progress));
    flag.store(true, Ordering::SeqCst);
    assert!(term.is_terminated(&progress));
}

#[test]
fn test_or_and_termination() {
    let build = |limit_a: u64, limit_b: u64| -> Vec<Box<dyn Termination<SimpleScore>>> {
        vec![
            Box::new(StepCountTermination::new(limit_a)),
            Box::new(StepCountTermination::new(limit_b)),
        ]
    };
    let or = OrTermination::new(build(3, 10));
    let and = AndTermination::new(build(3, 10));
    let progress = Progress {
        step_count: 5,
        ..Progress::default()
    };

    assert!(or.is_terminated(&progress));
    assert!(!and.is_terminated(&progress));
    assert!(!AndTermination::<SimpleScore>::new(Vec::new()).is_terminated(&progress));
    assert!(!OrTermination::<SimpleScore>::new(Vec::new()).is_terminated(&progress));
}

#[test]
fn test_build_empty_config() {
    let termination = build_termination::<SimpleScore>(&TerminationConfig::default()).unwrap();
    assert!(termination.is_none());
}

#[test]
fn test_build_or_composition() {
    let config = TerminationConfig {
        best_score_limit: Some("0".to_string()),
        step_count_limit: Some(10),
        ..TerminationConfig::default()
    };
    let termination = build_termination::<SimpleScore>(&config).unwrap().unwrap();

    assert!(termination.is_terminated(&progress_with_best(0)));
    assert!(termination.is_terminated(&Progress {
        step_count: 10,
        ..Progress::default()
    }));
    assert!(!termination.is_terminated(&progress_with_best(-1)));
}

#[test]
fn test_build_and_composition() {
    let config = TerminationConfig {
        termination_composition_style: Some(TerminationCompositionStyle::And),
        best_score_feasible: Some(true),
        step_count_limit: Some(10),
        ..TerminationConfig::default()
    };
    let termination = build_termination::<HardSoftScore>(&config).unwrap().unwrap();

    let feasible_early = Progress {
        step_count: 2,
        best_score: Some(HardSoftScore::of(0, -3)),
        ..Progress::default()
    };
    let feasible_late = Progress {
        step_count: 10,
        ..feasible_early
    };
    assert!(!termination.is_terminated(&feasible_early));
    assert!(termination.is_terminated(&feasible_late));
}

#[test]
fn test_build_time_limit_sums_units() {
    let config = TerminationConfig {
        milliseconds_spent_limit: Some(500),
        seconds_spent_limit: Some(1),
        ..TerminationConfig::default()
    };
    let termination = build_termination::<SimpleScore>(&config).unwrap().unwrap();

    let mut progress = Progress::default();
    progress.elapsed = Duration::from_millis(1_499);
    assert!(!termination.is_terminated(&progress));
    progress.elapsed = Duration::from_millis(1_500);
    assert!(termination.is_terminated(&progress));
}

#[test]
fn test_build_rejects_unparseable_score_limit() {
    let config = TerminationConfig {
        best_score_limit: Some("lots".to_string()),
        ..TerminationConfig::default()
    };
    let err = build_termination::<HardSoftScore>(&config).unwrap_err();
    assert!(matches!(err, TesseraError::Config(msg) if msg.contains("best_score_limit")));
}
