use std::sync::atomic::AtomicUsize;
use std::thread;
use std::time::Duration;

use proptest::prelude::*;
use tessera_config::{
    ConstructionHeuristicConfig, ConstructionHeuristicType, LocalSearchConfig,
    PartitionedSearchConfig, PhaseConfig, SolverConfig, TerminationConfig,
};
use tessera_core::{SimpleScore, TesseraError};
use tessera_scoring::{IncrementalScoreDirector, IncrementalScoreDirectorFactory, ScoreDirectorFactory};
use tessera_test::nqueens::{self, NQueens, NQueensCalculator};
use tessera_test::task::{self, TaskCalculator, TaskPlan};

use super::*;
use crate::phase::basic::BasicVariable;
use crate::phase::construction::ConstructionHeuristicPhase;
use crate::phase::localsearch::{HillClimbingAcceptor, LateAcceptanceAcceptor, LocalSearchPhase};
use crate::phase::partitioned::{FunctionalPartitioner, PartitionedSearchPhaseBuilder};
use crate::phase::BasicVariablePhaseBuilder;
use crate::registry::StrategyRegistry;
use crate::termination::{StepCountTermination, TimeTermination};

type QueensDirector = IncrementalScoreDirector<NQueens, NQueensCalculator>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn row_variable() -> BasicVariable<NQueens> {
    BasicVariable::new(
        "row",
        nqueens::queen_count,
        nqueens::row_count,
        nqueens::get_row,
        nqueens::set_row,
    )
}

fn queens_director(board: NQueens) -> QueensDirector {
    IncrementalScoreDirectorFactory::new(NQueensCalculator::default)
        .with_assertion_score_fn(nqueens::conflicts)
        .build_score_director(board)
}

fn construction() -> Box<dyn Phase<NQueens, QueensDirector>> {
    Box::new(ConstructionHeuristicPhase::new(
        row_variable(),
        ConstructionHeuristicType::FirstFit,
    ))
}

fn unbounded_local_search() -> Box<dyn Phase<NQueens, QueensDirector>> {
    Box::new(LocalSearchPhase::new(
        row_variable(),
        Box::new(LateAcceptanceAcceptor::new(10)),
        1,
    ))
}

/// Fails on its first run.
#[derive(Debug, Default)]
struct FailingPhase {
    runs: AtomicUsize,
}

impl Phase<NQueens, QueensDirector> for FailingPhase {
    fn solve(&mut self, _: &mut SolverScope<NQueens, QueensDirector>) -> Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Err(TesseraError::InvalidState("board is locked".to_string()))
    }

    fn phase_type_name(&self) -> &'static str {
        "Failing"
    }
}

#[test]
fn test_solve_runs_phases_in_order() {
    init_tracing();
    let mut solver = Solver::new(vec![construction(), unbounded_local_search()])
        .with_termination(Box::new(StepCountTermination::new(40)))
        .with_random_seed(5);

    let solved = solver.solve(queens_director(NQueens::uninitialized(6))).unwrap();

    assert!(solved.is_initialized());
    assert_eq!(solved.score(), Some(nqueens::conflicts(&solved)));
    assert!(!solver.is_solving());
}

#[test]
fn test_solver_termination_skips_remaining_phases() {
    let mut solver = Solver::new(vec![construction(), unbounded_local_search()])
        .with_termination(Box::new(StepCountTermination::new(0)));

    let solved = solver.solve(queens_director(NQueens::uninitialized(4))).unwrap();

    assert_eq!(solved.rows(), vec![None; 4]);
}

#[test]
fn test_termination_is_kept_across_solves() {
    let mut solver = Solver::new(vec![construction(), unbounded_local_search()])
        .with_termination(Box::new(StepCountTermination::new(10)));

    solver.solve(queens_director(NQueens::uninitialized(4))).unwrap();
    let second = solver.solve(queens_director(NQueens::uninitialized(4))).unwrap();

    assert!(second.is_initialized());
}

#[test]
fn test_terminate_early_without_solve_is_ignored() {
    let solver = Solver::new(vec![construction()]);

    assert!(!solver.terminate_early());
    assert!(!solver.handle().is_terminate_early());
}

#[test]
fn test_handle_stops_unbounded_local_search() {
    let mut solver = Solver::new(vec![construction(), unbounded_local_search()]).with_random_seed(3);
    let handle = solver.handle();

    let stopper = thread::spawn(move || {
        while !handle.is_solving() {
            thread::sleep(Duration::from_millis(1));
        }
        thread::sleep(Duration::from_millis(50));
        handle.terminate_early()
    });
    let solved = solver.solve(queens_director(NQueens::uninitialized(8))).unwrap();

    assert!(stopper.join().unwrap());
    assert!(solved.is_initialized());
    assert!(!solver.is_solving());
}

#[test]
fn test_time_termination_stops_local_search() {
    let mut solver = Solver::new(vec![construction(), unbounded_local_search()])
        .with_termination(Box::new(TimeTermination::millis(50)));

    let solved = solver.solve(queens_director(NQueens::uninitialized(8))).unwrap();

    assert!(solved.is_initialized());
}

#[test]
fn test_phase_error_stops_solving() {
    let failing: Box<dyn Phase<NQueens, QueensDirector>> = Box::new(FailingPhase::default());
    let mut solver = Solver::new(vec![construction(), failing, unbounded_local_search()]);

    let err = solver
        .solve(queens_director(NQueens::uninitialized(4)))
        .unwrap_err();

    assert!(matches!(err, TesseraError::InvalidState(_)));
    assert!(!solver.is_solving());
}

#[test]
fn test_with_config_applies_solver_settings() {
    let config = SolverConfig::from_toml_str(
        r#"
        environment_mode = "full_assert"
        random_seed = 21

        [termination]
        step_count_limit = 15
        "#,
    )
    .unwrap();
    let run = || {
        let mut solver = Solver::new(vec![construction(), unbounded_local_search()])
            .with_config(&config)
            .unwrap();
        solver.solve(queens_director(NQueens::uninitialized(5))).unwrap()
    };

    let first = run();
    assert_eq!(first.rows(), run().rows());
}

#[test]
fn test_with_config_rejects_bad_best_score_limit() {
    let mut config = SolverConfig::new();
    config.termination = Some(TerminationConfig {
        best_score_limit: Some("zero".to_string()),
        ..TerminationConfig::default()
    });

    let err = Solver::new(vec![construction()]).with_config(&config).unwrap_err();

    assert!(matches!(err, TesseraError::Config(_)));
}

#[test]
fn test_partitioned_search_solves_whole_plan() {
    init_tracing();
    type TaskDirector = IncrementalScoreDirector<TaskPlan, TaskCalculator>;

    let mut registry = StrategyRegistry::<TaskPlan>::new();
    registry.register_partitioner("by_group", |_| {
        Ok(Box::new(FunctionalPartitioner::new(
            task::partition_by_group,
            task::merge_groups,
        )))
    });
    let factory = Arc::new(
        IncrementalScoreDirectorFactory::new(TaskCalculator::default)
            .with_assertion_score_fn(task::score),
    );
    let nested = vec![
        PhaseConfig::ConstructionHeuristic(ConstructionHeuristicConfig::default()),
        PhaseConfig::LocalSearch(LocalSearchConfig {
            termination: Some(TerminationConfig::default().with_step_count_limit(40)),
            ..LocalSearchConfig::default()
        }),
    ];
    let partitioned: Box<dyn Phase<TaskPlan, TaskDirector>> = Box::new(
        PartitionedSearchPhaseBuilder::new(
            PartitionedSearchConfig::default()
                .with_solution_partitioner("by_group")
                .with_runnable_part_thread_limit("UNLIMITED")
                .with_phases(nested),
            &registry,
            Arc::clone(&factory),
            Arc::new(BasicVariablePhaseBuilder::new(BasicVariable::new(
                "machine",
                task::task_count,
                task::machine_count,
                task::get_machine,
                task::set_machine,
            ))),
        )
        .build()
        .unwrap(),
    );
    let polish: Box<dyn Phase<TaskPlan, TaskDirector>> = Box::new(
        LocalSearchPhase::new(
            BasicVariable::new(
                "machine",
                task::task_count,
                task::machine_count,
                task::get_machine,
                task::set_machine,
            ),
            Box::new(HillClimbingAcceptor),
            1,
        )
        .with_termination(Box::new(StepCountTermination::new(20))),
    );
    let mut solver = Solver::new(vec![partitioned, polish]).with_random_seed(9);

    let solved = solver
        .solve(factory.build_score_director(TaskPlan::generate(3, 3, 3)))
        .unwrap();

    assert!(solved.is_initialized());
    assert_eq!(solved.score(), Some(task::score(&solved)));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_best_score_matches_recalculation(seed in any::<u64>(), n in 1usize..8) {
        let mut solver = Solver::new(vec![construction(), unbounded_local_search()])
            .with_termination(Box::new(StepCountTermination::new(25)))
            .with_random_seed(seed);

        let solved = solver.solve(queens_director(NQueens::uninitialized(n))).unwrap();

        prop_assert!(solved.is_initialized());
        prop_assert_eq!(solved.score(), Some(nqueens::conflicts(&solved)));
        prop_assert!(solved.score().unwrap() <= SimpleScore::ZERO);
    }
}
