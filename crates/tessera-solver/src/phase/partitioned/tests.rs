use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel;
use tessera_config::{
    ConstructionHeuristicConfig, EnvironmentMode, LocalSearchConfig, PartitionedSearchConfig,
    PhaseConfig, TerminationConfig,
};
use tessera_core::{HardSoftScore, PlanningSolution, Score, TesseraError};
use tessera_scoring::{IncrementalScoreDirector, IncrementalScoreDirectorFactory, ScoreDirectorFactory};
use tessera_test::task::{self, TaskCalculator, TaskPlan};

use super::*;
use crate::phase::basic::BasicVariable;
use crate::phase::BasicVariablePhaseBuilder;
use crate::registry::StrategyRegistry;
use crate::termination::StepCountTermination;

type TaskFactory = IncrementalScoreDirectorFactory<TaskPlan, TaskCalculator>;
type TaskDirector = IncrementalScoreDirector<TaskPlan, TaskCalculator>;

fn machine_variable() -> BasicVariable<TaskPlan> {
    BasicVariable::new(
        "machine",
        task::task_count,
        task::machine_count,
        task::get_machine,
        task::set_machine,
    )
}

fn factory() -> Arc<TaskFactory> {
    Arc::new(
        IncrementalScoreDirectorFactory::new(TaskCalculator::default)
            .with_assertion_score_fn(task::score),
    )
}

fn phase_builder() -> Arc<BasicVariablePhaseBuilder<TaskPlan>> {
    Arc::new(BasicVariablePhaseBuilder::new(machine_variable()).with_move_sample_size(16))
}

fn bounded_phases(local_search_steps: u64) -> Vec<PhaseConfig> {
    vec![
        PhaseConfig::ConstructionHeuristic(ConstructionHeuristicConfig::default()),
        PhaseConfig::LocalSearch(LocalSearchConfig {
            termination: Some(TerminationConfig::default().with_step_count_limit(local_search_steps)),
            ..LocalSearchConfig::default()
        }),
    ]
}

/// Registry with `by_group`, plus `counting` which records how many parts
/// each merge receives.
fn registry(merged_parts: Arc<AtomicUsize>) -> StrategyRegistry<TaskPlan> {
    let mut registry = StrategyRegistry::new();
    registry
        .register_partitioner("by_group", |_| {
            Ok(Box::new(FunctionalPartitioner::new(
                task::partition_by_group,
                task::merge_groups,
            )))
        })
        .register_partitioner("counting", move |_| {
            let merged_parts = Arc::clone(&merged_parts);
            Ok(Box::new(FunctionalPartitioner::new(
                task::partition_by_group,
                move |original: &TaskPlan, parts: Vec<TaskPlan>| {
                    merged_parts.store(parts.len(), Ordering::SeqCst);
                    task::merge_groups(original, parts)
                },
            )))
        })
        .register_partitioner("empty", |_| {
            Ok(Box::new(FunctionalPartitioner::new(
                |_: &TaskPlan, _| Vec::new(),
                task::merge_groups,
            )))
        })
        .register_partitioner("per_group", |_| {
            Ok(Box::new(FunctionalPartitioner::new(
                |plan: &TaskPlan, _| task::partition_by_group(plan, None),
                task::merge_groups,
            )))
        })
        .register_partitioner("panicking_partition", |_| {
            Ok(Box::new(FunctionalPartitioner::new(
                |_: &TaskPlan, _| -> Vec<TaskPlan> { panic!("group index out of range") },
                task::merge_groups,
            )))
        })
        .register_partitioner("panicking_merge", |_| {
            Ok(Box::new(FunctionalPartitioner::new(
                task::partition_by_group,
                |_: &TaskPlan, _: Vec<TaskPlan>| -> TaskPlan { panic!("duplicate task id") },
            )))
        })
        .register_partitioner("broken", |_| Ok(Box::new(BrokenPartitioner)))
        .register_thread_factory("worker", Arc::new(DefaultThreadFactory::new("Worker")));
    registry
}

fn config(partitioner: &str) -> PartitionedSearchConfig {
    PartitionedSearchConfig::default()
        .with_solution_partitioner(partitioner)
        .with_phases(bounded_phases(30))
}

type TaskPartitionedPhase =
    PartitionedSearchPhase<TaskPlan, TaskFactory, BasicVariablePhaseBuilder<TaskPlan>>;

fn build(config: PartitionedSearchConfig) -> Result<TaskPartitionedPhase> {
    let registry = registry(Arc::new(AtomicUsize::new(0)));
    PartitionedSearchPhaseBuilder::new(config, &registry, factory(), phase_builder())
        .with_available_processors(4)
        .build()
}

fn solver_scope(plan: TaskPlan) -> SolverScope<TaskPlan, TaskDirector> {
    let mut scope = SolverScope::with_seed(factory().build_score_director(plan), 42);
    scope.start_solving();
    scope
}

#[derive(Debug)]
struct BrokenPartitioner;

impl SolutionPartitioner<TaskPlan> for BrokenPartitioner {
    fn partition(&self, _: &TaskPlan, _: Option<usize>) -> Result<Vec<TaskPlan>> {
        Err(TesseraError::Internal("no groups to split on".to_string()))
    }

    fn merge(&self, original: &TaskPlan, _: Vec<TaskPlan>) -> TaskPlan {
        original.clone()
    }
}

/// Nested phase that only runs `action`.
#[derive(Debug)]
struct ScriptedPhase {
    action: fn() -> Result<()>,
}

impl Phase<TaskPlan, TaskDirector> for ScriptedPhase {
    fn solve(&mut self, _: &mut SolverScope<TaskPlan, TaskDirector>) -> Result<()> {
        (self.action)()
    }

    fn phase_type_name(&self) -> &'static str {
        "Scripted"
    }
}

struct ScriptedPhaseBuilder(fn() -> Result<()>);

impl PartPhaseBuilder<TaskPlan, TaskDirector> for ScriptedPhaseBuilder {
    fn build_part_phases(
        &self,
        _: &[PhaseConfig],
    ) -> Result<Vec<Box<dyn Phase<TaskPlan, TaskDirector>>>> {
        Ok(vec![Box::new(ScriptedPhase { action: self.0 })])
    }
}

fn run_scripted(
    config: PartitionedSearchConfig,
    action: fn() -> Result<()>,
) -> (Result<()>, PartitionedSearchState) {
    let registry = registry(Arc::new(AtomicUsize::new(0)));
    let mut phase = PartitionedSearchPhaseBuilder::new(
        config,
        &registry,
        factory(),
        Arc::new(ScriptedPhaseBuilder(action)),
    )
    .with_available_processors(4)
    .build()
    .unwrap();
    let mut scope = solver_scope(TaskPlan::generate(3, 2, 2));
    let result = phase.solve(&mut scope);
    (result, phase.state())
}

#[test]
fn test_solves_every_partition_and_merges() {
    let merged_parts = Arc::new(AtomicUsize::new(0));
    let registry = registry(Arc::clone(&merged_parts));
    let mut phase = PartitionedSearchPhaseBuilder::new(
        config("counting").with_runnable_part_thread_limit("UNLIMITED"),
        &registry,
        factory(),
        phase_builder(),
    )
    .build()
    .unwrap();
    let mut scope = solver_scope(TaskPlan::generate(3, 4, 2));

    phase.solve(&mut scope).unwrap();

    assert_eq!(phase.state(), PartitionedSearchState::Done);
    assert_eq!(merged_parts.load(Ordering::SeqCst), 3);
    assert!(phase.created_thread_count() >= 1);
    assert!(phase.created_thread_count() <= 3);
    let best = scope.best_solution().unwrap();
    assert!(best.is_initialized());
    assert_eq!(scope.best_score(), Some(task::score(best)));
    assert_eq!(scope.total_step_count(), 1);
}

#[test]
fn test_merged_score_is_sum_of_part_scores() {
    let mut phase = build(config("by_group")).unwrap();
    let mut scope = solver_scope(TaskPlan::generate(4, 3, 3));

    phase.solve(&mut scope).unwrap();

    let best = scope.best_solution().unwrap().clone();
    let summed = HardSoftScore::accumulate(
        task::partition_by_group(&best, None).iter().map(task::score),
    );
    assert_eq!(scope.best_score(), Some(summed));
    assert_eq!(scope.calculate_score(), summed);
}

#[test]
fn test_partition_count_is_passed_as_hint() {
    let merged_parts = Arc::new(AtomicUsize::new(0));
    let registry = registry(Arc::clone(&merged_parts));
    let mut phase = PartitionedSearchPhaseBuilder::new(
        config("counting").with_partition_count(2),
        &registry,
        factory(),
        phase_builder(),
    )
    .with_available_processors(16)
    .build()
    .unwrap();
    let mut scope = solver_scope(TaskPlan::generate(5, 2, 2));

    phase.solve(&mut scope).unwrap();

    assert_eq!(merged_parts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_runnable_limit_is_hint_without_partition_count() {
    let merged_parts = Arc::new(AtomicUsize::new(0));
    let registry = registry(Arc::clone(&merged_parts));
    // AUTO on 4 processors resolves to 2.
    let mut phase = PartitionedSearchPhaseBuilder::new(
        config("counting"),
        &registry,
        factory(),
        phase_builder(),
    )
    .with_available_processors(4)
    .build()
    .unwrap();
    assert_eq!(phase.runnable_part_thread_limit(), Some(2));
    let mut scope = solver_scope(TaskPlan::generate(5, 2, 2));

    phase.solve(&mut scope).unwrap();

    assert_eq!(merged_parts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_terminated_parent_returns_parts_unsolved() {
    let mut phase = build(config("by_group")).unwrap();
    let plan = TaskPlan::generate(4, 2, 2);
    let mut scope = SolverScope::with_seed(factory().build_score_director(plan.clone()), 1)
        .with_termination(Box::new(StepCountTermination::new(0)));
    scope.start_solving();

    phase.solve(&mut scope).unwrap();

    assert_eq!(phase.state(), PartitionedSearchState::Terminated);
    assert_eq!(scope.working_solution().machines(), plan.machines());
    assert!(!scope.best_solution().unwrap().is_initialized());
}

#[test]
fn test_phase_termination_stops_running_parts() {
    // Default nested phases: the local search only stops on the shared flag.
    let config = PartitionedSearchConfig::default()
        .with_solution_partitioner("by_group")
        .with_termination(TerminationConfig::default().with_milliseconds_spent_limit(200));
    let mut phase = build(config).unwrap();
    let mut scope = solver_scope(TaskPlan::generate(3, 3, 2));

    phase.solve(&mut scope).unwrap();

    assert_eq!(phase.state(), PartitionedSearchState::Terminated);
    assert!(scope.best_solution().unwrap().is_initialized());
}

#[test]
fn test_terminate_early_flag_reaches_parts() {
    let config = PartitionedSearchConfig::default().with_solution_partitioner("by_group");
    let mut phase = build(config).unwrap();
    let flag = Arc::new(AtomicBool::new(false));
    let mut scope = SolverScope::with_seed(
        factory().build_score_director(TaskPlan::generate(2, 3, 2)),
        3,
    )
    .with_terminate_early_flag(Arc::clone(&flag));
    scope.start_solving();

    let raiser = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        flag.store(true, Ordering::Release);
    });
    phase.solve(&mut scope).unwrap();
    raiser.join().unwrap();

    assert_eq!(phase.state(), PartitionedSearchState::Terminated);
}

#[test]
fn test_reproducible_mode_repeats_result() {
    let solve_once = || {
        let registry = registry(Arc::new(AtomicUsize::new(0)));
        let mut phase = PartitionedSearchPhaseBuilder::new(
            config("by_group"),
            &registry,
            factory(),
            phase_builder(),
        )
        .with_environment_mode(EnvironmentMode::Reproducible)
        .build()
        .unwrap();
        let mut scope = solver_scope(TaskPlan::generate(3, 4, 3));
        phase.solve(&mut scope).unwrap();
        scope.best_solution().unwrap().machines()
    };

    assert_eq!(solve_once(), solve_once());
}

#[test]
fn test_full_assert_mode_runs_clean() {
    let registry = registry(Arc::new(AtomicUsize::new(0)));
    let mut phase = PartitionedSearchPhaseBuilder::new(
        config("by_group"),
        &registry,
        factory(),
        phase_builder(),
    )
    .with_environment_mode(EnvironmentMode::FullAssert)
    .build()
    .unwrap();
    let mut scope = solver_scope(TaskPlan::generate(2, 3, 2));

    phase.solve(&mut scope).unwrap();

    assert_eq!(phase.state(), PartitionedSearchState::Done);
}

#[test]
fn test_single_runnable_thread_still_solves_all_parts() {
    let merged_parts = Arc::new(AtomicUsize::new(0));
    let registry = registry(Arc::clone(&merged_parts));
    let mut phase = PartitionedSearchPhaseBuilder::new(
        config("counting").with_runnable_part_thread_limit("1"),
        &registry,
        factory(),
        phase_builder(),
    )
    .build()
    .unwrap();
    let mut scope = solver_scope(TaskPlan::generate(4, 2, 2));

    phase.solve(&mut scope).unwrap();

    // The hint follows the limit, so the four groups share one partition.
    assert_eq!(merged_parts.load(Ordering::SeqCst), 1);
    assert!(scope.best_solution().unwrap().is_initialized());
}

/// Nested phase recording how many parts run it at the same time.
#[derive(Debug)]
struct ConcurrencyPhase {
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl Phase<TaskPlan, TaskDirector> for ConcurrencyPhase {
    fn solve(&mut self, _: &mut SolverScope<TaskPlan, TaskDirector>) -> Result<()> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(20));
        self.running.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    fn phase_type_name(&self) -> &'static str {
        "Concurrency"
    }
}

#[derive(Default)]
struct ConcurrencyPhaseBuilder {
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl PartPhaseBuilder<TaskPlan, TaskDirector> for ConcurrencyPhaseBuilder {
    fn build_part_phases(
        &self,
        _: &[PhaseConfig],
    ) -> Result<Vec<Box<dyn Phase<TaskPlan, TaskDirector>>>> {
        Ok(vec![Box::new(ConcurrencyPhase {
            running: Arc::clone(&self.running),
            peak: Arc::clone(&self.peak),
        })])
    }
}

#[test]
fn test_runnable_limit_throttles_execution_not_threads() {
    let registry = registry(Arc::new(AtomicUsize::new(0)));
    let phase_builder = Arc::new(ConcurrencyPhaseBuilder::default());
    let mut phase = PartitionedSearchPhaseBuilder::new(
        config("per_group").with_runnable_part_thread_limit("2"),
        &registry,
        factory(),
        Arc::clone(&phase_builder),
    )
    .with_available_processors(8)
    .build()
    .unwrap();
    let mut scope = solver_scope(TaskPlan::generate(6, 2, 2));

    phase.solve(&mut scope).unwrap();

    assert_eq!(phase.created_thread_count(), 6);
    let peak = phase_builder.peak.load(Ordering::SeqCst);
    assert!((1..=2).contains(&peak), "peak {peak}");
    assert_eq!(phase_builder.running.load(Ordering::SeqCst), 0);
    assert_eq!(phase.state(), PartitionedSearchState::Done);
}

#[test]
fn test_huge_runnable_limit_solves_all_parts() {
    let registry = registry(Arc::new(AtomicUsize::new(0)));
    let mut phase = PartitionedSearchPhaseBuilder::new(
        config("per_group").with_runnable_part_thread_limit("availableProcessorCount * 100000000"),
        &registry,
        factory(),
        phase_builder(),
    )
    .with_available_processors(8)
    .build()
    .unwrap();
    let mut scope = solver_scope(TaskPlan::generate(3, 2, 2));

    phase.solve(&mut scope).unwrap();

    assert_eq!(phase.runnable_part_thread_limit(), Some(800_000_000));
    assert!(scope.best_solution().unwrap().is_initialized());
}

#[test]
fn test_missing_partitioner_is_config_error() {
    let err = build(PartitionedSearchConfig::default()).unwrap_err();
    assert!(matches!(err, TesseraError::Config(msg) if msg.contains("solution_partitioner")));
}

#[test]
fn test_custom_properties_without_partitioner_is_config_error() {
    let config = PartitionedSearchConfig::default().with_custom_property("group_field", "team");
    let err = build(config).unwrap_err();
    assert!(matches!(err, TesseraError::Config(msg) if msg.contains("custom_properties")));
}

#[test]
fn test_unknown_partitioner_is_config_error() {
    let err = build(config("by_room")).unwrap_err();
    assert!(matches!(err, TesseraError::Config(msg) if msg.contains("by_room")));
}

#[test]
fn test_unknown_thread_factory_is_config_error() {
    let mut config = config("by_group");
    config.thread_factory = Some("green".to_string());
    assert!(matches!(build(config), Err(TesseraError::Config(_))));
}

#[test]
fn test_thread_limit_below_one_is_config_error() {
    for limit in ["availableProcessorCount - 8", "0", "availableProcessorCount /"] {
        let config = config("by_group").with_runnable_part_thread_limit(limit);
        let err = build(config).unwrap_err();
        assert!(
            matches!(&err, TesseraError::Config(msg) if msg.contains("runnable_part_thread_limit")),
            "{limit}: {err}"
        );
    }
}

#[test]
fn test_nested_partitioned_search_is_config_error() {
    let nested = PhaseConfig::PartitionedSearch(config("by_group"));
    let config = config("by_group").with_phases(vec![nested]);
    assert!(matches!(build(config), Err(TesseraError::Config(_))));
}

#[test]
fn test_empty_partition_set_fails_partitioning() {
    let mut phase = build(config("empty")).unwrap();
    let mut scope = solver_scope(TaskPlan::generate(2, 2, 2));

    let err = phase.solve(&mut scope).unwrap_err();

    assert!(matches!(err, TesseraError::Partitioning(_)));
    assert_eq!(phase.state(), PartitionedSearchState::Idle);
}

#[test]
fn test_partitioner_error_becomes_partitioning_error() {
    let mut phase = build(config("broken")).unwrap();
    let mut scope = solver_scope(TaskPlan::generate(2, 2, 2));

    let err = phase.solve(&mut scope).unwrap_err();

    assert!(matches!(err, TesseraError::Partitioning(msg) if msg.contains("no groups")));
    assert_eq!(phase.state(), PartitionedSearchState::Idle);
}

#[test]
fn test_partition_panic_becomes_partitioning_error() {
    let (result, state) = run_scripted(config("panicking_partition"), || Ok(()));

    let err = result.unwrap_err();
    assert!(matches!(err, TesseraError::Partitioning(_)));
    assert!(err.to_string().contains("group index out of range"));
    assert_eq!(state, PartitionedSearchState::Idle);
}

#[test]
fn test_merge_panic_becomes_partitioning_error() {
    let (result, state) = run_scripted(config("panicking_merge"), || Ok(()));

    let err = result.unwrap_err();
    assert!(matches!(err, TesseraError::Partitioning(_)));
    assert!(err.to_string().contains("duplicate task id"));
    assert_eq!(state, PartitionedSearchState::Idle);
}

#[test]
fn test_part_panic_becomes_part_failed() {
    let (result, state) = run_scripted(config("by_group"), || panic!("boom"));

    let err = result.unwrap_err();
    assert!(
        matches!(&err, TesseraError::PartFailed { message, .. } if message.contains("boom")),
        "{err}"
    );
    assert_eq!(state, PartitionedSearchState::Idle);
}

#[test]
fn test_part_error_becomes_part_failed() {
    let (result, _) = run_scripted(config("by_group"), || {
        Err(TesseraError::InvalidState("no machines".to_string()))
    });

    assert!(matches!(
        result,
        Err(TesseraError::PartFailed { message, .. }) if message.contains("no machines")
    ));
}

#[test]
fn test_part_score_corruption_propagates_unchanged() {
    let (result, _) = run_scripted(config("by_group"), || {
        Err(TesseraError::ScoreCorruption {
            completed_action: "step 3".to_string(),
            expected: "0hard/-4soft".to_string(),
            actual: "0hard/-5soft".to_string(),
        })
    });

    assert!(matches!(result, Err(TesseraError::ScoreCorruption { .. })));
}

#[test]
fn test_configured_thread_factory_names_part_threads() {
    let mut config = config("by_group");
    config.thread_factory = Some("worker".to_string());

    let (result, state) = run_scripted(config, || {
        match thread::current().name() {
            Some(name) if name.starts_with("Worker-") => Ok(()),
            other => Err(TesseraError::Internal(format!("unexpected thread {other:?}"))),
        }
    });

    result.unwrap();
    assert_eq!(state, PartitionedSearchState::Done);
}

#[test]
fn test_pool_runs_every_task() {
    let mut pool = PartThreadPool::new(Arc::new(DefaultThreadFactory::new("PoolTest")));
    let (sender, receiver) = channel::unbounded();

    for i in 0..4 {
        let sender = sender.clone();
        pool.execute(move || sender.send(i).unwrap()).unwrap();
    }
    let mut received: Vec<i32> = (0..4).map(|_| receiver.recv().unwrap()).collect();
    received.sort_unstable();

    assert_eq!(received, vec![0, 1, 2, 3]);
    assert!(pool.created_thread_count() <= 4);
}

#[test]
fn test_pool_rejects_tasks_after_shutdown() {
    let mut pool = PartThreadPool::with_keep_alive(
        Arc::new(DefaultThreadFactory::default()),
        Duration::from_millis(10),
    );
    pool.execute(|| {}).unwrap();
    pool.shutdown();

    assert!(pool.is_shutdown());
    assert!(matches!(pool.execute(|| {}), Err(TesseraError::ThreadPool(_))));
}

#[test]
fn test_limiter_waits_for_permit_until_flag_raised() {
    let limiter = RunnableThreadLimiter::new(Some(1));
    let flag = Arc::new(AtomicBool::new(false));
    let held = limiter.acquire(&flag).unwrap();

    let waiter = {
        let limiter = limiter.clone();
        let flag = Arc::clone(&flag);
        thread::spawn(move || limiter.acquire(&flag).is_some())
    };
    thread::sleep(Duration::from_millis(20));
    flag.store(true, Ordering::Release);

    assert!(!waiter.join().unwrap());
    drop(held);
    assert_eq!(limiter.available_permits(), Some(1));
}

#[test]
fn test_limiter_hands_released_permit_to_waiter() {
    let limiter = RunnableThreadLimiter::new(Some(1));
    let flag = Arc::new(AtomicBool::new(false));
    let held = limiter.acquire(&flag).unwrap();

    let waiter = {
        let limiter = limiter.clone();
        let flag = Arc::clone(&flag);
        thread::spawn(move || limiter.acquire(&flag).is_some())
    };
    thread::sleep(Duration::from_millis(20));
    drop(held);

    assert!(waiter.join().unwrap());
}

#[test]
fn test_unlimited_limiter_never_waits() {
    let limiter = RunnableThreadLimiter::new(None);
    let flag = AtomicBool::new(true);

    assert!(limiter.acquire(&flag).is_some());
    assert_eq!(limiter.available_permits(), None);
}

#[test]
fn test_limiter_with_huge_limit_mints_permits_lazily() {
    let limiter = RunnableThreadLimiter::new(Some(usize::MAX));
    let flag = AtomicBool::new(false);

    let first = limiter.acquire(&flag).unwrap();
    let second = limiter.acquire(&flag).unwrap();
    assert_eq!(limiter.available_permits(), Some(usize::MAX - 2));

    drop(first);
    drop(second);
    assert_eq!(limiter.available_permits(), Some(usize::MAX));
}
