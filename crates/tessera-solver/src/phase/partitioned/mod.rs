//! Partitioned search phase for parallel solving.
//!
//! Partitioned search splits the working solution into independent
//! partitions, solves each one on its own part thread with a private score
//! director and a nested phase chain, then merges the results back.
//!
//! # Usage
//!
//! 1. Register a [`SolutionPartitioner`] factory in a
//!    [`StrategyRegistry`](crate::StrategyRegistry)
//! 2. Configure a [`PartitionedSearchConfig`](tessera_config::PartitionedSearchConfig)
//!    naming it
//! 3. Build the phase with [`PartitionedSearchPhaseBuilder`]
//!
//! ```
//! use std::sync::Arc;
//! use tessera_config::PartitionedSearchConfig;
//! use tessera_scoring::IncrementalScoreDirectorFactory;
//! use tessera_solver::phase::basic::BasicVariable;
//! use tessera_solver::phase::partitioned::{
//!     FunctionalPartitioner, PartitionedSearchPhaseBuilder, PartitionedSearchState,
//! };
//! use tessera_solver::phase::BasicVariablePhaseBuilder;
//! use tessera_solver::StrategyRegistry;
//! use tessera_test::task::{self, TaskCalculator, TaskPlan};
//!
//! let mut registry = StrategyRegistry::<TaskPlan>::new();
//! registry.register_partitioner("by_group", |_| {
//!     Ok(Box::new(FunctionalPartitioner::new(task::partition_by_group, task::merge_groups)))
//! });
//!
//! let phase = PartitionedSearchPhaseBuilder::new(
//!     PartitionedSearchConfig::default().with_solution_partitioner("by_group"),
//!     &registry,
//!     Arc::new(IncrementalScoreDirectorFactory::new(TaskCalculator::default)),
//!     Arc::new(BasicVariablePhaseBuilder::new(BasicVariable::new(
//!         "machine",
//!         task::task_count,
//!         task::machine_count,
//!         task::get_machine,
//!         task::set_machine,
//!     ))),
//! )
//! .with_available_processors(4)
//! .build()
//! .unwrap();
//! assert_eq!(phase.state(), PartitionedSearchState::Idle);
//! assert_eq!(phase.runnable_part_thread_limit(), Some(2));
//! ```

mod builder;
mod limiter;
mod partitioner;
mod pool;
mod thread_factory;

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{self, RecvTimeoutError, Sender};
use tessera_config::PhaseConfig;
use tessera_core::{PlanningSolution, Result, TesseraError};
use tessera_scoring::{ScoreDirector, ScoreDirectorFactory};
use tracing::{debug, info, info_span, warn};

use crate::assertion::AssertionPolicy;
use crate::phase::{PartPhaseBuilder, Phase};
use crate::scope::{PhaseScope, SolverScope};
use crate::termination::Termination;

pub use builder::PartitionedSearchPhaseBuilder;
pub use limiter::{RunnablePermit, RunnableThreadLimiter, PERMIT_POLL_INTERVAL};
pub use partitioner::{FunctionalPartitioner, SolutionPartitioner};
pub use pool::{PartThreadPool, DEFAULT_KEEP_ALIVE};
pub use thread_factory::{DefaultThreadFactory, ThreadBody, ThreadFactory};

/// How often the orchestrator re-evaluates termination while awaiting parts.
pub const AWAIT_POLL_INTERVAL: Duration = Duration::from_millis(5);

const PHASE_NAME: &str = "Partitioned Search";

/// Lifecycle of one [`PartitionedSearchPhase::solve`] call.
///
/// `Idle -> Partitioning -> Dispatched -> Awaiting -> Merging -> Done`, or
/// `Terminated` instead of `Done` when termination stopped the parts early.
/// A failed solve returns the phase to `Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PartitionedSearchState {
    #[default]
    Idle,
    Partitioning,
    Dispatched,
    Awaiting,
    Merging,
    Done,
    Terminated,
}

/// Result reported by a part thread.
struct PartOutcome<S: PlanningSolution> {
    part_index: usize,
    result: Result<(S, S::Score)>,
}

/// Everything a part thread needs besides its partition.
struct PartContext<S, F, B>
where
    S: PlanningSolution,
    F: ScoreDirectorFactory<S>,
    B: PartPhaseBuilder<S, F::Director>,
{
    part_index: usize,
    part_director_factory: Arc<F>,
    part_phase_builder: Arc<B>,
    nested_phases: Arc<Vec<PhaseConfig>>,
    limiter: RunnableThreadLimiter,
    terminate_flag: Arc<AtomicBool>,
    assertion_policy: AssertionPolicy,
    random_seed: Option<u64>,
    _phantom: PhantomData<fn() -> S>,
}

impl<S, F, B> PartContext<S, F, B>
where
    S: PlanningSolution,
    F: ScoreDirectorFactory<S>,
    B: PartPhaseBuilder<S, F::Director>,
{
    /// Solves one partition and reports it, converting a panic into
    /// [`TesseraError::PartFailed`].
    fn run(self, partition: S, results: Sender<PartOutcome<S>>) {
        let part_index = self.part_index;
        let _span = info_span!("part", part_index).entered();
        let result = match panic::catch_unwind(AssertUnwindSafe(|| self.solve(partition))) {
            Ok(Ok(solved)) => Ok(solved),
            Ok(Err(error)) if error.is_assertion_failure() => Err(error),
            Ok(Err(error)) => Err(TesseraError::PartFailed {
                part_index,
                message: error.to_string(),
            }),
            Err(payload) => Err(TesseraError::PartFailed {
                part_index,
                message: panic_message(payload.as_ref()),
            }),
        };
        if let Err(error) = &result {
            warn!(event = "part_failed", part_index, error = %error);
        }
        let _ = results.send(PartOutcome { part_index, result });
    }

    fn solve(&self, partition: S) -> Result<(S, S::Score)> {
        let director = self.part_director_factory.build_score_director(partition);
        let scope = match self.random_seed {
            Some(seed) => SolverScope::with_seed(director, seed),
            None => SolverScope::new(director),
        };
        let mut scope = scope
            .with_terminate_early_flag(Arc::clone(&self.terminate_flag))
            .with_assertion_policy(self.assertion_policy);
        scope.start_solving();
        debug!(event = "part_start", part_index = self.part_index);

        let mut phases = self.part_phase_builder.build_part_phases(&self.nested_phases)?;
        for phase in &mut phases {
            if scope.is_terminated() {
                break;
            }
            // Held for one nested phase, then yielded to waiting parts.
            let Some(_permit) = self.limiter.acquire(&self.terminate_flag) else {
                break;
            };
            phase.solve(&mut scope)?;
        }

        let score = match scope.best_score() {
            Some(score) => score,
            None => scope.calculate_score(),
        };
        debug!(
            event = "part_end",
            part_index = self.part_index,
            steps = scope.total_step_count(),
            score = %score,
        );
        Ok((scope.take_best_or_working_solution(), score))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    panic_detail("part thread panicked", payload)
}

fn partitioner_panicked(operation: &str, payload: &(dyn Any + Send)) -> TesseraError {
    TesseraError::Partitioning(panic_detail(
        &format!("solution partitioner panicked in {operation}"),
        payload,
    ))
}

fn panic_detail(context: &str, payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("{context}: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("{context}: {message}")
    } else {
        context.to_string()
    }
}

/// Partitioned search phase that solves partitions in parallel.
///
/// Built by [`PartitionedSearchPhaseBuilder`]. Each solve:
///
/// 1. partitions the working solution
/// 2. runs one task per partition on the [`PartThreadPool`], each with its
///    own score director, child solver scope and nested phases
/// 3. awaits all parts, raising the shared child termination flag once the
///    parent terminates
/// 4. merges the parts in partition index order and hands the result to
///    the solver's best solution recaller
///
/// A part failure stops the remaining parts, discards every partial result
/// and fails the phase.
pub struct PartitionedSearchPhase<S, F, B>
where
    S: PlanningSolution,
    F: ScoreDirectorFactory<S>,
    B: PartPhaseBuilder<S, F::Director>,
{
    partitioner: Box<dyn SolutionPartitioner<S>>,
    part_director_factory: Arc<F>,
    part_phase_builder: Arc<B>,
    nested_phases: Arc<Vec<PhaseConfig>>,
    pool: PartThreadPool,
    limiter: RunnableThreadLimiter,
    partition_count: Option<usize>,
    termination: Option<Box<dyn Termination<S::Score>>>,
    assertion_policy: AssertionPolicy,
    reproducible: bool,
    state: PartitionedSearchState,
}

impl<S, F, B> PartitionedSearchPhase<S, F, B>
where
    S: PlanningSolution,
    F: ScoreDirectorFactory<S> + 'static,
    B: PartPhaseBuilder<S, F::Director> + 'static,
{
    pub fn state(&self) -> PartitionedSearchState {
        self.state
    }

    /// The resolved permit count, `None` when unlimited.
    pub fn runnable_part_thread_limit(&self) -> Option<usize> {
        self.limiter.limit()
    }

    pub fn nested_phases(&self) -> &[PhaseConfig] {
        &self.nested_phases
    }

    /// Number of part threads created so far; idle threads are reused.
    pub fn created_thread_count(&self) -> usize {
        self.pool.created_thread_count()
    }

    fn solve_partitions<D: ScoreDirector<S>>(
        &mut self,
        phase_scope: &mut PhaseScope<'_, S, D>,
    ) -> Result<()> {
        self.state = PartitionedSearchState::Partitioning;
        let original = phase_scope.score_director().clone_working_solution();
        let requested = self.partition_count.or(self.limiter.limit());
        let partitioner = &self.partitioner;
        let partitions = panic::catch_unwind(AssertUnwindSafe(|| {
            partitioner.partition(&original, requested)
        }))
        .map_err(|payload| partitioner_panicked("partition", payload.as_ref()))?
        .map_err(|error| match error {
            TesseraError::Partitioning(_) => error,
            other => TesseraError::Partitioning(other.to_string()),
        })?;
        if partitions.is_empty() {
            return Err(TesseraError::Partitioning(
                "the solution partitioner returned no partitions".to_string(),
            ));
        }
        let part_count = partitions.len();
        debug!(event = "partitioned", part_count, requested = ?requested);

        let terminate_flag = Arc::new(AtomicBool::new(false));
        let mut terminated = phase_scope.is_terminated(self.termination.as_deref());
        if terminated {
            terminate_flag.store(true, Ordering::Release);
        }

        let base_seed = self
            .reproducible
            .then(|| phase_scope.solver_scope().random_seed().unwrap_or(0));
        let (results, outcomes) = channel::unbounded();
        self.state = PartitionedSearchState::Dispatched;
        let mut dispatched = 0;
        let mut dispatch_error = None;
        for (part_index, partition) in partitions.into_iter().enumerate() {
            let context = PartContext {
                part_index,
                part_director_factory: Arc::clone(&self.part_director_factory),
                part_phase_builder: Arc::clone(&self.part_phase_builder),
                nested_phases: Arc::clone(&self.nested_phases),
                limiter: self.limiter.clone(),
                terminate_flag: Arc::clone(&terminate_flag),
                assertion_policy: self.assertion_policy,
                random_seed: base_seed.map(|seed| seed.wrapping_add(part_index as u64)),
                _phantom: PhantomData,
            };
            let results = results.clone();
            if let Err(error) = self.pool.execute(move || context.run(partition, results)) {
                dispatch_error = Some(error);
                break;
            }
            dispatched += 1;
        }
        drop(results);
        if dispatch_error.is_some() {
            terminate_flag.store(true, Ordering::Release);
        }

        self.state = PartitionedSearchState::Awaiting;
        let mut solved: Vec<Option<(S, S::Score)>> = (0..dispatched).map(|_| None).collect();
        let mut failure = dispatch_error;
        let mut received = 0;
        while received < dispatched {
            match outcomes.recv_timeout(AWAIT_POLL_INTERVAL) {
                Ok(PartOutcome { part_index, result }) => {
                    received += 1;
                    match result {
                        Ok(part) => solved[part_index] = Some(part),
                        Err(error) => {
                            terminate_flag.store(true, Ordering::Release);
                            failure.get_or_insert(error);
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            if !terminated && phase_scope.is_terminated(self.termination.as_deref()) {
                terminated = true;
                terminate_flag.store(true, Ordering::Release);
                debug!(event = "parts_terminating", part_count, received);
            }
        }
        if let Some(error) = failure {
            return Err(error);
        }
        if received < dispatched {
            return Err(TesseraError::Internal(
                "a part thread exited without reporting its result".to_string(),
            ));
        }

        self.state = PartitionedSearchState::Merging;
        let (parts, part_scores): (Vec<S>, Vec<S::Score>) = solved.into_iter().flatten().unzip();
        let partitioner = &self.partitioner;
        let merged = panic::catch_unwind(AssertUnwindSafe(|| partitioner.merge(&original, parts)))
            .map_err(|payload| partitioner_panicked("merge", payload.as_ref()))?;
        let merged_score = phase_scope
            .solver_scope_mut()
            .recall_merged(merged, &part_scores);
        phase_scope.increment_step_count();
        self.assertion_policy.assert_step(
            phase_scope.score_director_mut(),
            merged_score,
            format_args!("merging {part_count} partitions"),
        )?;
        debug!(event = "merged", part_count, score = %merged_score);

        self.state = if terminated {
            PartitionedSearchState::Terminated
        } else {
            PartitionedSearchState::Done
        };
        Ok(())
    }
}

impl<S, F, B, D> Phase<S, D> for PartitionedSearchPhase<S, F, B>
where
    S: PlanningSolution,
    F: ScoreDirectorFactory<S> + 'static,
    B: PartPhaseBuilder<S, F::Director> + 'static,
    D: ScoreDirector<S>,
{
    fn solve(&mut self, solver_scope: &mut SolverScope<S, D>) -> Result<()> {
        let mut phase_scope = PhaseScope::new(solver_scope);
        let phase_index = phase_scope.phase_index();
        info!(event = "phase_start", phase = PHASE_NAME, phase_index);

        if let Err(error) = self.solve_partitions(&mut phase_scope) {
            self.state = PartitionedSearchState::Idle;
            warn!(event = "phase_failed", phase = PHASE_NAME, phase_index, error = %error);
            return Err(error);
        }

        info!(
            event = "phase_end",
            phase = PHASE_NAME,
            phase_index,
            duration_ms = phase_scope.elapsed().as_millis() as u64,
            steps = phase_scope.step_count(),
            speed = phase_scope.speed(),
            score = phase_scope.best_score_label(),
            terminated = self.state == PartitionedSearchState::Terminated,
        );
        Ok(())
    }

    fn phase_type_name(&self) -> &'static str {
        "PartitionedSearch"
    }
}

impl<S, F, B> fmt::Debug for PartitionedSearchPhase<S, F, B>
where
    S: PlanningSolution,
    F: ScoreDirectorFactory<S>,
    B: PartPhaseBuilder<S, F::Director>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartitionedSearchPhase")
            .field("partitioner", &self.partitioner)
            .field("nested_phases", &self.nested_phases)
            .field("pool", &self.pool)
            .field("limiter", &self.limiter)
            .field("partition_count", &self.partition_count)
            .field("termination", &self.termination)
            .field("assertion_policy", &self.assertion_policy)
            .field("reproducible", &self.reproducible)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests;
