//! Resolves a [`PartitionedSearchConfig`] into a runnable phase.

use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread;

use tessera_config::{EnvironmentMode, PartitionedSearchConfig};
use tessera_core::{ParseableScore, PlanningSolution, Result, TesseraError};
use tessera_scoring::ScoreDirectorFactory;
use tracing::debug;

use super::{
    DefaultThreadFactory, PartThreadPool, PartitionedSearchPhase, RunnableThreadLimiter,
    SolutionPartitioner,
};
use crate::assertion::AssertionPolicy;
use crate::phase::PartPhaseBuilder;
use crate::registry::StrategyRegistry;
use crate::termination::build_termination;

/// Builds a [`PartitionedSearchPhase`].
///
/// Every configuration problem is reported by [`build`](Self::build), before
/// any part thread exists:
///
/// - no `solution_partitioner` (with or without custom properties)
/// - an id unknown to the [`StrategyRegistry`]
/// - a `runnable_part_thread_limit` that does not evaluate or is below 1
/// - nested phase configs the [`PartPhaseBuilder`] rejects
pub struct PartitionedSearchPhaseBuilder<'r, S, F, B>
where
    S: PlanningSolution,
    F: ScoreDirectorFactory<S>,
    B: PartPhaseBuilder<S, F::Director>,
{
    config: PartitionedSearchConfig,
    registry: &'r StrategyRegistry<S>,
    part_director_factory: Arc<F>,
    part_phase_builder: Arc<B>,
    available_processors: Option<usize>,
    environment_mode: EnvironmentMode,
}

impl<'r, S, F, B> PartitionedSearchPhaseBuilder<'r, S, F, B>
where
    S: PlanningSolution,
    S::Score: ParseableScore,
    F: ScoreDirectorFactory<S> + 'static,
    B: PartPhaseBuilder<S, F::Director> + 'static,
{
    pub fn new(
        config: PartitionedSearchConfig,
        registry: &'r StrategyRegistry<S>,
        part_director_factory: Arc<F>,
        part_phase_builder: Arc<B>,
    ) -> Self {
        Self {
            config,
            registry,
            part_director_factory,
            part_phase_builder,
            available_processors: None,
            environment_mode: EnvironmentMode::default(),
        }
    }

    /// Overrides the processor count used to resolve the runnable part
    /// thread limit, which defaults to [`thread::available_parallelism`].
    pub fn with_available_processors(mut self, available_processors: usize) -> Self {
        self.available_processors = Some(available_processors);
        self
    }

    /// Sets the mode deciding the assertion policy and seeding of the
    /// partitions.
    pub fn with_environment_mode(mut self, environment_mode: EnvironmentMode) -> Self {
        self.environment_mode = environment_mode;
        self
    }

    pub fn build(self) -> Result<PartitionedSearchPhase<S, F, B>> {
        let partitioner = self.build_partitioner()?;

        let thread_factory = match &self.config.thread_factory {
            Some(id) => self.registry.thread_factory(id)?,
            None => Arc::new(DefaultThreadFactory::default()),
        };

        let available_processors = self.available_processors.unwrap_or_else(|| {
            thread::available_parallelism().map_or(1, NonZeroUsize::get)
        });
        let runnable_part_thread_limit = self
            .config
            .runnable_part_thread_limit()
            .resolve(available_processors)?;

        let nested_phases = self.config.nested_phases();
        // Built once here only to reject bad nested configs early.
        self.part_phase_builder.build_part_phases(&nested_phases)?;

        let termination = match &self.config.termination {
            Some(config) => build_termination(config)?,
            None => None,
        };

        debug!(
            event = "partitioned_search_built",
            available_processors,
            runnable_part_thread_limit = ?runnable_part_thread_limit,
            partition_count = ?self.config.partition_count,
            nested_phase_count = nested_phases.len(),
        );

        Ok(PartitionedSearchPhase {
            partitioner,
            part_director_factory: self.part_director_factory,
            part_phase_builder: self.part_phase_builder,
            nested_phases: Arc::new(nested_phases),
            pool: PartThreadPool::new(thread_factory),
            limiter: RunnableThreadLimiter::new(runnable_part_thread_limit),
            partition_count: self.config.partition_count,
            termination,
            assertion_policy: AssertionPolicy::from_environment_mode(self.environment_mode),
            reproducible: self.environment_mode.is_reproducible(),
            state: Default::default(),
        })
    }

    fn build_partitioner(&self) -> Result<Box<dyn SolutionPartitioner<S>>> {
        let properties = self.config.solution_partitioner_custom_properties.as_ref();
        match (&self.config.solution_partitioner, properties) {
            (Some(id), properties) => {
                let empty = BTreeMap::new();
                self.registry
                    .build_partitioner(id, properties.unwrap_or(&empty))
            }
            (None, Some(_)) => Err(TesseraError::Config(
                "solution_partitioner_custom_properties are set, \
                 but no solution_partitioner is configured"
                    .to_string(),
            )),
            (None, None) => Err(TesseraError::Config(
                "partitioned search needs a solution_partitioner".to_string(),
            )),
        }
    }
}

impl<S, F, B> fmt::Debug for PartitionedSearchPhaseBuilder<'_, S, F, B>
where
    S: PlanningSolution,
    F: ScoreDirectorFactory<S>,
    B: PartPhaseBuilder<S, F::Director>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartitionedSearchPhaseBuilder")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("available_processors", &self.available_processors)
            .field("environment_mode", &self.environment_mode)
            .finish_non_exhaustive()
    }
}
