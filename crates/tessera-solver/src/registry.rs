//! Named strategies referenced from configuration.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use tessera_core::{PlanningSolution, Result, TesseraError};

use crate::phase::partitioned::{SolutionPartitioner, ThreadFactory};

/// Builds a partitioner from the configured custom properties.
pub type PartitionerFactory<S> = Arc<
    dyn Fn(&BTreeMap<String, String>) -> Result<Box<dyn SolutionPartitioner<S>>> + Send + Sync,
>;

/// Maps the ids used in [`PartitionedSearchConfig`](tessera_config::PartitionedSearchConfig)
/// to partitioners and thread factories supplied by the host.
///
/// ```
/// use std::sync::Arc;
/// use tessera_solver::phase::partitioned::{DefaultThreadFactory, FunctionalPartitioner};
/// use tessera_solver::StrategyRegistry;
/// use tessera_test::task::{self, TaskPlan};
///
/// let mut registry = StrategyRegistry::<TaskPlan>::new();
/// registry
///     .register_partitioner("by_group", |_properties| {
///         Ok(Box::new(FunctionalPartitioner::new(
///             task::partition_by_group,
///             task::merge_groups,
///         )))
///     })
///     .register_thread_factory("named", Arc::new(DefaultThreadFactory::new("Worker")));
///
/// assert!(registry.build_partitioner("by_group", &Default::default()).is_ok());
/// assert!(registry.build_partitioner("by_room", &Default::default()).is_err());
/// ```
pub struct StrategyRegistry<S: PlanningSolution> {
    partitioners: HashMap<String, PartitionerFactory<S>>,
    thread_factories: HashMap<String, Arc<dyn ThreadFactory>>,
}

impl<S: PlanningSolution> Default for StrategyRegistry<S> {
    fn default() -> Self {
        Self {
            partitioners: HashMap::new(),
            thread_factories: HashMap::new(),
        }
    }
}

impl<S: PlanningSolution> StrategyRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a partitioner factory; a later registration under the same
    /// id replaces the earlier one.
    pub fn register_partitioner<F>(&mut self, id: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&BTreeMap<String, String>) -> Result<Box<dyn SolutionPartitioner<S>>>
            + Send
            + Sync
            + 'static,
    {
        self.partitioners.insert(id.into(), Arc::new(factory));
        self
    }

    pub fn register_thread_factory(
        &mut self,
        id: impl Into<String>,
        factory: Arc<dyn ThreadFactory>,
    ) -> &mut Self {
        self.thread_factories.insert(id.into(), factory);
        self
    }

    /// Builds the partitioner registered under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::Config`] for an unknown id, or whatever the
    /// factory returns for the given properties.
    pub fn build_partitioner(
        &self,
        id: &str,
        custom_properties: &BTreeMap<String, String>,
    ) -> Result<Box<dyn SolutionPartitioner<S>>> {
        let factory = self.partitioners.get(id).ok_or_else(|| {
            TesseraError::Config(format!("no solution partitioner is registered as '{id}'"))
        })?;
        factory(custom_properties)
    }

    /// Returns the thread factory registered under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::Config`] for an unknown id.
    pub fn thread_factory(&self, id: &str) -> Result<Arc<dyn ThreadFactory>> {
        self.thread_factories.get(id).cloned().ok_or_else(|| {
            TesseraError::Config(format!("no thread factory is registered as '{id}'"))
        })
    }
}

impl<S: PlanningSolution> fmt::Debug for StrategyRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut partitioners: Vec<&String> = self.partitioners.keys().collect();
        partitioners.sort();
        let mut thread_factories: Vec<&String> = self.thread_factories.keys().collect();
        thread_factories.sort();
        f.debug_struct("StrategyRegistry")
            .field("partitioners", &partitioners)
            .field("thread_factories", &thread_factories)
            .finish()
    }
}
