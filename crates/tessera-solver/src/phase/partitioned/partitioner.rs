//! Solution partitioner for dividing problems into independent sub-problems.
//!
//! Partitioners split a large problem into smaller pieces that are solved
//! independently on part threads, then merged back together.

use std::fmt::Debug;
use std::marker::PhantomData;

use tessera_core::{PlanningSolution, Result};

/// Splits a solution into independent partitions for parallel solving.
///
/// # Type Parameters
///
/// - `S`: The planning solution type
///
/// # Contract
///
/// The entity sets of the returned partitions are pairwise disjoint and
/// together cover the original solution; problem facts may be shared. The
/// number of partitions returned decides the number of part threads.
///
/// For a school timetabling problem, a natural partitioning might be by
/// department, where lessons of one department never share a constraint
/// with lessons of another.
pub trait SolutionPartitioner<S: PlanningSolution>: Send + Sync + Debug {
    /// Splits the solution into independent partitions.
    ///
    /// `requested_partition_count` is a hint (the configured partition count,
    /// or else the runnable part thread limit); the partitioner may ignore it.
    ///
    /// # Errors
    ///
    /// Return [`TesseraError::Partitioning`](tessera_core::TesseraError::Partitioning)
    /// if the solution cannot be split.
    fn partition(&self, solution: &S, requested_partition_count: Option<usize>) -> Result<Vec<S>>;

    /// Merges solved partitions, given in partition index order, back into
    /// a complete solution.
    fn merge(&self, original: &S, partitions: Vec<S>) -> S;
}

/// A partitioner built from two closures.
///
/// ```
/// use tessera_solver::phase::partitioned::{FunctionalPartitioner, SolutionPartitioner};
/// use tessera_test::task::{self, TaskPlan};
///
/// let partitioner = FunctionalPartitioner::new(task::partition_by_group, task::merge_groups);
/// let plan = TaskPlan::generate(4, 2, 2);
/// assert_eq!(partitioner.partition(&plan, None).unwrap().len(), 4);
/// assert_eq!(partitioner.partition(&plan, Some(2)).unwrap().len(), 2);
/// ```
pub struct FunctionalPartitioner<S, PF, MF>
where
    S: PlanningSolution,
    PF: Fn(&S, Option<usize>) -> Vec<S> + Send + Sync,
    MF: Fn(&S, Vec<S>) -> S + Send + Sync,
{
    partition_fn: PF,
    merge_fn: MF,
    _phantom: PhantomData<fn() -> S>,
}

impl<S, PF, MF> FunctionalPartitioner<S, PF, MF>
where
    S: PlanningSolution,
    PF: Fn(&S, Option<usize>) -> Vec<S> + Send + Sync,
    MF: Fn(&S, Vec<S>) -> S + Send + Sync,
{
    pub fn new(partition_fn: PF, merge_fn: MF) -> Self {
        Self {
            partition_fn,
            merge_fn,
            _phantom: PhantomData,
        }
    }
}

impl<S, PF, MF> Debug for FunctionalPartitioner<S, PF, MF>
where
    S: PlanningSolution,
    PF: Fn(&S, Option<usize>) -> Vec<S> + Send + Sync,
    MF: Fn(&S, Vec<S>) -> S + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionalPartitioner").finish_non_exhaustive()
    }
}

impl<S, PF, MF> SolutionPartitioner<S> for FunctionalPartitioner<S, PF, MF>
where
    S: PlanningSolution,
    PF: Fn(&S, Option<usize>) -> Vec<S> + Send + Sync,
    MF: Fn(&S, Vec<S>) -> S + Send + Sync,
{
    fn partition(&self, solution: &S, requested_partition_count: Option<usize>) -> Result<Vec<S>> {
        Ok((self.partition_fn)(solution, requested_partition_count))
    }

    fn merge(&self, original: &S, partitions: Vec<S>) -> S {
        (self.merge_fn)(original, partitions)
    }
}
