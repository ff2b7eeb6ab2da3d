//! Solver phases.
//!
//! - [`ConstructionHeuristicPhase`](construction::ConstructionHeuristicPhase):
//!   assigns every uninitialized entity
//! - [`LocalSearchPhase`](localsearch::LocalSearchPhase): improves an
//!   initialized solution move by move
//! - [`PartitionedSearchPhase`](partitioned::PartitionedSearchPhase): splits
//!   the solution and solves the partitions on worker threads

pub mod basic;
pub mod builder;
pub mod construction;
pub mod localsearch;
pub mod partitioned;

use std::fmt::Debug;

use tessera_core::{PlanningSolution, Result};
use tessera_scoring::ScoreDirector;

use crate::scope::SolverScope;

pub use builder::{BasicVariablePhaseBuilder, PartPhaseBuilder};

/// A phase of the solving process.
///
/// Phases are executed in sequence by the solver. Each phase has its own
/// strategy for exploring or constructing solutions.
///
/// # Type Parameters
/// * `S` - The planning solution type
/// * `D` - The score director type
pub trait Phase<S: PlanningSolution, D: ScoreDirector<S>>: Send + Debug {
    /// Executes this phase.
    ///
    /// The phase modifies the working solution in the solver scope and
    /// updates the best solution when improvements are found. Termination
    /// ends a phase early but is not an error.
    fn solve(&mut self, solver_scope: &mut SolverScope<S, D>) -> Result<()>;

    /// Returns the name of this phase type.
    fn phase_type_name(&self) -> &'static str;
}

impl<S: PlanningSolution, D: ScoreDirector<S>> Phase<S, D> for Box<dyn Phase<S, D>> {
    fn solve(&mut self, solver_scope: &mut SolverScope<S, D>) -> Result<()> {
        (**self).solve(solver_scope)
    }

    fn phase_type_name(&self) -> &'static str {
        (**self).phase_type_name()
    }
}
