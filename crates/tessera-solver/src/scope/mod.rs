//! Scope hierarchy for solver execution.
//!
//! - [`SolverScope`]: holds the score director, best solution, randomness,
//!   termination state and assertion policy of one solve
//! - [`PhaseScope`]: per-phase step counting and improvement tracking

mod phase;
mod solver;

pub use phase::PhaseScope;
pub use solver::SolverScope;
