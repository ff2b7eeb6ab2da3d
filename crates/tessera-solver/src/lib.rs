//! Tessera solver engine.
//!
//! This crate provides:
//! - [`Solver`], running a sequence of phases under a solver termination
//! - Phases: construction heuristic, local search and the concurrent
//!   partitioned search
//! - Termination conditions, evaluated at solver and phase level
//! - [`BestSolutionRecaller`], tracking the best solution of a solve
//! - [`StrategyRegistry`], resolving the partitioners and thread factories
//!   named in configuration

pub mod assertion;
pub mod phase;
pub mod recaller;
pub mod registry;
pub mod scope;
pub mod solver;
pub mod termination;

pub use assertion::AssertionPolicy;
pub use phase::{
    basic::BasicVariable,
    construction::ConstructionHeuristicPhase,
    localsearch::{
        AcceptedCountForager, Acceptor, ChangeMove, HillClimbingAcceptor, LateAcceptanceAcceptor,
        LocalSearchPhase,
    },
    partitioned::{
        DefaultThreadFactory, FunctionalPartitioner, PartThreadPool, PartitionedSearchPhase,
        PartitionedSearchPhaseBuilder, PartitionedSearchState, RunnableThreadLimiter,
        SolutionPartitioner, ThreadFactory,
    },
    BasicVariablePhaseBuilder, PartPhaseBuilder, Phase,
};
pub use recaller::BestSolutionRecaller;
pub use registry::{PartitionerFactory, StrategyRegistry};
pub use scope::{PhaseScope, SolverScope};
pub use solver::{Solver, SolverHandle};
pub use termination::{
    build_termination, AndTermination, BestScoreFeasibleTermination, BestScoreTermination,
    ExternalTermination, OrTermination, Progress, StepCountTermination, Termination,
    TimeTermination, UnimprovedStepCountTermination, UnimprovedTimeTermination,
};
