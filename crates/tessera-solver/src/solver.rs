//! Solver implementation.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tessera_config::{EnvironmentMode, SolverConfig};
use tessera_core::{ParseableScore, PlanningSolution, Result};
use tessera_scoring::ScoreDirector;
use tracing::{info, warn};

use crate::assertion::AssertionPolicy;
use crate::phase::Phase;
use crate::scope::SolverScope;
use crate::termination::{build_termination, Termination};

/// Runs a sequence of phases against one working solution.
///
/// The solver termination and the terminate-early flag are installed in the
/// [`SolverScope`], so every phase (and every partition of a partitioned
/// search) observes them.
///
/// # Example
///
/// ```
/// use tessera_config::ConstructionHeuristicType;
/// use tessera_core::PlanningSolution;
/// use tessera_scoring::{
///     IncrementalScoreDirector, IncrementalScoreDirectorFactory, ScoreDirectorFactory,
/// };
/// use tessera_solver::phase::basic::BasicVariable;
/// use tessera_solver::phase::construction::ConstructionHeuristicPhase;
/// use tessera_solver::phase::Phase;
/// use tessera_solver::Solver;
/// use tessera_test::nqueens::{self, NQueens, NQueensCalculator};
///
/// type Director = IncrementalScoreDirector<NQueens, NQueensCalculator>;
///
/// let row = BasicVariable::new(
///     "row",
///     nqueens::queen_count,
///     nqueens::row_count,
///     nqueens::get_row,
///     nqueens::set_row,
/// );
/// let construction: Box<dyn Phase<NQueens, Director>> = Box::new(
///     ConstructionHeuristicPhase::new(row, ConstructionHeuristicType::FirstFit),
/// );
/// let factory = IncrementalScoreDirectorFactory::new(NQueensCalculator::default);
///
/// let mut solver = Solver::new(vec![construction]).with_random_seed(7);
/// let solved = solver
///     .solve(factory.build_score_director(NQueens::uninitialized(6)))
///     .unwrap();
/// assert!(solved.is_initialized());
/// ```
pub struct Solver<S: PlanningSolution, D: ScoreDirector<S>> {
    phases: Vec<Box<dyn Phase<S, D>>>,
    termination: Option<Box<dyn Termination<S::Score>>>,
    random_seed: Option<u64>,
    environment_mode: EnvironmentMode,
    handle: SolverHandle,
}

/// Thread-safe view of a [`Solver`] used to stop it from another thread.
#[derive(Debug, Clone, Default)]
pub struct SolverHandle {
    terminate_early_flag: Arc<AtomicBool>,
    solving: Arc<AtomicBool>,
}

impl SolverHandle {
    /// Requests early termination of the running solve.
    ///
    /// Returns false, and does nothing, if no solve is in progress.
    pub fn terminate_early(&self) -> bool {
        if self.solving.load(Ordering::SeqCst) {
            self.terminate_early_flag.store(true, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    pub fn is_solving(&self) -> bool {
        self.solving.load(Ordering::SeqCst)
    }

    pub fn is_terminate_early(&self) -> bool {
        self.terminate_early_flag.load(Ordering::SeqCst)
    }
}

impl<S: PlanningSolution, D: ScoreDirector<S>> Solver<S, D> {
    pub fn new(phases: Vec<Box<dyn Phase<S, D>>>) -> Self {
        Self {
            phases,
            termination: None,
            random_seed: None,
            environment_mode: EnvironmentMode::default(),
            handle: SolverHandle::default(),
        }
    }

    pub fn with_termination(mut self, termination: Box<dyn Termination<S::Score>>) -> Self {
        self.termination = Some(termination);
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn with_environment_mode(mut self, environment_mode: EnvironmentMode) -> Self {
        self.environment_mode = environment_mode;
        self
    }

    /// Applies the solver-level settings of `config`: termination, random
    /// seed and environment mode. Phases are not built from the config.
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::Config`](tessera_core::TesseraError::Config)
    /// if the termination config is invalid.
    pub fn with_config(mut self, config: &SolverConfig) -> Result<Self>
    where
        S::Score: ParseableScore,
    {
        if let Some(termination) = &config.termination {
            self.termination = build_termination(termination)?;
        }
        if let Some(seed) = config.random_seed {
            self.random_seed = Some(seed);
        }
        self.environment_mode = config.environment_mode();
        Ok(self)
    }

    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    pub fn handle(&self) -> SolverHandle {
        self.handle.clone()
    }

    /// See [`SolverHandle::terminate_early`].
    pub fn terminate_early(&self) -> bool {
        self.handle.terminate_early()
    }

    pub fn is_solving(&self) -> bool {
        self.handle.is_solving()
    }

    /// Solves the solution owned by `score_director` and returns the best
    /// solution found.
    ///
    /// Phases run in order until one fails or the solver terminates.
    ///
    /// # Errors
    ///
    /// Returns the first phase error.
    pub fn solve(&mut self, score_director: D) -> Result<S> {
        self.handle.terminate_early_flag.store(false, Ordering::SeqCst);
        self.handle.solving.store(true, Ordering::SeqCst);

        let scope = match self.random_seed {
            Some(seed) => SolverScope::with_seed(score_director, seed),
            None => SolverScope::new(score_director),
        };
        let mut scope = scope
            .with_terminate_early_flag(Arc::clone(&self.handle.terminate_early_flag))
            .with_assertion_policy(AssertionPolicy::from_environment_mode(self.environment_mode));
        if let Some(termination) = self.termination.take() {
            scope = scope.with_termination(termination);
        }

        let result = self.run_phases(&mut scope);
        self.termination = scope.take_termination();
        self.handle.solving.store(false, Ordering::SeqCst);
        result?;
        Ok(scope.take_best_or_working_solution())
    }

    fn run_phases(&mut self, scope: &mut SolverScope<S, D>) -> Result<()> {
        scope.start_solving();
        info!(
            event = "solving_start",
            phase_count = self.phases.len(),
            random_seed = ?scope.random_seed(),
            environment_mode = ?self.environment_mode,
            score = %scope.calculate_score(),
        );

        for phase in &mut self.phases {
            if scope.is_terminated() {
                break;
            }
            if let Err(error) = phase.solve(scope) {
                warn!(
                    event = "solving_failed",
                    phase = phase.phase_type_name(),
                    error = %error,
                );
                return Err(error);
            }
        }

        info!(
            event = "solving_end",
            duration_ms = scope.elapsed().as_millis() as u64,
            steps = scope.total_step_count(),
            terminated_early = scope.is_terminate_early(),
            score = scope
                .best_score()
                .map_or_else(|| "none".to_string(), |s| s.to_string()),
        );
        Ok(())
    }
}

impl<S: PlanningSolution, D: ScoreDirector<S>> fmt::Debug for Solver<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solver")
            .field("phases", &self.phases)
            .field("termination", &self.termination)
            .field("random_seed", &self.random_seed)
            .field("environment_mode", &self.environment_mode)
            .field("solving", &self.is_solving())
            .finish()
    }
}

#[cfg(test)]
#[path = "solver_tests.rs"]
mod tests;
