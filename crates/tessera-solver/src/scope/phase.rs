//! Phase-level scope.

use std::time::{Duration, Instant};

use tessera_core::PlanningSolution;
use tessera_scoring::ScoreDirector;

use super::SolverScope;
use crate::termination::{Progress, Termination};

/// Scope for a single phase of solving.
///
/// # Type Parameters
/// * `'a` - Lifetime of the solver scope reference
/// * `S` - The planning solution type
/// * `D` - The score director type
pub struct PhaseScope<'a, S: PlanningSolution, D: ScoreDirector<S>> {
    /// Reference to the parent solver scope.
    solver_scope: &'a mut SolverScope<S, D>,
    /// Index of this phase (0-based).
    phase_index: usize,
    /// Best score at the start of this phase.
    starting_score: Option<S::Score>,
    /// Number of steps in this phase.
    step_count: u64,
    /// When this phase started.
    start_time: Instant,
    last_improvement_step: u64,
    last_improvement_time: Instant,
}

impl<'a, S: PlanningSolution, D: ScoreDirector<S>> PhaseScope<'a, S, D> {
    /// Creates a new phase scope with the next phase index of the solver.
    pub fn new(solver_scope: &'a mut SolverScope<S, D>) -> Self {
        let phase_index = solver_scope.next_phase_index();
        let starting_score = solver_scope.best_score();
        let now = Instant::now();
        Self {
            solver_scope,
            phase_index,
            starting_score,
            step_count: 0,
            start_time: now,
            last_improvement_step: 0,
            last_improvement_time: now,
        }
    }

    /// Returns the phase index.
    pub fn phase_index(&self) -> usize {
        self.phase_index
    }

    /// Returns the best score at the start of this phase.
    pub fn starting_score(&self) -> Option<S::Score> {
        self.starting_score
    }

    /// Returns the elapsed time for this phase.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Returns the step count for this phase.
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Increments the phase and solver step counts.
    pub fn increment_step_count(&mut self) -> u64 {
        self.step_count += 1;
        self.solver_scope.increment_step_count();
        self.step_count
    }

    /// Steps per second so far.
    pub fn speed(&self) -> u64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            (self.step_count as f64 / secs) as u64
        } else {
            0
        }
    }

    pub fn solver_scope(&self) -> &SolverScope<S, D> {
        self.solver_scope
    }

    pub fn solver_scope_mut(&mut self) -> &mut SolverScope<S, D> {
        self.solver_scope
    }

    pub fn score_director(&self) -> &D {
        self.solver_scope.score_director()
    }

    pub fn score_director_mut(&mut self) -> &mut D {
        self.solver_scope.score_director_mut()
    }

    pub fn calculate_score(&mut self) -> S::Score {
        self.solver_scope.calculate_score()
    }

    /// Updates the best solution, tracking phase-local improvement.
    pub fn update_best_solution(&mut self) -> bool {
        let improved = self.solver_scope.update_best_solution();
        if improved {
            self.last_improvement_step = self.step_count;
            self.last_improvement_time = Instant::now();
        }
        improved
    }

    /// Progress of this phase, for phase-level terminations.
    pub fn progress(&self) -> Progress<S::Score> {
        Progress {
            step_count: self.step_count,
            elapsed: self.elapsed(),
            best_score: self.solver_scope.best_score(),
            unimproved_step_count: self.step_count - self.last_improvement_step,
            unimproved_elapsed: self.last_improvement_time.elapsed(),
        }
    }

    /// True if the solver is terminated or `phase_termination` fires.
    pub fn is_terminated(&self, phase_termination: Option<&dyn Termination<S::Score>>) -> bool {
        self.solver_scope.is_terminated()
            || phase_termination.is_some_and(|t| t.is_terminated(&self.progress()))
    }

    /// Formats the best score for phase logging.
    pub fn best_score_label(&self) -> String {
        self.solver_scope
            .best_score()
            .map_or_else(|| "none".to_string(), |s| s.to_string())
    }
}
