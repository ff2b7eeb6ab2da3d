//! Solver-level scope.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tessera_core::PlanningSolution;
use tessera_scoring::ScoreDirector;

use crate::assertion::AssertionPolicy;
use crate::recaller::BestSolutionRecaller;
use crate::termination::{Progress, Termination};

/// Top-level scope for one solve.
///
/// Generic over `D: ScoreDirector<S>`; partition workers get their own scope
/// around a private director.
pub struct SolverScope<S: PlanningSolution, D: ScoreDirector<S>> {
    score_director: D,
    recaller: BestSolutionRecaller<S>,
    rng: ChaCha8Rng,
    random_seed: Option<u64>,
    start_time: Option<Instant>,
    total_step_count: u64,
    last_improvement_step: u64,
    last_improvement_time: Option<Instant>,
    phase_count: usize,
    termination: Option<Box<dyn Termination<S::Score>>>,
    terminate_early_flag: Option<Arc<AtomicBool>>,
    assertion_policy: AssertionPolicy,
}

impl<S: PlanningSolution, D: ScoreDirector<S>> SolverScope<S, D> {
    pub fn new(score_director: D) -> Self {
        Self::build(score_director, ChaCha8Rng::from_os_rng(), None)
    }

    /// Creates a scope whose random decisions are reproducible.
    pub fn with_seed(score_director: D, seed: u64) -> Self {
        Self::build(score_director, ChaCha8Rng::seed_from_u64(seed), Some(seed))
    }

    fn build(score_director: D, rng: ChaCha8Rng, random_seed: Option<u64>) -> Self {
        Self {
            score_director,
            recaller: BestSolutionRecaller::new(),
            rng,
            random_seed,
            start_time: None,
            total_step_count: 0,
            last_improvement_step: 0,
            last_improvement_time: None,
            phase_count: 0,
            termination: None,
            terminate_early_flag: None,
            assertion_policy: AssertionPolicy::default(),
        }
    }

    pub fn with_termination(mut self, termination: Box<dyn Termination<S::Score>>) -> Self {
        self.termination = Some(termination);
        self
    }

    pub fn with_terminate_early_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.terminate_early_flag = Some(flag);
        self
    }

    pub fn with_assertion_policy(mut self, policy: AssertionPolicy) -> Self {
        self.assertion_policy = policy;
        self
    }

    /// Starts the clock and records the working solution as the first best.
    pub fn start_solving(&mut self) {
        let now = Instant::now();
        self.start_time = Some(now);
        self.total_step_count = 0;
        self.last_improvement_step = 0;
        self.last_improvement_time = Some(now);
        self.recaller.process_working_solution(&mut self.score_director);
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.map_or(Duration::ZERO, |t| t.elapsed())
    }

    pub fn score_director(&self) -> &D {
        &self.score_director
    }

    pub fn score_director_mut(&mut self) -> &mut D {
        &mut self.score_director
    }

    pub fn working_solution(&self) -> &S {
        self.score_director.working_solution()
    }

    pub fn working_solution_mut(&mut self) -> &mut S {
        self.score_director.working_solution_mut()
    }

    pub fn calculate_score(&mut self) -> S::Score {
        self.score_director.calculate_score()
    }

    pub fn best_solution(&self) -> Option<&S> {
        self.recaller.best_solution()
    }

    pub fn best_score(&self) -> Option<S::Score> {
        self.recaller.best_score()
    }

    pub fn recaller(&self) -> &BestSolutionRecaller<S> {
        &self.recaller
    }

    /// Records the working solution as best if it improves on it.
    pub fn update_best_solution(&mut self) -> bool {
        let improved = self
            .recaller
            .process_working_solution(&mut self.score_director);
        if improved {
            self.mark_improved();
        }
        improved
    }

    /// Installs a merged partition result, see
    /// [`BestSolutionRecaller::recall_merged`].
    pub fn recall_merged(&mut self, merged: S, part_scores: &[S::Score]) -> S::Score {
        let (score, improved) =
            self.recaller
                .recall_merged(&mut self.score_director, merged, part_scores);
        if improved {
            self.mark_improved();
        }
        score
    }

    fn mark_improved(&mut self) {
        self.last_improvement_step = self.total_step_count;
        self.last_improvement_time = Some(Instant::now());
    }

    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    pub fn random_seed(&self) -> Option<u64> {
        self.random_seed
    }

    pub fn increment_step_count(&mut self) -> u64 {
        self.total_step_count += 1;
        self.total_step_count
    }

    pub fn total_step_count(&self) -> u64 {
        self.total_step_count
    }

    /// Hands out consecutive phase indices.
    pub(crate) fn next_phase_index(&mut self) -> usize {
        let index = self.phase_count;
        self.phase_count += 1;
        index
    }

    pub fn progress(&self) -> Progress<S::Score> {
        Progress {
            step_count: self.total_step_count,
            elapsed: self.elapsed(),
            best_score: self.best_score(),
            unimproved_step_count: self.total_step_count - self.last_improvement_step,
            unimproved_elapsed: self
                .last_improvement_time
                .map_or(Duration::ZERO, |t| t.elapsed()),
        }
    }

    pub fn set_terminate_early_flag(&mut self, flag: Arc<AtomicBool>) {
        self.terminate_early_flag = Some(flag);
    }

    pub fn terminate_early_flag(&self) -> Option<&Arc<AtomicBool>> {
        self.terminate_early_flag.as_ref()
    }

    pub fn is_terminate_early(&self) -> bool {
        self.terminate_early_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Acquire))
    }

    /// Removes the solver termination so it can be reused by the next solve.
    pub fn take_termination(&mut self) -> Option<Box<dyn Termination<S::Score>>> {
        self.termination.take()
    }

    pub fn has_termination(&self) -> bool {
        self.termination.is_some() || self.terminate_early_flag.is_some()
    }

    /// True once the terminate-early flag is raised or the solver
    /// termination fires.
    pub fn is_terminated(&self) -> bool {
        self.is_terminate_early()
            || self
                .termination
                .as_ref()
                .is_some_and(|t| t.is_terminated(&self.progress()))
    }

    pub fn assertion_policy(&self) -> AssertionPolicy {
        self.assertion_policy
    }

    pub fn take_best_solution(mut self) -> Option<S> {
        self.recaller.take_best_solution()
    }

    pub fn take_best_or_working_solution(mut self) -> S {
        match self.recaller.take_best_solution() {
            Some(best) => best,
            None => self.score_director.clone_working_solution(),
        }
    }
}

impl<S: PlanningSolution, D: ScoreDirector<S>> fmt::Debug for SolverScope<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolverScope")
            .field("best_score", &self.best_score())
            .field("total_step_count", &self.total_step_count)
            .field("phase_count", &self.phase_count)
            .field("random_seed", &self.random_seed)
            .field("assertion_policy", &self.assertion_policy)
            .finish_non_exhaustive()
    }
}
