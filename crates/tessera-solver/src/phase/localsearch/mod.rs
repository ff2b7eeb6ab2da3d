//! Local search phase.
//!
//! Improves an initialized solution by repeatedly changing the value of one
//! entity. Each step samples change moves, scores each one through a
//! [`RecordingScoreDirector`] and undoes it, then applies the move the
//! [`AcceptedCountForager`] picks among those the [`Acceptor`] accepted.

mod acceptor;
mod forager;

use std::fmt;

use rand::Rng;
use tessera_core::{PlanningSolution, Result};
use tessera_scoring::{RecordingScoreDirector, ScoreDirector};
use tracing::{info, trace, warn};

use crate::phase::basic::BasicVariable;
use crate::phase::Phase;
use crate::scope::{PhaseScope, SolverScope};
use crate::termination::Termination;

pub use acceptor::{
    Acceptor, HillClimbingAcceptor, LateAcceptanceAcceptor, DEFAULT_LATE_ACCEPTANCE_SIZE,
};
pub use forager::AcceptedCountForager;

/// Upper bound on the moves evaluated in one step.
pub const DEFAULT_MOVE_SAMPLE_SIZE: usize = 1_000;

const PHASE_NAME: &str = "Local Search";

/// Assigns `to_value` to the variable of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeMove {
    pub entity_index: usize,
    pub to_value: usize,
}

/// Local search phase over a [`BasicVariable`].
pub struct LocalSearchPhase<S: PlanningSolution> {
    variable: BasicVariable<S>,
    acceptor: Box<dyn Acceptor<S::Score>>,
    forager: AcceptedCountForager<ChangeMove, S::Score>,
    move_sample_size: usize,
    termination: Option<Box<dyn Termination<S::Score>>>,
}

impl<S: PlanningSolution> LocalSearchPhase<S> {
    pub fn new(
        variable: BasicVariable<S>,
        acceptor: Box<dyn Acceptor<S::Score>>,
        accepted_count_limit: usize,
    ) -> Self {
        Self {
            variable,
            acceptor,
            forager: AcceptedCountForager::new(accepted_count_limit),
            move_sample_size: DEFAULT_MOVE_SAMPLE_SIZE,
            termination: None,
        }
    }

    pub fn with_termination(mut self, termination: Box<dyn Termination<S::Score>>) -> Self {
        self.termination = Some(termination);
        self
    }

    pub fn with_move_sample_size(mut self, move_sample_size: usize) -> Self {
        self.move_sample_size = move_sample_size.max(1);
        self
    }

    /// Scores `mv` without keeping it: the recording director undoes the
    /// change and the undo is checked against `last_step_score`.
    fn evaluate<D: ScoreDirector<S>>(
        &self,
        phase_scope: &mut PhaseScope<'_, S, D>,
        mv: ChangeMove,
        last_step_score: S::Score,
    ) -> Result<S::Score> {
        let policy = phase_scope.solver_scope().assertion_policy();
        let mut recording = RecordingScoreDirector::new(phase_scope.score_director_mut());
        self.variable
            .change_undoable(&mut recording, mv.entity_index, Some(mv.to_value));
        let score = recording.calculate_score();
        recording.undo_changes();
        policy.assert_undo(
            &mut recording,
            last_step_score,
            format_args!("move {} -> {}", mv.entity_index, mv.to_value),
        )?;
        Ok(score)
    }

    fn sample_moves<D: ScoreDirector<S>>(
        &self,
        phase_scope: &mut PhaseScope<'_, S, D>,
        entity_count: usize,
        value_count: usize,
    ) -> Vec<ChangeMove> {
        let sample_size = (entity_count * value_count).min(self.move_sample_size);
        let rng = phase_scope.solver_scope_mut().rng();
        let candidates: Vec<ChangeMove> = (0..sample_size)
            .map(|_| ChangeMove {
                entity_index: rng.random_range(0..entity_count),
                to_value: rng.random_range(0..value_count),
            })
            .collect();
        let solution = phase_scope.score_director().working_solution();
        candidates
            .into_iter()
            .filter(|mv| self.variable.get(solution, mv.entity_index) != Some(mv.to_value))
            .collect()
    }
}

impl<S: PlanningSolution> fmt::Debug for LocalSearchPhase<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSearchPhase")
            .field("variable", &self.variable)
            .field("acceptor", &self.acceptor)
            .field("accepted_count_limit", &self.forager.accepted_count_limit())
            .field("move_sample_size", &self.move_sample_size)
            .field("termination", &self.termination)
            .finish()
    }
}

impl<S, D> Phase<S, D> for LocalSearchPhase<S>
where
    S: PlanningSolution,
    D: ScoreDirector<S>,
{
    fn solve(&mut self, solver_scope: &mut SolverScope<S, D>) -> Result<()> {
        let mut phase_scope = PhaseScope::new(solver_scope);
        let phase_index = phase_scope.phase_index();
        let policy = phase_scope.solver_scope().assertion_policy();

        info!(event = "phase_start", phase = PHASE_NAME, phase_index);

        if self.termination.is_none() && !phase_scope.solver_scope().has_termination() {
            warn!(
                event = "phase_without_termination",
                phase = PHASE_NAME,
                phase_index,
                "local search has no termination and only stops when the solver is terminated"
            );
        }

        let solution = phase_scope.score_director().working_solution();
        let entity_count = self.variable.entity_count(solution);
        let value_count = self.variable.value_count(solution);

        let mut last_step_score = phase_scope.calculate_score();
        self.acceptor.phase_started(&last_step_score);

        while entity_count > 0
            && value_count > 0
            && !phase_scope.is_terminated(self.termination.as_deref())
        {
            self.forager.step_started();
            for mv in self.sample_moves(&mut phase_scope, entity_count, value_count) {
                let score = self.evaluate(&mut phase_scope, mv, last_step_score)?;
                if self.acceptor.is_accepted(&last_step_score, &score) {
                    self.forager.add_move(mv, score);
                    if self.forager.is_quit_early() {
                        break;
                    }
                }
            }

            let step = phase_scope.increment_step_count();
            let Some((mv, _)) = self.forager.pick_move() else {
                trace!(event = "step", step, accepted = false);
                continue;
            };

            let director = phase_scope.score_director_mut();
            self.variable
                .change(director, mv.entity_index, Some(mv.to_value));
            let step_score = director.calculate_score();
            policy.assert_step(
                phase_scope.score_director_mut(),
                step_score,
                format_args!(
                    "local search step {step} (entity {} -> {})",
                    mv.entity_index, mv.to_value
                ),
            )?;
            self.acceptor.step_ended(&step_score);
            last_step_score = step_score;
            let improved = phase_scope.update_best_solution();

            trace!(
                event = "step",
                step,
                entity = mv.entity_index,
                value = mv.to_value,
                score = %step_score,
                new_best = improved,
            );
        }

        info!(
            event = "phase_end",
            phase = PHASE_NAME,
            phase_index,
            duration_ms = phase_scope.elapsed().as_millis() as u64,
            steps = phase_scope.step_count(),
            speed = phase_scope.speed(),
            score = phase_scope.best_score_label(),
        );
        Ok(())
    }

    fn phase_type_name(&self) -> &'static str {
        "LocalSearch"
    }
}
