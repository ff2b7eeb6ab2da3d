//! Construction heuristic phase.
//!
//! Builds an initial solution by assigning a value to every uninitialized
//! entity of a [`BasicVariable`], one entity per step.

use std::fmt;

use tessera_config::ConstructionHeuristicType;
use tessera_core::{PlanningSolution, Result, Score};
use tessera_scoring::ScoreDirector;
use tracing::{info, trace};

use crate::phase::basic::BasicVariable;
use crate::phase::Phase;
use crate::scope::{PhaseScope, SolverScope};
use crate::termination::Termination;

const PHASE_NAME: &str = "Construction Heuristic";

/// Construction heuristic phase that builds an initial solution.
///
/// Entities are visited in index order. `FirstFit` tries every value and
/// keeps the best scoring one (the first on ties); `FirstFeasibleFit` stops
/// at the first value whose score is feasible.
pub struct ConstructionHeuristicPhase<S: PlanningSolution> {
    variable: BasicVariable<S>,
    heuristic_type: ConstructionHeuristicType,
    termination: Option<Box<dyn Termination<S::Score>>>,
}

impl<S: PlanningSolution> ConstructionHeuristicPhase<S> {
    pub fn new(variable: BasicVariable<S>, heuristic_type: ConstructionHeuristicType) -> Self {
        Self {
            variable,
            heuristic_type,
            termination: None,
        }
    }

    pub fn with_termination(mut self, termination: Box<dyn Termination<S::Score>>) -> Self {
        self.termination = Some(termination);
        self
    }

    /// Evaluates every candidate value for `entity_index` and undoes each
    /// evaluation before returning the pick.
    fn pick_value<D: ScoreDirector<S>>(
        &self,
        phase_scope: &mut PhaseScope<'_, S, D>,
        entity_index: usize,
        value_count: usize,
    ) -> Result<Option<usize>> {
        let policy = phase_scope.solver_scope().assertion_policy();
        let variable = self.variable;
        let director = phase_scope.score_director_mut();
        let before_score = director.calculate_score();

        let mut best: Option<(usize, S::Score)> = None;
        for value in 0..value_count {
            variable.change(director, entity_index, Some(value));
            let score = director.calculate_score();
            variable.change(director, entity_index, None);
            policy.assert_undo(
                director,
                before_score,
                format_args!("assigning value {value} to entity {entity_index}"),
            )?;

            if self.heuristic_type == ConstructionHeuristicType::FirstFeasibleFit
                && score.is_feasible()
            {
                return Ok(Some(value));
            }
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((value, score));
            }
        }
        Ok(best.map(|(value, _)| value))
    }
}

impl<S: PlanningSolution> fmt::Debug for ConstructionHeuristicPhase<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructionHeuristicPhase")
            .field("variable", &self.variable)
            .field("heuristic_type", &self.heuristic_type)
            .field("termination", &self.termination)
            .finish()
    }
}

impl<S, D> Phase<S, D> for ConstructionHeuristicPhase<S>
where
    S: PlanningSolution,
    D: ScoreDirector<S>,
{
    fn solve(&mut self, solver_scope: &mut SolverScope<S, D>) -> Result<()> {
        let mut phase_scope = PhaseScope::new(solver_scope);
        let phase_index = phase_scope.phase_index();
        let policy = phase_scope.solver_scope().assertion_policy();
        let termination = self.termination.as_deref();

        info!(event = "phase_start", phase = PHASE_NAME, phase_index);

        let solution = phase_scope.score_director().working_solution();
        let entity_count = self.variable.entity_count(solution);
        let value_count = self.variable.value_count(solution);

        for entity_index in 0..entity_count {
            if phase_scope.is_terminated(termination) {
                break;
            }
            let solution = phase_scope.score_director().working_solution();
            if self.variable.get(solution, entity_index).is_some() {
                continue;
            }
            let Some(value) = self.pick_value(&mut phase_scope, entity_index, value_count)? else {
                break;
            };

            let director = phase_scope.score_director_mut();
            self.variable.change(director, entity_index, Some(value));
            let step_score = director.calculate_score();
            let step = phase_scope.increment_step_count();
            policy.assert_step(
                phase_scope.score_director_mut(),
                step_score,
                format_args!("construction step {step} (entity {entity_index} -> {value})"),
            )?;
            trace!(
                event = "step",
                step,
                entity = entity_index,
                value,
                score = %step_score,
            );
            phase_scope.update_best_solution();
        }

        phase_scope.update_best_solution();
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
        "ConstructionHeuristic"
    }
}
