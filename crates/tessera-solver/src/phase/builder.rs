//! Turning phase configs into runnable phases.

use std::fmt;

use tessera_config::{AcceptorConfig, PhaseConfig};
use tessera_core::{ParseableScore, PlanningSolution, Result, TesseraError};
use tessera_scoring::ScoreDirector;

use crate::phase::basic::BasicVariable;
use crate::phase::construction::ConstructionHeuristicPhase;
use crate::phase::localsearch::{
    Acceptor, HillClimbingAcceptor, LateAcceptanceAcceptor, LocalSearchPhase,
    DEFAULT_LATE_ACCEPTANCE_SIZE, DEFAULT_MOVE_SAMPLE_SIZE,
};
use crate::phase::Phase;
use crate::termination::build_termination;

/// Builds the nested phases run inside each partition.
///
/// Called once per partition, on the partition's worker thread, so that
/// every partition gets fresh phase state. The partitioned search phase
/// builder also calls it once up front to surface config errors early.
pub trait PartPhaseBuilder<S: PlanningSolution, D: ScoreDirector<S>>: Send + Sync {
    /// Builds one phase per config, in order.
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::Config`] for configs it cannot build,
    /// including a partitioned search nested in a partition.
    fn build_part_phases(&self, configs: &[PhaseConfig]) -> Result<Vec<Box<dyn Phase<S, D>>>>;
}

/// Builds construction heuristic and local search phases over one
/// [`BasicVariable`].
///
/// ```
/// use tessera_config::PartitionedSearchConfig;
/// use tessera_scoring::SimpleScoreDirector;
/// use tessera_solver::phase::basic::BasicVariable;
/// use tessera_solver::phase::{BasicVariablePhaseBuilder, PartPhaseBuilder, Phase};
/// use tessera_core::SimpleScore;
/// use tessera_test::nqueens::{self, NQueens};
///
/// type Director = SimpleScoreDirector<NQueens, fn(&NQueens) -> SimpleScore>;
///
/// let builder = BasicVariablePhaseBuilder::new(BasicVariable::new(
///     "row",
///     nqueens::queen_count,
///     nqueens::row_count,
///     nqueens::get_row,
///     nqueens::set_row,
/// ));
/// let defaults = PartitionedSearchConfig::default().nested_phases();
/// let phases = PartPhaseBuilder::<NQueens, Director>::build_part_phases(&builder, &defaults)
///     .unwrap();
/// assert_eq!(phases.len(), 2);
/// assert_eq!(phases[0].phase_type_name(), "ConstructionHeuristic");
/// assert_eq!(phases[1].phase_type_name(), "LocalSearch");
/// ```
pub struct BasicVariablePhaseBuilder<S: PlanningSolution> {
    variable: BasicVariable<S>,
    move_sample_size: usize,
}

impl<S: PlanningSolution> BasicVariablePhaseBuilder<S> {
    pub fn new(variable: BasicVariable<S>) -> Self {
        Self {
            variable,
            move_sample_size: DEFAULT_MOVE_SAMPLE_SIZE,
        }
    }

    pub fn with_move_sample_size(mut self, move_sample_size: usize) -> Self {
        self.move_sample_size = move_sample_size;
        self
    }
}

impl<S> BasicVariablePhaseBuilder<S>
where
    S: PlanningSolution,
    S::Score: ParseableScore,
{
    /// Builds a construction heuristic or local search phase.
    pub fn build_phase<D: ScoreDirector<S>>(
        &self,
        config: &PhaseConfig,
    ) -> Result<Box<dyn Phase<S, D>>> {
        let termination = match config.termination() {
            Some(termination) => build_termination(termination)?,
            None => None,
        };

        match config {
            PhaseConfig::ConstructionHeuristic(ch) => {
                let mut phase = ConstructionHeuristicPhase::new(
                    self.variable,
                    ch.construction_heuristic_type.unwrap_or_default(),
                );
                if let Some(termination) = termination {
                    phase = phase.with_termination(termination);
                }
                Ok(Box::new(phase))
            }
            PhaseConfig::LocalSearch(ls) => {
                let acceptor: Box<dyn Acceptor<S::Score>> = match &ls.acceptor {
                    Some(AcceptorConfig::HillClimbing) => Box::new(HillClimbingAcceptor),
                    Some(AcceptorConfig::LateAcceptance(la)) => Box::new(
                        LateAcceptanceAcceptor::new(
                            la.late_acceptance_size
                                .unwrap_or(DEFAULT_LATE_ACCEPTANCE_SIZE),
                        ),
                    ),
                    None => Box::new(LateAcceptanceAcceptor::default()),
                };
                let accepted_count_limit = ls
                    .forager
                    .as_ref()
                    .and_then(|f| f.accepted_count_limit)
                    .unwrap_or(1);
                let mut phase = LocalSearchPhase::new(self.variable, acceptor, accepted_count_limit)
                    .with_move_sample_size(self.move_sample_size);
                if let Some(termination) = termination {
                    phase = phase.with_termination(termination);
                }
                Ok(Box::new(phase))
            }
            PhaseConfig::PartitionedSearch(_) => Err(TesseraError::Config(
                "a partitioned search phase cannot run inside a partition".to_string(),
            )),
        }
    }
}

impl<S, D> PartPhaseBuilder<S, D> for BasicVariablePhaseBuilder<S>
where
    S: PlanningSolution,
    S::Score: ParseableScore,
    D: ScoreDirector<S>,
{
    fn build_part_phases(&self, configs: &[PhaseConfig]) -> Result<Vec<Box<dyn Phase<S, D>>>> {
        configs.iter().map(|config| self.build_phase(config)).collect()
    }
}

impl<S: PlanningSolution> fmt::Debug for BasicVariablePhaseBuilder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicVariablePhaseBuilder")
            .field("variable", &self.variable)
            .field("move_sample_size", &self.move_sample_size)
            .finish()
    }
}
