//! Builds terminations from [`TerminationConfig`].

use tessera_config::{TerminationCompositionStyle, TerminationConfig};
use tessera_core::{ParseableScore, Result, TesseraError};

use super::{
    AndTermination, BestScoreFeasibleTermination, BestScoreTermination, OrTermination,
    StepCountTermination, Termination, TimeTermination, UnimprovedStepCountTermination,
    UnimprovedTimeTermination,
};

/// Builds the termination described by `config`.
///
/// Returns `Ok(None)` when the config sets no limit at all. Several limits
/// are combined with the configured composition style (OR by default).
///
/// # Errors
///
/// Returns [`TesseraError::Config`] if `best_score_limit` does not parse as
/// the solution's score type.
///
/// ```
/// use tessera_config::TerminationConfig;
/// use tessera_core::HardSoftScore;
/// use tessera_solver::termination::build_termination;
///
/// let config = TerminationConfig {
///     best_score_limit: Some("0hard/-10soft".to_string()),
///     ..TerminationConfig::default().with_step_count_limit(500)
/// };
/// let termination = build_termination::<HardSoftScore>(&config).unwrap();
/// assert!(termination.is_some());
///
/// let none = build_termination::<HardSoftScore>(&TerminationConfig::default()).unwrap();
/// assert!(none.is_none());
/// ```
pub fn build_termination<Sc: ParseableScore>(
    config: &TerminationConfig,
) -> Result<Option<Box<dyn Termination<Sc>>>> {
    let mut terminations: Vec<Box<dyn Termination<Sc>>> = Vec::new();

    if let Some(limit) = config.time_limit() {
        terminations.push(Box::new(TimeTermination::new(limit)));
    }
    if let Some(limit) = config.step_count_limit {
        terminations.push(Box::new(StepCountTermination::new(limit)));
    }
    if let Some(limit) = config.unimproved_step_count_limit {
        terminations.push(Box::new(UnimprovedStepCountTermination::new(limit)));
    }
    if let Some(limit) = config.unimproved_time_limit() {
        terminations.push(Box::new(UnimprovedTimeTermination::new(limit)));
    }
    if let Some(limit) = &config.best_score_limit {
        let target = Sc::parse(limit).map_err(|e| {
            TesseraError::Config(format!("invalid best_score_limit: {}", e.message))
        })?;
        terminations.push(Box::new(BestScoreTermination::new(target)));
    }
    if config.best_score_feasible == Some(true) {
        terminations.push(Box::new(BestScoreFeasibleTermination));
    }

    if terminations.len() <= 1 {
        return Ok(terminations.pop());
    }
    let composite: Box<dyn Termination<Sc>> = match config.composition_style() {
        TerminationCompositionStyle::Or => Box::new(OrTermination::new(terminations)),
        TerminationCompositionStyle::And => Box::new(AndTermination::new(terminations)),
    };
    Ok(Some(composite))
}
