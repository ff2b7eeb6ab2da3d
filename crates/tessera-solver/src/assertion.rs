//! Consistency checks run between steps, derived from the environment mode.

use std::fmt;

use tessera_config::EnvironmentMode;
use tessera_core::{PlanningSolution, Result};
use tessera_scoring::ScoreDirector;

/// Which score director assertions a phase runs after each step and after
/// each undone move.
///
/// ```
/// use tessera_config::EnvironmentMode;
/// use tessera_solver::AssertionPolicy;
///
/// let full = AssertionPolicy::from_environment_mode(EnvironmentMode::FullAssert);
/// assert!(full.assert_step_score_from_scratch);
/// assert!(full.assert_expected_step_score);
///
/// let fast = AssertionPolicy::from_environment_mode(EnvironmentMode::FastAssert);
/// assert!(!fast.assert_step_score_from_scratch);
/// assert!(fast.assert_shadow_variables_are_not_stale);
///
/// assert!(!AssertionPolicy::from_environment_mode(EnvironmentMode::Reproducible).is_enabled());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssertionPolicy {
    /// Recompute the step score from scratch (non-intrusive full assert).
    pub assert_step_score_from_scratch: bool,
    /// Re-read the incremental score and compare (intrusive fast assert).
    pub assert_expected_step_score: bool,
    /// Refresh shadows on a clone and compare (intrusive fast assert).
    pub assert_shadow_variables_are_not_stale: bool,
}

impl AssertionPolicy {
    pub fn from_environment_mode(mode: EnvironmentMode) -> Self {
        let intrusive = mode.is_intrusive_fast_asserted();
        Self {
            assert_step_score_from_scratch: mode.is_non_intrusive_full_asserted(),
            assert_expected_step_score: intrusive,
            assert_shadow_variables_are_not_stale: intrusive,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.assert_step_score_from_scratch
            || self.assert_expected_step_score
            || self.assert_shadow_variables_are_not_stale
    }

    /// Checks the director after a step scored `step_score`.
    ///
    /// `completed_action` is only rendered when a check is enabled.
    pub fn assert_step<S, D>(
        &self,
        director: &mut D,
        step_score: S::Score,
        completed_action: fmt::Arguments<'_>,
    ) -> Result<()>
    where
        S: PlanningSolution,
        D: ScoreDirector<S> + ?Sized,
    {
        if !self.is_enabled() {
            return Ok(());
        }
        let action = completed_action.to_string();
        if self.assert_step_score_from_scratch {
            director.assert_working_score_from_scratch(step_score, &action)?;
        }
        if self.assert_expected_step_score {
            director.assert_expected_working_score(step_score, &action)?;
        }
        if self.assert_shadow_variables_are_not_stale {
            director.assert_shadow_variables_are_not_stale(step_score, &action)?;
        }
        Ok(())
    }

    /// Checks that undoing an evaluated move restored `before_score`.
    pub fn assert_undo<S, D>(
        &self,
        director: &mut D,
        before_score: S::Score,
        undone_action: fmt::Arguments<'_>,
    ) -> Result<()>
    where
        S: PlanningSolution,
        D: ScoreDirector<S> + ?Sized,
    {
        if !self.assert_expected_step_score {
            return Ok(());
        }
        let action = format!("undo of {undone_action}");
        director.assert_expected_working_score(before_score, &action)
    }
}
