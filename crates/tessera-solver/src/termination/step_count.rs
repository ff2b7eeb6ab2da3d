//! Step count termination.

use tessera_core::Score;

use super::{Progress, Termination};

/// Terminates after a step count.
///
/// # Example
///
/// ```
/// use tessera_solver::termination::StepCountTermination;
///
/// // Terminate after 1000 steps
/// let term = StepCountTermination::new(1000);
/// ```
#[derive(Debug, Clone)]
pub struct StepCountTermination {
    limit: u64,
}

impl StepCountTermination {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }
}

impl<Sc: Score> Termination<Sc> for StepCountTermination {
    fn is_terminated(&self, progress: &Progress<Sc>) -> bool {
        progress.step_count >= self.limit
    }
}
