//! Termination conditions based on lack of improvement.

use std::time::Duration;

use tessera_core::Score;

use super::{Progress, Termination};

/// Terminates if no improvement occurs for a specified number of steps.
///
/// Useful to stop a phase that has plateaued.
///
/// ```
/// use tessera_solver::termination::UnimprovedStepCountTermination;
///
/// // Terminate after 100 steps without improvement
/// let term = UnimprovedStepCountTermination::new(100);
/// ```
#[derive(Debug, Clone)]
pub struct UnimprovedStepCountTermination {
    limit: u64,
}

impl UnimprovedStepCountTermination {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }
}

impl<Sc: Score> Termination<Sc> for UnimprovedStepCountTermination {
    fn is_terminated(&self, progress: &Progress<Sc>) -> bool {
        progress.unimproved_step_count >= self.limit
    }
}

/// Terminates if no improvement occurs for a specified duration.
#[derive(Debug, Clone)]
pub struct UnimprovedTimeTermination {
    limit: Duration,
}

impl UnimprovedTimeTermination {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn seconds(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }
}

impl<Sc: Score> Termination<Sc> for UnimprovedTimeTermination {
    fn is_terminated(&self, progress: &Progress<Sc>) -> bool {
        progress.unimproved_elapsed >= self.limit
    }
}
