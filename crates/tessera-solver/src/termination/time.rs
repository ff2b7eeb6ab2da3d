//! Time-based termination.

use std::time::Duration;

use tessera_core::Score;

use super::{Progress, Termination};

/// Terminates once the elapsed time reaches a limit.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tessera_solver::termination::TimeTermination;
///
/// let term = TimeTermination::new(Duration::from_secs(30));
/// let term = TimeTermination::millis(500);
/// ```
#[derive(Debug, Clone)]
pub struct TimeTermination {
    limit: Duration,
}

impl TimeTermination {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn seconds(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }
}

impl<Sc: Score> Termination<Sc> for TimeTermination {
    fn is_terminated(&self, progress: &Progress<Sc>) -> bool {
        progress.elapsed >= self.limit
    }
}
