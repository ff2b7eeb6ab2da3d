//! Cap on the number of part threads running a nested phase at once.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

/// How often a thread waiting for a permit re-checks the termination flag.
pub const PERMIT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Counting semaphore over a channel of permit tokens.
///
/// It limits runnable threads, not alive ones: every partition has its own
/// thread, but only `limit` of them run a nested phase at the same time.
/// Tokens are minted on demand, so memory follows the number of permits
/// ever held at once rather than the limit. Cloning shares the permits.
///
/// ```
/// use std::sync::atomic::AtomicBool;
/// use tessera_solver::phase::partitioned::RunnableThreadLimiter;
///
/// let limiter = RunnableThreadLimiter::new(Some(1));
/// let flag = AtomicBool::new(false);
///
/// let permit = limiter.acquire(&flag).unwrap();
/// assert_eq!(limiter.available_permits(), Some(0));
/// drop(permit);
/// assert_eq!(limiter.available_permits(), Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct RunnableThreadLimiter {
    limit: Option<usize>,
    permits: Option<Arc<PermitPool>>,
}

#[derive(Debug)]
struct PermitPool {
    limit: usize,
    minted: AtomicUsize,
    released: Sender<()>,
    returned: Receiver<()>,
}

impl PermitPool {
    fn try_mint(&self) -> bool {
        self.minted
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |minted| {
                (minted < self.limit).then_some(minted + 1)
            })
            .is_ok()
    }
}

impl RunnableThreadLimiter {
    /// `None` means unlimited: [`acquire`](Self::acquire) never waits.
    pub fn new(limit: Option<usize>) -> Self {
        let permits = limit.map(|limit| {
            let (released, returned) = channel::unbounded();
            Arc::new(PermitPool {
                limit,
                minted: AtomicUsize::new(0),
                released,
                returned,
            })
        });
        Self { limit, permits }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn available_permits(&self) -> Option<usize> {
        self.permits.as_ref().map(|pool| {
            let unminted = pool.limit - pool.minted.load(Ordering::Acquire);
            unminted.saturating_add(pool.returned.len())
        })
    }

    /// Waits for a permit.
    ///
    /// Returns `None` if `terminate_flag` is raised while waiting.
    pub fn acquire(&self, terminate_flag: &AtomicBool) -> Option<RunnablePermit> {
        let Some(pool) = &self.permits else {
            return Some(RunnablePermit { release: None });
        };
        let granted = || RunnablePermit {
            release: Some(pool.released.clone()),
        };
        if pool.returned.try_recv().is_ok() || pool.try_mint() {
            return Some(granted());
        }
        loop {
            match pool.returned.recv_timeout(PERMIT_POLL_INTERVAL) {
                Ok(()) => return Some(granted()),
                Err(RecvTimeoutError::Timeout) => {
                    if terminate_flag.load(Ordering::Acquire) {
                        return None;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }
}

/// Gives its permit back when dropped.
#[derive(Debug)]
pub struct RunnablePermit {
    release: Option<Sender<()>>,
}

impl Drop for RunnablePermit {
    fn drop(&mut self) {
        if let Some(sender) = self.release.take() {
            let _ = sender.try_send(());
        }
    }
}
