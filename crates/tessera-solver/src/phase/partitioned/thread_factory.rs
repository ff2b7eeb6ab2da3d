//! Creation of part threads.

use std::fmt::Debug;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

/// Work run on a part thread.
pub type ThreadBody = Box<dyn FnOnce() + Send + 'static>;

/// Creates the threads of a [`PartThreadPool`](super::PartThreadPool).
///
/// Hosts register their own factory in the
/// [`StrategyRegistry`](crate::StrategyRegistry) to control naming, stack
/// size or priority of part threads.
pub trait ThreadFactory: Send + Sync + Debug {
    /// Starts a new thread running `body`.
    fn new_thread(&self, body: ThreadBody) -> io::Result<JoinHandle<()>>;
}

static POOL_NUMBER: AtomicUsize = AtomicUsize::new(1);

/// Names threads `{prefix}-{pool}-{n}`, numbering pools process-wide and
/// threads per factory, both from 1.
///
/// ```
/// use tessera_solver::phase::partitioned::{DefaultThreadFactory, ThreadFactory};
///
/// let factory = DefaultThreadFactory::new("PartThread");
/// let handle = factory
///     .new_thread(Box::new(|| {
///         let name = std::thread::current().name().unwrap().to_string();
///         assert!(name.starts_with("PartThread-"));
///         assert!(name.ends_with("-1"));
///     }))
///     .unwrap();
/// handle.join().unwrap();
/// ```
#[derive(Debug)]
pub struct DefaultThreadFactory {
    prefix: String,
    pool_number: usize,
    thread_number: AtomicUsize,
}

impl DefaultThreadFactory {
    pub const DEFAULT_PREFIX: &'static str = "PartThread";

    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            pool_number: POOL_NUMBER.fetch_add(1, Ordering::Relaxed),
            thread_number: AtomicUsize::new(1),
        }
    }

    fn next_thread_name(&self) -> String {
        let n = self.thread_number.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}-{}", self.prefix, self.pool_number, n)
    }
}

impl Default for DefaultThreadFactory {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREFIX)
    }
}

impl ThreadFactory for DefaultThreadFactory {
    fn new_thread(&self, body: ThreadBody) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(self.next_thread_name())
            .spawn(body)
    }
}
