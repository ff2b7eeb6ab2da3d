//! Cached thread pool running one task per partition.

use std::fmt;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use tessera_core::{Result, TesseraError};
use tracing::trace;

use super::thread_factory::{ThreadBody, ThreadFactory};

/// How long an idle part thread waits for a new task before exiting.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(60);

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Cached pool with no core threads, no maximum and direct hand-off.
///
/// A task goes to an idle thread only if one is blocked waiting for work;
/// otherwise a new thread is created for it immediately. Tasks never queue,
/// so every partition starts running at once. Throttling is left to the
/// [`RunnableThreadLimiter`](super::RunnableThreadLimiter).
pub struct PartThreadPool {
    // Zero-capacity channel: `try_send` only succeeds on a waiting receiver.
    hand_off: Option<Sender<Task>>,
    idle: Receiver<Task>,
    thread_factory: Arc<dyn ThreadFactory>,
    keep_alive: Duration,
    threads: Vec<JoinHandle<()>>,
    created_thread_count: usize,
}

impl PartThreadPool {
    pub fn new(thread_factory: Arc<dyn ThreadFactory>) -> Self {
        Self::with_keep_alive(thread_factory, DEFAULT_KEEP_ALIVE)
    }

    pub fn with_keep_alive(thread_factory: Arc<dyn ThreadFactory>, keep_alive: Duration) -> Self {
        let (hand_off, idle) = channel::bounded(0);
        Self {
            hand_off: Some(hand_off),
            idle,
            thread_factory,
            keep_alive,
            threads: Vec::new(),
            created_thread_count: 0,
        }
    }

    /// Runs `task` on an idle thread or on a new one.
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::ThreadPool`] if the pool is shut down or the
    /// thread factory fails to create a thread.
    pub fn execute(&mut self, task: impl FnOnce() + Send + 'static) -> Result<()> {
        let hand_off = self
            .hand_off
            .as_ref()
            .ok_or_else(|| TesseraError::ThreadPool("the part thread pool is shut down".into()))?;
        let task = match hand_off.try_send(Box::new(task)) {
            Ok(()) => {
                trace!(event = "part_task_handed_off");
                return Ok(());
            }
            Err(TrySendError::Full(task)) | Err(TrySendError::Disconnected(task)) => task,
        };

        self.threads.retain(|handle| !handle.is_finished());
        let idle = self.idle.clone();
        let keep_alive = self.keep_alive;
        let body: ThreadBody = Box::new(move || {
            let mut next = Some(task);
            while let Some(task) = next.take() {
                task();
                next = idle.recv_timeout(keep_alive).ok();
            }
        });
        let handle = self
            .thread_factory
            .new_thread(body)
            .map_err(|e| TesseraError::ThreadPool(format!("cannot create a part thread: {e}")))?;
        self.threads.push(handle);
        self.created_thread_count += 1;
        Ok(())
    }

    /// Total number of threads this pool has created.
    pub fn created_thread_count(&self) -> usize {
        self.created_thread_count
    }

    /// Stops accepting tasks, releases idle threads and joins every thread.
    ///
    /// Threads busy with a task finish it first.
    pub fn shutdown(&mut self) {
        self.hand_off = None;
        for handle in self.threads.drain(..) {
            let _ = handle.join();
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.hand_off.is_none()
    }
}

impl Drop for PartThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for PartThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartThreadPool")
            .field("thread_factory", &self.thread_factory)
            .field("keep_alive", &self.keep_alive)
            .field("created_thread_count", &self.created_thread_count)
            .field("is_shutdown", &self.is_shutdown())
            .finish()
    }
}
