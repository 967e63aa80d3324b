//! Caller-chosen execution contexts.
//!
//! Hosts hand the core a [`CallbackExecutor`] to say where player
//! notifications should run: the UI thread, a dispatcher, a Tokio runtime.
//! The core never assumes anything about the thread a job lands on.

use std::fmt;

/// A unit of work posted to a [`CallbackExecutor`].
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Execution context that runs posted jobs.
///
/// Implementations must run every job exactly once and should preserve
/// submission order, otherwise listeners may observe `on_playing` before
/// `on_ready`.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::executor::{CallbackExecutor, Job};
///
/// struct MainLooper { /* platform handle */ }
///
/// impl CallbackExecutor for MainLooper {
///     fn execute(&self, job: Job) {
///         // post `job` to the platform main loop
///     }
/// }
/// ```
pub trait CallbackExecutor: Send + Sync {
    /// Schedule `job` on this execution context.
    fn execute(&self, job: Job);
}

/// Executor that runs jobs immediately on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl CallbackExecutor for InlineExecutor {
    fn execute(&self, job: Job) {
        job();
    }
}

impl fmt::Debug for dyn CallbackExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CallbackExecutor { .. }")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn inline_executor_runs_immediately() {
        let counter = Arc::new(AtomicUsize::new(0));
        let job_counter = Arc::clone(&counter);

        InlineExecutor.execute(Box::new(move || {
            job_counter.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
