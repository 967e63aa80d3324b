//! Task spawning abstractions.
//!
//! Thin wrappers over `tokio::task`. Tasks spawned from inside a
//! [`SerialRuntime`](crate::runtime::SerialRuntime) stay on that runtime's
//! single thread, which is what keeps delayed work ordered with the rest of
//! the queue.

pub use tokio::task::{spawn_blocking, yield_now, AbortHandle, JoinError, JoinHandle};

/// Spawns a new asynchronous task on the current Tokio runtime.
///
/// # Panics
///
/// Panics when called outside of a runtime context.
///
/// # Examples
///
/// ```rust
/// use core_async::task::spawn;
///
/// # async fn example() {
/// let handle = spawn(async { 42 });
/// assert_eq!(handle.await.unwrap(), 42);
/// # }
/// ```
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}

/// Result type for task operations.
pub type Result<T> = std::result::Result<T, JoinError>;
