//! Runtime utilities that abstract over the underlying async executor.
//!
//! Besides re-exporting Tokio's runtime primitives, this module provides
//! [`SerialRuntime`]: a named OS thread hosting a current-thread Tokio runtime.
//! Everything spawned on it (queue consumers, timers, delayed re-posts) runs on
//! that one thread, one poll at a time, so state owned by the worker never
//! needs more than a coarse lock.

use std::fmt;
use std::future::Future;
use std::io;
use std::sync::mpsc as std_mpsc;
use std::thread::{self, JoinHandle, ThreadId};

pub use tokio::runtime::{Builder, Handle, Runtime};

/// A dedicated single-threaded execution context.
///
/// The runtime lives exactly as long as the future returned by the `main`
/// closure passed to [`SerialRuntime::start`]. When that future resolves the
/// runtime is dropped on the worker thread, which also drops any task still
/// pending on it.
pub struct SerialRuntime {
    name: String,
    thread_id: ThreadId,
    thread: Option<JoinHandle<()>>,
}

impl SerialRuntime {
    /// Spawns the worker thread and runs `main` on it.
    ///
    /// Returns once the runtime has been built, so a successful return means
    /// the worker is ready to accept work.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS thread cannot be spawned or the Tokio
    /// runtime cannot be built on it.
    pub fn start<F, Fut>(name: impl Into<String>, main: F) -> io::Result<Self>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()>,
    {
        let name = name.into();
        let (ready_tx, ready_rx) = std_mpsc::sync_channel::<io::Result<()>>(1);

        let thread = thread::Builder::new().name(name.clone()).spawn(move || {
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                    return;
                }
            };
            let _ = ready_tx.send(Ok(()));
            runtime.block_on(main());
        })?;

        let thread_id = thread.thread().id();
        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                name,
                thread_id,
                thread: Some(thread),
            }),
            Ok(Err(err)) => {
                let _ = thread.join();
                Err(err)
            }
            Err(_) => {
                let _ = thread.join();
                Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("worker thread '{}' exited during startup", name),
                ))
            }
        }
    }

    /// Name given to the worker thread.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` when called from the worker thread itself.
    pub fn is_current_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Returns `true` once the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread
            .as_ref()
            .map_or(true, |thread| thread.is_finished())
    }

    /// Waits for the worker thread to exit.
    ///
    /// Joining from the worker thread itself would deadlock, so in that case
    /// the thread is detached and `Ok(())` is returned immediately; it exits
    /// on its own once its main future resolves.
    ///
    /// # Errors
    ///
    /// Returns the panic payload if the worker thread panicked.
    pub fn join(mut self) -> thread::Result<()> {
        if self.is_current_thread() {
            self.thread.take();
            return Ok(());
        }
        match self.thread.take() {
            Some(thread) => thread.join(),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for SerialRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialRuntime")
            .field("name", &self.name)
            .field("finished", &self.is_finished())
            .finish()
    }
}
