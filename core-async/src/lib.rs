//! Async abstraction layer for the playback core.
//!
//! Every core-* crate depends on this crate instead of reaching for Tokio
//! directly, so the executor can be swapped or pinned in one place.
//!
//! # Modules
//!
//! - `task`: Task spawning and join handles
//! - `time`: Sleep, timeouts and instants
//! - `sync`: Channels, cancellation and async-aware locks
//! - `runtime`: Runtime builders plus [`runtime::SerialRuntime`], the
//!   dedicated single-threaded execution context that owns decoder work
//!
//! # Examples
//!
//! ```rust
//! use core_async::runtime::SerialRuntime;
//! use core_async::sync::mpsc;
//!
//! let (tx, mut rx) = mpsc::unbounded_channel::<u32>();
//! let worker = SerialRuntime::start("example-worker", move || async move {
//!     while let Some(value) = rx.recv().await {
//!         println!("processing {value}");
//!     }
//! })
//! .expect("worker thread");
//!
//! tx.send(1).unwrap();
//! drop(tx);
//! worker.join().unwrap();
//! ```

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use tokio::select;
pub use time::{sleep, Duration, Instant};
