//! Synchronization primitives.
//!
//! Re-exports the Tokio channel and lock types used by the core together with
//! `tokio_util`'s [`CancellationToken`], which the worker runtime uses to stop
//! delayed work when the engine is released.
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::{mpsc, CancellationToken};
//!
//! let token = CancellationToken::new();
//! let (tx, mut rx) = mpsc::unbounded_channel::<&'static str>();
//! tx.send("work").unwrap();
//! assert_eq!(rx.try_recv().unwrap(), "work");
//!
//! token.cancel();
//! assert!(token.is_cancelled());
//! ```

pub use tokio::sync::{
    broadcast, mpsc, oneshot, watch, Mutex, MutexGuard, Notify, RwLock, RwLockReadGuard,
    RwLockWriteGuard,
};

pub use tokio_util::sync::CancellationToken;
