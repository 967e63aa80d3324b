//! # Host Bridge Traits
//!
//! Contract between the playback core and the host platform.
//!
//! ## Overview
//!
//! The core owns the playback state machine; the host owns everything that
//! touches the device. Each trait here is a capability the core requires but
//! that must be implemented per platform (Android, iOS, desktop).
//!
//! ## Traits
//!
//! ### Playback
//! - [`MediaDecoder`](playback::MediaDecoder) - One native decoder instance
//! - [`DecoderFactory`](playback::DecoderFactory) - Allocates decoders sharing one audio session
//! - [`DecoderListener`](playback::DecoderListener) - Receives completion/error signals
//!
//! ### Threading
//! - [`CallbackExecutor`](executor::CallbackExecutor) - Where player notifications run
//!
//! ### Diagnostics
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Fail-Fast Strategy
//!
//! The core refuses to start without a decoder factory:
//!
//! ```ignore
//! let config = CoreConfig::builder().build()?;
//! // Err(CapabilityMissing { capability: "DecoderFactory", .. })
//! ```
//!
//! ## Error Handling
//!
//! Every bridge call returns [`BridgeError`](error::BridgeError). Platform
//! implementations should map "called in the wrong state" failures to
//! [`BridgeError::IllegalState`](error::BridgeError::IllegalState): the core
//! treats those decoders as lost and releases them.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync`. Signals and jobs may be delivered
//! on any thread.

pub mod error;
pub mod executor;
pub mod logging;
pub mod playback;

pub use error::BridgeError;

pub use executor::{CallbackExecutor, InlineExecutor, Job};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use playback::{
    error_codes, AudioStreamType, DecoderFactory, DecoderListener, DecoderSignal, Headers, MediaDecoder,
    MediaLocator, WakeMode,
};
