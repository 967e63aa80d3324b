//! Platform decoder bridge.
//!
//! The playback core never decodes audio itself. Each host wraps its native
//! media decoder (Android `MediaPlayer`, `AVPlayer`, a desktop shim) in a
//! [`MediaDecoder`] and hands the core a [`DecoderFactory`] to create them.
//!
//! Native decoders are not thread-safe. The core guarantees that every
//! mutating call on a given decoder is issued from its single worker thread;
//! only cheap queries (`position_ms`, `duration_ms`, `is_playing`) and
//! `start`/`pause` may arrive from a caller thread, and those are still
//! serialized behind the core's guard.
//!
//! Decoder signals ([`DecoderSignal`]) may be raised on any platform thread.
//! Implementations deliver them to the registered [`DecoderListener`] and must
//! not hold internal locks while doing so.

use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Request headers attached to a media locator (e.g. `Authorization` for a
/// remote library). Passed through to the decoder verbatim.
pub type Headers = HashMap<String, String>;

/// Well-known decoder error codes, mirroring the platform's `what` values.
pub mod error_codes {
    /// Unspecified decoder error.
    pub const MEDIA_ERROR_UNKNOWN: i32 = 1;
    /// The media server process died; every decoder instance is invalid.
    pub const MEDIA_ERROR_SERVER_DIED: i32 = 100;
    /// Generic I/O failure while reading the stream.
    pub const MEDIA_ERROR_IO: i32 = -1004;
    /// The stream is malformed.
    pub const MEDIA_ERROR_MALFORMED: i32 = -1007;
    /// The codec or container is not supported.
    pub const MEDIA_ERROR_UNSUPPORTED: i32 = -1010;
}

/// Resolved media locator: a file path, `content://` URI or HTTP(S) URL.
///
/// The library layer strips any provider-specific addressing before a
/// locator reaches the player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaLocator(String);

impl MediaLocator {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for network locators.
    pub fn is_remote(&self) -> bool {
        let lower = self.0.to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }

    /// Last path segment without query string, for log lines.
    pub fn display_name(&self) -> &str {
        let without_query = self.0.split(['?', '#']).next().unwrap_or(&self.0);
        without_query
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(without_query)
    }
}

impl fmt::Display for MediaLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MediaLocator {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MediaLocator {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Audio stream category the decoder output is routed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioStreamType {
    Music,
    Notification,
    Alarm,
}

/// How the decoder keeps the device awake while playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WakeMode {
    /// No wake lock; playback may stall when the device sleeps.
    None,
    /// CPU stays awake while the decoder plays; the screen may turn off.
    Partial,
}

/// Asynchronous signal raised by a platform decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum DecoderSignal {
    /// The stream played to its natural end.
    Completion,
    /// The decoder failed while playing.
    Error { what: i32, extra: i32 },
}

impl DecoderSignal {
    /// Returns `true` if the platform media service itself went away.
    pub fn is_server_died(&self) -> bool {
        matches!(
            self,
            DecoderSignal::Error {
                what: error_codes::MEDIA_ERROR_SERVER_DIED,
                ..
            }
        )
    }
}

/// Receiver for [`DecoderSignal`]s. Called on arbitrary platform threads.
pub trait DecoderListener: Send + Sync {
    fn on_signal(&self, signal: DecoderSignal);
}

impl<F> DecoderListener for F
where
    F: Fn(DecoderSignal) + Send + Sync,
{
    fn on_signal(&self, signal: DecoderSignal) {
        self(signal)
    }
}

/// One native decoder instance.
///
/// Methods take `&self`: implementations wrap a platform object that has its
/// own interior state. Every call may fail with
/// [`BridgeError::IllegalState`] when the platform object is in a state that
/// forbids it; the core treats such a decoder as lost.
pub trait MediaDecoder: Send + Sync {
    /// Return the decoder to its idle state.
    fn reset(&self) -> Result<()>;

    fn set_audio_stream_type(&self, stream_type: AudioStreamType) -> Result<()>;

    fn set_wake_mode(&self, mode: WakeMode) -> Result<()>;

    /// Attach the shared audio session so effects and equalizers follow the
    /// player across decoder instances.
    fn set_audio_session_id(&self, session_id: i32) -> Result<()>;

    fn set_data_source(&self, locator: &MediaLocator, headers: &Headers) -> Result<()>;

    /// Synchronously prepare the stream. May block on I/O.
    fn prepare(&self) -> Result<()>;

    fn start(&self) -> Result<()>;

    fn pause(&self) -> Result<()>;

    fn stop(&self) -> Result<()>;

    fn seek_to(&self, position_ms: i64) -> Result<()>;

    /// Set the output volume, `0.0..=1.0`.
    fn set_volume(&self, volume: f32) -> Result<()>;

    fn duration_ms(&self) -> Result<i64>;

    fn position_ms(&self) -> Result<i64>;

    fn is_playing(&self) -> Result<bool>;

    /// Whether the platform can chain a successor decoder natively.
    fn supports_next_decoder(&self) -> bool {
        false
    }

    /// Ask the platform to start `next` as soon as this decoder completes.
    ///
    /// Only called when [`supports_next_decoder`](Self::supports_next_decoder)
    /// returns `true`. `None` clears any previously chained decoder.
    fn set_next_decoder(&self, next: Option<Arc<dyn MediaDecoder>>) -> Result<()> {
        let _ = next;
        Err(BridgeError::NotAvailable(
            "native decoder chaining".to_string(),
        ))
    }

    /// Register the listener that receives completion/error signals,
    /// replacing any previous one.
    fn set_listener(&self, listener: Option<Arc<dyn DecoderListener>>);

    /// Free native resources. Further calls may fail with `IllegalState`.
    fn release(&self);
}

impl fmt::Debug for dyn MediaDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaDecoder")
            .field("supports_next_decoder", &self.supports_next_decoder())
            .finish_non_exhaustive()
    }
}

/// Creates platform decoders for the core.
pub trait DecoderFactory: Send + Sync {
    /// Allocate a fresh, idle decoder.
    fn create(&self) -> Result<Arc<dyn MediaDecoder>>;

    /// Audio session shared by every decoder this factory creates.
    fn audio_session_id(&self) -> i32;

    /// Short name used in log lines.
    fn name(&self) -> &str {
        "platform-decoder"
    }
}
