//! # Core Configuration Module
//!
//! Provides the host-facing configuration for the playback core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance holding the bridges the core needs. It enforces fail-fast
//! validation so a missing decoder factory is reported at startup instead of
//! at the first `set_data_source`.
//!
//! ## Required Dependencies
//!
//! - `DecoderFactory` - Creates the platform decoders
//!
//! ## Optional Dependencies
//!
//! - `CallbackExecutor` - Where player notifications run (default: inline on
//!   the playback worker)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .decoder_factory(Arc::new(MediaPlayerFactory::new(session_id)))
//!     .callback_executor(Arc::new(MainLooperExecutor))
//!     .event_buffer_size(64)
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Panics with an actionable CapabilityMissing message
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing decoder factory");
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{CallbackExecutor, DecoderFactory};
use std::sync::Arc;

/// Upper bound for the event buffer; anything larger hides a stuck subscriber.
const MAX_EVENT_BUFFER_SIZE: usize = 10_000;

/// Core configuration for the playback core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Platform decoder factory (required)
    pub decoder_factory: Arc<dyn DecoderFactory>,

    /// Execution context for player notifications (optional)
    pub callback_executor: Option<Arc<dyn CallbackExecutor>>,

    /// Capacity of the player event bus
    pub event_buffer_size: usize,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field(
                "decoder_factory",
                &format!("DecoderFactory {{ name: {:?} }}", self.decoder_factory.name()),
            )
            .field(
                "callback_executor",
                &self
                    .callback_executor
                    .as_ref()
                    .map(|_| "CallbackExecutor { ... }"),
            )
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size > MAX_EVENT_BUFFER_SIZE {
            return Err(Error::Config(format!(
                "Event buffer size exceeds maximum of {}",
                MAX_EVENT_BUFFER_SIZE
            )));
        }

        Ok(())
    }
}

fn decoder_factory_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "DecoderFactory".to_string(),
        message: "DecoderFactory implementation is required to create platform decoders. \
                 Android: wrap MediaPlayer. \
                 iOS: wrap AVPlayer. \
                 Desktop: inject a decoder backed by the system media framework."
            .to_string(),
    }
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    decoder_factory: Option<Arc<dyn DecoderFactory>>,
    callback_executor: Option<Arc<dyn CallbackExecutor>>,
    event_buffer_size: Option<usize>,
}

impl CoreConfigBuilder {
    /// Sets the decoder factory (required).
    pub fn decoder_factory(mut self, factory: Arc<dyn DecoderFactory>) -> Self {
        self.decoder_factory = Some(factory);
        self
    }

    /// Sets the execution context for player notifications.
    ///
    /// Without one, notifications run inline on the playback worker thread.
    pub fn callback_executor(mut self, executor: Arc<dyn CallbackExecutor>) -> Self {
        self.callback_executor = Some(executor);
        self
    }

    /// Sets the event bus capacity.
    ///
    /// Default: [`DEFAULT_EVENT_BUFFER_SIZE`]
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapabilityMissing`] when no decoder factory was set and
    /// [`Error::Config`] when a value is out of range.
    pub fn build(self) -> Result<CoreConfig> {
        let decoder_factory = self
            .decoder_factory
            .ok_or_else(decoder_factory_missing_error)?;

        let config = CoreConfig {
            decoder_factory,
            callback_executor: self.callback_executor,
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;

        Ok(config)
    }
}
