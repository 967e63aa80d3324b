//! Decoder Handle: one platform decoder plus its chaining strategy.
//!
//! A handle adapts a [`MediaDecoder`] to a uniform contract whatever the
//! platform's capabilities. It never lets a platform failure escape as
//! anything but a [`PlaybackError`], and it re-routes the decoder's
//! asynchronous signals, tagged with its [`HandleId`], to the engine's queue.

use crate::chain::{self, ChainStrategy};
use crate::config::ChainingMode;
use crate::error::{PlaybackError, Result};
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    AudioStreamType, DecoderFactory, DecoderListener, DecoderSignal, Headers, MediaDecoder,
    MediaLocator, WakeMode,
};
use core_runtime::logging::describe_headers;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Identity of one handle, used to recognise stale signals and in log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(Uuid);

impl HandleId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First group is enough to tell handles apart in a log.
        let id = self.0.simple().to_string();
        f.write_str(&id[..8])
    }
}

/// Lifecycle of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Idle,
    Preparing,
    Prepared,
    Error,
}

/// Where a handle forwards decoder signals.
pub(crate) type SignalRouter = Arc<dyn Fn(HandleId, DecoderSignal) + Send + Sync>;

pub(crate) struct DecoderHandle {
    id: HandleId,
    decoder: Arc<dyn MediaDecoder>,
    chain: Box<dyn ChainStrategy>,
    state: HandleState,
    locator: Option<MediaLocator>,
    released: bool,
}

impl DecoderHandle {
    /// Allocate a decoder and wire its signals to `router`.
    pub(crate) fn create(
        factory: &dyn DecoderFactory,
        chaining: ChainingMode,
        router: &SignalRouter,
    ) -> Result<Self> {
        let decoder = factory.create()?;
        let chain = chain::select(chaining, decoder.as_ref());
        let id = HandleId::new();

        let router = Arc::clone(router);
        let listener: Arc<dyn DecoderListener> =
            Arc::new(move |signal: DecoderSignal| router(id, signal));
        decoder.set_listener(Some(listener));

        debug!(handle = %id, chaining = ?chain.mode(), "Created decoder handle");

        Ok(Self {
            id,
            decoder,
            chain,
            state: HandleState::Idle,
            locator: None,
            released: false,
        })
    }

    pub(crate) fn id(&self) -> HandleId {
        self.id
    }

    pub(crate) fn state(&self) -> HandleState {
        self.state
    }

    pub(crate) fn chaining(&self) -> ChainingMode {
        self.chain.mode()
    }

    /// Short name of the loaded locator, for logs.
    pub(crate) fn describe(&self) -> &str {
        self.locator
            .as_ref()
            .map(MediaLocator::display_name)
            .unwrap_or("<none>")
    }

    /// Reset, configure and synchronously prepare `locator`.
    ///
    /// Blocks on the platform's `prepare()`; only ever called on the worker.
    #[instrument(
        skip(self, locator, headers, session_id),
        fields(handle = %self.id, track = locator.display_name())
    )]
    pub(crate) fn open(
        &mut self,
        locator: &MediaLocator,
        headers: &Headers,
        session_id: i32,
    ) -> Result<()> {
        self.ensure_live()?;
        self.state = HandleState::Preparing;
        self.locator = Some(locator.clone());

        if !headers.is_empty() {
            debug!(headers = %describe_headers(headers), "Opening with headers");
        }

        match self.configure_and_prepare(locator, headers, session_id) {
            Ok(()) => {
                self.state = HandleState::Prepared;
                debug!("Prepared");
                Ok(())
            }
            Err(err) => {
                self.state = HandleState::Error;
                Err(PlaybackError::OpenFailed {
                    locator: locator.display_name().to_string(),
                    message: err.to_string(),
                })
            }
        }
    }

    fn configure_and_prepare(
        &self,
        locator: &MediaLocator,
        headers: &Headers,
        session_id: i32,
    ) -> BridgeResult<()> {
        self.decoder.reset()?;
        self.decoder.set_audio_stream_type(AudioStreamType::Music)?;
        self.decoder.set_wake_mode(WakeMode::Partial)?;
        self.decoder.set_audio_session_id(session_id)?;
        self.decoder.set_data_source(locator, headers)?;
        self.decoder.prepare()
    }

    /// Link this handle to the one that plays after it, or unlink with `None`.
    pub(crate) fn set_successor(&self, successor: Option<&DecoderHandle>) -> Result<()> {
        self.ensure_live()?;
        self.chain
            .link(&self.decoder, successor.map(|handle| &handle.decoder))?;
        Ok(())
    }

    /// Successor decoder that must be started by hand on completion.
    pub(crate) fn relay_target(&self) -> Option<Arc<dyn MediaDecoder>> {
        if self.released {
            return None;
        }
        self.chain.relay_target()
    }

    pub(crate) fn start(&self) -> Result<()> {
        self.ensure_live()?;
        Ok(self.decoder.start()?)
    }

    pub(crate) fn pause(&self) -> Result<()> {
        self.ensure_live()?;
        Ok(self.decoder.pause()?)
    }

    pub(crate) fn seek_to(&self, position_ms: i64) -> Result<()> {
        self.ensure_live()?;
        Ok(self.decoder.seek_to(position_ms)?)
    }

    pub(crate) fn set_volume(&self, volume: f32) -> Result<()> {
        self.ensure_live()?;
        Ok(self.decoder.set_volume(volume)?)
    }

    pub(crate) fn position_ms(&self) -> Result<i64> {
        self.ensure_live()?;
        Ok(self.decoder.position_ms()?)
    }

    pub(crate) fn duration_ms(&self) -> Result<i64> {
        self.ensure_live()?;
        Ok(self.decoder.duration_ms()?)
    }

    pub(crate) fn is_playing(&self) -> Result<bool> {
        self.ensure_live()?;
        Ok(self.decoder.is_playing()?)
    }

    /// Free the native decoder. Idempotent.
    pub(crate) fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.decoder.set_listener(None);
        self.decoder.release();
        debug!(handle = %self.id, track = self.describe(), "Released decoder handle");
    }

    fn ensure_live(&self) -> Result<()> {
        if self.released {
            return Err(PlaybackError::IllegalState(format!(
                "handle {} already released",
                self.id
            )));
        }
        Ok(())
    }
}

impl Drop for DecoderHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for DecoderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderHandle")
            .field("id", &self.id.to_string())
            .field("state", &self.state)
            .field("track", &self.describe())
            .field("chaining", &self.chain.mode())
            .field("released", &self.released)
            .finish()
    }
}
