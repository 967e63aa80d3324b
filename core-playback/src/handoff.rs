//! Gapless Handoff Controller.
//!
//! Owns the `current` and `next` [`DecoderHandle`] slots behind one coarse
//! guard and drives every transition between them: opening the current track,
//! preparing and linking the next one, promoting next to current on
//! completion or skip, and tearing both down on stop, error or release.
//!
//! Rules every method follows:
//!
//! - At most two handles exist; the old `next` is released before a new one is
//!   created, and a promoted `current` is released before `next` takes its
//!   place.
//! - Platform `prepare()` runs without the guard held. The result is only
//!   installed if no `stop`/`release` happened meanwhile (tracked by an epoch
//!   counter) and, for the next track, if `current` is still the handle it was
//!   prepared for. Only a caller `stop`/`release` moves the epoch; stops the
//!   worker triggers itself leave it alone so later queued opens still run.
//! - The supersession check and `on_loading` happen under the same gate as a
//!   caller `stop`, so a host never sees `Loading` after the `Stopped` that
//!   cancelled it.
//! - Host notifications are always emitted after the guard is dropped, since
//!   an inline callback may call straight back into the engine.

use crate::config::ChainingMode;
use crate::delegate::CallbackDelegate;
use crate::error::{PlaybackError, Result};
use crate::handle::{DecoderHandle, HandleId, HandleState, SignalRouter};
use bridge_traits::{DecoderFactory, DecoderSignal, Headers, MediaLocator};
use core_runtime::events::PlayerEvent;
use parking_lot::{Mutex, MutexGuard, ReentrantMutex};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

#[derive(Default)]
struct Slots {
    current: Option<DecoderHandle>,
    next: Option<DecoderHandle>,
}

impl Slots {
    fn current_id(&self) -> Option<HandleId> {
        self.current.as_ref().map(DecoderHandle::id)
    }

    fn release_next(&mut self) {
        if let Some(mut next) = self.next.take() {
            next.release();
        }
    }

    fn release_all(&mut self) {
        self.release_next();
        if let Some(mut current) = self.current.take() {
            current.release();
        }
    }
}

/// What the worker must do after a decoder signal was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SignalOutcome {
    Handled,
    /// Start the successor by hand after the configured delay.
    RelayAfterDelay,
}

pub(crate) struct HandoffController {
    slots: Mutex<Slots>,
    factory: Arc<dyn DecoderFactory>,
    chaining: ChainingMode,
    router: SignalRouter,
    delegate: Arc<CallbackDelegate>,
    epoch: AtomicU64,
    /// Serializes a caller stop against the start of an open. Reentrant so an
    /// inline callback may call `stop` from inside `on_loading`.
    stop_gate: ReentrantMutex<()>,
    released: AtomicBool,
}

impl HandoffController {
    pub(crate) fn new(
        factory: Arc<dyn DecoderFactory>,
        chaining: ChainingMode,
        router: SignalRouter,
        delegate: Arc<CallbackDelegate>,
    ) -> Self {
        Self {
            slots: Mutex::new(Slots::default()),
            factory,
            chaining,
            router,
            delegate,
            epoch: AtomicU64::new(0),
            stop_gate: ReentrantMutex::new(()),
            released: AtomicBool::new(false),
        }
    }

    /// Counter bumped by every caller stop and by release.
    pub(crate) fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    fn superseded(&self, epoch: u64) -> bool {
        self.is_released() || self.epoch() != epoch
    }

    fn open_handle(&self, locator: &MediaLocator, headers: &Headers) -> Result<DecoderHandle> {
        let mut handle = DecoderHandle::create(self.factory.as_ref(), self.chaining, &self.router)?;
        handle.open(locator, headers, self.factory.audio_session_id())?;
        Ok(handle)
    }

    // ========================================================================
    // Worker operations
    // ========================================================================

    /// Replace the current track. `epoch` is the counter value observed when
    /// the request was made; a stop issued since then wins.
    pub(crate) fn set_data_source(&self, locator: MediaLocator, headers: Headers, epoch: u64) {
        {
            let _gate = self.stop_gate.lock();
            if self.superseded(epoch) {
                debug!(track = locator.display_name(), "Open request superseded by stop");
                return;
            }

            self.slots.lock().release_all();
            info!(
                track = locator.display_name(),
                remote = locator.is_remote(),
                decoder = self.factory.name(),
                "Opening track"
            );
            self.delegate.on_loading();
        }

        let handle = match self.open_handle(&locator, &headers) {
            Ok(handle) => handle,
            Err(err) => {
                if self.superseded(epoch) {
                    debug!(%err, "Open failed after stop; not reporting");
                    return;
                }
                warn!(track = locator.display_name(), %err, "Failed to open track");
                self.delegate.on_error_open_current_failed(err.to_string());
                return;
            }
        };

        let duration_ms = handle.duration_ms().unwrap_or(-1);
        {
            let mut slots = self.slots.lock();
            if self.superseded(epoch) {
                debug!(handle = %handle.id(), "Stopped while preparing; discarding");
                drop(slots);
                drop(handle);
                return;
            }
            slots.release_all();
            slots.current = Some(handle);
        }

        self.delegate.on_ready();
        self.delegate.publish(PlayerEvent::Duration { duration_ms });
    }

    /// Prepare `locator` as the gapless successor of the current track.
    pub(crate) fn set_next_data_source(&self, locator: MediaLocator, headers: Headers) {
        let current_id = {
            let mut slots = self.slots.lock();
            let Some(current) = slots.current.as_ref() else {
                warn!(
                    track = locator.display_name(),
                    "No current track; ignoring next track"
                );
                return;
            };
            if let Err(err) = current.set_successor(None) {
                warn!(%err, "Failed to unlink previous next track");
            }
            let id = current.id();
            slots.release_next();
            id
        };

        let next = match self.open_handle(&locator, &headers) {
            Ok(next) => next,
            Err(err) => {
                warn!(track = locator.display_name(), %err, "Failed to open next track");
                self.delegate.on_error_open_next_failed(err.to_string());
                return;
            }
        };

        let mut slots = self.slots.lock();
        let Some(current) = slots.current.as_ref().filter(|c| c.id() == current_id) else {
            debug!(handle = %next.id(), "Current track changed while preparing next; discarding");
            return;
        };

        if let Err(err) = current.set_successor(Some(&next)) {
            warn!(%err, "Failed to link next track");
            drop(slots);
            drop(next);
            self.delegate.on_error_open_next_failed(err.to_string());
            return;
        }

        info!(
            current = %current_id,
            next = %next.id(),
            track = next.describe(),
            chaining = ?next.chaining(),
            "Next track linked"
        );
        slots.next = Some(next);
    }

    /// React to a signal raised by the decoder of handle `id`.
    pub(crate) fn on_signal(&self, id: HandleId, signal: DecoderSignal) -> SignalOutcome {
        match signal {
            DecoderSignal::Completion => self.on_completion(id),
            DecoderSignal::Error { what, extra } => {
                self.on_decoder_error(id, what, extra, signal.is_server_died());
                SignalOutcome::Handled
            }
        }
    }

    fn on_completion(&self, id: HandleId) -> SignalOutcome {
        let mut slots = self.slots.lock();
        if slots.current_id() != Some(id) {
            debug!(handle = %id, "Completion from inactive decoder ignored");
            return SignalOutcome::Handled;
        }

        if slots.next.is_none() {
            slots.release_all();
            drop(slots);
            info!("Reached end of last track");
            self.delegate.on_stopped();
            return SignalOutcome::Handled;
        }

        let relay = slots
            .current
            .as_ref()
            .is_some_and(|current| current.chaining() == ChainingMode::Relay);
        if relay {
            trace!(handle = %id, "Completion; successor starts after relay delay");
            return SignalOutcome::RelayAfterDelay;
        }

        self.promote(slots);
        SignalOutcome::Handled
    }

    /// Start the relayed successor of handle `id` and promote it.
    pub(crate) fn relay_start(&self, id: HandleId) {
        let mut slots = self.slots.lock();
        if slots.current_id() != Some(id) {
            debug!(handle = %id, "Relay superseded");
            return;
        }
        if slots.next.is_none() {
            // The queued track went away during the delay.
            slots.release_all();
            drop(slots);
            info!("Next track gone at relay time; stopping");
            self.delegate.on_stopped();
            return;
        }

        let target = slots.current.as_ref().and_then(DecoderHandle::relay_target);
        let started = match target {
            Some(decoder) => decoder.start().map_err(PlaybackError::from),
            None => Err(PlaybackError::IllegalState(
                "relay successor already released".to_string(),
            )),
        };

        match started {
            Ok(()) => self.promote(slots),
            Err(err) => {
                warn!(%err, "Failed to start next track");
                slots.release_all();
                drop(slots);
                self.delegate.on_stopped();
            }
        }
    }

    fn on_decoder_error(&self, id: HandleId, what: i32, extra: i32, server_died: bool) {
        let mut slots = self.slots.lock();
        if slots.current_id() != Some(id) {
            warn!(handle = %id, what, extra, "Error from inactive decoder ignored");
            return;
        }

        error!(handle = %id, what, extra, server_died, "Decoder error; releasing tracks");
        slots.release_all();
        drop(slots);
        self.delegate.on_stopped();
    }

    /// Make `next` the current track. Consumes the guard so notifications go
    /// out unlocked.
    fn promote(&self, mut slots: MutexGuard<'_, Slots>) {
        let Some(next) = slots.next.take() else {
            return;
        };
        debug_assert_eq!(next.state(), HandleState::Prepared);
        if let Some(mut previous) = slots.current.take() {
            previous.release();
        }

        let duration_ms = next.duration_ms().unwrap_or(-1);
        info!(handle = %next.id(), track = next.describe(), "Went to next track");
        slots.current = Some(next);
        drop(slots);

        self.delegate.on_went_to_next();
        self.delegate.publish(PlayerEvent::Duration { duration_ms });
    }

    /// Jump to the queued track now, or stop when nothing is queued.
    pub(crate) fn skip_to_next(&self) {
        let mut slots = self.slots.lock();
        let Some(next) = slots.next.take() else {
            drop(slots);
            debug!("Nothing queued; skip stops playback");
            self.stop_tracks();
            return;
        };

        if let Some(mut previous) = slots.current.take() {
            previous.release();
        }

        if let Err(err) = next.start() {
            warn!(%err, "Failed to start skipped-to track");
            drop(next);
            drop(slots);
            self.delegate.on_stopped();
            return;
        }

        let duration_ms = next.duration_ms().unwrap_or(-1);
        info!(handle = %next.id(), track = next.describe(), "Skipped to next track");
        slots.current = Some(next);
        drop(slots);

        self.delegate.on_went_to_next();
        self.delegate.publish(PlayerEvent::Duration { duration_ms });
    }

    // ========================================================================
    // Caller-thread operations
    // ========================================================================

    /// Release both tracks and report `on_stopped`. Open requests issued
    /// before this call are dropped.
    pub(crate) fn stop(&self) {
        let _gate = self.stop_gate.lock();
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.stop_tracks();
    }

    fn stop_tracks(&self) {
        self.slots.lock().release_all();
        info!("Playback stopped");
        self.delegate.on_stopped();
    }

    /// Release both tracks without notifying. Idempotent.
    pub(crate) fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.slots.lock().release_all();
    }

    pub(crate) fn play(&self) {
        if self.with_current("play", DecoderHandle::start).is_some() {
            self.delegate.on_playing();
        }
    }

    pub(crate) fn pause(&self) {
        if self.with_current("pause", DecoderHandle::pause).is_some() {
            self.delegate.on_paused();
        }
    }

    pub(crate) fn seek_to(&self, position_ms: i64) -> bool {
        self.with_current("seek", |current| current.seek_to(position_ms))
            .is_some()
    }

    pub(crate) fn set_volume(&self, volume: f32) {
        let volume = if (0.0..=1.0).contains(&volume) {
            volume
        } else {
            warn!(error = %PlaybackError::InvalidVolume(volume), "Clamping volume");
            volume.clamp(0.0, 1.0)
        };
        self.with_current("set_volume", |current| current.set_volume(volume));
    }

    pub(crate) fn position_ms(&self) -> i64 {
        self.with_current("position", DecoderHandle::position_ms)
            .unwrap_or(-1)
    }

    pub(crate) fn duration_ms(&self) -> i64 {
        self.with_current("duration", DecoderHandle::duration_ms)
            .unwrap_or(-1)
    }

    pub(crate) fn is_playing(&self) -> bool {
        self.with_current("is_playing", DecoderHandle::is_playing)
            .unwrap_or(false)
    }

    /// Publish the playback position if the current track is playing.
    pub(crate) fn report_position(&self) {
        let position = self
            .with_current("position tick", |current| {
                if current.is_playing()? {
                    current.position_ms().map(Some)
                } else {
                    Ok(None)
                }
            })
            .flatten();

        if let Some(position_ms) = position {
            self.delegate.publish(PlayerEvent::Position { position_ms });
        }
    }

    /// Whether a current and a next track are loaded, for diagnostics.
    pub(crate) fn loaded(&self) -> (bool, bool) {
        let slots = self.slots.lock();
        (slots.current.is_some(), slots.next.is_some())
    }

    /// Run `operation` against the current handle under the guard.
    ///
    /// An illegal-state failure means the decoder is lost: both tracks are
    /// released and `on_stopped` is reported. Other failures are logged.
    fn with_current<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&DecoderHandle) -> Result<T>,
    ) -> Option<T> {
        let mut slots = self.slots.lock();
        let result = match slots.current.as_ref() {
            Some(current) => f(current),
            None => {
                trace!(operation, error = %PlaybackError::NoTrackLoaded, "Ignored");
                return None;
            }
        };

        match result {
            Ok(value) => Some(value),
            Err(err) if err.is_illegal_state() => {
                warn!(operation, %err, "Decoder in illegal state; releasing tracks");
                slots.release_all();
                drop(slots);
                self.delegate.on_stopped();
                None
            }
            Err(err) => {
                warn!(operation, %err, "Decoder call failed");
                None
            }
        }
    }
}

impl fmt::Debug for HandoffController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (current, next) = self.loaded();
        f.debug_struct("HandoffController")
            .field("decoder", &self.factory.name())
            .field("chaining", &self.chaining)
            .field("current", &current)
            .field("next", &next)
            .field("epoch", &self.epoch())
            .finish()
    }
}
