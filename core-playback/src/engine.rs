//! Playback Engine facade.
//!
//! [`PlayerEngine`] is what hosts hold. It owns the worker runtime, the
//! handoff controller and the callback delegate, and maps each [`Player`]
//! operation either onto the worker queue (anything that opens media) or
//! onto a direct guarded call on the current decoder (transport controls and
//! queries).

use crate::config::EngineConfig;
use crate::delegate::CallbackDelegate;
use crate::error::{PlaybackError, Result};
use crate::handle::SignalRouter;
use crate::handoff::HandoffController;
use crate::queue::{Command, CommandSender, Worker};
use crate::traits::{Player, PlayerCallback};
use bridge_traits::{CallbackExecutor, Headers, MediaLocator};
use core_async::runtime::SerialRuntime;
use core_async::sync::{mpsc, watch, CancellationToken};
use core_runtime::config::CoreConfig;
use core_runtime::events::{EventBus, PlayerEvent, PlayerStatus, Receiver};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace};

/// Gapless dual-decoder player.
///
/// # Example
///
/// ```rust,no_run
/// use core_playback::{EngineConfig, Player, PlayerEngine};
/// use core_runtime::config::CoreConfig;
/// # use bridge_traits::DecoderFactory;
/// # use std::collections::HashMap;
/// # use std::sync::Arc;
/// # fn platform_factory() -> Arc<dyn DecoderFactory> { unimplemented!() }
///
/// # fn main() -> core_playback::Result<()> {
/// let core = CoreConfig::builder()
///     .decoder_factory(platform_factory())
///     .build()?;
/// let engine = PlayerEngine::new(core, EngineConfig::default())?;
///
/// engine.set_data_source("/music/01.flac".into(), HashMap::new());
/// engine.set_next_data_source("/music/02.flac".into());
/// engine.play();
/// # Ok(())
/// # }
/// ```
pub struct PlayerEngine {
    controller: Arc<HandoffController>,
    delegate: Arc<CallbackDelegate>,
    commands: CommandSender,
    shutdown: CancellationToken,
    worker: Mutex<Option<SerialRuntime>>,
    released: AtomicBool,
    audio_session_id: i32,
}

impl PlayerEngine {
    /// Start the worker thread and build an idle engine.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::Runtime`] or [`PlaybackError::InvalidConfig`]
    /// when either configuration is rejected, and [`PlaybackError::Internal`]
    /// if the worker thread cannot start.
    pub fn new(core: CoreConfig, config: EngineConfig) -> Result<Self> {
        core.validate()?;
        config.validate().map_err(PlaybackError::InvalidConfig)?;

        let bus = EventBus::new(core.event_buffer_size);
        let delegate = Arc::new(CallbackDelegate::new(bus, core.callback_executor.clone()));
        let (commands, inbox) = mpsc::unbounded_channel();

        let router: SignalRouter = {
            let commands = commands.clone();
            Arc::new(move |handle, signal| {
                if commands.send(Command::Signal { handle, signal }).is_err() {
                    trace!(%handle, ?signal, "Signal after shutdown dropped");
                }
            })
        };

        let audio_session_id = core.decoder_factory.audio_session_id();
        let controller = Arc::new(HandoffController::new(
            Arc::clone(&core.decoder_factory),
            config.chaining,
            router,
            Arc::clone(&delegate),
        ));

        let shutdown = CancellationToken::new();
        let worker = Worker::new(
            Arc::clone(&controller),
            commands.clone(),
            shutdown.clone(),
            &config,
        );
        let runtime = SerialRuntime::start(config.worker_thread_name.clone(), move || {
            worker.run(inbox)
        })
        .map_err(|e| PlaybackError::Internal(format!("failed to start playback worker: {}", e)))?;

        info!(
            worker = runtime.name(),
            decoder = core.decoder_factory.name(),
            chaining = ?config.chaining,
            audio_session_id,
            "Player engine started"
        );

        Ok(Self {
            controller,
            delegate,
            commands,
            shutdown,
            worker: Mutex::new(Some(runtime)),
            released: AtomicBool::new(false),
            audio_session_id,
        })
    }

    /// Queue the next track with request headers.
    pub fn set_next_data_source_with_headers(&self, locator: MediaLocator, headers: Headers) {
        self.ensure_live("set_next_data_source");
        self.post(Command::SetNextDataSource { locator, headers });
    }

    /// Subscribe to every [`PlayerEvent`] from now on.
    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        self.delegate.bus().subscribe()
    }

    /// Last status reported.
    pub fn status(&self) -> PlayerStatus {
        self.delegate.bus().last_status()
    }

    /// Watch the status; the receiver starts at the last known value.
    pub fn watch_status(&self) -> watch::Receiver<PlayerStatus> {
        self.delegate.bus().watch_status()
    }

    /// Audio session shared by every decoder of this engine.
    pub fn audio_session_id(&self) -> i32 {
        self.audio_session_id
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Whether a current and a queued track are loaded.
    pub fn has_tracks(&self) -> (bool, bool) {
        self.controller.loaded()
    }

    /// Block until every operation posted before this call has run.
    ///
    /// Returns `false` on timeout, after release, or when called from the
    /// worker thread itself (for instance from an inline callback). Meant for
    /// tests and tooling; playback never needs it.
    pub fn flush(&self, timeout: Duration) -> bool {
        if self.is_released() {
            return false;
        }
        let on_worker = self
            .worker
            .lock()
            .as_ref()
            .map_or(true, SerialRuntime::is_current_thread);
        if on_worker {
            debug!("flush() called from the worker thread; skipping");
            return false;
        }

        let (ack, done) = std_mpsc::sync_channel(1);
        if self.commands.send(Command::Flush(ack)).is_err() {
            return false;
        }
        done.recv_timeout(timeout).is_ok()
    }

    fn ensure_live(&self, operation: &str) {
        assert!(
            !self.is_released(),
            "PlayerEngine::{} called after release()",
            operation
        );
    }

    fn post(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("Worker gone; command dropped");
        }
    }
}

impl Player for PlayerEngine {
    fn set_data_source(&self, locator: MediaLocator, headers: Headers) {
        self.ensure_live("set_data_source");
        let epoch = self.controller.epoch();
        self.post(Command::SetDataSource {
            locator,
            headers,
            epoch,
        });
    }

    fn set_next_data_source(&self, locator: MediaLocator) {
        self.set_next_data_source_with_headers(locator, Headers::new());
    }

    fn play(&self) {
        self.ensure_live("play");
        self.controller.play();
    }

    fn pause(&self) {
        self.ensure_live("pause");
        self.controller.pause();
    }

    fn stop(&self) {
        self.ensure_live("stop");
        self.controller.stop();
    }

    fn seek_to(&self, position_ms: i64) -> bool {
        self.ensure_live("seek_to");
        self.controller.seek_to(position_ms)
    }

    fn skip_to_next(&self) {
        self.ensure_live("skip_to_next");
        self.post(Command::SkipToNext);
    }

    fn position_ms(&self) -> i64 {
        if self.is_released() {
            return -1;
        }
        self.controller.position_ms()
    }

    fn duration_ms(&self) -> i64 {
        if self.is_released() {
            return -1;
        }
        self.controller.duration_ms()
    }

    fn is_playing(&self) -> bool {
        !self.is_released() && self.controller.is_playing()
    }

    fn set_volume(&self, volume: f32) {
        self.ensure_live("set_volume");
        self.controller.set_volume(volume);
    }

    fn duck(&self, down: bool) {
        self.ensure_live("duck");
        self.post(Command::Duck { down });
    }

    fn set_callback(
        &self,
        callback: Option<Arc<dyn PlayerCallback>>,
        executor: Option<Arc<dyn CallbackExecutor>>,
    ) {
        self.delegate.set_callback(callback, executor);
    }

    fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            trace!("Player engine already released");
            return;
        }

        info!("Releasing player engine");
        self.controller.release();
        self.shutdown.cancel();

        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                error!("Playback worker panicked");
            }
        }
    }
}

impl Drop for PlayerEngine {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for PlayerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerEngine")
            .field("controller", &self.controller)
            .field("audio_session_id", &self.audio_session_id)
            .field("released", &self.is_released())
            .finish()
    }
}
