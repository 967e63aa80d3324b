//! Shared fixtures: an in-memory platform decoder and a recording callback.

#![allow(dead_code)]

use bridge_traits::error::{BridgeError, Result};
use bridge_traits::{
    AudioStreamType, DecoderFactory, DecoderListener, DecoderSignal, Headers, MediaDecoder,
    MediaLocator, WakeMode,
};
use core_playback::{EngineConfig, Player, PlayerCallback, PlayerEngine};
use core_runtime::config::CoreConfig;
use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const WAIT: Duration = Duration::from_secs(2);
pub const TRACK_DURATION_MS: i64 = 200_000;

// ============================================================================
// Fake platform decoder
// ============================================================================

pub struct FakeDecoder {
    native: bool,
    source: Mutex<Option<String>>,
    playing: AtomicBool,
    position: AtomicI64,
    starts: AtomicUsize,
    volumes: Mutex<Vec<f32>>,
    released: AtomicBool,
    lost: AtomicBool,
    listener: Mutex<Option<Arc<dyn DecoderListener>>>,
    /// Survives release, to simulate a platform signal that arrives late.
    last_listener: Mutex<Option<Arc<dyn DecoderListener>>>,
    next: Mutex<Option<Arc<dyn MediaDecoder>>>,
    factory: Arc<Shared>,
}

impl FakeDecoder {
    pub fn source(&self) -> Option<String> {
        self.source.lock().clone()
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    pub fn volumes(&self) -> Vec<f32> {
        self.volumes.lock().clone()
    }

    pub fn set_position(&self, position_ms: i64) {
        self.position.store(position_ms, Ordering::SeqCst);
    }

    pub fn has_native_next(&self) -> bool {
        self.next.lock().is_some()
    }

    /// Every further call fails with `IllegalState`.
    pub fn lose(&self) {
        self.lost.store(true, Ordering::SeqCst);
    }

    /// Play to the end. A natively chained successor starts before the
    /// completion signal goes out, as the platform does it.
    pub fn complete(&self) {
        self.playing.store(false, Ordering::SeqCst);
        let next = self.next.lock().take();
        if let Some(next) = next {
            let _ = next.start();
        }
        self.fire(DecoderSignal::Completion);
    }

    pub fn fire(&self, signal: DecoderSignal) {
        let listener = self.listener.lock().clone();
        if let Some(listener) = listener {
            listener.on_signal(signal);
        }
    }

    pub fn fire_late(&self, signal: DecoderSignal) {
        let listener = self.last_listener.lock().clone();
        if let Some(listener) = listener {
            listener.on_signal(signal);
        }
    }

    fn check(&self) -> Result<()> {
        if self.lost.load(Ordering::SeqCst) || self.is_released() {
            return Err(BridgeError::IllegalState("decoder lost".to_string()));
        }
        Ok(())
    }
}

impl MediaDecoder for FakeDecoder {
    fn reset(&self) -> Result<()> {
        self.check()?;
        *self.source.lock() = None;
        Ok(())
    }

    fn set_audio_stream_type(&self, _stream_type: AudioStreamType) -> Result<()> {
        self.check()
    }

    fn set_wake_mode(&self, _mode: WakeMode) -> Result<()> {
        self.check()
    }

    fn set_audio_session_id(&self, _session_id: i32) -> Result<()> {
        self.check()
    }

    fn set_data_source(&self, locator: &MediaLocator, _headers: &Headers) -> Result<()> {
        self.check()?;
        *self.source.lock() = Some(locator.to_string());
        Ok(())
    }

    fn prepare(&self) -> Result<()> {
        self.check()?;
        let delay = *self.factory.prepare_delay.lock();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        let source = self.source().unwrap_or_default();
        if self.factory.failing.lock().contains(&source) {
            return Err(BridgeError::OperationFailed(format!(
                "prepare failed for {}",
                source
            )));
        }
        Ok(())
    }

    fn start(&self) -> Result<()> {
        self.check()?;
        self.playing.store(true, Ordering::SeqCst);
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        self.check()?;
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        self.check()?;
        self.playing.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn seek_to(&self, position_ms: i64) -> Result<()> {
        self.check()?;
        self.set_position(position_ms);
        Ok(())
    }

    fn set_volume(&self, volume: f32) -> Result<()> {
        self.check()?;
        self.volumes.lock().push(volume);
        Ok(())
    }

    fn duration_ms(&self) -> Result<i64> {
        self.check()?;
        Ok(TRACK_DURATION_MS)
    }

    fn position_ms(&self) -> Result<i64> {
        self.check()?;
        Ok(self.position.load(Ordering::SeqCst))
    }

    fn is_playing(&self) -> Result<bool> {
        self.check()?;
        Ok(self.playing.load(Ordering::SeqCst))
    }

    fn supports_next_decoder(&self) -> bool {
        self.native
    }

    fn set_next_decoder(&self, next: Option<Arc<dyn MediaDecoder>>) -> Result<()> {
        if !self.native {
            return Err(BridgeError::NotAvailable("chaining".to_string()));
        }
        self.check()?;
        *self.next.lock() = next;
        Ok(())
    }

    fn set_listener(&self, listener: Option<Arc<dyn DecoderListener>>) {
        if listener.is_some() {
            *self.last_listener.lock() = listener.clone();
        }
        *self.listener.lock() = listener;
    }

    fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        self.playing.store(false, Ordering::SeqCst);
        self.next.lock().take();
        self.factory.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct Shared {
    failing: Mutex<HashSet<String>>,
    prepare_delay: Mutex<Duration>,
    live: AtomicUsize,
    max_live: AtomicUsize,
}

pub struct FakeFactory {
    native: bool,
    shared: Arc<Shared>,
    created: Mutex<Vec<Arc<FakeDecoder>>>,
}

impl FakeFactory {
    pub fn native() -> Arc<Self> {
        Self::build(true)
    }

    pub fn relay() -> Arc<Self> {
        Self::build(false)
    }

    fn build(native: bool) -> Arc<Self> {
        Arc::new(Self {
            native,
            shared: Arc::new(Shared::default()),
            created: Mutex::new(Vec::new()),
        })
    }

    /// Make `prepare()` fail for `locator`.
    pub fn fail(&self, locator: &str) {
        self.shared.failing.lock().insert(locator.to_string());
    }

    pub fn set_prepare_delay(&self, delay: Duration) {
        *self.shared.prepare_delay.lock() = delay;
    }

    /// Most recent decoder opened on `locator`.
    pub fn decoder_for(&self, locator: &str) -> Arc<FakeDecoder> {
        self.created
            .lock()
            .iter()
            .rev()
            .find(|decoder| decoder.source().as_deref() == Some(locator))
            .cloned()
            .unwrap_or_else(|| panic!("no decoder opened on {}", locator))
    }

    pub fn created(&self) -> usize {
        self.created.lock().len()
    }

    pub fn live(&self) -> usize {
        self.shared.live.load(Ordering::SeqCst)
    }

    pub fn max_live(&self) -> usize {
        self.shared.max_live.load(Ordering::SeqCst)
    }
}

impl DecoderFactory for FakeFactory {
    fn create(&self) -> Result<Arc<dyn MediaDecoder>> {
        let live = self.shared.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.max_live.fetch_max(live, Ordering::SeqCst);

        let decoder = Arc::new(FakeDecoder {
            native: self.native,
            source: Mutex::new(None),
            playing: AtomicBool::new(false),
            position: AtomicI64::new(0),
            starts: AtomicUsize::new(0),
            volumes: Mutex::new(Vec::new()),
            released: AtomicBool::new(false),
            lost: AtomicBool::new(false),
            listener: Mutex::new(None),
            last_listener: Mutex::new(None),
            next: Mutex::new(None),
            factory: Arc::clone(&self.shared),
        });
        self.created.lock().push(Arc::clone(&decoder));
        Ok(decoder)
    }

    fn audio_session_id(&self) -> i32 {
        17
    }

    fn name(&self) -> &str {
        "fake-decoder"
    }
}

// ============================================================================
// Recording callback
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Note {
    Loading,
    Ready,
    Playing,
    Paused,
    Stopped,
    WentToNext,
    OpenCurrentFailed(String),
    OpenNextFailed(String),
}

#[derive(Default)]
pub struct Recorder {
    notes: Mutex<Vec<Note>>,
    changed: Condvar,
}

impl Recorder {
    fn push(&self, note: Note) {
        self.notes.lock().push(note);
        self.changed.notify_all();
    }

    pub fn notes(&self) -> Vec<Note> {
        self.notes.lock().clone()
    }

    pub fn count(&self, wanted: &Note) -> usize {
        self.notes.lock().iter().filter(|note| *note == wanted).count()
    }

    pub fn has(&self, predicate: impl Fn(&Note) -> bool) -> bool {
        self.notes.lock().iter().any(predicate)
    }

    /// Wait until a note matching `predicate` was recorded.
    pub fn wait_for(&self, predicate: impl Fn(&Note) -> bool) -> bool {
        let deadline = Instant::now() + WAIT;
        let mut notes = self.notes.lock();
        while !notes.iter().any(&predicate) {
            if self.changed.wait_until(&mut notes, deadline).timed_out() {
                return notes.iter().any(&predicate);
            }
        }
        true
    }
}

impl PlayerCallback for Recorder {
    fn on_loading(&self) {
        self.push(Note::Loading);
    }

    fn on_ready(&self) {
        self.push(Note::Ready);
    }

    fn on_playing(&self) {
        self.push(Note::Playing);
    }

    fn on_paused(&self) {
        self.push(Note::Paused);
    }

    fn on_stopped(&self) {
        self.push(Note::Stopped);
    }

    fn on_went_to_next(&self) {
        self.push(Note::WentToNext);
    }

    fn on_error_open_current_failed(&self, message: &str) {
        self.push(Note::OpenCurrentFailed(message.to_string()));
    }

    fn on_error_open_next_failed(&self, message: &str) {
        self.push(Note::OpenNextFailed(message.to_string()));
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub fn engine_with(factory: &Arc<FakeFactory>, config: EngineConfig) -> (PlayerEngine, Arc<Recorder>) {
    let core = CoreConfig::builder()
        .decoder_factory(factory.clone())
        .build()
        .expect("valid core config");
    let engine = PlayerEngine::new(core, config).expect("engine starts");

    let recorder = Arc::new(Recorder::default());
    let callback: Arc<dyn PlayerCallback> = recorder.clone();
    engine.set_callback(Some(callback), None);
    (engine, recorder)
}

pub fn engine(factory: &Arc<FakeFactory>) -> (PlayerEngine, Arc<Recorder>) {
    engine_with(factory, EngineConfig::quiet())
}

pub fn flush(engine: &PlayerEngine) {
    assert!(engine.flush(WAIT), "worker did not drain in time");
}

/// Poll `condition` until it holds or the wait budget runs out.
pub fn eventually(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
