//! # Gapless Playback Example
//!
//! Plays a short queue through `PlayerEngine` using a simulated platform
//! decoder whose tracks last a fraction of a second, and prints every
//! notification as it arrives.
//!
//! Run with: `cargo run --example playback_demo --package core-playback`

use bridge_traits::error::{BridgeError, Result};
use bridge_traits::logging::LogLevel;
use bridge_traits::{
    AudioStreamType, DecoderFactory, DecoderListener, DecoderSignal, Headers, MediaDecoder,
    MediaLocator, WakeMode,
};
use core_playback::{EngineConfig, Player, PlayerCallback, PlayerEngine};
use core_runtime::config::CoreConfig;
use core_runtime::logging::{init_logging, LoggingConfig};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

// ============================================================================
// Simulated Platform Decoder
// ============================================================================

struct SimulatedDecoder {
    length: Duration,
    source: Mutex<Option<String>>,
    started_at: Mutex<Option<Instant>>,
    /// Bumped on every start/pause/release so stale end timers do nothing.
    run: Arc<AtomicU64>,
    released: AtomicBool,
    listener: Mutex<Option<Arc<dyn DecoderListener>>>,
}

impl SimulatedDecoder {
    fn new(length: Duration) -> Arc<Self> {
        Arc::new(Self {
            length,
            source: Mutex::new(None),
            started_at: Mutex::new(None),
            run: Arc::new(AtomicU64::new(0)),
            released: AtomicBool::new(false),
            listener: Mutex::new(None),
        })
    }

    fn live(&self) -> Result<()> {
        if self.released.load(Ordering::SeqCst) {
            return Err(BridgeError::IllegalState("released".to_string()));
        }
        Ok(())
    }
}

impl MediaDecoder for SimulatedDecoder {
    fn reset(&self) -> Result<()> {
        self.live()
    }

    fn set_audio_stream_type(&self, _: AudioStreamType) -> Result<()> {
        self.live()
    }

    fn set_wake_mode(&self, _: WakeMode) -> Result<()> {
        self.live()
    }

    fn set_audio_session_id(&self, _: i32) -> Result<()> {
        self.live()
    }

    fn set_data_source(&self, locator: &MediaLocator, _: &Headers) -> Result<()> {
        self.live()?;
        *self.source.lock() = Some(locator.to_string());
        Ok(())
    }

    fn prepare(&self) -> Result<()> {
        self.live()?;
        thread::sleep(Duration::from_millis(30));
        match self.source.lock().as_deref() {
            Some(source) if source.ends_with(".wma") => {
                Err(BridgeError::Unsupported("WMA codec".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn start(&self) -> Result<()> {
        self.live()?;
        *self.started_at.lock() = Some(Instant::now());
        let run = self.run.fetch_add(1, Ordering::SeqCst) + 1;

        let length = self.length;
        let listener = self.listener.lock().clone();
        let runs = Arc::clone(&self.run);
        thread::spawn(move || {
            thread::sleep(length);
            if runs.load(Ordering::SeqCst) == run {
                if let Some(listener) = listener {
                    listener.on_signal(DecoderSignal::Completion);
                }
            }
        });
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        self.live()?;
        self.run.fetch_add(1, Ordering::SeqCst);
        *self.started_at.lock() = None;
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        self.pause()
    }

    fn seek_to(&self, _: i64) -> Result<()> {
        self.live()
    }

    fn set_volume(&self, _: f32) -> Result<()> {
        self.live()
    }

    fn duration_ms(&self) -> Result<i64> {
        self.live()?;
        Ok(self.length.as_millis() as i64)
    }

    fn position_ms(&self) -> Result<i64> {
        self.live()?;
        Ok(self
            .started_at
            .lock()
            .map_or(0, |at| at.elapsed().as_millis() as i64))
    }

    fn is_playing(&self) -> Result<bool> {
        self.live()?;
        Ok(self.started_at.lock().is_some())
    }

    fn set_listener(&self, listener: Option<Arc<dyn DecoderListener>>) {
        *self.listener.lock() = listener;
    }

    fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
        self.run.fetch_add(1, Ordering::SeqCst);
    }
}

struct SimulatedFactory;

impl DecoderFactory for SimulatedFactory {
    fn create(&self) -> Result<Arc<dyn MediaDecoder>> {
        Ok(SimulatedDecoder::new(Duration::from_millis(400)))
    }

    fn audio_session_id(&self) -> i32 {
        1
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

// ============================================================================
// Host Callback
// ============================================================================

struct ConsolePrinter {
    done: Mutex<mpsc::Sender<()>>,
}

impl PlayerCallback for ConsolePrinter {
    fn on_loading(&self) {
        println!("  ⏳ loading");
    }

    fn on_ready(&self) {
        println!("  ✓ ready");
    }

    fn on_playing(&self) {
        println!("  ▶ playing");
    }

    fn on_went_to_next(&self) {
        println!("  ⏭ went to next track (gapless)");
    }

    fn on_stopped(&self) {
        println!("  ⏹ stopped");
        let _ = self.done.lock().send(());
    }

    fn on_error_open_current_failed(&self, message: &str) {
        println!("  ✗ cannot open track: {}", message);
    }

    fn on_error_open_next_failed(&self, message: &str) {
        println!("  ✗ cannot queue next track: {}", message);
    }
}

fn main() -> core_playback::Result<()> {
    init_logging(LoggingConfig::default().with_level(LogLevel::Warn))?;

    println!("=== Gapless Playback Demo ===\n");

    let core = CoreConfig::builder()
        .decoder_factory(Arc::new(SimulatedFactory))
        .build()?;
    let engine = PlayerEngine::new(core, EngineConfig::default())?;

    let (done_tx, done_rx) = mpsc::channel();
    let printer: Arc<dyn PlayerCallback> = Arc::new(ConsolePrinter {
        done: Mutex::new(done_tx),
    });
    engine.set_callback(Some(printer), None);

    println!("Queueing an unsupported track as next:");
    engine.set_data_source(MediaLocator::from("/music/01-intro.flac"), HashMap::new());
    engine.set_next_data_source(MediaLocator::from("/music/02-legacy.wma"));
    engine.flush(Duration::from_secs(2));

    println!("\nQueueing the real next track and playing:");
    engine.set_next_data_source(MediaLocator::from("/music/02-theme.flac"));
    engine.flush(Duration::from_secs(2));
    engine.play();

    // Queue the third track as soon as the second becomes current.
    thread::sleep(Duration::from_millis(450));
    engine.set_next_data_source(MediaLocator::from("/music/03-outro.flac"));

    let _ = done_rx.recv_timeout(Duration::from_secs(5));
    println!("\nFinal status: {:?}", engine.status());

    engine.release();
    println!("\n=== Demo Complete ===");
    Ok(())
}
