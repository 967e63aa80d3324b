//! # Core Playback Traits
//!
//! The public player contract and the notification interface hosts implement
//! to follow playback.
//!
//! ## Threading Model
//!
//! Operations that open media ([`Player::set_data_source`],
//! [`Player::set_next_data_source`], [`Player::skip_to_next`]) are posted to
//! the engine's worker thread and return immediately; their outcome arrives
//! through [`PlayerCallback`]. Transport controls and queries run on the
//! calling thread and only hold the engine's guard for the duration of one
//! platform call.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use bridge_traits::MediaLocator;
//! use core_playback::{Player, PlayerCallback};
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! struct NowPlaying;
//!
//! impl PlayerCallback for NowPlaying {
//!     fn on_ready(&self) {
//!         println!("ready");
//!     }
//!
//!     fn on_error_open_current_failed(&self, message: &str) {
//!         eprintln!("cannot play: {message}");
//!     }
//! }
//!
//! fn start(player: &impl Player) {
//!     player.set_callback(Some(Arc::new(NowPlaying)), None);
//!     player.set_data_source(MediaLocator::from("/music/intro.flac"), HashMap::new());
//!     player.set_next_data_source(MediaLocator::from("/music/track2.flac"));
//!     player.play();
//! }
//! ```

use bridge_traits::{CallbackExecutor, Headers, MediaLocator};
use std::sync::Arc;

/// Notifications delivered to the host.
///
/// Every method has an empty default so hosts only implement what they
/// display. Calls arrive on the execution context passed to
/// [`Player::set_callback`], or inline on the engine thread that produced
/// them when none was given.
#[cfg_attr(test, mockall::automock)]
pub trait PlayerCallback: Send + Sync {
    /// A new current track is being opened.
    fn on_loading(&self) {}

    /// The current track is prepared.
    fn on_ready(&self) {}

    fn on_playing(&self) {}

    fn on_paused(&self) {}

    /// Playback stopped: explicitly, at the end of the last track, or because
    /// the decoder was lost.
    fn on_stopped(&self) {}

    /// The queued next track became current.
    fn on_went_to_next(&self) {}

    fn on_error_open_current_failed(&self, message: &str) {
        let _ = message;
    }

    fn on_error_open_next_failed(&self, message: &str) {
        let _ = message;
    }
}

/// Gapless player contract.
///
/// Calling a mutating operation after [`release`](Player::release) is a
/// programming error and panics. Queries after release return `-1`/`false`.
pub trait Player: Send + Sync {
    /// Replace the current track. Releases any current and queued track,
    /// then reports `on_loading` followed by `on_ready` or
    /// `on_error_open_current_failed`.
    fn set_data_source(&self, locator: MediaLocator, headers: Headers);

    /// Queue the track that follows the current one without a gap.
    ///
    /// Only failure is reported (`on_error_open_next_failed`). Ignored when
    /// no current track is loaded.
    fn set_next_data_source(&self, locator: MediaLocator);

    fn play(&self);

    fn pause(&self);

    /// Release both tracks and report `on_stopped`.
    fn stop(&self);

    /// Returns whether the decoder accepted the seek.
    fn seek_to(&self, position_ms: i64) -> bool;

    /// Jump to the queued track now, or stop when nothing is queued.
    fn skip_to_next(&self);

    /// Current position in milliseconds, `-1` when unknown.
    fn position_ms(&self) -> i64;

    /// Duration of the current track in milliseconds, `-1` when unknown.
    fn duration_ms(&self) -> i64;

    fn is_playing(&self) -> bool;

    /// Set the output volume of the current track, `0.0..=1.0`.
    fn set_volume(&self, volume: f32);

    /// Fade down to the duck floor (`true`) or back up to full volume
    /// (`false`).
    fn duck(&self, down: bool);

    /// Replace the notification sink. `executor` chooses where callbacks run.
    fn set_callback(
        &self,
        callback: Option<Arc<dyn PlayerCallback>>,
        executor: Option<Arc<dyn CallbackExecutor>>,
    );

    /// Tear the engine down. Idempotent.
    fn release(&self);
}
