//! # Gapless Playback Module
//!
//! Drives platform decoders so consecutive tracks play back to back without
//! an audible gap.
//!
//! ## Overview
//!
//! This module handles:
//! - Two decoder slots, `current` and `next`, with the next track prepared
//!   while the current one plays
//! - Successor chaining: native where the platform supports it, a manual
//!   relay after a short delay where it does not
//! - Volume ducking with stepped fades
//! - Delivering notifications to the host on its chosen execution context
//!   and on the [`EventBus`](core_runtime::events::EventBus)
//!
//! Everything that opens media runs on one dedicated worker thread. See
//! [`traits`] for the threading contract.

mod chain;
pub mod config;
pub mod delegate;
pub mod engine;
pub mod error;
mod fade;
mod handle;
mod handoff;
mod queue;
pub mod traits;

pub use config::{ChainingMode, EngineConfig, FadeConfig};
pub use delegate::TokioExecutor;
pub use engine::PlayerEngine;
pub use error::{PlaybackError, Result};
pub use fade::FadeDirection;
pub use handle::{HandleId, HandleState};
pub use traits::{Player, PlayerCallback};

pub use core_runtime::events::{PlayerEvent, PlayerStatus};
