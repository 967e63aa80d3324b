//! Workspace facade crate.
//!
//! Re-exports the gapless playback core so host applications can depend on
//! `gapless-workspace` alone. The `playback` feature (on by default) pulls in
//! `core-playback` together with the configuration and bridge crates a host
//! needs to construct a [`PlayerEngine`](core_playback::PlayerEngine).

#[cfg(feature = "playback")]
pub use bridge_traits as bridge;
#[cfg(feature = "playback")]
pub use core_playback as playback;
#[cfg(feature = "playback")]
pub use core_runtime as runtime;

#[cfg(feature = "playback")]
pub use core_playback::{
    ChainingMode, EngineConfig, Player, PlayerCallback, PlayerEngine, PlayerEvent, PlayerStatus,
};
