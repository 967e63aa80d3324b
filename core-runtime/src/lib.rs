//! # Core Runtime Module
//!
//! Foundational infrastructure shared by the playback core:
//! - Logging and tracing setup with host log forwarding
//! - Configuration management with fail-fast capability checks
//! - The player event bus (status + events, last-known status for late
//!   subscribers)
//!
//! ## Overview
//!
//! Nothing in this crate touches a decoder. It establishes the logging
//! conventions, the configuration entry point and the event types that
//! `core-playback` publishes and hosts observe.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
