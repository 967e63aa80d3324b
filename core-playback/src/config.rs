//! # Engine Configuration
//!
//! Tuning for the playback engine: fade ramps, successor relay delay,
//! position reporting and the chaining strategy override.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a decoder hands off to its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainingMode {
    /// Probe each decoder and use native chaining when it is supported.
    #[default]
    Auto,
    /// Always use the platform's successor primitive. Decoders that do not
    /// support it fall back to relay.
    Native,
    /// Always start the successor manually after completion.
    Relay,
}

/// Volume ramp parameters.
///
/// Ducking steps down quickly to a floor; restoring steps up slowly to full
/// volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FadeConfig {
    /// Volume removed per fade-down step.
    ///
    /// Default: 0.1
    #[serde(default = "default_down_step")]
    pub down_step: f32,

    /// Lowest volume reached while ducked.
    ///
    /// Default: 0.2
    #[serde(default = "default_floor")]
    pub floor: f32,

    /// Volume added per fade-up step.
    ///
    /// Default: 0.01
    #[serde(default = "default_up_step")]
    pub up_step: f32,

    /// Delay between two steps.
    ///
    /// Default: 10ms
    #[serde(default = "default_step_interval")]
    pub step_interval: Duration,
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            down_step: default_down_step(),
            floor: default_floor(),
            up_step: default_up_step(),
            step_interval: default_step_interval(),
        }
    }
}

impl FadeConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.down_step > 0.0 && self.down_step <= 1.0) {
            return Err("fade down_step must be in (0.0, 1.0]".to_string());
        }

        if !(self.up_step > 0.0 && self.up_step <= 1.0) {
            return Err("fade up_step must be in (0.0, 1.0]".to_string());
        }

        if !(0.0..1.0).contains(&self.floor) {
            return Err("fade floor must be in [0.0, 1.0)".to_string());
        }

        if self.step_interval.is_zero() {
            return Err("fade step_interval must be > 0".to_string());
        }

        Ok(())
    }
}

/// Playback engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub fade: FadeConfig,

    /// Pause between a completion and starting the successor in relay mode,
    /// so platform timing jitter cannot overlap the two streams.
    ///
    /// Default: 50ms
    #[serde(default = "default_successor_start_delay")]
    pub successor_start_delay: Duration,

    /// Interval of [`PlayerEvent::Position`](core_runtime::events::PlayerEvent)
    /// reports while playing. `None` disables them.
    ///
    /// Default: 500ms
    #[serde(default = "default_position_interval")]
    pub position_interval: Option<Duration>,

    /// Name of the dedicated decoder thread.
    ///
    /// Default: "playback-worker"
    #[serde(default = "default_worker_thread_name")]
    pub worker_thread_name: String,

    #[serde(default)]
    pub chaining: ChainingMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fade: FadeConfig::default(),
            successor_start_delay: default_successor_start_delay(),
            position_interval: default_position_interval(),
            worker_thread_name: default_worker_thread_name(),
            chaining: ChainingMode::default(),
        }
    }
}

impl EngineConfig {
    /// Configuration for tests and tools: no position ticks, relay delay
    /// kept short.
    pub fn quiet() -> Self {
        Self {
            successor_start_delay: Duration::from_millis(5),
            position_interval: None,
            ..Default::default()
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        self.fade.validate()?;

        if self.successor_start_delay > Duration::from_secs(1) {
            return Err("successor_start_delay must not exceed 1s".to_string());
        }

        if matches!(self.position_interval, Some(interval) if interval < Duration::from_millis(10))
        {
            return Err("position_interval must be at least 10ms".to_string());
        }

        if self.worker_thread_name.trim().is_empty() {
            return Err("worker_thread_name cannot be empty".to_string());
        }

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_down_step() -> f32 {
    0.1
}

fn default_floor() -> f32 {
    0.2
}

fn default_up_step() -> f32 {
    0.01
}

fn default_step_interval() -> Duration {
    Duration::from_millis(10)
}

fn default_successor_start_delay() -> Duration {
    Duration::from_millis(50)
}

fn default_position_interval() -> Option<Duration> {
    Some(Duration::from_millis(500))
}

fn default_worker_thread_name() -> String {
    "playback-worker".to_string()
}
