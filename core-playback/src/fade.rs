//! Fade Controller.
//!
//! Owns the ducking volume scalar. Ramps are driven one step at a time by the
//! worker: each step returns the volume to apply and whether another step is
//! due. Starting a ramp bumps the generation and aborts the pending timer, so
//! a step scheduled by the previous ramp can never run after the switch.

use crate::config::FadeConfig;
use core_async::task::AbortHandle;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeDirection {
    /// Duck towards the floor.
    Down,
    /// Restore towards full volume.
    Up,
}

/// Outcome of one ramp step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FadeStep {
    pub volume: f32,
    /// The ramp reached its target; no further step is scheduled.
    pub done: bool,
}

#[derive(Debug)]
pub(crate) struct FadeController {
    config: FadeConfig,
    volume: f32,
    generation: u64,
    direction: Option<FadeDirection>,
    pending: Option<AbortHandle>,
}

impl FadeController {
    pub(crate) fn new(config: FadeConfig) -> Self {
        Self {
            config,
            volume: 1.0,
            generation: 0,
            direction: None,
            pending: None,
        }
    }

    pub(crate) fn volume(&self) -> f32 {
        self.volume
    }

    pub(crate) fn interval(&self) -> Duration {
        self.config.step_interval
    }

    /// Start a ramp, cancelling whichever one was running.
    ///
    /// Returns the generation its steps must carry.
    pub(crate) fn begin(&mut self, direction: FadeDirection) -> u64 {
        self.cancel();
        self.generation = self.generation.wrapping_add(1);
        self.direction = Some(direction);
        self.generation
    }

    /// Advance the ramp tagged `generation`.
    ///
    /// Returns `None` for steps of a superseded or finished ramp.
    pub(crate) fn step(&mut self, generation: u64) -> Option<FadeStep> {
        if generation != self.generation {
            return None;
        }
        let direction = self.direction?;
        self.pending = None;

        let (volume, done) = match direction {
            FadeDirection::Down => {
                let volume = (self.volume - self.config.down_step).max(self.config.floor);
                (volume, volume <= self.config.floor)
            }
            FadeDirection::Up => {
                let volume = (self.volume + self.config.up_step).min(1.0);
                (volume, volume >= 1.0)
            }
        };

        self.volume = volume;
        if done {
            self.direction = None;
        }
        Some(FadeStep { volume, done })
    }

    /// Remember the timer carrying the next step so it can be aborted.
    pub(crate) fn set_pending(&mut self, pending: AbortHandle) {
        self.pending = Some(pending);
    }

    /// Abort the pending step, if any. The volume stays where it is.
    pub(crate) fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        self.direction = None;
    }
}
