//! Serial command queue and the worker that drains it.
//!
//! Runs on the engine's [`SerialRuntime`](core_async::runtime::SerialRuntime).
//! Commands execute strictly one at a time in submission order; delayed work
//! (relay start, fade steps, position ticks) is a timer task that re-posts a
//! command, so it is ordered with everything else on the same queue. Once the
//! shutdown token fires, queued commands are drained without running.

use crate::config::EngineConfig;
use crate::fade::{FadeController, FadeDirection};
use crate::handle::HandleId;
use crate::handoff::{HandoffController, SignalOutcome};
use bridge_traits::{DecoderSignal, Headers, MediaLocator};
use core_async::sync::{mpsc, CancellationToken};
use core_async::task::AbortHandle;
use core_async::{select, sleep, Duration};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use tracing::{debug, info, trace};

pub(crate) enum Command {
    SetDataSource {
        locator: MediaLocator,
        headers: Headers,
        epoch: u64,
    },
    SetNextDataSource {
        locator: MediaLocator,
        headers: Headers,
    },
    SkipToNext,
    Signal {
        handle: HandleId,
        signal: DecoderSignal,
    },
    RelayStart {
        handle: HandleId,
    },
    Duck {
        down: bool,
    },
    FadeStep {
        generation: u64,
    },
    PositionTick,
    /// Acknowledged once every earlier command has run.
    Flush(std_mpsc::SyncSender<()>),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::SetDataSource { .. } => "set_data_source",
            Command::SetNextDataSource { .. } => "set_next_data_source",
            Command::SkipToNext => "skip_to_next",
            Command::Signal { .. } => "signal",
            Command::RelayStart { .. } => "relay_start",
            Command::Duck { .. } => "duck",
            Command::FadeStep { .. } => "fade_step",
            Command::PositionTick => "position_tick",
            Command::Flush(_) => "flush",
        }
    }
}

pub(crate) type CommandSender = mpsc::UnboundedSender<Command>;

pub(crate) struct Worker {
    controller: Arc<HandoffController>,
    fade: FadeController,
    commands: CommandSender,
    shutdown: CancellationToken,
    successor_start_delay: Duration,
    position_interval: Option<Duration>,
}

impl Worker {
    pub(crate) fn new(
        controller: Arc<HandoffController>,
        commands: CommandSender,
        shutdown: CancellationToken,
        config: &EngineConfig,
    ) -> Self {
        Self {
            controller,
            fade: FadeController::new(config.fade.clone()),
            commands,
            shutdown,
            successor_start_delay: config.successor_start_delay,
            position_interval: config.position_interval,
        }
    }

    /// Drain `inbox` until shutdown.
    pub(crate) async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Command>) {
        debug!("Playback worker started");
        if let Some(interval) = self.position_interval {
            self.spawn_ticker(interval);
        }

        loop {
            let command = select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                command = inbox.recv() => command,
            };
            match command {
                Some(command) => self.handle(command),
                None => break,
            }
        }

        inbox.close();
        let mut dropped = 0usize;
        while inbox.try_recv().is_ok() {
            dropped += 1;
        }
        self.fade.cancel();
        info!(dropped, "Playback worker stopped");
    }

    fn handle(&mut self, command: Command) {
        trace!(command = command.name(), "Processing command");
        match command {
            Command::SetDataSource {
                locator,
                headers,
                epoch,
            } => self.controller.set_data_source(locator, headers, epoch),
            Command::SetNextDataSource { locator, headers } => {
                self.controller.set_next_data_source(locator, headers)
            }
            Command::SkipToNext => self.controller.skip_to_next(),
            Command::Signal { handle, signal } => {
                if self.controller.on_signal(handle, signal) == SignalOutcome::RelayAfterDelay {
                    self.schedule(self.successor_start_delay, Command::RelayStart { handle });
                }
            }
            Command::RelayStart { handle } => self.controller.relay_start(handle),
            Command::Duck { down } => {
                let direction = if down {
                    FadeDirection::Down
                } else {
                    FadeDirection::Up
                };
                let generation = self.fade.begin(direction);
                debug!(?direction, from = self.fade.volume(), "Fade started");
                self.fade_step(generation);
            }
            Command::FadeStep { generation } => self.fade_step(generation),
            Command::PositionTick => self.controller.report_position(),
            Command::Flush(ack) => {
                let _ = ack.try_send(());
            }
        }
    }

    fn fade_step(&mut self, generation: u64) {
        let Some(step) = self.fade.step(generation) else {
            trace!(generation, "Stale fade step dropped");
            return;
        };
        self.controller.set_volume(step.volume);
        if step.done {
            debug!(volume = step.volume, "Fade finished");
        } else {
            let pending = self.schedule(self.fade.interval(), Command::FadeStep { generation });
            self.fade.set_pending(pending);
        }
    }

    /// Post `command` after `delay` unless the engine shuts down first.
    fn schedule(&self, delay: Duration, command: Command) -> AbortHandle {
        let commands = self.commands.clone();
        let shutdown = self.shutdown.clone();
        core_async::spawn(async move {
            select! {
                _ = shutdown.cancelled() => {}
                _ = sleep(delay) => {
                    let _ = commands.send(command);
                }
            }
        })
        .abort_handle()
    }

    fn spawn_ticker(&self, interval: Duration) {
        let commands = self.commands.clone();
        let shutdown = self.shutdown.clone();
        core_async::spawn(async move {
            loop {
                select! {
                    _ = shutdown.cancelled() => break,
                    _ = sleep(interval) => {
                        if commands.send(Command::PositionTick).is_err() {
                            break;
                        }
                    }
                }
            }
        });
    }
}
