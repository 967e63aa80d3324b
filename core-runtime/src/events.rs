//! # Player Event Bus
//!
//! Publishes player status changes and playback events to any number of
//! observers using `tokio::sync::broadcast`, and keeps the last known
//! [`PlayerStatus`] in a `watch` channel so late subscribers can catch up.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: [`PlayerStatus`] and [`PlayerEvent`]
//! - **EventBus**: Broadcast channel plus last-known status
//! - **EventStream**: Wrapper for consuming events with filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐     emit      ┌───────────┐    subscribe    ┌────────────┐
//! │ Callback       ├──────────────>│ EventBus  ├────────────────>│ Subscriber │
//! │ Delegate       │               │ (broadcast│                 └────────────┘
//! └────────────────┘               │  + watch) │   watch_status  ┌────────────┐
//! ┌────────────────┐     emit      │           ├────────────────>│ Late UI    │
//! │ Position tick  ├──────────────>│           │                 └────────────┘
//! └────────────────┘               └───────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, PlayerEvent, PlayerStatus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut events = bus.subscribe();
//!
//! bus.emit(PlayerEvent::StatusChanged(PlayerStatus::Playing)).ok();
//!
//! assert_eq!(
//!     events.recv().await.unwrap(),
//!     PlayerEvent::StatusChanged(PlayerStatus::Playing)
//! );
//! assert_eq!(bus.last_status(), PlayerStatus::Playing);
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events (position
//!   ticks are the usual culprit). Non-fatal.
//! - **`RecvError::Closed`**: the engine was released and the bus dropped.

use core_async::sync::{broadcast, watch};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub use core_async::sync::broadcast::error::{RecvError, SendError};
pub use core_async::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Position ticks arrive twice a second, so this holds close to a minute of
/// backlog for a stalled subscriber.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Event Types
// ============================================================================

/// Coarse player state, as reported to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlayerStatus {
    /// Nothing has been loaded yet.
    #[default]
    None,
    /// A data source is being opened.
    Loading,
    /// The current track is prepared and can be played.
    Ready,
    Playing,
    Paused,
    /// Playback ended, was stopped, or the decoder was lost.
    Stopped,
    /// Opening the current track failed.
    Error { message: String },
}

impl PlayerStatus {
    /// Returns `true` while a track is loaded and not stopped.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            PlayerStatus::Ready | PlayerStatus::Playing | PlayerStatus::Paused
        )
    }
}

/// Everything published on the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum PlayerEvent {
    StatusChanged(PlayerStatus),
    /// The queued next track took over as current.
    WentToNext,
    /// Preparing the queued next track failed; the current track is unaffected.
    OpenNextFailed { message: String },
    /// Periodic position report while playing.
    Position { position_ms: i64 },
    /// Duration of the current track, published once per open or promotion.
    Duration { duration_ms: i64 },
}

impl PlayerEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            PlayerEvent::StatusChanged(status) => match status {
                PlayerStatus::None => "Player idle",
                PlayerStatus::Loading => "Loading track",
                PlayerStatus::Ready => "Track ready",
                PlayerStatus::Playing => "Playback started",
                PlayerStatus::Paused => "Playback paused",
                PlayerStatus::Stopped => "Playback stopped",
                PlayerStatus::Error { .. } => "Failed to open track",
            },
            PlayerEvent::WentToNext => "Went to next track",
            PlayerEvent::OpenNextFailed { .. } => "Failed to open next track",
            PlayerEvent::Position { .. } => "Playback position changed",
            PlayerEvent::Duration { .. } => "Track duration known",
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            PlayerEvent::StatusChanged(PlayerStatus::Error { .. }) => EventSeverity::Error,
            PlayerEvent::OpenNextFailed { .. } => EventSeverity::Warning,
            PlayerEvent::StatusChanged(_) | PlayerEvent::WentToNext => EventSeverity::Info,
            PlayerEvent::Position { .. } | PlayerEvent::Duration { .. } => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central bus for player events.
///
/// Cloning the bus shares both channels. Status changes emitted through
/// [`emit`](Self::emit) also update the last known status, whether or not any
/// broadcast subscriber is listening.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<PlayerEvent>,
    status: Arc<watch::Sender<PlayerStatus>>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; `CoreConfig` rejects that value before
    /// a bus is ever built from it.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        let (status, _) = watch::channel(PlayerStatus::None);
        Self {
            sender,
            status: Arc::new(status),
        }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are none. The last known status is updated either way.
    pub fn emit(&self, event: PlayerEvent) -> Result<usize, SendError<PlayerEvent>> {
        if let PlayerEvent::StatusChanged(status) = &event {
            self.status.send_replace(status.clone());
        }
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<PlayerEvent> {
        self.sender.subscribe()
    }

    /// Watch the last known status. The receiver sees the current value
    /// immediately.
    pub fn watch_status(&self) -> watch::Receiver<PlayerStatus> {
        self.status.subscribe()
    }

    /// Last status emitted on this bus.
    pub fn last_status(&self) -> PlayerStatus {
        self.status.borrow().clone()
    }

    /// Returns the number of active broadcast subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .field("last_status", &self.last_status())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&PlayerEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{EventBus, EventSeverity, EventStream};
///
/// let bus = EventBus::new(16);
/// let important = EventStream::new(bus.subscribe())
///     .filter(|event| event.severity() >= EventSeverity::Info);
/// ```
pub struct EventStream {
    receiver: Receiver<PlayerEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<PlayerEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events that match `predicate` will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&PlayerEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &PlayerEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if the bus has been dropped.
    pub async fn recv(&mut self) -> Result<PlayerEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without waiting.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<PlayerEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
