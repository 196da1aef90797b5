//! Transport layer for receiving heart-rate samples.
//!
//! One [`TransportManager`] owns at most one active channel, either a
//! server-push stream or a polling loop, and turns its events into samples
//! in the [`SampleBuffer`](crate::data::SampleBuffer).
//!
//! Channels are opened through a [`Connector`]. [`HttpConnector`] talks to
//! real endpoints with reqwest; tests plug in scripted connectors and inject
//! events by hand.
//!
//! ```text
//!  Connector task (tokio)                       UI thread
//! ┌──────────────────────┐   Envelope    ┌──────────────────────┐
//! │ push stream / poller │──────────────▶│ TransportManager     │
//! │  (EventSender, gen)  │  unbounded    │  drain() ─▶ buffer   │
//! └──────────────────────┘   mpsc        └──────────────────────┘
//! ```
//!
//! Every event carries the generation of the channel that produced it. The
//! manager bumps the generation whenever it closes a channel, so anything a
//! superseded channel still delivers is dropped instead of reaching the buffer.

mod error;
mod http;
mod manager;
pub mod sse;
#[cfg(test)]
pub(crate) mod testing;

pub use error::TransportError;
pub use http::HttpConnector;
pub use manager::{
    DrainReport, TransportManager, STATUS_CONNECTED, STATUS_CONNECTING, STATUS_DISCONNECTED,
    STATUS_FALLBACK, STATUS_FETCH_FAILED, STATUS_POLLING,
};

use std::fmt::Debug;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Lifecycle state of the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// No channel is active.
    Disconnected,
    /// A push stream is being opened.
    Connecting,
    /// The push stream is open.
    Connected,
    /// The poll loop is running.
    Polling,
    /// The push stream failed; a fallback to polling follows immediately.
    Failed,
}

impl TransportState {
    /// Returns the display label for this state.
    pub fn label(&self) -> &'static str {
        match self {
            TransportState::Disconnected => "disconnected",
            TransportState::Connecting => "connecting",
            TransportState::Connected => "connected",
            TransportState::Polling => "polling",
            TransportState::Failed => "failed",
        }
    }
}

/// Kind of an active channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Push,
    Poll,
}

/// Something a channel observed.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// The push stream opened successfully.
    Opened,
    /// One push event payload.
    Message(String),
    /// The push stream failed or closed. Push channels send this at most once.
    Error(String),
    /// Body of a successful poll response.
    Response(String),
    /// A poll request failed (network error or non-success status).
    FetchFailed(String),
}

/// A channel event tagged with the generation of its channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub generation: u64,
    pub event: ChannelEvent,
}

/// Sending half handed to a channel when it is opened.
#[derive(Debug, Clone)]
pub struct EventSender {
    generation: u64,
    tx: mpsc::UnboundedSender<Envelope>,
}

impl EventSender {
    pub(crate) fn new(generation: u64, tx: mpsc::UnboundedSender<Envelope>) -> Self {
        Self { generation, tx }
    }

    /// Send an event. Returns `false` once the manager is gone.
    pub fn send(&self, event: ChannelEvent) -> bool {
        self.tx
            .send(Envelope {
                generation: self.generation,
                event,
            })
            .is_ok()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Handle to an open channel. Closing or dropping it stops the channel's task.
#[derive(Debug)]
pub struct ChannelHandle {
    kind: ChannelKind,
    task: Option<JoinHandle<()>>,
}

impl ChannelHandle {
    /// A channel driven by a background task.
    pub fn spawned(kind: ChannelKind, task: JoinHandle<()>) -> Self {
        Self {
            kind,
            task: Some(task),
        }
    }

    /// A channel with no task of its own (events are sent by someone else).
    pub fn detached(kind: ChannelKind) -> Self {
        Self { kind, task: None }
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Stop the channel.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Opens transport channels.
///
/// Implementations must not block: they start whatever work the channel
/// needs in the background and report through the given [`EventSender`].
pub trait Connector: Send + Debug {
    /// Open a server-push stream to `url`.
    fn open_push(&self, url: &str, events: EventSender) -> ChannelHandle;

    /// Start polling `url` every `interval`. The first request goes out one
    /// interval after the call.
    fn start_poll(&self, url: &str, interval: Duration, events: EventSender) -> ChannelHandle;
}
