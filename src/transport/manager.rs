//! The transport state machine.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{
    ChannelEvent, ChannelHandle, ChannelKind, Connector, Envelope, EventSender, TransportState,
};
use crate::data::{now_millis, PayloadError, Sample, SampleBuffer};
use crate::settings::{TransportMode, TransportSettings};

pub const STATUS_DISCONNECTED: &str = "disconnected";
pub const STATUS_CONNECTING: &str = "connecting…";
pub const STATUS_CONNECTED: &str = "push connected";
pub const STATUS_FALLBACK: &str = "connection failed, falling back to polling";
pub const STATUS_POLLING: &str = "polling…";
pub const STATUS_FETCH_FAILED: &str = "unable to fetch data";

/// What one [`TransportManager::drain`] call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Samples appended to the buffer.
    pub appended: usize,
    /// State transitions since the previous drain, oldest first.
    pub transitions: Vec<TransportState>,
}

/// Owns the single active channel and feeds its samples into the buffer.
///
/// Construction and [`reconfigure`](Self::reconfigure) always tear down the
/// previous channel before opening the next one, so at most one channel is
/// active at any time. A push channel that errors is replaced by polling and
/// is not retried until the transport is reconfigured.
#[derive(Debug)]
pub struct TransportManager {
    connector: Box<dyn Connector>,
    settings: TransportSettings,
    state: TransportState,
    status: String,
    channel: Option<ChannelHandle>,
    generation: u64,
    events_tx: mpsc::UnboundedSender<Envelope>,
    events_rx: mpsc::UnboundedReceiver<Envelope>,
    transitions: Vec<TransportState>,
}

impl TransportManager {
    /// Create a manager and open the channel described by `settings`.
    pub fn new(connector: Box<dyn Connector>, settings: TransportSettings) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut manager = Self {
            connector,
            settings,
            state: TransportState::Disconnected,
            status: STATUS_DISCONNECTED.to_string(),
            channel: None,
            generation: 0,
            events_tx,
            events_rx,
            transitions: Vec::new(),
        };
        manager.setup();
        manager
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Human-readable status of the transport.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn settings(&self) -> &TransportSettings {
        &self.settings
    }

    /// Number of open channels: 0 or 1.
    pub fn active_channels(&self) -> usize {
        usize::from(self.channel.is_some())
    }

    pub fn active_kind(&self) -> Option<ChannelKind> {
        self.channel.as_ref().map(ChannelHandle::kind)
    }

    /// Generation tag of the current channel.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Short description of where samples come from.
    pub fn description(&self) -> String {
        match self.active_kind() {
            Some(ChannelKind::Push) => format!("push: {}", self.settings.push_url),
            Some(ChannelKind::Poll) => format!("poll: {}", self.settings.poll_url),
            None => "no channel".to_string(),
        }
    }

    /// Replace the transport: teardown, then setup with `settings`.
    pub fn reconfigure(&mut self, settings: TransportSettings) {
        info!(mode = settings.mode.label(), "Reconfiguring transport");
        self.teardown();
        self.settings = settings;
        self.setup();
    }

    /// Close the active channel, if any, and go to `Disconnected`.
    pub fn teardown(&mut self) {
        self.close_channel();
        self.set_state(TransportState::Disconnected);
        self.status = STATUS_DISCONNECTED.to_string();
    }

    /// Apply every queued channel event, in arrival order.
    ///
    /// Events from superseded channels are dropped.
    pub fn drain(&mut self, buffer: &mut SampleBuffer) -> DrainReport {
        let mut appended = 0;

        while let Ok(envelope) = self.events_rx.try_recv() {
            if envelope.generation != self.generation {
                debug!(
                    generation = envelope.generation,
                    current = self.generation,
                    "Ignoring event from superseded channel"
                );
                continue;
            }
            if self.handle_event(envelope.event, buffer) {
                appended += 1;
            }
        }

        DrainReport {
            appended,
            transitions: std::mem::take(&mut self.transitions),
        }
    }

    fn setup(&mut self) {
        match self.settings.mode {
            TransportMode::Push => self.open_push(),
            TransportMode::Poll => {
                self.start_polling();
                self.status = STATUS_POLLING.to_string();
            }
        }
    }

    fn open_push(&mut self) {
        info!(url = %self.settings.push_url, "Opening push channel");
        self.set_state(TransportState::Connecting);
        self.status = STATUS_CONNECTING.to_string();
        let sender = self.sender();
        let handle = self.connector.open_push(&self.settings.push_url, sender);
        self.channel = Some(handle);
    }

    fn start_polling(&mut self) {
        if self.active_kind() == Some(ChannelKind::Poll) {
            return;
        }
        info!(
            url = %self.settings.poll_url,
            interval_ms = self.settings.poll_interval.as_millis() as u64,
            "Starting poll channel"
        );
        let sender = self.sender();
        let handle =
            self.connector
                .start_poll(&self.settings.poll_url, self.settings.poll_interval, sender);
        self.channel = Some(handle);
        self.set_state(TransportState::Polling);
    }

    fn close_channel(&mut self) {
        if let Some(channel) = self.channel.take() {
            debug!(kind = ?channel.kind(), "Closing channel");
            channel.close();
        }
        self.generation += 1;
    }

    fn sender(&self) -> EventSender {
        EventSender::new(self.generation, self.events_tx.clone())
    }

    fn set_state(&mut self, state: TransportState) {
        if self.state != state {
            self.state = state;
            self.transitions.push(state);
        }
    }

    /// Returns `true` if the event appended a sample.
    fn handle_event(&mut self, event: ChannelEvent, buffer: &mut SampleBuffer) -> bool {
        match event {
            ChannelEvent::Opened => {
                if self.state == TransportState::Connecting {
                    info!("Push channel connected");
                    self.set_state(TransportState::Connected);
                    self.status = STATUS_CONNECTED.to_string();
                }
                false
            }
            ChannelEvent::Message(payload) => ingest(&payload, buffer).is_ok(),
            ChannelEvent::Error(reason) => {
                warn!(%reason, "Push channel failed, falling back to polling");
                self.close_channel();
                self.set_state(TransportState::Failed);
                self.start_polling();
                self.status = STATUS_FALLBACK.to_string();
                false
            }
            ChannelEvent::Response(body) => match ingest(&body, buffer) {
                Ok(()) => {
                    self.status = STATUS_POLLING.to_string();
                    true
                }
                Err(PayloadError::NotJson(reason)) => {
                    debug!(%reason, "Poll response is not JSON");
                    self.status = STATUS_FETCH_FAILED.to_string();
                    false
                }
                // A JSON body without a usable value is dropped; status stays as it was.
                Err(_) => false,
            },
            ChannelEvent::FetchFailed(reason) => {
                debug!(%reason, "Poll request failed");
                self.status = STATUS_FETCH_FAILED.to_string();
                false
            }
        }
    }
}

/// Parse a payload and append it, or drop it without touching any state.
fn ingest(payload: &str, buffer: &mut SampleBuffer) -> Result<(), PayloadError> {
    match Sample::parse(payload, now_millis()) {
        Ok(sample) => {
            buffer.append(sample);
            Ok(())
        }
        Err(e) => {
            debug!(error = %e, "Discarding payload");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::ScriptedConnector;
    use std::time::Duration;

    fn settings(mode: TransportMode) -> TransportSettings {
        TransportSettings {
            mode,
            push_url: "http://hr.test/events".to_string(),
            poll_url: "http://hr.test/latest".to_string(),
            poll_interval: Duration::from_millis(500),
        }
    }

    fn push_manager() -> (ScriptedConnector, TransportManager) {
        let connector = ScriptedConnector::default();
        let manager =
            TransportManager::new(Box::new(connector.clone()), settings(TransportMode::Push));
        (connector, manager)
    }

    #[test]
    fn test_push_setup_and_open() {
        let (connector, mut manager) = push_manager();
        let mut buffer = SampleBuffer::new();

        assert_eq!(manager.state(), TransportState::Connecting);
        assert_eq!(connector.last().url, "http://hr.test/events");

        connector.last().sender.send(ChannelEvent::Opened);
        let report = manager.drain(&mut buffer);

        assert_eq!(
            report.transitions,
            vec![TransportState::Connecting, TransportState::Connected]
        );
        assert_eq!(manager.state(), TransportState::Connected);
        assert_eq!(manager.status(), STATUS_CONNECTED);
    }

    #[test]
    fn test_push_messages_append_in_order() {
        let (connector, mut manager) = push_manager();
        let mut buffer = SampleBuffer::new();
        let push = connector.last().sender;

        push.send(ChannelEvent::Opened);
        push.send(ChannelEvent::Message(r#"{"hr":70,"ts":1}"#.to_string()));
        push.send(ChannelEvent::Message(r#"{"hr":71,"ts":2}"#.to_string()));
        push.send(ChannelEvent::Message(r#"{"hr":72,"ts":3}"#.to_string()));

        let report = manager.drain(&mut buffer);
        assert_eq!(report.appended, 3);
        assert_eq!(buffer.values(), vec![70.0, 71.0, 72.0]);
    }

    #[test]
    fn test_malformed_push_payload_changes_nothing() {
        let (connector, mut manager) = push_manager();
        let mut buffer = SampleBuffer::new();
        let push = connector.last().sender;
        push.send(ChannelEvent::Opened);
        manager.drain(&mut buffer);

        push.send(ChannelEvent::Message("garbage".to_string()));
        push.send(ChannelEvent::Message(r#"{"bpm":70}"#.to_string()));
        let report = manager.drain(&mut buffer);

        assert_eq!(report, DrainReport::default());
        assert!(buffer.is_empty());
        assert_eq!(manager.state(), TransportState::Connected);
        assert_eq!(manager.status(), STATUS_CONNECTED);
    }

    #[test]
    fn test_push_error_falls_back_to_polling() {
        let (connector, mut manager) = push_manager();
        let mut buffer = SampleBuffer::new();
        let push = connector.last().sender;
        push.send(ChannelEvent::Opened);
        manager.drain(&mut buffer);

        push.send(ChannelEvent::Error("stream closed".to_string()));
        let report = manager.drain(&mut buffer);

        assert_eq!(
            report.transitions,
            vec![TransportState::Failed, TransportState::Polling]
        );
        assert_eq!(manager.status(), STATUS_FALLBACK);
        assert_eq!(manager.active_channels(), 1);
        assert_eq!(manager.active_kind(), Some(ChannelKind::Poll));

        let poll = connector.last();
        assert_eq!(poll.kind, ChannelKind::Poll);
        assert_eq!(poll.url, "http://hr.test/latest");
        assert_eq!(poll.interval, Some(Duration::from_millis(500)));

        poll.sender.send(ChannelEvent::Response(r#"{"hr":90,"ts":10}"#.to_string()));
        let report = manager.drain(&mut buffer);
        assert_eq!(report.appended, 1);
        assert_eq!(buffer.latest(), Some(&Sample::new(10, 90.0)));
        assert_eq!(manager.status(), STATUS_POLLING);
    }

    #[test]
    fn test_failed_push_channel_is_not_reopened() {
        let (connector, mut manager) = push_manager();
        let mut buffer = SampleBuffer::new();
        let push = connector.last().sender;

        push.send(ChannelEvent::Error("refused".to_string()));
        manager.drain(&mut buffer);
        // A late message from the dead push stream is ignored.
        push.send(ChannelEvent::Message(r#"{"hr":99}"#.to_string()));
        push.send(ChannelEvent::Error("again".to_string()));
        let report = manager.drain(&mut buffer);

        assert_eq!(report, DrainReport::default());
        assert!(buffer.is_empty());
        assert_eq!(connector.count(), 2);
        assert_eq!(manager.state(), TransportState::Polling);
    }

    #[test]
    fn test_poll_failure_is_transient() {
        let connector = ScriptedConnector::default();
        let mut manager =
            TransportManager::new(Box::new(connector.clone()), settings(TransportMode::Poll));
        let mut buffer = SampleBuffer::new();
        let poll = connector.last().sender;

        assert_eq!(manager.state(), TransportState::Polling);
        assert_eq!(manager.status(), STATUS_POLLING);

        poll.send(ChannelEvent::FetchFailed("connection refused".to_string()));
        manager.drain(&mut buffer);
        assert_eq!(manager.status(), STATUS_FETCH_FAILED);
        assert_eq!(manager.state(), TransportState::Polling);

        poll.send(ChannelEvent::Response("<html>oops</html>".to_string()));
        manager.drain(&mut buffer);
        assert_eq!(manager.status(), STATUS_FETCH_FAILED);

        poll.send(ChannelEvent::Response(r#"{"hr":64}"#.to_string()));
        let report = manager.drain(&mut buffer);
        assert_eq!(report.appended, 1);
        assert_eq!(manager.status(), STATUS_POLLING);
        assert_eq!(connector.count(), 1);
    }

    #[test]
    fn test_unusable_poll_payload_keeps_status() {
        let connector = ScriptedConnector::default();
        let mut manager =
            TransportManager::new(Box::new(connector.clone()), settings(TransportMode::Poll));
        let mut buffer = SampleBuffer::new();
        let poll = connector.last().sender;

        poll.send(ChannelEvent::FetchFailed("timeout".to_string()));
        manager.drain(&mut buffer);
        assert_eq!(manager.status(), STATUS_FETCH_FAILED);

        poll.send(ChannelEvent::Response(r#"{"bpm":70}"#.to_string()));
        let report = manager.drain(&mut buffer);
        assert_eq!(report.appended, 0);
        assert!(buffer.is_empty());
        assert_eq!(manager.status(), STATUS_FETCH_FAILED);

        // Same for the initial status.
        manager.reconfigure(settings(TransportMode::Poll));
        let poll = connector.last().sender;
        poll.send(ChannelEvent::Response(r#"{"hr":"fast"}"#.to_string()));
        manager.drain(&mut buffer);
        assert_eq!(manager.status(), STATUS_POLLING);
    }

    #[test]
    fn test_reconfigure_keeps_exactly_one_channel() {
        let (connector, mut manager) = push_manager();
        let mut buffer = SampleBuffer::new();
        let old = connector.last().sender;

        manager.reconfigure(settings(TransportMode::Poll));
        assert_eq!(manager.active_channels(), 1);
        assert_eq!(manager.active_kind(), Some(ChannelKind::Poll));
        assert_ne!(old.generation(), manager.generation());
        assert_eq!(connector.last().sender.generation(), manager.generation());

        old.send(ChannelEvent::Message(r#"{"hr":120}"#.to_string()));
        old.send(ChannelEvent::Error("late".to_string()));
        let report = manager.drain(&mut buffer);

        assert_eq!(report.appended, 0);
        assert!(buffer.is_empty());
        assert_eq!(manager.state(), TransportState::Polling);
        assert_eq!(connector.count(), 2);

        manager.reconfigure(settings(TransportMode::Push));
        assert_eq!(manager.active_channels(), 1);
        assert_eq!(manager.active_kind(), Some(ChannelKind::Push));
        assert_eq!(manager.state(), TransportState::Connecting);
    }

    #[test]
    fn test_reconfigure_reports_disconnect_transition() {
        let connector = ScriptedConnector::default();
        let mut manager =
            TransportManager::new(Box::new(connector.clone()), settings(TransportMode::Poll));
        let mut buffer = SampleBuffer::new();
        manager.drain(&mut buffer);

        let mut next = settings(TransportMode::Poll);
        next.poll_url = "http://other.test/latest".to_string();
        manager.reconfigure(next);

        let report = manager.drain(&mut buffer);
        assert_eq!(
            report.transitions,
            vec![TransportState::Disconnected, TransportState::Polling]
        );
        assert_eq!(connector.last().url, "http://other.test/latest");
    }

    #[test]
    fn test_teardown() {
        let (_connector, mut manager) = push_manager();
        manager.teardown();
        assert_eq!(manager.active_channels(), 0);
        assert_eq!(manager.state(), TransportState::Disconnected);
        assert_eq!(manager.status(), STATUS_DISCONNECTED);
        assert_eq!(manager.description(), "no channel");
    }
}
