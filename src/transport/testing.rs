//! Scripted connector for driving the transport from tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{ChannelHandle, ChannelKind, Connector, EventSender};

/// A channel opened by [`ScriptedConnector`].
#[derive(Debug, Clone)]
pub(crate) struct OpenedChannel {
    pub kind: ChannelKind,
    pub url: String,
    pub interval: Option<Duration>,
    pub sender: EventSender,
}

/// Connector that opens nothing and hands the event senders to the test.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedConnector {
    pub opened: Arc<Mutex<Vec<OpenedChannel>>>,
}

impl ScriptedConnector {
    /// The most recently opened channel.
    pub fn last(&self) -> OpenedChannel {
        self.opened.lock().unwrap().last().cloned().expect("no channel opened")
    }

    /// How many channels have been opened so far.
    pub fn count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }
}

impl Connector for ScriptedConnector {
    fn open_push(&self, url: &str, events: EventSender) -> ChannelHandle {
        self.opened.lock().unwrap().push(OpenedChannel {
            kind: ChannelKind::Push,
            url: url.to_string(),
            interval: None,
            sender: events,
        });
        ChannelHandle::detached(ChannelKind::Push)
    }

    fn start_poll(&self, url: &str, interval: Duration, events: EventSender) -> ChannelHandle {
        self.opened.lock().unwrap().push(OpenedChannel {
            kind: ChannelKind::Poll,
            url: url.to_string(),
            interval: Some(interval),
            sender: events,
        });
        ChannelHandle::detached(ChannelKind::Poll)
    }
}
