//! HTTP connector: server-sent events for push, plain GET for polling.

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Client, Url};
use tokio::runtime::Handle;
use tokio::task::JoinSet;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use super::sse::SseDecoder;
use super::{ChannelEvent, ChannelHandle, ChannelKind, Connector, EventSender, TransportError};

/// Default timeout for poll requests and for establishing connections.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens channels over HTTP on a tokio runtime.
///
/// The push client only bounds connection setup, since an event stream stays
/// open indefinitely; the poll client bounds each whole request.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    push_client: Client,
    poll_client: Client,
    runtime: Handle,
}

impl HttpConnector {
    /// Create a connector that spawns its tasks on `runtime`.
    pub fn new(runtime: Handle) -> Result<Self, TransportError> {
        Self::with_timeout(runtime, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(runtime: Handle, timeout: Duration) -> Result<Self, TransportError> {
        let push_client = Client::builder().connect_timeout(timeout).build()?;
        let poll_client = Client::builder().connect_timeout(timeout).timeout(timeout).build()?;
        Ok(Self {
            push_client,
            poll_client,
            runtime,
        })
    }
}

impl Connector for HttpConnector {
    fn open_push(&self, url: &str, events: EventSender) -> ChannelHandle {
        let client = self.push_client.clone();
        let url = url.to_string();

        let task = self.runtime.spawn(async move {
            let error = match stream_events(&client, &url, &events).await {
                Ok(()) => TransportError::Closed,
                Err(e) => e,
            };
            events.send(ChannelEvent::Error(error.to_string()));
        });

        ChannelHandle::spawned(ChannelKind::Push, task)
    }

    fn start_poll(&self, url: &str, interval: Duration, events: EventSender) -> ChannelHandle {
        let client = self.poll_client.clone();
        let url = url.to_string();
        let interval = interval.max(Duration::from_millis(1));

        let task = self.runtime.spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Requests live here so aborting the poll task cancels them too.
            let mut in_flight = JoinSet::new();

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let client = client.clone();
                        let url = url.clone();
                        let events = events.clone();
                        in_flight.spawn(async move {
                            let event = match fetch_latest(&client, &url).await {
                                Ok(body) => ChannelEvent::Response(body),
                                Err(e) => ChannelEvent::FetchFailed(e.to_string()),
                            };
                            events.send(event);
                        });
                    }
                    Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
                }
            }
        });

        ChannelHandle::spawned(ChannelKind::Poll, task)
    }
}

/// Read the event stream until it ends. Returns `Ok(())` on a clean close.
async fn stream_events(
    client: &Client,
    url: &str,
    events: &EventSender,
) -> Result<(), TransportError> {
    let url = Url::parse(url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

    let response = client
        .get(url)
        .header(ACCEPT, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache")
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(TransportError::Status(response.status().as_u16()));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !content_type.starts_with("text/event-stream") {
        return Err(TransportError::ContentType(content_type));
    }

    if !events.send(ChannelEvent::Opened) {
        return Ok(());
    }

    let mut decoder = SseDecoder::new();
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        for data in decoder.feed(&chunk) {
            if !events.send(ChannelEvent::Message(data)) {
                debug!("Push receiver gone, stopping stream");
                return Ok(());
            }
        }
    }

    Ok(())
}

/// One poll request, bypassing caches.
async fn fetch_latest(client: &Client, url: &str) -> Result<String, TransportError> {
    let url = Url::parse(url).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

    let response = client.get(url).header(CACHE_CONTROL, "no-store").send().await?;

    if !response.status().is_success() {
        return Err(TransportError::Status(response.status().as_u16()));
    }

    Ok(response.text().await?)
}
