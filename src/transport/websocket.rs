use std::fmt::Display;

use futures::{Sink, SinkExt, Stream, StreamExt};
use reqwest::Url;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::{self, Message as WsMessage};

use crate::{
    domain::{
        compose::TypingSignal,
        events::RealtimeEventKind,
        ids::{ConversationId, UserId},
    },
    usecases::contracts::{EventHandler, RealtimeChannel, Subscription, TransportError},
};

use super::{
    hub::EventHub,
    wire::{self, OutboundFrame},
};

const REALTIME_CONNECTED: &str = "REALTIME_CONNECTED";
const REALTIME_READER_STOPPED: &str = "REALTIME_READER_STOPPED";
const REALTIME_WRITER_STOPPED: &str = "REALTIME_WRITER_STOPPED";
const REALTIME_FRAME_DECODE_FAILED: &str = "REALTIME_FRAME_DECODE_FAILED";
const REALTIME_READ_FAILED: &str = "REALTIME_READ_FAILED";
const REALTIME_WRITE_FAILED: &str = "REALTIME_WRITE_FAILED";
const REALTIME_SHUTDOWN_SIGNALLED: &str = "REALTIME_SHUTDOWN_SIGNALLED";

#[derive(Debug, thiserror::Error)]
pub enum TransportStartError {
    #[error("failed to connect realtime transport at {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: Box<tungstenite::Error>,
    },
}

/// WebSocket client for the realtime server. A reader task decodes pushed
/// frames and fans them out to subscribers; a writer task drains outgoing
/// frames. Both stop when the transport is dropped.
pub struct WebSocketTransport {
    hub: EventHub,
    outbound: mpsc::UnboundedSender<String>,
    stop_tx: Option<watch::Sender<bool>>,
}

impl WebSocketTransport {
    /// Connects to `url`. The auth token, when present, is passed as the
    /// `token` query parameter.
    pub async fn connect(url: &str, auth_token: Option<&str>) -> Result<Self, TransportStartError> {
        let request_url = with_token(url, auth_token);
        let (stream, _response) = tokio_tungstenite::connect_async(request_url.as_str())
            .await
            .map_err(|source| TransportStartError::Connect {
                url: url.to_owned(),
                source: Box::new(source),
            })?;

        let (sink, stream) = stream.split();
        let transport = Self::start(sink, stream);

        tracing::info!(code = REALTIME_CONNECTED, url, "realtime transport connected");
        Ok(transport)
    }

    fn start<Si, St>(sink: Si, stream: St) -> Self
    where
        Si: Sink<WsMessage> + Unpin + Send + 'static,
        Si::Error: Display,
        St: Stream<Item = Result<WsMessage, tungstenite::Error>> + Unpin + Send + 'static,
    {
        let hub = EventHub::default();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);

        tokio::spawn(run_writer(sink, outbound_rx, stop_rx.clone()));
        tokio::spawn(run_reader(stream, hub.clone(), stop_rx));

        Self {
            hub,
            outbound,
            stop_tx: Some(stop_tx),
        }
    }

    fn send_frame(&self, frame: OutboundFrame) -> Result<(), TransportError> {
        let text = wire::encode_outbound(&frame)?;
        self.outbound
            .send(text)
            .map_err(|_| TransportError::Closed)
    }
}

impl RealtimeChannel for WebSocketTransport {
    fn join(&self, id: &ConversationId) -> Result<(), TransportError> {
        self.send_frame(OutboundFrame::join(id))
    }

    fn leave(&self, id: &ConversationId) -> Result<(), TransportError> {
        self.send_frame(OutboundFrame::leave(id))
    }

    fn emit_typing(
        &self,
        id: &ConversationId,
        user_id: &UserId,
        signal: TypingSignal,
    ) -> Result<(), TransportError> {
        self.send_frame(OutboundFrame::typing(id, user_id, signal))
    }

    fn subscribe(&self, kind: RealtimeEventKind, handler: EventHandler) -> Subscription {
        self.hub.subscribe(kind, handler)
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(true);
            tracing::info!(
                code = REALTIME_SHUTDOWN_SIGNALLED,
                "realtime transport shutdown signal sent"
            );
        }
    }
}

async fn run_writer<Si>(
    mut sink: Si,
    mut outbound: mpsc::UnboundedReceiver<String>,
    mut stop_rx: watch::Receiver<bool>,
) where
    Si: Sink<WsMessage> + Unpin,
    Si::Error: Display,
{
    loop {
        tokio::select! {
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    // Flush frames queued before shutdown, e.g. a final room leave.
                    while let Ok(text) = outbound.try_recv() {
                        if sink.send(WsMessage::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    let _ = sink.send(WsMessage::Close(None)).await;
                    tracing::info!(code = REALTIME_WRITER_STOPPED, "realtime writer stopped");
                    return;
                }
            }
            frame = outbound.recv() => {
                let Some(text) = frame else {
                    tracing::info!(code = REALTIME_WRITER_STOPPED, "realtime writer stopped");
                    return;
                };
                if let Err(error) = sink.send(WsMessage::Text(text.into())).await {
                    tracing::warn!(
                        code = REALTIME_WRITE_FAILED,
                        error = %error,
                        "realtime frame write failed; writer stopping"
                    );
                    return;
                }
            }
        }
    }
}

async fn run_reader<St>(mut stream: St, hub: EventHub, mut stop_rx: watch::Receiver<bool>)
where
    St: Stream<Item = Result<WsMessage, tungstenite::Error>> + Unpin,
{
    loop {
        tokio::select! {
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    tracing::info!(code = REALTIME_READER_STOPPED, "realtime reader stopped");
                    return;
                }
            }
            frame = stream.next() => {
                match frame {
                    Some(Ok(WsMessage::Text(text))) => match wire::decode_inbound(&text) {
                        Ok(event) => {
                            let kind = event.kind();
                            let delivered = hub.dispatch(event);
                            tracing::trace!(
                                event = kind.as_str(),
                                delivered,
                                "realtime event dispatched"
                            );
                        }
                        Err(error) => {
                            tracing::warn!(
                                code = REALTIME_FRAME_DECODE_FAILED,
                                error = %error,
                                "skipping undecodable realtime frame"
                            );
                        }
                    },
                    Some(Ok(WsMessage::Close(_))) | None => {
                        tracing::info!(
                            code = REALTIME_READER_STOPPED,
                            "realtime connection closed by server"
                        );
                        return;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        tracing::warn!(
                            code = REALTIME_READ_FAILED,
                            error = %error,
                            "realtime read failed; reader stopping"
                        );
                        return;
                    }
                }
            }
        }
    }
}

/// Appends the token as a form-encoded `token` query pair. An unparsable
/// url is returned as is and fails at connect.
fn with_token(url: &str, auth_token: Option<&str>) -> String {
    match auth_token {
        Some(token) if !token.is_empty() => match Url::parse(url) {
            Ok(mut parsed) => {
                parsed.query_pairs_mut().append_pair("token", token);
                parsed.into()
            }
            Err(_) => url.to_owned(),
        },
        _ => url.to_owned(),
    }
}
