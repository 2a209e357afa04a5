use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::Result;
use async_trait::async_trait;
use cabinet_core::{
    connector::{CabinetConnector, ConnectError, StreamError, TransactionStream},
    util::{unbounded_receiver_stream, SafeMap},
};
use cabinet_proto::{self as proto, RequestId, StreamFrame, StreamId};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use strum::Display;
use thiserror::Error;
use tokio::{
    net::TcpStream,
    select,
    sync::{mpsc, oneshot, watch, Notify},
    task::JoinHandle,
    time::sleep,
};
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use crate::sender::WebsocketActionSink;

/// Connection state for the websocket client
#[derive(Debug, Clone, PartialEq, Display)]
pub enum ConnectionState {
    Disconnected,
    #[strum(serialize = "Connecting")]
    Connecting { url: String },
    #[strum(serialize = "Connected")]
    Connected { url: String },
    #[strum(serialize = "Error")]
    Error(ConnectionError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConnectionError {
    #[error("General connection error: {0}")]
    General(String),
}

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;
type PendingStream = mpsc::UnboundedSender<Result<proto::TransactionActionResponse, StreamError>>;

struct Inner {
    server_url: String,
    connection_state: watch::Sender<ConnectionState>,
    connected: AtomicBool,
    shutdown: Notify,
    shutdown_requested: AtomicBool,
    outgoing: mpsc::UnboundedSender<proto::Message>,
    pending_requests: SafeMap<RequestId, oneshot::Sender<proto::ResponseBody>>,
    pending_streams: SafeMap<StreamId, PendingStream>,
}

/// A [`CabinetConnector`] speaking to a `cabinet-websocket-server` over one persistent socket.
///
/// Reconnects with exponential backoff when the connection drops. Requests and transaction
/// streams in flight when that happens fail; nothing is replayed.
pub struct WebsocketClient {
    inner: Arc<Inner>,
    task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl WebsocketClient {
    /// Create a new WebSocket client and start connecting to the server
    pub async fn new(server_url: &str) -> Result<Self> {
        let ws_url = Self::normalize_url(server_url);
        info!("Creating WebSocket client for {}", ws_url);

        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        let inner = Arc::new(Inner {
            server_url: ws_url,
            connection_state: watch::Sender::new(ConnectionState::Disconnected),
            connected: AtomicBool::new(false),
            shutdown: Notify::new(),
            shutdown_requested: AtomicBool::new(false),
            outgoing,
            pending_requests: SafeMap::new(),
            pending_streams: SafeMap::new(),
        });

        let task = tokio::spawn(Self::run_connection_loop(inner.clone(), outgoing_rx));
        Ok(Self { inner, task: std::sync::Mutex::new(Some(task)) })
    }

    fn normalize_url(url: &str) -> String {
        match url {
            u if u.starts_with("ws://") || u.starts_with("wss://") => format!("{}/ws", u),
            u if u.starts_with("http://") => format!("ws://{}/ws", &u[7..]),
            u if u.starts_with("https://") => format!("wss://{}/ws", &u[8..]),
            u => format!("wss://{}/ws", u),
        }
    }

    pub fn server_url(&self) -> &str { &self.inner.server_url }

    /// Subscribe to connection state changes
    pub fn state(&self) -> watch::Receiver<ConnectionState> { self.inner.connection_state.subscribe() }

    /// Check if currently connected to the server
    pub fn is_connected(&self) -> bool { self.inner.connected.load(Ordering::SeqCst) }

    /// Gracefully shutdown the WebSocket connection
    pub async fn shutdown(&self) -> Result<()> {
        info!("Shutting down WebSocket client");

        let task = self.task.lock().map_err(|_| anyhow::anyhow!("client task lock poisoned"))?.take();
        if let Some(task) = task {
            self.inner.shutdown_requested.store(true, Ordering::Release);
            self.inner.shutdown.notify_waiters();

            match task.await {
                Ok(()) => info!("WebSocket client shutdown completed"),
                Err(e) => warn!("Connection task join error during shutdown: {}", e),
            }
        } else {
            info!("WebSocket client already shut down");
        }
        Ok(())
    }

    /// Wait until the client is connected, or the latest attempt failed
    pub async fn wait_connected(&self) -> Result<(), ConnectionError> {
        let mut state = self.state();
        let settled = state.wait_for(|s| matches!(s, ConnectionState::Connected { .. } | ConnectionState::Error(_))).await.map(|s| s.clone());
        match settled {
            Ok(ConnectionState::Connected { .. }) => Ok(()),
            Ok(ConnectionState::Error(e)) => Err(e),
            Ok(other) => Err(ConnectionError::General(format!("unexpected state {other}"))),
            Err(_) => Err(ConnectionError::General("client shut down".into())),
        }
    }

    /// Main connection loop with automatic reconnection
    async fn run_connection_loop(inner: Arc<Inner>, mut outgoing_rx: mpsc::UnboundedReceiver<proto::Message>) {
        let mut backoff = INITIAL_BACKOFF;
        info!("Starting websocket connection loop to {}", inner.server_url);

        loop {
            select! {
                _ = inner.shutdown.notified() => {
                    info!("Websocket connection shutting down");
                    break;
                }
                result = Self::connect_once(&inner, &mut outgoing_rx) => {
                    match result {
                        Ok(()) => {
                            info!("Connection to {} completed normally", inner.server_url);
                            backoff = INITIAL_BACKOFF;
                            if inner.shutdown_requested.load(Ordering::Acquire) {
                                info!("Shutdown requested, stopping reconnection attempts");
                                break;
                            }
                        }
                        Err(e) => {
                            error!("Connection to {} failed: {}", inner.server_url, e);
                            inner.connection_state.send_replace(ConnectionState::Error(ConnectionError::General(e.to_string())));

                            info!("Retrying connection in {:?}", backoff);
                            select! {
                                _ = inner.shutdown.notified() => break,
                                _ = sleep(backoff) => {}
                            }
                            backoff = (backoff * 2).min(MAX_BACKOFF);
                        }
                    }
                }
            }
        }

        Self::fail_pending(&inner, &mut outgoing_rx, "client shut down");
        inner.connection_state.send_replace(ConnectionState::Disconnected);
    }

    /// Attempt a single connection, failing everything in flight once it ends
    async fn connect_once(inner: &Arc<Inner>, outgoing_rx: &mut mpsc::UnboundedReceiver<proto::Message>) -> Result<()> {
        let result = Self::session(inner, outgoing_rx).await;
        Self::fail_pending(inner, outgoing_rx, "connection lost");
        result
    }

    async fn session(inner: &Arc<Inner>, outgoing_rx: &mut mpsc::UnboundedReceiver<proto::Message>) -> Result<()> {
        info!("Attempting to connect to {}", inner.server_url);
        inner.connection_state.send_replace(ConnectionState::Connecting { url: inner.server_url.clone() });

        let (ws_stream, _) = connect_async(inner.server_url.as_str()).await?;
        info!("WebSocket handshake completed with {}", inner.server_url);

        let (mut sink, mut stream) = ws_stream.split();
        inner.connected.store(true, Ordering::SeqCst);
        inner.connection_state.send_replace(ConnectionState::Connected { url: inner.server_url.clone() });

        loop {
            select! {
                _ = inner.shutdown.notified() => {
                    debug!("Connection received shutdown signal");
                    let _ = sink.send(WsMessage::Close(None)).await;
                    break;
                }
                msg = outgoing_rx.recv() => {
                    let Some(message) = msg else { break };
                    Self::handle_outgoing_message(&mut sink, message).await?;
                }
                msg = stream.next() => {
                    match Self::handle_incoming_message(inner, msg, &mut sink).await? {
                        MessageResult::Continue => continue,
                        MessageResult::Break => break,
                    }
                }
            }
        }
        Ok(())
    }

    /// Fail every request and stream still waiting on the server
    fn fail_pending(inner: &Inner, outgoing_rx: &mut mpsc::UnboundedReceiver<proto::Message>, reason: &str) {
        inner.connected.store(false, Ordering::SeqCst);
        while outgoing_rx.try_recv().is_ok() {}

        Self::fail_streams(inner, reason);
        // dropping the senders fails the callers
        let requests = inner.pending_requests.take_all();
        if !requests.is_empty() {
            debug!("Failing {} pending requests: {reason}", requests.len());
        }
    }

    fn fail_streams(inner: &Inner, reason: &str) {
        for (id, tx) in inner.pending_streams.take_all() {
            debug!("Failing stream {id}: {reason}");
            let _ = tx.send(Err(StreamError::Transport(reason.to_owned())));
        }
    }

    /// Decode and route one binary frame. A frame that does not decode cannot be traced to
    /// its stream, so it fails every open stream.
    fn receive_frame(inner: &Inner, data: &[u8]) {
        match proto::Message::decode(data) {
            Ok(message) => Self::dispatch(inner, message),
            Err(e) => {
                warn!("Failed to deserialize message: {}", e);
                Self::fail_streams(inner, &format!("undecodable frame: {e}"));
            }
        }
    }

    async fn handle_outgoing_message(sink: &mut WsSink, message: proto::Message) -> Result<()> {
        debug!("Sending {message}");
        match message.encode() {
            Ok(data) => sink.send(WsMessage::Binary(data.into())).await?,
            Err(e) => error!("Failed to serialize outgoing message: {}", e),
        }
        Ok(())
    }

    async fn handle_incoming_message(
        inner: &Arc<Inner>,
        msg: Option<Result<WsMessage, tokio_tungstenite::tungstenite::Error>>,
        sink: &mut WsSink,
    ) -> Result<MessageResult> {
        match msg {
            Some(Ok(WsMessage::Binary(data))) => {
                Self::receive_frame(inner, &data);
                Ok(MessageResult::Continue)
            }
            Some(Ok(WsMessage::Close(_))) => {
                info!("WebSocket connection closed by server");
                Ok(MessageResult::Break)
            }
            Some(Ok(WsMessage::Ping(data))) => {
                debug!("Received ping, sending pong");
                if let Err(e) = sink.send(WsMessage::Pong(data)).await {
                    warn!("Failed to send pong: {}", e);
                    return Err(e.into());
                }
                Ok(MessageResult::Continue)
            }
            Some(Ok(WsMessage::Text(text))) => {
                debug!("Received unexpected text message: {}", text);
                Ok(MessageResult::Continue)
            }
            Some(Ok(_)) => Ok(MessageResult::Continue),
            Some(Err(e)) => {
                error!("WebSocket error: {}", e);
                Err(e.into())
            }
            None => {
                info!("WebSocket stream closed");
                Ok(MessageResult::Break)
            }
        }
    }

    /// Route a server message to whoever is waiting for it
    fn dispatch(inner: &Inner, message: proto::Message) {
        match message {
            proto::Message::Response { id, body } => match inner.pending_requests.remove(&id) {
                Some(tx) => {
                    let _ = tx.send(body);
                }
                None => warn!("Response for unknown request {id}"),
            },
            proto::Message::Stream { id, frame: StreamFrame::Response(response) } => {
                if inner.pending_streams.with(&id, |tx| tx.send(Ok(response))).is_none() {
                    warn!("Response for unknown stream {id}");
                }
            }
            proto::Message::Stream { id, frame: StreamFrame::End(status) } => {
                // removing the sender ends the response stream
                match (inner.pending_streams.remove(&id), status) {
                    (Some(tx), Some(status)) => {
                        let _ = tx.send(Err(StreamError::Status(status)));
                    }
                    (Some(_), None) => debug!("Stream {id} ended"),
                    (None, _) => warn!("End for unknown stream {id}"),
                }
            }
            other => warn!("Ignoring unexpected message {other}"),
        }
    }
}

#[async_trait]
impl CabinetConnector for WebsocketClient {
    async fn open_transaction(&self) -> Result<TransactionStream, ConnectError> {
        let id = StreamId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.pending_streams.insert(id.clone(), tx);
        // checked after registering so a concurrent disconnect cannot strand the entry
        if !self.is_connected() {
            self.inner.pending_streams.remove(&id);
            return Err(ConnectError::NotConnected);
        }

        if self.inner.outgoing.send(proto::Message::Stream { id: id.clone(), frame: StreamFrame::Open }).is_err() {
            self.inner.pending_streams.remove(&id);
            return Err(ConnectError::ConnectionClosed);
        }
        debug!("Opened stream {id}");
        Ok(TransactionStream { sink: Box::new(WebsocketActionSink::new(id, self.inner.outgoing.clone())), responses: unbounded_receiver_stream(rx) })
    }

    async fn request(&self, body: proto::RequestBody) -> Result<proto::ResponseBody, ConnectError> {
        let id = RequestId::new();
        let (tx, rx) = oneshot::channel();
        self.inner.pending_requests.insert(id.clone(), tx);
        if !self.is_connected() {
            self.inner.pending_requests.remove(&id);
            return Err(ConnectError::NotConnected);
        }

        if self.inner.outgoing.send(proto::Message::Request { id: id.clone(), body }).is_err() {
            self.inner.pending_requests.remove(&id);
            return Err(ConnectError::ConnectionClosed);
        }
        rx.await.map_err(|_| ConnectError::ConnectionClosed)
    }
}

#[derive(Debug)]
enum MessageResult {
    Continue,
    Break,
}

impl Drop for WebsocketClient {
    fn drop(&mut self) {
        if let Ok(mut task) = self.task.lock() {
            if let Some(task) = task.take() {
                debug!("WebSocket client dropped, requesting shutdown");
                self.inner.shutdown_requested.store(true, Ordering::Release);
                self.inner.shutdown.notify_waiters();
                task.abort();
            }
        }
    }
}
