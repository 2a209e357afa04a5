use std::{net::SocketAddr, ops::ControlFlow, sync::Arc};

use anyhow::Result;
use axum::{
    extract::{
        connect_info::ConnectInfo,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use cabinet_core::storage::CabinetStore;
use cabinet_proto as proto;
use futures_util::StreamExt;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{debug, info, warn, Level};

use crate::{sender::ClientSender, state::Connection, user_agent::OptionalUserAgent};

/// Serves a [`CabinetStore`] to websocket clients on `/ws`
pub struct WebsocketServer {
    store: Arc<dyn CabinetStore>,
}

impl WebsocketServer {
    pub fn new(store: Arc<dyn CabinetStore>) -> Self { Self { store } }

    pub async fn run(&self, bind_address: &str) -> Result<()> {
        let listener = TcpListener::bind(bind_address).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let app = Router::new().route("/ws", get(ws_handler)).with_state(self.store.clone()).layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .into_inner(),
        );

        info!("listening on {}", listener.local_addr()?);
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

        Ok(())
    }
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    user_agent: OptionalUserAgent,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(store): State<Arc<dyn CabinetStore>>,
) -> impl IntoResponse {
    info!("`{}` at {addr} connected", user_agent.label());
    ws.on_upgrade(move |socket| handle_socket(socket, addr, store))
}

async fn handle_socket(socket: WebSocket, who: SocketAddr, store: Arc<dyn CabinetStore>) {
    let (sender, mut receiver) = socket.split();
    let mut conn = Connection::new(ClientSender::new(who.to_string(), sender), store);

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(msg) => {
                if process_message(msg, who, &mut conn).await.is_break() {
                    break;
                }
            }
            Err(e) => {
                warn!("client {who} abruptly disconnected: {e}");
                break;
            }
        }
    }

    info!("Websocket context {who} destroyed with {} streams still open", conn.open_streams());
}

async fn process_message(msg: WsMessage, who: SocketAddr, conn: &mut Connection) -> ControlFlow<(), ()> {
    match msg {
        WsMessage::Binary(d) => {
            debug!(">>> {} sent {} bytes", who, d.len());
            match proto::Message::decode(&d) {
                Ok(message) => conn.handle(message).await,
                Err(e) => warn!("Failed to deserialize message from {who}: {e}"),
            }
        }
        WsMessage::Text(t) => {
            debug!(">>> {who} sent str: {t:?}");
        }
        WsMessage::Close(c) => {
            if let Some(cf) = c {
                info!(">>> {} sent close with code {} and reason `{}`", who, cf.code, cf.reason);
            } else {
                info!(">>> {who} sent close message without CloseFrame");
            }
            return ControlFlow::Break(());
        }
        WsMessage::Pong(v) => {
            debug!(">>> {who} sent pong with {v:?}");
        }
        WsMessage::Ping(v) => {
            debug!(">>> {who} sent ping with {v:?}");
        }
    }
    ControlFlow::Continue(())
}
