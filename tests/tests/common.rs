use std::{str::FromStr, sync::Arc};

use anyhow::Result;
use cabinet_connector_local_process::LocalProcessConnector;
use cabinet_core::Cabinet;
use cabinet_storage_memory::MemoryStore;
use cabinet_websocket_server::WebsocketServer;
use tokio::{net::TcpListener, task::JoinHandle};
use tracing::{info, Level};

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() {
    // if LOG_LEVEL env var is set, use it
    if let Ok(level) = std::env::var("LOG_LEVEL") {
        tracing_subscriber::fmt().with_max_level(Level::from_str(&level).unwrap()).with_test_writer().init();
    } else {
        tracing_subscriber::fmt().with_max_level(Level::INFO).with_test_writer().init();
    }
}

/// A cabinet talking to a fresh memory store in this process
#[allow(unused)]
pub fn local_cabinet() -> (Cabinet, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let connector = Arc::new(LocalProcessConnector::new(store.clone()));
    (Cabinet::new(connector), store)
}

/// Serve a fresh memory store on an ephemeral port, returning the store and its url
#[allow(unused)]
pub async fn start_test_server() -> Result<(Arc<MemoryStore>, String, JoinHandle<()>)> {
    let store = Arc::new(MemoryStore::new());
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let server_url = format!("ws://{}", listener.local_addr()?);
    info!("Starting websocket server on {}", server_url);

    let server = WebsocketServer::new(store.clone());
    let server_task = tokio::spawn(async move {
        if let Err(e) = server.serve(listener).await {
            tracing::warn!("Test server error: {}", e);
        }
    });

    Ok((store, server_url, server_task))
}

/// A local address nobody is listening on
#[allow(unused)]
pub async fn unused_url() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    Ok(format!("ws://{}", listener.local_addr()?))
}
