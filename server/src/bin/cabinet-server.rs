use anyhow::Result;
use std::sync::Arc;

use cabinet_server::ServerConfig;
use cabinet_storage_memory::MemoryStore;
use cabinet_websocket_server::WebsocketServer;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from_env()?;

    // initialize tracing
    tracing_subscriber::fmt().with_max_level(config.log_level).init();

    let store = Arc::new(MemoryStore::new());

    // Create and start the websocket server
    let server = WebsocketServer::new(store);
    server.run(&config.bind).await?;

    Ok(())
}
