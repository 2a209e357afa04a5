use std::sync::Arc;

use anyhow::Result;
use cabinet_core::{
    connector::{CabinetConnector, ConnectError, StreamError},
    proto::*,
    Cabinet, RequestError, TransactionError,
};
use cabinet_websocket_client::WebsocketClient;
use futures::StreamExt;
use tracing::info;

mod common;
use common::*;

async fn connect(server_url: &str) -> Result<(Arc<WebsocketClient>, Cabinet)> {
    let client = Arc::new(WebsocketClient::new(server_url).await?);
    client.wait_connected().await?;
    info!("Client connected to {}", client.server_url());
    let cabinet = Cabinet::new(client.clone());
    Ok((client, cabinet))
}

#[tokio::test]
async fn transaction_over_websocket() -> Result<()> {
    let (store, server_url, server_task) = start_test_server().await?;
    let (client, cabinet) = connect(&server_url).await?;

    let mut trx = cabinet.begin();
    trx.push(Action::NodeCreate(Node::new(1, "tmp:artist").with_properties(*b"Pink Floyd")));
    trx.push(Action::NodeCreate(Node::new(2, "tmp:album").with_properties(*b"Animals")));
    trx.push(Action::EdgeUpdate(Edge::new("tmp:artist", 1, "tmp:album")));
    let committed = trx.commit().await?;

    let artist = committed.resolve("tmp:artist").map(str::to_owned);
    let album = committed.resolve("tmp:album").map(str::to_owned);
    let (Some(artist), Some(album)) = (artist, album) else { panic!("placeholders unresolved: {:?}", committed.ids()) };
    assert_eq!(store.node_count(), 2);

    assert_eq!(cabinet.node_get(2, &album).await?.properties, b"Animals");
    let edge = cabinet.edge_get(EdgeKey { subject: artist, predicate: 1, target: album.clone() }).await?;
    assert_eq!(edge.target, album);

    client.shutdown().await?;
    server_task.abort();
    Ok(())
}

#[tokio::test]
async fn store_rejection_over_websocket() -> Result<()> {
    let (store, server_url, server_task) = start_test_server().await?;
    let (client, cabinet) = connect(&server_url).await?;

    let mut trx = cabinet.begin();
    trx.push(Action::NodeCreate(Node::new(1, "tmp:a")));
    trx.push(Action::ReadCheck(ReadCheckRequest::exists("n/1/nobody")));
    let err = trx.commit().await.unwrap_err();

    assert_eq!(err.code(), 3);
    assert_eq!(err.status().map(|s| s.code), Some(StatusCode::ReadCheckFailed));
    assert_eq!(store.node_count(), 0);

    client.shutdown().await?;
    server_task.abort();
    Ok(())
}

#[tokio::test]
async fn unary_calls_over_websocket() -> Result<()> {
    let (_store, server_url, server_task) = start_test_server().await?;
    let (client, cabinet) = connect(&server_url).await?;
    let uuid = uuid::Uuid::new_v4().to_string();

    let created = cabinet.sequential_create(Sequential::new("ws").with_uuid(&uuid)).await?;
    assert_eq!(created.seqid, Some(1));
    match cabinet.sequential_create(Sequential::new("ws").with_uuid(&uuid)).await {
        Err(RequestError::AlreadyExists(existing)) => assert_eq!(existing, created),
        other => panic!("expected AlreadyExists, got {other:?}"),
    }

    let err = cabinet.node_get(1, "missing").await.unwrap_err();
    assert_eq!(err.code(), Some(StatusCode::NotFound));

    client.shutdown().await?;
    server_task.abort();
    Ok(())
}

#[tokio::test]
async fn dropped_sink_aborts_the_stream() -> Result<()> {
    let (store, server_url, server_task) = start_test_server().await?;
    let (client, _cabinet) = connect(&server_url).await?;

    let mut stream = client.open_transaction().await?;
    stream.sink.send(TransactionAction::new(1, Action::NodeCreate(Node::new(1, "tmp:a")))).await?;
    drop(stream.sink);

    match stream.responses.next().await {
        Some(Err(StreamError::Status(status))) => assert_eq!(status.code, StatusCode::Aborted),
        other => panic!("expected an aborted stream, got {other:?}"),
    }
    assert_eq!(store.node_count(), 0);

    client.shutdown().await?;
    server_task.abort();
    Ok(())
}

#[tokio::test]
async fn unreachable_server_is_a_connection_error() -> Result<()> {
    let client = Arc::new(WebsocketClient::new(&unused_url().await?).await?);
    assert!(client.wait_connected().await.is_err());
    assert!(!client.is_connected());

    let cabinet = Cabinet::new(client.clone());
    let mut trx = cabinet.begin();
    trx.push(Action::NodeCreate(Node::new(1, "tmp:a")));
    let err = trx.commit().await.unwrap_err();
    assert!(matches!(err, TransactionError::Connection(ConnectError::NotConnected)));
    assert_eq!(err.code(), 0);

    client.shutdown().await?;
    Ok(())
}
