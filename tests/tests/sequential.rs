use anyhow::Result;
use cabinet_core::{proto::*, RequestError};
use futures::future::join_all;

mod common;
use common::*;

fn seqids(entries: &[Sequential]) -> Vec<u32> { entries.iter().filter_map(|s| s.seqid).collect() }

#[tokio::test]
async fn concurrent_creates_allocate_dense_ids() -> Result<()> {
    let (cabinet, _store) = local_cabinet();

    let creates = (0..100).map(|i| cabinet.sequential_create(Sequential::new("ticket").with_node(format!("node-{i}"))));
    let mut allocated = join_all(creates).await.into_iter().map(|r| r.map(|s| s.seqid.unwrap_or_default())).collect::<Result<Vec<_>, _>>()?;
    allocated.sort();

    assert_eq!(allocated, (1..=100).collect::<Vec<u32>>());
    Ok(())
}

#[tokio::test]
async fn repeated_uuid_returns_existing_allocation() -> Result<()> {
    let (cabinet, _store) = local_cabinet();
    let uuid = uuid::Uuid::new_v4().to_string();

    let first = cabinet.sequential_create(Sequential::new("order").with_uuid(&uuid)).await?;
    assert_eq!(first.seqid, Some(1));

    match cabinet.sequential_create(Sequential::new("order").with_uuid(&uuid)).await {
        Err(RequestError::AlreadyExists(existing)) => assert_eq!(existing.seqid, Some(1)),
        other => panic!("expected AlreadyExists, got {other:?}"),
    }
    assert_eq!(cabinet.sequential_get(Sequential::new("order").with_uuid(&uuid)).await?.seqid, Some(1));

    // deleting frees the uuid, ids keep growing
    cabinet.sequential_delete(Sequential::new("order").with_seqid(1)).await?;
    let again = cabinet.sequential_create(Sequential::new("order").with_uuid(&uuid)).await?;
    assert_eq!(again.seqid, Some(2));
    Ok(())
}

#[tokio::test]
async fn update_rebinds_the_node() -> Result<()> {
    let (cabinet, _store) = local_cabinet();

    let created = cabinet.sequential_create(Sequential::new("slot").with_node("a")).await?;
    let seqid = created.seqid.unwrap_or_default();

    let response = cabinet.sequential_update(Sequential::new("slot").with_seqid(seqid).with_node("b")).await?;
    assert_eq!(response.status, MutationStatus::Success);
    let response = cabinet.sequential_update(Sequential::new("slot").with_seqid(seqid).with_node("b")).await?;
    assert_eq!(response.status, MutationStatus::Unchanged);

    assert_eq!(cabinet.sequential_get(Sequential::new("slot").with_seqid(seqid)).await?.node.as_deref(), Some("b"));
    Ok(())
}

#[tokio::test]
async fn malformed_requests_are_rejected() -> Result<()> {
    let (cabinet, _store) = local_cabinet();
    let invalid = |r: Result<(), RequestError>| matches!(r, Err(e) if e.code() == Some(StatusCode::InvalidArgument));

    assert!(invalid(cabinet.sequential_create(Sequential::new("t").with_node("n").with_seqid(5)).await.map(|_| ())));
    assert!(invalid(cabinet.sequential_create(Sequential::new("t")).await.map(|_| ())));
    assert!(invalid(cabinet.sequential_update(Sequential::new("t").with_node("n")).await.map(|_| ())));
    assert!(invalid(cabinet.sequential_delete(Sequential::new("t").with_seqid(1).with_node("n")).await.map(|_| ())));
    assert!(invalid(cabinet.sequential_get(Sequential::new("t")).await.map(|_| ())));
    assert!(invalid(cabinet.sequential_list("t", ListOptions::all(0)).await.map(|_| ())));

    let missing = cabinet.sequential_delete(Sequential::new("t").with_seqid(9)).await.unwrap_err();
    assert_eq!(missing.code(), Some(StatusCode::NotFound));
    Ok(())
}

#[tokio::test]
async fn listing_pages_in_id_order() -> Result<()> {
    let (cabinet, _store) = local_cabinet();
    for i in 0..5 {
        cabinet.sequential_create(Sequential::new("row").with_node(format!("n{i}"))).await?;
    }

    assert_eq!(seqids(&cabinet.sequential_list("row", ListOptions::all(2)).await?), [1, 2, 3, 4, 5]);
    assert_eq!(seqids(&cabinet.sequential_list("row", ListOptions::page(1, 2)).await?), [3, 4]);
    assert_eq!(seqids(&cabinet.sequential_list("row", ListOptions::page(2, 2)).await?), [5]);
    assert!(cabinet.sequential_list("row", ListOptions::page(3, 2)).await?.is_empty());
    assert!(cabinet.sequential_list("other", ListOptions::all(2)).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn sequences_allocate_inside_transactions() -> Result<()> {
    let (cabinet, _store) = local_cabinet();
    cabinet.sequential_create(Sequential::new("invoice").with_node("first")).await?;

    let mut trx = cabinet.begin();
    trx.push(Action::NodeCreate(Node::new(1, "tmp:invoice")));
    let allocation = trx.push(Action::SequentialCreate(Sequential::new("invoice").with_node("tmp:invoice")));
    let committed = trx.commit().await?;

    match committed.response(allocation) {
        Some(ActionResponse::SequentialCreate(s)) => {
            assert_eq!(s.seqid, Some(2));
            assert_eq!(s.node.as_deref(), committed.resolve("tmp:invoice"));
        }
        other => panic!("unexpected response {other:?}"),
    }
    Ok(())
}
