use std::collections::HashSet;

use anyhow::Result;
use cabinet_core::{proto::*, TransactionError};

mod common;
use common::*;

#[tokio::test]
async fn created_nodes_link_within_one_batch() -> Result<()> {
    let (cabinet, store) = local_cabinet();

    let mut trx = cabinet.begin();
    trx.push(Action::NodeCreate(Node::new(1, "tmp:alice").with_properties(*b"Alice")));
    trx.push(Action::NodeCreate(Node::new(1, "tmp:bob").with_properties(*b"Bob")));
    trx.push(Action::EdgeUpdate(Edge::new("tmp:alice", 7, "tmp:bob")));
    trx.push(Action::IndexCreate(Index::new(2, "alice", "tmp:alice")));
    trx.push(Action::MetaUpdate(Meta::new(Object::Node("tmp:alice".into()), 3).with_value(*b"admin")));
    trx.push(Action::CounterRegister(Counter::new(Object::Node("tmp:bob".into()), 4)));
    let committed = trx.commit().await?;

    assert_eq!(committed.ids().len(), 2);
    assert_eq!(committed.responses().len(), 6);
    let alice = committed.ids()["tmp:alice"].to_owned();
    let bob = committed.ids()["tmp:bob"].to_owned();
    assert_ne!(alice, bob);
    assert_eq!(store.node_count(), 2);

    assert_eq!(cabinet.node_get(1, &alice).await?.properties, b"Alice");
    let edges = cabinet.edge_list(&alice, Some(7), ListOptions::all(10)).await?;
    assert_eq!(edges.iter().map(|e| e.target.as_str()).collect::<Vec<_>>(), [bob.as_str()]);
    assert_eq!(cabinet.index_get(2, "alice", &alice).await?.node, alice);
    assert_eq!(cabinet.meta_get(Object::Node(alice.clone()), 3).await?.value, b"admin");
    assert_eq!(cabinet.counter_get(Object::Node(bob), 4).await?.value, 0);
    Ok(())
}

#[tokio::test]
async fn node_create_without_placeholder() -> Result<()> {
    let (cabinet, store) = local_cabinet();

    let mut trx = cabinet.begin();
    let create = trx.push(Action::NodeCreate(Node::new(1, "")));
    let committed = trx.commit().await?;

    assert!(committed.ids().is_empty());
    assert_eq!(store.node_count(), 1);
    let id = match committed.response(create) {
        Some(ActionResponse::NodeCreate(node)) => node.id.clone(),
        other => panic!("unexpected response {other:?}"),
    };
    assert!(!id.is_empty());
    assert_eq!(cabinet.node_get(1, &id).await?.id, id);
    Ok(())
}

#[tokio::test]
async fn counter_increments_report_new_value() -> Result<()> {
    let (cabinet, _store) = local_cabinet();
    let object = Object::Node("n1".into());

    let mut trx = cabinet.begin();
    trx.push(Action::CounterRegister(Counter::new(object.clone(), 1)));
    trx.push(Action::CounterIncrement(Counter::new(object.clone(), 1).with_value(3)));
    let second = trx.push(Action::CounterIncrement(Counter::new(object.clone(), 1).with_value(-1)));
    let committed = trx.commit().await?;

    match committed.response(second) {
        Some(ActionResponse::CounterIncrement(counter)) => assert_eq!(counter.value, 2),
        other => panic!("unexpected response {other:?}"),
    }
    assert_eq!(cabinet.counter_get(object, 1).await?.value, 2);
    Ok(())
}

#[tokio::test]
async fn failed_read_check_rolls_back_the_batch() -> Result<()> {
    let (cabinet, store) = local_cabinet();

    let mut trx = cabinet.begin();
    trx.push(Action::NodeCreate(Node::new(1, "tmp:a").with_properties(*b"v1")));
    let id = trx.commit().await?.into_ids()["tmp:a"].to_owned();

    let mut trx = cabinet.begin();
    trx.push(Action::NodeCreate(Node::new(1, "tmp:b")));
    trx.push(Action::ReadCheck(ReadCheckRequest::equal(format!("n/1/{id}"), CheckTarget::Value(b"v2".to_vec()))));
    let err = trx.commit().await.unwrap_err();

    assert_eq!(err.code(), 3);
    assert_eq!(err.status().map(|s| s.code), Some(StatusCode::ReadCheckFailed));
    assert_eq!(store.node_count(), 1);
    assert_eq!(cabinet.node_list(1, ListOptions::all(10)).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn read_check_sees_earlier_actions() -> Result<()> {
    let (cabinet, _store) = local_cabinet();

    let mut trx = cabinet.begin();
    trx.push(Action::NodeCreate(Node::new(1, "tmp:a").with_properties(*b"v1")));
    let check = trx.push(Action::ReadCheck(ReadCheckRequest::equal("n/1/tmp:a", CheckTarget::Value(b"v1".to_vec()))));
    let committed = trx.commit().await?;

    assert!(matches!(committed.response(check), Some(ActionResponse::ReadCheck(ReadCheckResponse { result: true }))));
    Ok(())
}

#[tokio::test]
async fn unary_read_check() -> Result<()> {
    let (cabinet, _store) = local_cabinet();

    let mut trx = cabinet.begin();
    trx.push(Action::NodeCreate(Node::new(1, "tmp:a").with_properties(*b"v1")));
    trx.push(Action::NodeCreate(Node::new(1, "tmp:b").with_properties(*b"v1")));
    let ids = trx.commit().await?.into_ids();
    let (a, b) = (format!("n/1/{}", &ids["tmp:a"]), format!("n/1/{}", &ids["tmp:b"]));

    assert!(cabinet.read_check(ReadCheckRequest::equal(&a, CheckTarget::Iri(b.clone()))).await?);
    assert!(!cabinet.read_check(ReadCheckRequest::not_equal(&a, CheckTarget::Iri(b))).await?);
    assert!(!cabinet.read_check(ReadCheckRequest::exists("n/1/missing")).await?);

    let err = cabinet.read_check(ReadCheckRequest::exists("x/1")).await.unwrap_err();
    assert_eq!(err.code(), Some(StatusCode::InvalidArgument));
    Ok(())
}

#[tokio::test]
async fn duplicate_action_id_never_opens_a_stream() -> Result<()> {
    let (cabinet, store) = local_cabinet();

    let mut trx = cabinet.begin();
    trx.add(TransactionAction::new(1, Action::NodeCreate(Node::new(1, "tmp:a"))))
        .add(TransactionAction::new(1, Action::NodeCreate(Node::new(1, "tmp:b"))));
    let err = trx.commit().await.unwrap_err();

    assert!(matches!(err, TransactionError::DuplicateAction(ActionId(1))));
    assert_eq!(err.code(), 10);
    assert_eq!(store.node_count(), 0);

    let err = cabinet.begin().commit().await.unwrap_err();
    assert!(matches!(err, TransactionError::Empty));
    assert_eq!(err.code(), 11);
    Ok(())
}

#[tokio::test]
async fn many_placeholders_resolve_to_distinct_ids() -> Result<()> {
    let (cabinet, store) = local_cabinet();

    let mut trx = cabinet.begin();
    for i in 0..50 {
        trx.push(Action::NodeCreate(Node::new(1, format!("tmp:{i}"))));
    }
    let ids = trx.commit().await?.into_ids();

    assert_eq!(ids.len(), 50);
    let distinct: HashSet<_> = ids.iter().map(|(_, id)| id.to_owned()).collect();
    assert_eq!(distinct.len(), 50);
    assert_eq!(store.node_count(), 50);
    Ok(())
}

#[tokio::test]
async fn updates_and_deletes() -> Result<()> {
    let (cabinet, _store) = local_cabinet();

    let mut trx = cabinet.begin();
    trx.push(Action::NodeCreate(Node::new(1, "tmp:a").with_properties(*b"v1")));
    let id = trx.commit().await?.into_ids()["tmp:a"].to_owned();

    let mut trx = cabinet.begin();
    let update = trx.push(Action::NodeUpdate(Node::new(1, &id).with_properties(*b"v2")));
    let committed = trx.commit().await?;
    assert!(matches!(committed.response(update), Some(ActionResponse::NodeUpdate(MutationResponse { status: MutationStatus::Success }))));
    assert_eq!(cabinet.node_get(1, &id).await?.properties, b"v2");

    let mut trx = cabinet.begin();
    trx.push(Action::NodeDelete(Node::new(1, &id)));
    trx.commit().await?;
    let err = cabinet.node_get(1, &id).await.unwrap_err();
    assert_eq!(err.code(), Some(StatusCode::NotFound));
    Ok(())
}

#[tokio::test]
async fn read_check_guards_later_updates() -> Result<()> {
    let (cabinet, _store) = local_cabinet();

    let mut trx = cabinet.begin();
    trx.push(Action::NodeCreate(Node::new(1, "tmp:x").with_properties(*b"v1")));
    let id = trx.commit().await?.into_ids()["tmp:x"].to_owned();
    let iri = format!("n/1/{id}");

    let mut trx = cabinet.begin();
    trx.push(Action::ReadCheck(ReadCheckRequest::equal(&iri, CheckTarget::Value(b"stale".to_vec()))));
    trx.push(Action::NodeUpdate(Node::new(1, &id).with_properties(*b"v2")));
    assert!(trx.commit().await.is_err());
    assert_eq!(cabinet.node_get(1, &id).await?.properties, b"v1");

    let mut trx = cabinet.begin();
    trx.push(Action::ReadCheck(ReadCheckRequest::equal(&iri, CheckTarget::Value(b"v1".to_vec()))));
    trx.push(Action::NodeUpdate(Node::new(1, &id).with_properties(*b"v2")));
    trx.commit().await?;
    assert_eq!(cabinet.node_get(1, &id).await?.properties, b"v2");
    Ok(())
}
