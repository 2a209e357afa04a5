use std::collections::HashMap;

use cabinet_proto::{
    new_node_id, Action, ActionResponse, Counter, Edge, EdgeKey, Index, Iri, Meta, MutationResponse, Node, Object, ReadCheckResponse, Status,
    StatusCode,
};
use tracing::debug;

use crate::{
    check,
    sequence::{self, Allocation},
    state::State,
};

/// Placeholder ids handed out by creates earlier in the same batch
#[derive(Debug, Default)]
pub(crate) struct Placeholders(HashMap<String, String>);

impl Placeholders {
    pub fn insert(&mut self, placeholder: String, id: String) { self.0.insert(placeholder, id); }

    pub fn id(&self, id: &mut String) {
        if let Some(permanent) = self.0.get(id.as_str()) {
            *id = permanent.clone();
        }
    }

    pub fn edge_key(&self, key: &mut EdgeKey) {
        self.id(&mut key.subject);
        self.id(&mut key.target);
    }

    pub fn object(&self, object: &mut Object) {
        match object {
            Object::Node(id) => self.id(id),
            Object::Edge(key) => self.edge_key(key),
        }
    }

    pub fn iri(&self, mut iri: Iri) -> Iri {
        match &mut iri {
            Iri::Node { id, .. } => self.id(id),
            Iri::Edge(key) => self.edge_key(key),
            Iri::Index { node, .. } => self.id(node),
            Iri::Meta { object, .. } => self.object(object),
        }
        iri
    }
}

fn changed(changed: bool) -> MutationResponse {
    if changed {
        MutationResponse::success()
    } else {
        MutationResponse::unchanged()
    }
}

/// Apply one action of a batch to the working copy
pub(crate) fn apply(state: &mut State, placeholders: &mut Placeholders, action: Action) -> Result<ActionResponse, Status> {
    Ok(match action {
        Action::NodeCreate(node) => ActionResponse::NodeCreate(node_create(state, placeholders, node)),
        Action::NodeUpdate(mut node) => {
            placeholders.id(&mut node.id);
            ActionResponse::NodeUpdate(node_update(state, node)?)
        }
        Action::NodeDelete(mut node) => {
            placeholders.id(&mut node.id);
            state.node(node.node_type, &node.id).ok_or_else(|| Status::not_found(format!("node {}", node.id)))?;
            state.nodes.remove(&node.id);
            ActionResponse::NodeDelete(MutationResponse::success())
        }

        Action::EdgeUpdate(edge) => ActionResponse::EdgeUpdate(edge_update(state, placeholders, edge)?),
        Action::EdgeDelete(edge) => {
            let mut key = edge.key();
            placeholders.edge_key(&mut key);
            ActionResponse::EdgeDelete(changed(state.edges.remove(&key).is_some()))
        }
        Action::EdgeClear(edge) => {
            let mut key = edge.key();
            placeholders.edge_key(&mut key);
            let removed = if key.target == Edge::ANY_TARGET {
                let before = state.edges.len();
                state.edges.retain(|k, _| k.subject != key.subject || k.predicate != key.predicate);
                before - state.edges.len()
            } else {
                usize::from(state.edges.remove(&key).is_some())
            };
            debug!("EdgeClear {key} removed {removed}");
            ActionResponse::EdgeClear(changed(removed > 0))
        }

        Action::IndexCreate(mut index) => {
            placeholders.id(&mut index.node);
            let key = index_key(&index);
            if state.indexes.contains_key(&key) {
                return Err(Status::already_exists(format!("index {}/{}/{}", key.0, key.1, key.2)));
            }
            state.indexes.insert(key, index);
            ActionResponse::IndexCreate(MutationResponse::success())
        }
        Action::IndexUpdate(mut index) => {
            placeholders.id(&mut index.node);
            let key = index_key(&index);
            let previous = state.indexes.insert(key, index.clone());
            ActionResponse::IndexUpdate(changed(previous.as_ref() != Some(&index)))
        }
        Action::IndexDelete(mut index) => {
            placeholders.id(&mut index.node);
            ActionResponse::IndexDelete(changed(state.indexes.remove(&index_key(&index)).is_some()))
        }

        Action::MetaUpdate(mut meta) => {
            placeholders.object(&mut meta.object);
            let previous = state.metas.insert((meta.object.clone(), meta.key), meta.clone());
            ActionResponse::MetaUpdate(changed(previous.as_ref() != Some(&meta)))
        }
        Action::MetaDelete(mut meta) => {
            placeholders.object(&mut meta.object);
            ActionResponse::MetaDelete(changed(state.metas.remove(&(meta.object, meta.key)).is_some()))
        }
        Action::MetaClear(Meta { mut object, .. }) => {
            placeholders.object(&mut object);
            let before = state.metas.len();
            state.metas.retain(|(o, _), _| *o != object);
            ActionResponse::MetaClear(changed(state.metas.len() < before))
        }

        Action::CounterRegister(mut counter) => {
            placeholders.object(&mut counter.object);
            let key = (counter.object.clone(), counter.counter);
            let registered = !state.counters.contains_key(&key);
            if registered {
                state.counters.insert(key, Counter { value: 0, ..counter });
            }
            ActionResponse::CounterRegister(changed(registered))
        }
        Action::CounterIncrement(mut counter) => {
            placeholders.object(&mut counter.object);
            ActionResponse::CounterIncrement(counter_increment(state, counter)?)
        }
        Action::CounterDelete(mut counter) => {
            placeholders.object(&mut counter.object);
            ActionResponse::CounterDelete(changed(state.counters.remove(&(counter.object, counter.counter)).is_some()))
        }

        Action::SequentialCreate(mut request) => {
            if let Some(node) = request.node.as_mut() {
                placeholders.id(node);
            }
            match sequence::create(state, request)? {
                Allocation::Created(allocated) => ActionResponse::SequentialCreate(allocated),
                Allocation::Exists(existing) => {
                    return Err(Status::already_exists(format!("uuid {} is sequence #{}", existing.uuid.unwrap_or_default(), existing.seqid.unwrap_or_default())))
                }
            }
        }
        Action::SequentialUpdate(mut request) => {
            if let Some(node) = request.node.as_mut() {
                placeholders.id(node);
            }
            ActionResponse::SequentialUpdate(sequence::update(state, request)?)
        }
        Action::SequentialDelete(request) => ActionResponse::SequentialDelete(sequence::delete(state, request)?),

        Action::ReadCheck(request) => {
            if !check::evaluate(state, &request, placeholders)? {
                return Err(Status::new(StatusCode::ReadCheckFailed, format!("read check failed: {request}")));
            }
            ActionResponse::ReadCheck(ReadCheckResponse { result: true })
        }
    })
}

fn index_key(index: &Index) -> (u32, String, String) { (index.index_type, index.value.clone(), index.node.clone()) }

fn node_create(state: &mut State, placeholders: &mut Placeholders, node: Node) -> Node {
    let id = new_node_id();
    if !node.id.is_empty() {
        placeholders.insert(node.id.clone(), id.clone());
    }
    let created = Node { id: id.clone(), version: 1, ..node };
    state.nodes.insert(id, created.clone());
    created
}

fn node_update(state: &mut State, node: Node) -> Result<MutationResponse, Status> {
    let existing = state.nodes.get_mut(&node.id).filter(|n| n.node_type == node.node_type).ok_or_else(|| Status::not_found(format!("node {}", node.id)))?;
    if existing.properties == node.properties {
        return Ok(MutationResponse::unchanged());
    }
    existing.properties = node.properties;
    existing.version += 1;
    Ok(MutationResponse::success())
}

fn edge_update(state: &mut State, placeholders: &Placeholders, mut edge: Edge) -> Result<MutationResponse, Status> {
    placeholders.id(&mut edge.subject);
    placeholders.id(&mut edge.target);
    if edge.subject.is_empty() || edge.target.is_empty() || edge.target == Edge::ANY_TARGET {
        return Err(Status::invalid_argument(format!("edge {} needs a concrete subject and target", edge.key())));
    }
    let previous = state.edges.insert(edge.key(), edge.clone());
    Ok(changed(previous.as_ref() != Some(&edge)))
}

fn counter_increment(state: &mut State, counter: Counter) -> Result<Counter, Status> {
    let key = (counter.object.clone(), counter.counter);
    let existing = state.counters.get_mut(&key).ok_or_else(|| Status::not_found(format!("counter {}/{}", key.0, key.1)))?;
    existing.value = existing
        .value
        .checked_add(counter.value)
        .ok_or_else(|| Status::invalid_argument(format!("counter {}/{} would overflow", key.0, key.1)))?;
    Ok(existing.clone())
}
