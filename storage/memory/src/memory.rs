use std::sync::Mutex;

use async_trait::async_trait;
use cabinet_core::storage::CabinetStore;
use cabinet_proto::{
    ReadCheckResponse, RequestBody, ResponseBody, Status, StatusCode, TransactionAction, TransactionActionResponse,
};
use tracing::{debug, info, warn};

use crate::{
    apply::{apply, Placeholders},
    check,
    page::paginate,
    sequence::{self, Allocation},
    state::State,
};

/// A store that keeps everything in process memory. Used by tests and the demo server.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>, Status> {
        self.state.lock().map_err(|_| Status::new(StatusCode::Internal, "store state poisoned"))
    }

    /// Number of nodes currently stored
    pub fn node_count(&self) -> usize { self.lock().map(|s| s.nodes.len()).unwrap_or_default() }

    fn read(&self, body: RequestBody) -> Result<ResponseBody, Status> {
        let state = self.lock()?;
        let none = Placeholders::default();
        Ok(match body {
            RequestBody::NodeGet(r) => {
                ResponseBody::Node(state.node(r.node_type, &r.id).cloned().ok_or_else(|| Status::not_found(format!("node {}", r.id)))?)
            }
            RequestBody::NodeList(r) => {
                ResponseBody::Nodes(paginate(state.nodes.values().filter(|n| n.node_type == r.node_type).cloned(), &r.options)?)
            }
            RequestBody::EdgeGet(key) => {
                ResponseBody::Edge(state.edges.get(&key).cloned().ok_or_else(|| Status::not_found(format!("edge {key}")))?)
            }
            RequestBody::EdgeList(r) => ResponseBody::Edges(paginate(state.edges_from(&r.subject, r.predicate).cloned(), &r.options)?),
            RequestBody::IndexGet(r) => ResponseBody::Index(
                state
                    .index(r.index_type, &r.value, &r.node)
                    .cloned()
                    .ok_or_else(|| Status::not_found(format!("index {}/{}/{}", r.index_type, r.value, r.node)))?,
            ),
            RequestBody::IndexList(r) => {
                let matches = state
                    .indexes
                    .values()
                    .filter(|i| i.index_type == r.index_type && r.value.as_ref().map_or(true, |v| *v == i.value))
                    .cloned();
                ResponseBody::Indexes(paginate(matches, &r.options)?)
            }
            RequestBody::MetaGet(r) => ResponseBody::Meta(
                state.metas.get(&(r.object.clone(), r.key)).cloned().ok_or_else(|| Status::not_found(format!("meta {}/{}", r.object, r.key)))?,
            ),
            RequestBody::MetaList(r) => ResponseBody::Metas(paginate(state.metas_of(&r.object).cloned(), &r.options)?),
            RequestBody::CounterGet(r) => ResponseBody::Counter(
                state
                    .counters
                    .get(&(r.object.clone(), r.counter))
                    .cloned()
                    .ok_or_else(|| Status::not_found(format!("counter {}/{}", r.object, r.counter)))?,
            ),
            RequestBody::ReadCheck(r) => ResponseBody::ReadCheck(ReadCheckResponse { result: check::evaluate(&state, &r, &none)? }),
            RequestBody::SequentialGet(r) => ResponseBody::Sequential(sequence::get(&state, &r)?),
            RequestBody::SequentialList(r) => {
                ResponseBody::Sequentials(paginate(sequence::list(&state, &r.seq_type)?.into_iter().cloned(), &r.options)?)
            }
            other => return Err(Status::new(StatusCode::Internal, format!("{other} is not a read"))),
        })
    }

    fn write(&self, body: RequestBody) -> Result<ResponseBody, Status> {
        let mut state = self.lock()?;
        Ok(match body {
            RequestBody::SequentialCreate(r) => match sequence::create(&mut state, r)? {
                Allocation::Created(allocated) => ResponseBody::Sequential(allocated),
                Allocation::Exists(existing) => ResponseBody::SequentialExists(existing),
            },
            RequestBody::SequentialUpdate(r) => ResponseBody::Mutation(sequence::update(&mut state, r)?),
            RequestBody::SequentialDelete(r) => ResponseBody::Mutation(sequence::delete(&mut state, r)?),
            other => return Err(Status::new(StatusCode::Internal, format!("{other} is not a write"))),
        })
    }
}

#[async_trait]
impl CabinetStore for MemoryStore {
    async fn commit(&self, actions: Vec<TransactionAction>) -> Result<Vec<TransactionActionResponse>, Status> {
        let mut live = self.lock()?;
        let mut working = live.clone();
        let mut placeholders = Placeholders::default();
        let mut responses = Vec::with_capacity(actions.len());

        for TransactionAction { action_id, action } in actions {
            let kind = action.kind();
            match apply(&mut working, &mut placeholders, action) {
                Ok(response) => responses.push(TransactionActionResponse { action_id, response }),
                Err(status) => {
                    warn!("MemoryStore rejected batch at {action_id} {kind}: {status}");
                    return Err(status);
                }
            }
        }

        *live = working;
        info!("MemoryStore committed {} actions", responses.len());
        Ok(responses)
    }

    async fn handle_request(&self, body: RequestBody) -> ResponseBody {
        debug!("MemoryStore request {body}");
        let write = matches!(body, RequestBody::SequentialCreate(_) | RequestBody::SequentialUpdate(_) | RequestBody::SequentialDelete(_));
        let result = if write { self.write(body) } else { self.read(body) };
        match result {
            Ok(response) => response,
            Err(status) => ResponseBody::Error(status),
        }
    }
}
