use std::sync::Arc;

use cabinet_proto::{self as proto, RequestBody, ResponseBody};
use tracing::debug;

use crate::{connector::CabinetConnector, error::RequestError, transaction::Transaction};

/// Typed client over a [`CabinetConnector`].
///
/// Transactions are started with [`Cabinet::begin`]; everything else is a unary call.
#[derive(Clone)]
pub struct Cabinet {
    connector: Arc<dyn CabinetConnector>,
}

/// Unwrap the expected response variant or turn anything else into a [`RequestError`]
macro_rules! expect_body {
    ($response:expr, $variant:ident) => {
        match $response {
            ResponseBody::$variant(value) => Ok(value),
            other => Err(unexpected(other)),
        }
    };
}

fn unexpected(body: ResponseBody) -> RequestError {
    match body {
        ResponseBody::Error(status) => RequestError::Status(status),
        ResponseBody::SequentialExists(existing) => RequestError::AlreadyExists(existing),
        other => RequestError::UnexpectedResponse(other.to_string()),
    }
}

impl Cabinet {
    pub fn new(connector: Arc<dyn CabinetConnector>) -> Self { Self { connector } }

    pub fn connector(&self) -> &Arc<dyn CabinetConnector> { &self.connector }

    /// Start an empty transaction against this client's connector
    pub fn begin(&self) -> Transaction { Transaction::new(self.connector.clone()) }

    async fn call(&self, body: RequestBody) -> Result<ResponseBody, RequestError> {
        debug!("Cabinet request {body}");
        let response = self.connector.request(body).await?;
        debug!("Cabinet response {response}");
        Ok(response)
    }

    pub async fn node_get(&self, node_type: u32, id: impl Into<String>) -> Result<proto::Node, RequestError> {
        let request = proto::NodeGetRequest { node_type, id: id.into() };
        expect_body!(self.call(RequestBody::NodeGet(request)).await?, Node)
    }

    pub async fn node_list(&self, node_type: u32, options: proto::ListOptions) -> Result<Vec<proto::Node>, RequestError> {
        expect_body!(self.call(RequestBody::NodeList(proto::NodeListRequest { node_type, options })).await?, Nodes)
    }

    pub async fn edge_get(&self, key: proto::EdgeKey) -> Result<proto::Edge, RequestError> {
        expect_body!(self.call(RequestBody::EdgeGet(key)).await?, Edge)
    }

    pub async fn edge_list(
        &self,
        subject: impl Into<String>,
        predicate: Option<u32>,
        options: proto::ListOptions,
    ) -> Result<Vec<proto::Edge>, RequestError> {
        let request = proto::EdgeListRequest { subject: subject.into(), predicate, options };
        expect_body!(self.call(RequestBody::EdgeList(request)).await?, Edges)
    }

    pub async fn index_get(&self, index_type: u32, value: impl Into<String>, node: impl Into<String>) -> Result<proto::Index, RequestError> {
        let request = proto::IndexGetRequest { index_type, value: value.into(), node: node.into() };
        expect_body!(self.call(RequestBody::IndexGet(request)).await?, Index)
    }

    pub async fn index_list(
        &self,
        index_type: u32,
        value: Option<String>,
        options: proto::ListOptions,
    ) -> Result<Vec<proto::Index>, RequestError> {
        expect_body!(self.call(RequestBody::IndexList(proto::IndexListRequest { index_type, value, options })).await?, Indexes)
    }

    pub async fn meta_get(&self, object: proto::Object, key: u32) -> Result<proto::Meta, RequestError> {
        expect_body!(self.call(RequestBody::MetaGet(proto::MetaGetRequest { object, key })).await?, Meta)
    }

    pub async fn meta_list(&self, object: proto::Object, options: proto::ListOptions) -> Result<Vec<proto::Meta>, RequestError> {
        expect_body!(self.call(RequestBody::MetaList(proto::MetaListRequest { object, options })).await?, Metas)
    }

    pub async fn counter_get(&self, object: proto::Object, counter: u32) -> Result<proto::Counter, RequestError> {
        expect_body!(self.call(RequestBody::CounterGet(proto::CounterGetRequest { object, counter })).await?, Counter)
    }

    /// Evaluate a read-check outside of any transaction
    pub async fn read_check(&self, check: proto::ReadCheckRequest) -> Result<bool, RequestError> {
        expect_body!(self.call(RequestBody::ReadCheck(check)).await?, ReadCheck).map(|r| r.result)
    }

    /// Allocate the next id of a sequence.
    ///
    /// Repeating a create with a UUID that is already allocated fails with
    /// [`RequestError::AlreadyExists`] carrying the existing allocation.
    pub async fn sequential_create(&self, sequential: proto::Sequential) -> Result<proto::Sequential, RequestError> {
        expect_body!(self.call(RequestBody::SequentialCreate(sequential)).await?, Sequential)
    }

    pub async fn sequential_update(&self, sequential: proto::Sequential) -> Result<proto::MutationResponse, RequestError> {
        expect_body!(self.call(RequestBody::SequentialUpdate(sequential)).await?, Mutation)
    }

    pub async fn sequential_delete(&self, sequential: proto::Sequential) -> Result<proto::MutationResponse, RequestError> {
        expect_body!(self.call(RequestBody::SequentialDelete(sequential)).await?, Mutation)
    }

    pub async fn sequential_get(&self, sequential: proto::Sequential) -> Result<proto::Sequential, RequestError> {
        expect_body!(self.call(RequestBody::SequentialGet(sequential)).await?, Sequential)
    }

    pub async fn sequential_list(
        &self,
        seq_type: impl Into<String>,
        options: proto::ListOptions,
    ) -> Result<Vec<proto::Sequential>, RequestError> {
        let request = proto::SequentialListRequest { seq_type: seq_type.into(), options };
        expect_body!(self.call(RequestBody::SequentialList(request)).await?, Sequentials)
    }
}
