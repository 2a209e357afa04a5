use serde::{Deserialize, Serialize};

use crate::{
    check::{ReadCheckRequest, ReadCheckResponse},
    data::{Counter, Edge, EdgeKey, Index, Meta, MutationResponse, Node, Object, Sequential},
    error::Status,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListMode {
    /// Every match, regardless of page size
    All,
    /// The zero-based page of `page_size` matches
    Page(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    pub mode: ListMode,
    pub page_size: u32,
}

impl ListOptions {
    pub fn all(page_size: u32) -> Self { Self { mode: ListMode::All, page_size } }

    pub fn page(page: u32, page_size: u32) -> Self { Self { mode: ListMode::Page(page), page_size } }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeGetRequest {
    pub node_type: u32,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeListRequest {
    pub node_type: u32,
    pub options: ListOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeListRequest {
    pub subject: String,
    /// Restrict to one predicate
    pub predicate: Option<u32>,
    pub options: ListOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexGetRequest {
    pub index_type: u32,
    pub value: String,
    pub node: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexListRequest {
    pub index_type: u32,
    /// Restrict to one indexed value
    pub value: Option<String>,
    pub options: ListOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaGetRequest {
    pub object: Object,
    pub key: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaListRequest {
    pub object: Object,
    pub options: ListOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterGetRequest {
    pub object: Object,
    pub counter: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequentialListRequest {
    pub seq_type: String,
    pub options: ListOptions,
}

/// Unary calls against the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, strum::IntoStaticStr)]
pub enum RequestBody {
    NodeGet(NodeGetRequest),
    NodeList(NodeListRequest),
    EdgeGet(EdgeKey),
    EdgeList(EdgeListRequest),
    IndexGet(IndexGetRequest),
    IndexList(IndexListRequest),
    MetaGet(MetaGetRequest),
    MetaList(MetaListRequest),
    CounterGet(CounterGetRequest),
    ReadCheck(ReadCheckRequest),
    SequentialCreate(Sequential),
    SequentialUpdate(Sequential),
    SequentialDelete(Sequential),
    SequentialGet(Sequential),
    SequentialList(SequentialListRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, strum::IntoStaticStr)]
pub enum ResponseBody {
    Node(Node),
    Nodes(Vec<Node>),
    Edge(Edge),
    Edges(Vec<Edge>),
    Index(Index),
    Indexes(Vec<Index>),
    Meta(Meta),
    Metas(Vec<Meta>),
    Counter(Counter),
    ReadCheck(ReadCheckResponse),
    Sequential(Sequential),
    Sequentials(Vec<Sequential>),
    Mutation(MutationResponse),
    /// A create was repeated with a known UUID; carries the existing allocation
    SequentialExists(Sequential),
    Error(Status),
}

impl std::fmt::Display for RequestBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind: &'static str = self.into();
        write!(f, "{kind}")
    }
}

impl std::fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseBody::Error(status) => write!(f, "Error: {status}"),
            other => {
                let kind: &'static str = other.into();
                write!(f, "{kind}")
            }
        }
    }
}
