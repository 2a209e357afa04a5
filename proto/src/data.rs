use serde::{Deserialize, Serialize};

/// A graph node. In a `NodeCreate` action `id` holds the caller's placeholder;
/// in the matching response it holds the id assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Node {
    pub node_type: u32,
    pub id: String,
    pub version: u32,
    pub properties: Vec<u8>,
}

impl Node {
    pub fn new(node_type: u32, id: impl Into<String>) -> Self { Self { node_type, id: id.into(), version: 1, properties: Vec::new() } }

    pub fn with_properties(mut self, properties: impl Into<Vec<u8>>) -> Self {
        self.properties = properties.into();
        self
    }
}

/// Identity of an edge, without its payload
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    pub subject: String,
    pub predicate: u32,
    pub target: String,
}

impl std::fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}/{}/{}", self.subject, self.predicate, self.target) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub subject: String,
    pub predicate: u32,
    pub target: String,
    pub properties: Vec<u8>,
}

impl Edge {
    /// Target value used by `EdgeClear` to match every target of a subject/predicate pair
    pub const ANY_TARGET: &'static str = "*";

    pub fn new(subject: impl Into<String>, predicate: u32, target: impl Into<String>) -> Self {
        Self { subject: subject.into(), predicate, target: target.into(), properties: Vec::new() }
    }

    pub fn with_properties(mut self, properties: impl Into<Vec<u8>>) -> Self {
        self.properties = properties.into();
        self
    }

    pub fn key(&self) -> EdgeKey { EdgeKey { subject: self.subject.clone(), predicate: self.predicate, target: self.target.clone() } }
}

/// Secondary index entry, keyed by `(index_type, value, node)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub index_type: u32,
    pub value: String,
    pub node: String,
    pub properties: Vec<u8>,
}

impl Index {
    pub fn new(index_type: u32, value: impl Into<String>, node: impl Into<String>) -> Self {
        Self { index_type, value: value.into(), node: node.into(), properties: Vec::new() }
    }

    pub fn with_properties(mut self, properties: impl Into<Vec<u8>>) -> Self {
        self.properties = properties.into();
        self
    }
}

/// The object a meta entry or counter is attached to
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Object {
    Node(String),
    Edge(EdgeKey),
}

impl std::fmt::Display for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Object::Node(id) => write!(f, "n/{id}"),
            Object::Edge(key) => write!(f, "e/{key}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub object: Object,
    pub key: u32,
    pub value: Vec<u8>,
}

impl Meta {
    pub fn new(object: Object, key: u32) -> Self { Self { object, key, value: Vec::new() } }

    pub fn with_value(mut self, value: impl Into<Vec<u8>>) -> Self {
        self.value = value.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    pub object: Object,
    pub counter: u32,
    pub value: i64,
}

impl Counter {
    pub fn new(object: Object, counter: u32) -> Self { Self { object, counter, value: 0 } }

    pub fn with_value(mut self, value: i64) -> Self {
        self.value = value;
        self
    }
}

/// A sequence allocation. `seqid` is assigned by the store on create.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sequential {
    pub seq_type: String,
    pub seqid: Option<u32>,
    pub node: Option<String>,
    pub uuid: Option<String>,
}

impl Sequential {
    pub fn new(seq_type: impl Into<String>) -> Self { Self { seq_type: seq_type.into(), ..Default::default() } }

    pub fn with_seqid(mut self, seqid: u32) -> Self {
        self.seqid = Some(seqid);
        self
    }

    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationStatus {
    Success,
    /// The mutation matched nothing, e.g. deleting an absent key
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResponse {
    pub status: MutationStatus,
}

impl MutationResponse {
    pub fn success() -> Self { Self { status: MutationStatus::Success } }
    pub fn unchanged() -> Self { Self { status: MutationStatus::Unchanged } }
}
