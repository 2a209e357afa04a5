use std::collections::{BTreeMap, HashMap};

use cabinet_proto::{Counter, Edge, EdgeKey, Index, Meta, Node, Object, Sequential};

/// (index type, value, node)
pub(crate) type IndexKey = (u32, String, String);

/// Everything the store holds. Commits apply to a clone and swap it in on success.
#[derive(Debug, Clone, Default)]
pub(crate) struct State {
    pub nodes: BTreeMap<String, Node>,
    pub edges: BTreeMap<EdgeKey, Edge>,
    pub indexes: BTreeMap<IndexKey, Index>,
    pub metas: BTreeMap<(Object, u32), Meta>,
    pub counters: BTreeMap<(Object, u32), Counter>,
    pub sequences: HashMap<String, Sequence>,
}

/// Allocations of one sequence type
#[derive(Debug, Clone, Default)]
pub(crate) struct Sequence {
    /// Highest seqid ever allocated; never reused even after deletes
    pub high: u32,
    pub entries: BTreeMap<u32, Sequential>,
    pub uuids: HashMap<String, u32>,
}

impl State {
    pub fn node(&self, node_type: u32, id: &str) -> Option<&Node> { self.nodes.get(id).filter(|n| n.node_type == node_type) }

    pub fn edges_from<'a>(&'a self, subject: &'a str, predicate: Option<u32>) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.values().filter(move |e| e.subject == subject && predicate.map_or(true, |p| e.predicate == p))
    }

    pub fn index(&self, index_type: u32, value: &str, node: &str) -> Option<&Index> {
        self.indexes.get(&(index_type, value.to_owned(), node.to_owned()))
    }

    pub fn metas_of<'a>(&'a self, object: &'a Object) -> impl Iterator<Item = &'a Meta> + 'a {
        self.metas.iter().filter(move |((o, _), _)| o == object).map(|(_, m)| m)
    }
}
