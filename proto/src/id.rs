use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Caller-assigned correlation identifier of an action within one transaction batch
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Debug, Serialize, Deserialize, Hash, Default)]
pub struct ActionId(pub u32);

impl ActionId {
    pub fn next(self) -> Self { Self(self.0 + 1) }
}

impl From<u32> for ActionId {
    fn from(value: u32) -> Self { Self(value) }
}

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "A{}", self.0) }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Serialize, Deserialize, Hash, Default)]
pub struct RequestId(Ulid);

impl RequestId {
    pub fn new() -> Self { Self(Ulid::new()) }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id_str = self.0.to_string();
        write!(f, "R{}", &id_str[20..])
    }
}

/// Identifies one transaction stream multiplexed over a shared connection
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Serialize, Deserialize, Hash, Default)]
pub struct StreamId(Ulid);

impl StreamId {
    pub fn new() -> Self { Self(Ulid::new()) }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id_str = self.0.to_string();
        write!(f, "S{}", &id_str[20..])
    }
}

/// Permanent node identifier as assigned by the store
pub fn new_node_id() -> String { Ulid::new().to_string() }
