use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum CheckOperator {
    Equal,
    NotEqual,
    /// The source object exists
    Exists,
    /// The source object exists; reads it without comparing
    Touch,
}

/// What the source value is compared against. Ignored by `Exists` and `Touch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckTarget {
    Value(Vec<u8>),
    Iri(String),
}

/// An assertion evaluated by the store against the object named by `source`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadCheckRequest {
    pub source: String,
    pub operator: CheckOperator,
    pub target: CheckTarget,
}

impl ReadCheckRequest {
    pub fn equal(source: impl Into<String>, target: CheckTarget) -> Self {
        Self { source: source.into(), operator: CheckOperator::Equal, target }
    }

    pub fn not_equal(source: impl Into<String>, target: CheckTarget) -> Self {
        Self { source: source.into(), operator: CheckOperator::NotEqual, target }
    }

    pub fn exists(source: impl Into<String>) -> Self {
        Self { source: source.into(), operator: CheckOperator::Exists, target: CheckTarget::Value(b"*".to_vec()) }
    }

    pub fn touch(source: impl Into<String>) -> Self {
        Self { source: source.into(), operator: CheckOperator::Touch, target: CheckTarget::Value(b"*".to_vec()) }
    }
}

impl std::fmt::Display for ReadCheckRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.target {
            CheckTarget::Value(v) => write!(f, "{} {} {:?}", self.source, self.operator, String::from_utf8_lossy(v)),
            CheckTarget::Iri(iri) => write!(f, "{} {} <{}>", self.source, self.operator, iri),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadCheckResponse {
    pub result: bool,
}
