//! Textual addresses for store objects, used as read-check sources and targets.
//!
//! | Object     | Form                                  |
//! |------------|---------------------------------------|
//! | node       | `n/{type}/{id}`                       |
//! | edge       | `e/{subject}/{predicate}/{target}`    |
//! | index      | `i/{type}/{value}/{node}`             |
//! | node meta  | `m/n/{node}/{key}`                    |
//! | edge meta  | `m/e/{subject}/{predicate}/{target}/{key}` |
//!
//! Index values may themselves contain `/`; the node id is always the last segment.

use std::str::FromStr;

use thiserror::Error;

use crate::data::{EdgeKey, Object};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Iri {
    Node { node_type: u32, id: String },
    Edge(EdgeKey),
    Index { index_type: u32, value: String, node: String },
    Meta { object: Object, key: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IriError {
    #[error("unknown iri scheme in {0:?}")]
    UnknownScheme(String),
    #[error("malformed iri {0:?}")]
    Malformed(String),
    #[error("invalid number {segment:?} in iri {iri:?}")]
    InvalidNumber { iri: String, segment: String },
}

fn number(iri: &str, segment: &str) -> Result<u32, IriError> {
    segment.parse().map_err(|_| IriError::InvalidNumber { iri: iri.to_owned(), segment: segment.to_owned() })
}

fn edge_key(iri: &str, parts: &[&str]) -> Result<EdgeKey, IriError> {
    match parts {
        [subject, predicate, target] if !subject.is_empty() && !target.is_empty() => {
            Ok(EdgeKey { subject: subject.to_string(), predicate: number(iri, predicate)?, target: target.to_string() })
        }
        _ => Err(IriError::Malformed(iri.to_owned())),
    }
}

impl FromStr for Iri {
    type Err = IriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || IriError::Malformed(s.to_owned());
        let (scheme, rest) = s.split_once('/').ok_or_else(malformed)?;

        match scheme {
            "n" => {
                let (node_type, id) = rest.split_once('/').ok_or_else(malformed)?;
                if id.is_empty() || id.contains('/') {
                    return Err(malformed());
                }
                Ok(Iri::Node { node_type: number(s, node_type)?, id: id.to_owned() })
            }
            "e" => Ok(Iri::Edge(edge_key(s, &rest.split('/').collect::<Vec<_>>())?)),
            "i" => {
                let (index_type, rest) = rest.split_once('/').ok_or_else(malformed)?;
                let (value, node) = rest.rsplit_once('/').ok_or_else(malformed)?;
                if node.is_empty() {
                    return Err(malformed());
                }
                Ok(Iri::Index { index_type: number(s, index_type)?, value: value.to_owned(), node: node.to_owned() })
            }
            "m" => {
                let parts: Vec<&str> = rest.split('/').collect();
                match parts.as_slice() {
                    ["n", node, key] if !node.is_empty() => Ok(Iri::Meta { object: Object::Node(node.to_string()), key: number(s, key)? }),
                    ["e", subject, predicate, target, key] => {
                        Ok(Iri::Meta { object: Object::Edge(edge_key(s, &[subject, predicate, target])?), key: number(s, key)? })
                    }
                    _ => Err(malformed()),
                }
            }
            _ => Err(IriError::UnknownScheme(s.to_owned())),
        }
    }
}

impl std::fmt::Display for Iri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Iri::Node { node_type, id } => write!(f, "n/{node_type}/{id}"),
            Iri::Edge(key) => write!(f, "e/{key}"),
            Iri::Index { index_type, value, node } => write!(f, "i/{index_type}/{value}/{node}"),
            Iri::Meta { object, key } => write!(f, "m/{object}/{key}"),
        }
    }
}
