use cabinet_proto::{CheckOperator, CheckTarget, Iri, ReadCheckRequest, Status};

use crate::{apply::Placeholders, state::State};

fn parse(iri: &str, placeholders: &Placeholders) -> Result<Iri, Status> {
    let iri: Iri = iri.parse().map_err(|e: cabinet_proto::IriError| Status::invalid_argument(e.to_string()))?;
    Ok(placeholders.iri(iri))
}

/// The payload of the object an IRI names, if it exists
fn value_of<'a>(state: &'a State, iri: &Iri) -> Option<&'a [u8]> {
    match iri {
        Iri::Node { node_type, id } => state.node(*node_type, id).map(|n| n.properties.as_slice()),
        Iri::Edge(key) => state.edges.get(key).map(|e| e.properties.as_slice()),
        Iri::Index { index_type, value, node } => state.index(*index_type, value, node).map(|i| i.properties.as_slice()),
        Iri::Meta { object, key } => state.metas.get(&(object.clone(), *key)).map(|m| m.value.as_slice()),
    }
}

/// Evaluate a read-check. A missing source fails every operator.
pub(crate) fn evaluate(state: &State, check: &ReadCheckRequest, placeholders: &Placeholders) -> Result<bool, Status> {
    let source = parse(&check.source, placeholders)?;
    let Some(value) = value_of(state, &source) else {
        return Ok(false);
    };

    let target = match (&check.operator, &check.target) {
        (CheckOperator::Exists | CheckOperator::Touch, _) => return Ok(true),
        (_, CheckTarget::Value(target)) => Some(target.as_slice()),
        (_, CheckTarget::Iri(target)) => value_of(state, &parse(target, placeholders)?),
    };

    Ok(match check.operator {
        CheckOperator::Equal => target == Some(value),
        CheckOperator::NotEqual => target.is_some_and(|t| t != value),
        CheckOperator::Exists | CheckOperator::Touch => true,
    })
}
