use cabinet_proto::{MutationResponse, Sequential, Status};
use tracing::debug;

use crate::state::{Sequence, State};

/// Outcome of a sequence create
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Allocation {
    Created(Sequential),
    /// The UUID was already allocated; carries the existing entry
    Exists(Sequential),
}

fn require_type(s: &Sequential) -> Result<(), Status> {
    if s.seq_type.is_empty() {
        return Err(Status::invalid_argument("sequence type is required"));
    }
    Ok(())
}

fn reject_node(s: &Sequential) -> Result<(), Status> {
    if s.node.is_some() {
        return Err(Status::invalid_argument("node is not accepted here"));
    }
    Ok(())
}

fn require_seqid(s: &Sequential) -> Result<u32, Status> { s.seqid.ok_or_else(|| Status::invalid_argument("seqid is required")) }

fn sequence<'a>(state: &'a State, seq_type: &str) -> Option<&'a Sequence> { state.sequences.get(seq_type) }

pub(crate) fn create(state: &mut State, request: Sequential) -> Result<Allocation, Status> {
    require_type(&request)?;
    if request.seqid.is_some() {
        return Err(Status::invalid_argument("seqid is assigned by the store"));
    }
    if request.node.is_none() && request.uuid.is_none() {
        return Err(Status::invalid_argument("node or uuid is required"));
    }

    let sequence = state.sequences.entry(request.seq_type.clone()).or_default();
    if let Some(uuid) = &request.uuid {
        if let Some(existing) = sequence.uuids.get(uuid).and_then(|seqid| sequence.entries.get(seqid)) {
            debug!("Sequence {} already holds uuid {uuid}", request.seq_type);
            return Ok(Allocation::Exists(existing.clone()));
        }
    }

    sequence.high += 1;
    let seqid = sequence.high;
    let allocated = Sequential { seqid: Some(seqid), ..request };
    if let Some(uuid) = &allocated.uuid {
        sequence.uuids.insert(uuid.clone(), seqid);
    }
    sequence.entries.insert(seqid, allocated.clone());
    Ok(Allocation::Created(allocated))
}

pub(crate) fn update(state: &mut State, request: Sequential) -> Result<MutationResponse, Status> {
    require_type(&request)?;
    let seqid = require_seqid(&request)?;
    let node = request.node.ok_or_else(|| Status::invalid_argument("node is required"))?;

    let entry = state
        .sequences
        .get_mut(&request.seq_type)
        .and_then(|s| s.entries.get_mut(&seqid))
        .ok_or_else(|| Status::not_found(format!("sequence {} #{seqid}", request.seq_type)))?;
    if entry.node.as_deref() == Some(node.as_str()) {
        return Ok(MutationResponse::unchanged());
    }
    entry.node = Some(node);
    Ok(MutationResponse::success())
}

pub(crate) fn delete(state: &mut State, request: Sequential) -> Result<MutationResponse, Status> {
    require_type(&request)?;
    let seqid = require_seqid(&request)?;
    reject_node(&request)?;

    let sequence = state.sequences.get_mut(&request.seq_type);
    let removed = sequence.and_then(|s| {
        let removed = s.entries.remove(&seqid)?;
        if let Some(uuid) = &removed.uuid {
            s.uuids.remove(uuid);
        }
        Some(removed)
    });
    match removed {
        Some(_) => Ok(MutationResponse::success()),
        None => Err(Status::not_found(format!("sequence {} #{seqid}", request.seq_type))),
    }
}

pub(crate) fn get(state: &State, request: &Sequential) -> Result<Sequential, Status> {
    require_type(request)?;
    reject_node(request)?;
    let sequence = sequence(state, &request.seq_type);
    let seqid = match (request.seqid, &request.uuid) {
        (Some(seqid), _) => Some(seqid),
        (None, Some(uuid)) => sequence.and_then(|s| s.uuids.get(uuid).copied()),
        (None, None) => return Err(Status::invalid_argument("seqid or uuid is required")),
    };
    seqid
        .and_then(|seqid| sequence?.entries.get(&seqid).cloned())
        .ok_or_else(|| Status::not_found(format!("sequence {} entry", request.seq_type)))
}

pub(crate) fn list<'a>(state: &'a State, seq_type: &str) -> Result<Vec<&'a Sequential>, Status> {
    if seq_type.is_empty() {
        return Err(Status::invalid_argument("sequence type is required"));
    }
    Ok(sequence(state, seq_type).map(|s| s.entries.values().collect()).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cabinet_proto::{MutationStatus, StatusCode};

    fn created(allocation: Allocation) -> Sequential {
        match allocation {
            Allocation::Created(s) => s,
            Allocation::Exists(s) => panic!("unexpected existing allocation {s:?}"),
        }
    }

    #[test]
    fn ids_grow_past_deletes() {
        let mut state = State::default();
        let first = created(create(&mut state, Sequential::new("n").with_node("a")).unwrap());
        let second = created(create(&mut state, Sequential::new("n").with_node("b")).unwrap());
        assert_eq!((first.seqid, second.seqid), (Some(1), Some(2)));

        delete(&mut state, Sequential::new("n").with_seqid(2)).unwrap();
        let third = created(create(&mut state, Sequential::new("n").with_node("c")).unwrap());
        assert_eq!(third.seqid, Some(3));
        assert_eq!(get(&state, &Sequential::new("n").with_seqid(2)).unwrap_err().code, StatusCode::NotFound);
    }

    #[test]
    fn uuid_is_idempotent_until_deleted() {
        let mut state = State::default();
        let first = created(create(&mut state, Sequential::new("n").with_uuid("u-1")).unwrap());
        assert_eq!(create(&mut state, Sequential::new("n").with_uuid("u-1")).unwrap(), Allocation::Exists(first.clone()));
        assert_eq!(get(&state, &Sequential::new("n").with_uuid("u-1")).unwrap(), first);

        delete(&mut state, Sequential::new("n").with_seqid(1)).unwrap();
        let again = created(create(&mut state, Sequential::new("n").with_uuid("u-1")).unwrap());
        assert_eq!(again.seqid, Some(2));
    }

    #[test]
    fn update_reports_unchanged() {
        let mut state = State::default();
        create(&mut state, Sequential::new("n").with_node("XXXX")).unwrap();
        let response = update(&mut state, Sequential::new("n").with_seqid(1).with_node("YYYY")).unwrap();
        assert_eq!(response.status, MutationStatus::Success);
        let response = update(&mut state, Sequential::new("n").with_seqid(1).with_node("YYYY")).unwrap();
        assert_eq!(response.status, MutationStatus::Unchanged);
        assert_eq!(get(&state, &Sequential::new("n").with_seqid(1)).unwrap().node.as_deref(), Some("YYYY"));
    }

    #[test]
    fn malformed_requests_are_invalid() {
        let mut state = State::default();
        let invalid = |r: Result<_, Status>| matches!(r, Err(Status { code: StatusCode::InvalidArgument, .. }));

        assert!(invalid(create(&mut state, Sequential::new("n")).map(|_| ())));
        assert!(invalid(create(&mut state, Sequential::default().with_node("X")).map(|_| ())));
        assert!(invalid(create(&mut state, Sequential::new("n").with_node("X").with_seqid(100)).map(|_| ())));

        assert!(invalid(update(&mut state, Sequential::default()).map(|_| ())));
        assert!(invalid(update(&mut state, Sequential::new("n").with_node("X")).map(|_| ())));
        assert!(invalid(update(&mut state, Sequential::new("n").with_seqid(1)).map(|_| ())));

        assert!(invalid(delete(&mut state, Sequential::new("n")).map(|_| ())));
        assert!(invalid(delete(&mut state, Sequential::default().with_seqid(1)).map(|_| ())));
        assert!(invalid(delete(&mut state, Sequential::new("n").with_seqid(1).with_node("X")).map(|_| ())));

        assert!(invalid(get(&state, &Sequential::default()).map(|_| ())));
        assert!(invalid(get(&state, &Sequential::new("n")).map(|_| ())));
        assert!(invalid(get(&state, &Sequential::new("n").with_seqid(1).with_node("X")).map(|_| ())));

        assert!(invalid(list(&state, "").map(|_| ())));
    }
}
