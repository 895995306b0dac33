//! Propagation: the output of `plan()` that the Session Manager turns into
//! network sends. The RIB never does I/O itself.

use crate::schema::{PeerInfo, UpdateEntry};

/// The payload half of a propagation item. Reused as the outbound half of
/// the wire message shape (an `Open` is never produced by `plan()` —
/// opens are a session manager-side reaction to a successful dial, not a
/// RIB output).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PropagationMessage {
    Update(Vec<UpdateEntry>),
    Close { code: i32 },
}

/// One propagation item, addressed by `PeerInfo` rather than by an opaque
/// session handle — the Session Manager resolves delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Propagation {
    pub peer: PeerInfo,
    pub message: PropagationMessage,
}

impl Propagation {
    pub fn update(peer: PeerInfo, updates: Vec<UpdateEntry>) -> Self {
        Self {
            peer,
            message: PropagationMessage::Update(updates),
        }
    }

    pub fn close(peer: PeerInfo, code: i32) -> Self {
        Self {
            peer,
            message: PropagationMessage::Close { code },
        }
    }
}

/// One peer's batched outbound messages, in commit order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerBatch {
    pub peer: PeerInfo,
    pub messages: Vec<PropagationMessage>,
}

/// Group a flat propagation list by destination peer, preserving the
/// relative order of peers (first appearance) and of messages within each
/// peer's queue. Never reorders across peers or within a peer.
pub fn group_by_peer(propagations: Vec<Propagation>) -> Vec<PeerBatch> {
    let mut batches: Vec<PeerBatch> = Vec::new();
    for prop in propagations {
        if let Some(batch) = batches.iter_mut().find(|b| b.peer.name == prop.peer.name) {
            batch.messages.push(prop.message);
        } else {
            batches.push(PeerBatch {
                peer: prop.peer,
                messages: vec![prop.message],
            });
        }
    }
    batches
}
