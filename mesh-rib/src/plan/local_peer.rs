use crate::error::PlanError;
use crate::propagation::Propagation;
use crate::schema::PeerInfo;
use crate::state::{LocalPeer, State};

/// `LocalPeerCreate` / `LocalPeerUpdate`: write to `local.peers`. No
/// propagation — there is no session yet.
pub fn create(state: &mut State, info: PeerInfo) -> Result<Vec<Propagation>, PlanError> {
    let added_at = state.next_seq();
    insert(state, info, added_at)
}

pub fn update(state: &mut State, info: PeerInfo) -> Result<Vec<Propagation>, PlanError> {
    let added_at = state
        .local
        .peers
        .get(&info.name)
        .map(|p| p.added_at)
        .unwrap_or_else(|| state.next_seq());
    insert(state, info, added_at)
}

fn insert(state: &mut State, info: PeerInfo, added_at: u64) -> Result<Vec<Propagation>, PlanError> {
    state
        .local
        .peers
        .insert(info.name.clone(), LocalPeer { info, added_at });
    Ok(Vec::new())
}

/// `LocalPeerDelete`: remove the registration only. Deliberately leaves
/// `internal.peers` and `internal.routes` untouched — the "zombie"
/// behavior. Operators must issue
/// `InternalProtocolClose` first to purge a peer's learned routes.
pub fn delete(state: &mut State, name: &str) -> Result<Vec<Propagation>, PlanError> {
    state.local.peers.remove(name);
    Ok(Vec::new())
}
