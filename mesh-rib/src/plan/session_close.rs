use std::collections::BTreeMap;

use crate::error::PlanError;
use crate::propagation::Propagation;
use crate::schema::{PeerInfo, RouteKey, UpdateEntry};
use crate::selector;
use crate::state::{route_key, State};

/// `InternalProtocolClose`: drop the session, purge every route learned
/// from it, and withdraw from every other connected peer any of those
/// routes that had actually been forwarded there. A route is only ever
/// forwarded when it is the selected best path, so "had ever been propagated to peer P" is reconstructed from
/// the removed route's `is_best` flag and its (would-be) outgoing
/// `nodePath` at the moment it is withdrawn — the RIB keeps no separate
/// per-peer advertisement ledger.
pub fn close(
    state: &mut State,
    peer_info: PeerInfo,
    _code: i32,
    self_name: &str,
) -> Result<Vec<Propagation>, PlanError> {
    state.internal.peers.remove(&peer_info.name);

    let keys_to_remove: Vec<(String, String)> = state
        .internal
        .routes
        .iter()
        .filter(|(_, route)| route.peer_name == peer_info.name)
        .map(|(k, _)| k.clone())
        .collect();

    let mut withdraw_to: BTreeMap<String, Vec<RouteKey>> = BTreeMap::new();
    let mut affected_names: Vec<String> = Vec::new();

    for key in &keys_to_remove {
        let removed = state.internal.routes.remove(key).expect("key just listed");
        affected_names.push(removed.name().to_string());

        if removed.is_best {
            let mut outgoing = vec![self_name.to_string()];
            outgoing.extend(removed.node_path.iter().cloned());

            for other in state.internal.peers.values() {
                if other.name == removed.peer_name || outgoing.contains(&other.name) {
                    continue;
                }
                withdraw_to
                    .entry(other.name.clone())
                    .or_default()
                    .push(route_key(removed.name(), removed.route.protocol));
            }
        }
    }

    for name in &affected_names {
        selector::recompute(&mut state.internal.routes, name);
    }

    let propagations = withdraw_to
        .into_iter()
        .filter_map(|(peer_name, keys)| {
            state.internal.peers.get(&peer_name).map(|peer| {
                Propagation::update(
                    peer.clone(),
                    keys.into_iter()
                        .map(|route| UpdateEntry::Remove { route })
                        .collect(),
                )
            })
        })
        .collect();

    Ok(propagations)
}
