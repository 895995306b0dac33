use std::collections::{BTreeMap, BTreeSet};

use crate::error::PlanError;
use crate::propagation::Propagation;
use crate::schema::{PeerInfo, UpdateEntry};
use crate::selector;
use crate::state::{InternalRoute, State};

/// `InternalProtocolUpdate`: process each batch entry independently — a
/// failed or dropped entry never aborts the rest of the batch. Best-path
/// recomputation happens only after every entry has been applied to the
/// draft state, and propagations are then emitted in the original batch
/// order.
pub fn update(
    state: &mut State,
    peer_info: PeerInfo,
    updates: Vec<UpdateEntry>,
    self_name: &str,
) -> Result<Vec<Propagation>, PlanError> {
    if !state.internal.peers.contains_key(&peer_info.name) {
        return Err(PlanError::UnknownPeer(peer_info.name));
    }

    let mut affected: BTreeSet<String> = BTreeSet::new();
    let mut dropped: Vec<bool> = Vec::with_capacity(updates.len());

    for entry in &updates {
        match entry {
            UpdateEntry::Add { route, node_path } => {
                if node_path.iter().any(|hop| hop == self_name) {
                    // Loop detected: silently drop, no error, no propagation.
                    dropped.push(true);
                    continue;
                }
                dropped.push(false);
                let key = (route.name.clone(), peer_info.name.clone());
                state.internal.routes.insert(
                    key,
                    InternalRoute {
                        route: route.clone(),
                        peer_name: peer_info.name.clone(),
                        node_path: node_path.clone(),
                        is_best: false,
                    },
                );
                affected.insert(route.name.clone());
            }
            UpdateEntry::Remove { route } => {
                dropped.push(false);
                let key = (route.name.clone(), peer_info.name.clone());
                state.internal.routes.remove(&key);
                affected.insert(route.name.clone());
            }
        }
    }

    for name in &affected {
        selector::recompute(&mut state.internal.routes, name);
    }

    let mut per_peer: BTreeMap<String, Vec<UpdateEntry>> = BTreeMap::new();

    for (entry, was_dropped) in updates.iter().zip(dropped.iter()) {
        if *was_dropped {
            continue;
        }
        match entry {
            UpdateEntry::Add { route, .. } => {
                let key = (route.name.clone(), peer_info.name.clone());
                // May be absent if a later entry in the same batch removed
                // this exact (name, peerName) pair.
                let Some(current) = state.internal.routes.get(&key) else {
                    continue;
                };
                if !current.is_best {
                    // Only the newly-selected best path is re-advertised.
                    continue;
                }
                let mut outgoing_path = vec![self_name.to_string()];
                outgoing_path.extend(current.node_path.iter().cloned());
                let forwarded = UpdateEntry::Add {
                    route: current.route.clone(),
                    node_path: outgoing_path.clone(),
                };
                for peer in state.internal.peers.values() {
                    if peer.name == peer_info.name || outgoing_path.contains(&peer.name) {
                        continue;
                    }
                    per_peer
                        .entry(peer.name.clone())
                        .or_default()
                        .push(forwarded.clone());
                }
            }
            UpdateEntry::Remove { route } => {
                for peer in state.internal.peers.values() {
                    if peer.name == peer_info.name {
                        continue;
                    }
                    per_peer.entry(peer.name.clone()).or_default().push(
                        UpdateEntry::Remove {
                            route: route.clone(),
                        },
                    );
                }
            }
        }
    }

    let propagations = per_peer
        .into_iter()
        .filter_map(|(name, entries)| {
            state
                .internal
                .peers
                .get(&name)
                .map(|peer| Propagation::update(peer.clone(), entries))
        })
        .collect();

    Ok(propagations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::PropagationMessage;
    use crate::schema::{Protocol, Route};

    fn peer(name: &str) -> PeerInfo {
        PeerInfo {
            name: name.into(),
            endpoint: format!("{name}:7400"),
            domains: vec![],
            peer_token: None,
        }
    }

    fn connect(state: &mut State, name: &str) {
        state.internal.peers.insert(name.to_string(), peer(name));
    }

    fn add(name: &str, path: &[&str]) -> UpdateEntry {
        UpdateEntry::Add {
            route: Route {
                name: name.into(),
                protocol: Protocol::Http,
                endpoint: format!("http://{name}"),
                region: None,
                tags: vec![],
            },
            node_path: path.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn update_from_peer_not_in_internal_peers_is_rejected() {
        let mut state = State::new();
        let err = update(&mut state, peer("b"), vec![add("svc-x", &["b"])], "a").unwrap_err();
        assert_eq!(err, PlanError::UnknownPeer("b".into()));
        assert!(state.internal.routes.is_empty());
    }

    #[test]
    fn s2_loop_is_silently_dropped() {
        let mut state = State::new();
        connect(&mut state, "b");
        let props = update(&mut state, peer("b"), vec![add("svc-x", &["b", "other", "a"])], "a")
            .unwrap();
        assert!(state.internal.routes.is_empty());
        assert!(props.is_empty());
    }

    #[test]
    fn s3_split_horizon_suppresses_peer_already_in_path() {
        let mut state = State::new();
        connect(&mut state, "b");
        connect(&mut state, "c");
        let props = update(&mut state, peer("b"), vec![add("svc-x", &["b", "c"])], "a").unwrap();
        assert_eq!(state.internal.routes.len(), 1);
        assert!(props.is_empty(), "C is in the path and must not receive it");
    }

    #[test]
    fn s7_upsert_emits_single_add_not_remove_then_add() {
        let mut state = State::new();
        connect(&mut state, "b");
        connect(&mut state, "c");

        update(
            &mut state,
            peer("b"),
            vec![UpdateEntry::Add {
                route: Route {
                    name: "svc-x".into(),
                    protocol: Protocol::Http,
                    endpoint: "old".into(),
                    region: None,
                    tags: vec![],
                },
                node_path: vec!["b".into()],
            }],
            "a",
        )
        .unwrap();

        let props = update(
            &mut state,
            peer("b"),
            vec![UpdateEntry::Add {
                route: Route {
                    name: "svc-x".into(),
                    protocol: Protocol::Http,
                    endpoint: "new".into(),
                    region: None,
                    tags: vec![],
                },
                node_path: vec!["b".into()],
            }],
            "a",
        )
        .unwrap();

        assert_eq!(props.len(), 1);
        match &props[0].message {
            PropagationMessage::Update(entries) => {
                assert_eq!(entries.len(), 1);
                match &entries[0] {
                    UpdateEntry::Add { route, .. } => assert_eq!(route.endpoint, "new"),
                    _ => panic!("expected a single add"),
                }
            }
            _ => panic!("expected update"),
        }
    }

    #[test]
    fn remove_of_unknown_route_is_a_silent_no_op() {
        let mut state = State::new();
        connect(&mut state, "b");
        let props = update(
            &mut state,
            peer("b"),
            vec![UpdateEntry::Remove {
                route: crate::state::route_key("svc-ghost", Protocol::Http),
            }],
            "a",
        )
        .unwrap();
        assert!(props.is_empty());
    }

    #[test]
    fn s4_best_path_upgrade_then_downgrade_changes_selection_reason() {
        let mut state = State::new();
        connect(&mut state, "b");
        connect(&mut state, "c");

        update(&mut state, peer("b"), vec![add("svc-x", &["b"])], "a").unwrap();
        update(&mut state, peer("c"), vec![add("svc-x", &["c", "other"])], "a").unwrap();
        assert_eq!(state.best_path_for("svc-x").unwrap().peer_name, "b");

        update(
            &mut state,
            peer("b"),
            vec![add("svc-x", &["b", "h1", "h2"])],
            "a",
        )
        .unwrap();
        assert_eq!(state.best_path_for("svc-x").unwrap().peer_name, "c");
        let meta = state.route_metadata();
        assert_eq!(
            meta["svc-x"].selection_reason,
            crate::selector::REASON_SHORTEST
        );
    }
}
