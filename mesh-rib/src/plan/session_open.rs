use crate::error::PlanError;
use crate::propagation::Propagation;
use crate::schema::{PeerInfo, UpdateEntry};
use crate::state::State;

/// `InternalProtocolOpen`: the peer must already be a registered local
/// peer, then it is inserted into `internal.peers` and sent a full sync —
/// one `add` per local route plus one `add` per surviving internal route,
/// split-horizon filtered and with `selfName` prepended to the forwarded
/// `nodePath`.
pub fn open(
    state: &mut State,
    peer_info: PeerInfo,
    self_name: &str,
) -> Result<Vec<Propagation>, PlanError> {
    if !state.local.peers.contains_key(&peer_info.name) {
        return Err(PlanError::UnknownPeer(peer_info.name.clone()));
    }

    state
        .internal
        .peers
        .insert(peer_info.name.clone(), peer_info.clone());

    let mut updates = Vec::new();

    for route in state.local.routes.values() {
        updates.push(UpdateEntry::Add {
            route: route.clone(),
            node_path: vec![self_name.to_string()],
        });
    }

    for ((_, _), internal) in state.internal.routes.iter() {
        if internal.node_path.contains(&peer_info.name) {
            continue;
        }
        let mut outgoing_path = vec![self_name.to_string()];
        outgoing_path.extend(internal.node_path.iter().cloned());
        updates.push(UpdateEntry::Add {
            route: internal.route.clone(),
            node_path: outgoing_path,
        });
    }

    if updates.is_empty() {
        return Ok(Vec::new());
    }

    Ok(vec![Propagation::update(peer_info, updates)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Protocol, Route};
    use crate::state::{route_key, InternalRoute};

    fn peer(name: &str) -> PeerInfo {
        PeerInfo {
            name: name.into(),
            endpoint: format!("{name}:7400"),
            domains: vec![],
            peer_token: None,
        }
    }

    #[test]
    fn unknown_peer_rejected() {
        let mut state = State::new();
        let err = open(&mut state, peer("b"), "a").unwrap_err();
        assert!(matches!(err, PlanError::UnknownPeer(_)));
    }

    #[test]
    fn s6_full_sync_filters_routes_whose_path_contains_joining_peer() {
        let mut state = State::new();
        state
            .local
            .peers
            .insert("c".into(), crate::state::LocalPeer { info: peer("c"), added_at: 0 });
        state.local.routes.insert(
            route_key("local-svc", Protocol::Http),
            Route {
                name: "local-svc".into(),
                protocol: Protocol::Http,
                endpoint: "http://a".into(),
                region: None,
                tags: vec![],
            },
        );
        state.internal.routes.insert(
            ("b-svc".into(), "b".into()),
            InternalRoute {
                route: Route {
                    name: "b-svc".into(),
                    protocol: Protocol::Http,
                    endpoint: "http://b".into(),
                    region: None,
                    tags: vec![],
                },
                peer_name: "b".into(),
                node_path: vec!["b".into(), "c".into()],
                is_best: true,
            },
        );

        let props = open(&mut state, peer("c"), "a").unwrap();
        assert_eq!(props.len(), 1);
        match &props[0].message {
            crate::propagation::PropagationMessage::Update(updates) => {
                assert_eq!(updates.len(), 1);
                match &updates[0] {
                    UpdateEntry::Add { route, .. } => assert_eq!(route.name, "local-svc"),
                    _ => panic!("expected add"),
                }
            }
            _ => panic!("expected update"),
        }
    }
}
