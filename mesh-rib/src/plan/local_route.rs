use crate::error::PlanError;
use crate::propagation::Propagation;
use crate::schema::{Route, RouteKey, UpdateEntry};
use crate::state::{route_key, State};

/// `LocalRouteCreate`: insert into `local.routes`, rejecting a duplicate
/// `(name, protocol)`. Advertise to every currently-connected peer not
/// already in the outgoing path — which for a freshly-originated route is
/// simply every connected peer, since `nodePath = [selfName]` can never
/// contain a peer's own name.
pub fn create(
    state: &mut State,
    route: Route,
    self_name: &str,
) -> Result<Vec<Propagation>, PlanError> {
    let key = route_key(&route.name, route.protocol);
    if state.local.routes.contains_key(&key) {
        return Err(PlanError::duplicate_route(&key));
    }
    state.local.routes.insert(key, route.clone());

    let node_path = vec![self_name.to_string()];
    let propagations = state
        .connected_peers()
        .filter(|peer| !node_path.contains(&peer.name))
        .map(|peer| {
            Propagation::update(
                peer.clone(),
                vec![UpdateEntry::Add {
                    route: route.clone(),
                    node_path: node_path.clone(),
                }],
            )
        })
        .collect();

    Ok(propagations)
}

/// `LocalRouteDelete`: remove from `local.routes`, rejecting an absent
/// key. Withdrawal is sent to every connected peer unconditionally —
/// removals bypass split-horizon filtering.
pub fn delete(state: &mut State, key: &RouteKey) -> Result<Vec<Propagation>, PlanError> {
    if state.local.routes.remove(key).is_none() {
        return Err(PlanError::not_found(key));
    }

    let propagations = state
        .connected_peers()
        .map(|peer| {
            Propagation::update(
                peer.clone(),
                vec![UpdateEntry::Remove {
                    route: key.clone(),
                }],
            )
        })
        .collect();

    Ok(propagations)
}
