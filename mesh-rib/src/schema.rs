//! Action & wire message schema: the closed tagged unions that cross the
//! RIB boundary, plus their validation.

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// Wire protocol a [`Route`] is reachable over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Http,
    #[serde(rename = "http:graphql")]
    HttpGraphql,
    #[serde(rename = "http:gql")]
    HttpGql,
    #[serde(rename = "http:grpc")]
    HttpGrpc,
    Tcp,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Protocol::Http => "http",
            Protocol::HttpGraphql => "http:graphql",
            Protocol::HttpGql => "http:gql",
            Protocol::HttpGrpc => "http:grpc",
            Protocol::Tcp => "tcp",
        };
        f.write_str(s)
    }
}

/// Identity of a node in the fabric.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerInfo {
    pub name: String,
    pub endpoint: String,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(rename = "peerToken", default, skip_serializing_if = "Option::is_none")]
    pub peer_token: Option<String>,
}

/// An advertisable service endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub name: String,
    pub protocol: Protocol,
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Key identifying a local route: `(name, protocol)`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RouteKey {
    pub name: String,
    pub protocol: Protocol,
}

/// One entry of an `InternalProtocolUpdate` batch, and the shape reused on
/// the wire for `Update` messages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum UpdateEntry {
    Add {
        route: Route,
        #[serde(rename = "nodePath")]
        node_path: Vec<String>,
    },
    Remove {
        route: RouteKey,
    },
}

/// Closed tagged union of mutation requests accepted by the RIB.
///
/// Modeled as a single enum dispatched through a function table keyed on
/// the discriminator — never as per-action subclasses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    LocalPeerCreate(PeerInfo),
    LocalPeerUpdate(PeerInfo),
    LocalPeerDelete { name: String },
    LocalRouteCreate(Route),
    LocalRouteDelete(RouteKey),
    InternalProtocolOpen { peer_info: PeerInfo },
    InternalProtocolClose { peer_info: PeerInfo, code: i32 },
    InternalProtocolUpdate {
        peer_info: PeerInfo,
        updates: Vec<UpdateEntry>,
    },
    Tick { now: u64 },
}

impl Action {
    /// The string discriminator, used in logging and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::LocalPeerCreate(_) => "LocalPeerCreate",
            Action::LocalPeerUpdate(_) => "LocalPeerUpdate",
            Action::LocalPeerDelete { .. } => "LocalPeerDelete",
            Action::LocalRouteCreate(_) => "LocalRouteCreate",
            Action::LocalRouteDelete(_) => "LocalRouteDelete",
            Action::InternalProtocolOpen { .. } => "InternalProtocolOpen",
            Action::InternalProtocolClose { .. } => "InternalProtocolClose",
            Action::InternalProtocolUpdate { .. } => "InternalProtocolUpdate",
            Action::Tick { .. } => "Tick",
        }
    }
}

fn validate_peer_info(peer: &PeerInfo, self_name: &str) -> Result<(), PlanError> {
    if peer.name.trim().is_empty() {
        return Err(PlanError::Validation("peer name must not be empty".into()));
    }
    if peer.name == self_name {
        return Err(PlanError::Validation(
            "peer name must not equal this node's own name".into(),
        ));
    }
    if peer.endpoint.trim().is_empty() {
        return Err(PlanError::Validation(
            "peer endpoint must not be empty".into(),
        ));
    }
    Ok(())
}

fn validate_route(route: &Route) -> Result<(), PlanError> {
    if route.name.trim().is_empty() {
        return Err(PlanError::Validation("route name must not be empty".into()));
    }
    if route.endpoint.trim().is_empty() {
        return Err(PlanError::Validation(
            "route endpoint must not be empty".into(),
        ));
    }
    Ok(())
}

/// Validate an action's payload shape. Runs **before** any state
/// inspection — a dedicated `ValidationError` that never touches `State`.
pub fn validate(action: &Action, self_name: &str) -> Result<(), PlanError> {
    match action {
        Action::LocalPeerCreate(peer) | Action::LocalPeerUpdate(peer) => {
            validate_peer_info(peer, self_name)
        }
        Action::LocalPeerDelete { name } => {
            if name.trim().is_empty() {
                Err(PlanError::Validation("peer name must not be empty".into()))
            } else {
                Ok(())
            }
        }
        Action::LocalRouteCreate(route) => validate_route(route),
        Action::LocalRouteDelete(key) => {
            if key.name.trim().is_empty() {
                Err(PlanError::Validation("route name must not be empty".into()))
            } else {
                Ok(())
            }
        }
        Action::InternalProtocolOpen { peer_info } => validate_peer_info(peer_info, self_name),
        Action::InternalProtocolClose { peer_info, .. } => validate_peer_info(peer_info, self_name),
        Action::InternalProtocolUpdate { peer_info, updates } => {
            validate_peer_info(peer_info, self_name)?;
            for entry in updates {
                if let UpdateEntry::Add { route, .. } = entry {
                    validate_route(route)?;
                }
            }
            Ok(())
        }
        Action::Tick { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(name: &str) -> PeerInfo {
        PeerInfo {
            name: name.to_string(),
            endpoint: format!("{name}.internal:7400"),
            domains: vec![],
            peer_token: None,
        }
    }

    #[test]
    fn rejects_empty_peer_name() {
        let mut p = peer("b");
        p.name = "".into();
        let err = validate(&Action::LocalPeerCreate(p), "a").unwrap_err();
        assert!(matches!(err, PlanError::Validation(_)));
    }

    #[test]
    fn rejects_self_referential_peer() {
        let err = validate(&Action::LocalPeerCreate(peer("a")), "a").unwrap_err();
        assert!(matches!(err, PlanError::Validation(_)));
    }

    #[test]
    fn accepts_well_formed_peer() {
        assert!(validate(&Action::LocalPeerCreate(peer("b")), "a").is_ok());
    }

    #[test]
    fn protocol_round_trips_through_json() {
        let route = Route {
            name: "svc-x".into(),
            protocol: Protocol::HttpGraphql,
            endpoint: "http://a:8080".into(),
            region: None,
            tags: vec![],
        };
        let json = serde_json::to_string(&route).unwrap();
        assert!(json.contains("\"http:graphql\""));
        let back: Route = serde_json::from_str(&json).unwrap();
        assert_eq!(back, route);
    }
}
