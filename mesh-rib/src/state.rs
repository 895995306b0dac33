//! The RIB snapshot: peers, local routes, internal (learned) routes, and
//! the invariants that must hold before and after every commit.

use std::collections::BTreeMap;

use crate::schema::{PeerInfo, Protocol, Route, RouteKey};

/// A configured neighbor, independent of connectivity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalPeer {
    pub info: PeerInfo,
    pub added_at: u64,
}

/// A route originated by this node. Identical shape to [`Route`].
pub type LocalRoute = Route;

/// A route learned from a peer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InternalRoute {
    pub route: Route,
    /// The immediate neighbor that advertised this path.
    pub peer_name: String,
    /// Ordered sequence of node names this advertisement has traversed,
    /// ending at the origin. Empty when freshly originated.
    pub node_path: Vec<String>,
    /// Set by the selector; exactly one candidate per route name is best.
    pub is_best: bool,
}

impl InternalRoute {
    pub fn name(&self) -> &str {
        &self.route.name
    }
}

/// Per-route-name explanation of the current best-path pick, derived from
/// `internal.routes` on demand — not persisted as separate state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteMetadata {
    /// All known candidates for this route name, keyed by advertising peer.
    pub candidates: BTreeMap<String, InternalRoute>,
    pub best_peer: Option<String>,
    pub selection_reason: String,
}

/// Locally-configured peers and locally-originated routes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocalTables {
    pub peers: BTreeMap<String, LocalPeer>,
    pub routes: BTreeMap<RouteKey, LocalRoute>,
}

/// Live session membership and routes learned over those sessions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InternalTables {
    pub peers: BTreeMap<String, PeerInfo>,
    /// Keyed by `(name, peerName)`.
    pub routes: BTreeMap<(String, String), InternalRoute>,
}

/// The immutable RIB snapshot. Every mutation produces a new `State`
/// rather than mutating this one in place — `plan()` never sees more than
/// a shared reference.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct State {
    pub local: LocalTables,
    pub internal: InternalTables,
    /// Monotonic logical clock, bumped once per `LocalPeerCreate`/`Update`
    /// to stamp `LocalPeer::added_at` without `plan()` reading wall-clock
    /// time, which would break its purity.
    pub seq: u64,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_seq(&mut self) -> u64 {
        let seq = self.seq;
        self.seq += 1;
        seq
    }

    pub fn is_connected(&self, peer_name: &str) -> bool {
        self.internal.peers.contains_key(peer_name)
    }

    pub fn connected_peers(&self) -> impl Iterator<Item = &PeerInfo> {
        self.internal.peers.values()
    }

    /// Candidate routes for a given route name, across all advertising
    /// peers, in deterministic (peer-name) order.
    pub fn candidates_for(&self, name: &str) -> impl Iterator<Item = &InternalRoute> {
        self.internal
            .routes
            .range((name.to_string(), String::new())..)
            .take_while(move |((n, _), _)| n == name)
            .map(|(_, route)| route)
    }

    pub fn best_path_for(&self, name: &str) -> Option<&InternalRoute> {
        self.candidates_for(name).find(|r| r.is_best)
    }

    /// Derived view used by `getRouteMetadata()`.
    pub fn route_metadata(&self) -> BTreeMap<String, RouteMetadata> {
        let mut out: BTreeMap<String, RouteMetadata> = BTreeMap::new();
        for ((name, peer_name), route) in &self.internal.routes {
            let entry = out.entry(name.clone()).or_insert_with(|| RouteMetadata {
                candidates: BTreeMap::new(),
                best_peer: None,
                selection_reason: String::new(),
            });
            entry.candidates.insert(peer_name.clone(), route.clone());
            if route.is_best {
                entry.best_peer = Some(peer_name.clone());
            }
        }
        for meta in out.values_mut() {
            meta.selection_reason = crate::selector::reason_for(meta.candidates.values());
        }
        out
    }

    /// Verify the seven structural invariants. Intended for tests and
    /// debug assertions, not the hot commit path.
    pub fn check_invariants(&self, self_name: &str) -> Result<(), String> {
        // 1. No local peer named after this node.
        if self.local.peers.contains_key(self_name) {
            return Err(format!("local peer list contains own name {self_name}"));
        }

        // 2 & 3. Uniqueness is structural (BTreeMap keys); nothing to check.

        // 4. Every connected peer has a matching local peer registration.
        for name in self.internal.peers.keys() {
            if !self.local.peers.contains_key(name) {
                return Err(format!(
                    "internal.peers contains {name} with no local.peers entry"
                ));
            }
        }

        // 5. Every InternalRoute's peerName is a currently-connected peer.
        // LocalPeerDelete never touches internal.peers/internal.routes, so
        // this holds even across the zombie window documented on local.peers.
        for (name, peer_name) in self.internal.routes.keys() {
            if !self.internal.peers.contains_key(peer_name) {
                return Err(format!(
                    "route {name} learned from {peer_name}, which is not in internal.peers"
                ));
            }
        }

        // 6. Own name never appears in any nodePath.
        for ((name, peer_name), route) in &self.internal.routes {
            if route.node_path.iter().any(|hop| hop == self_name) {
                return Err(format!(
                    "route {name} from {peer_name} carries own name in nodePath"
                ));
            }
        }

        // 7. Exactly one best path per route name with candidates.
        let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
        for ((name, _), route) in &self.internal.routes {
            let counter = seen.entry(name.as_str()).or_insert(0);
            if route.is_best {
                *counter += 1;
            }
        }
        for (name, count) in seen {
            if count != 1 {
                return Err(format!(
                    "route {name} has {count} best-path candidates, expected exactly 1"
                ));
            }
        }

        Ok(())
    }
}

pub fn route_key(name: &str, protocol: Protocol) -> RouteKey {
    RouteKey {
        name: name.to_string(),
        protocol,
    }
}
