//! Best-path selection: strictly shortest `nodePath`, ties broken by
//! lexicographic `peerName`.

use std::collections::BTreeMap;

use crate::state::InternalRoute;

pub const REASON_SHORTEST: &str = "shortest nodePath";
pub const REASON_TIE_BREAK: &str = "tie-break: peerName";

/// Recompute and mark `is_best` for every candidate of `name` in `routes`.
/// Returns the peer name of the newly-selected best path, or `None` if no
/// candidates remain for this route name.
///
/// `routes` is keyed by `(name, peerName)`; only entries for `name` are
/// touched.
pub fn recompute(routes: &mut BTreeMap<(String, String), InternalRoute>, name: &str) -> Option<String> {
    let keys: Vec<(String, String)> = routes
        .range((name.to_string(), String::new())..)
        .take_while(|((n, _), _)| n == name)
        .map(|(k, _)| k.clone())
        .collect();

    if keys.is_empty() {
        return None;
    }

    let best_peer = {
        let mut best: Option<&(String, String)> = None;
        for key in &keys {
            let candidate = &routes[key];
            best = match best {
                None => Some(key),
                Some(current) => {
                    let current_route = &routes[current];
                    if is_better(candidate, current_route) {
                        Some(key)
                    } else {
                        Some(current)
                    }
                }
            };
        }
        best.map(|(_, peer)| peer.clone())
    };

    for key in &keys {
        if let Some(entry) = routes.get_mut(key) {
            entry.is_best = Some(&key.1) == best_peer.as_ref();
        }
    }

    best_peer
}

/// True if `candidate` beats `current` under the selection rule.
fn is_better(candidate: &InternalRoute, current: &InternalRoute) -> bool {
    let by_length = candidate.node_path.len().cmp(&current.node_path.len());
    match by_length {
        std::cmp::Ordering::Less => true,
        std::cmp::Ordering::Greater => false,
        std::cmp::Ordering::Equal => candidate.peer_name < current.peer_name,
    }
}

/// Human-readable explanation of the current pick, for `RouteMetadata`:
/// a genuine length tie reports `"tie-break: peerName"`, otherwise
/// `"shortest nodePath"`.
pub fn reason_for<'a>(candidates: impl Iterator<Item = &'a InternalRoute>) -> String {
    let mut shortest = usize::MAX;
    let mut shortest_count = 0usize;
    for c in candidates {
        match c.node_path.len().cmp(&shortest) {
            std::cmp::Ordering::Less => {
                shortest = c.node_path.len();
                shortest_count = 1;
            }
            std::cmp::Ordering::Equal => shortest_count += 1,
            std::cmp::Ordering::Greater => {}
        }
    }
    if shortest_count > 1 {
        REASON_TIE_BREAK.to_string()
    } else {
        REASON_SHORTEST.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Protocol, Route};

    fn route(name: &str, peer: &str, path: &[&str]) -> InternalRoute {
        InternalRoute {
            route: Route {
                name: name.into(),
                protocol: Protocol::Http,
                endpoint: format!("http://{peer}"),
                region: None,
                tags: vec![],
            },
            peer_name: peer.into(),
            node_path: path.iter().map(|s| s.to_string()).collect(),
            is_best: false,
        }
    }

    #[test]
    fn shortest_path_wins() {
        let mut routes = BTreeMap::new();
        routes.insert(("svc-x".into(), "b".into()), route("svc-x", "b", &["b"]));
        routes.insert(
            ("svc-x".into(), "c".into()),
            route("svc-x", "c", &["c", "other"]),
        );
        let best = recompute(&mut routes, "svc-x").unwrap();
        assert_eq!(best, "b");
        assert!(routes[&("svc-x".into(), "b".into())].is_best);
        assert!(!routes[&("svc-x".into(), "c".into())].is_best);
    }

    #[test]
    fn ties_break_on_peer_name() {
        let mut routes = BTreeMap::new();
        routes.insert(("svc-x".into(), "zz".into()), route("svc-x", "zz", &["zz"]));
        routes.insert(("svc-x".into(), "aa".into()), route("svc-x", "aa", &["aa"]));
        let best = recompute(&mut routes, "svc-x").unwrap();
        assert_eq!(best, "aa");
    }

    #[test]
    fn best_path_upgrade_then_downgrade() {
        let mut routes = BTreeMap::new();
        routes.insert(("svc-x".into(), "b".into()), route("svc-x", "b", &["b"]));
        routes.insert(
            ("svc-x".into(), "c".into()),
            route("svc-x", "c", &["c", "other"]),
        );
        assert_eq!(recompute(&mut routes, "svc-x").unwrap(), "b");

        routes.insert(
            ("svc-x".into(), "b".into()),
            route("svc-x", "b", &["b", "h1", "h2"]),
        );
        assert_eq!(recompute(&mut routes, "svc-x").unwrap(), "c");
    }
}
