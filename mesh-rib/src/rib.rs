//! The commit engine: the single serialization point every `Action` passes
//! through. `Rib` owns the live `Arc<State>` behind a
//! `tokio::sync::Mutex` that guards only the pointer swap — `plan()` itself
//! never holds the lock.

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};

use crate::error::PlanError;
use crate::plan::{self, Plan};
use crate::propagation::Propagation;
use crate::schema::Action;
use crate::state::{RouteMetadata, State};
use crate::{rib_info, rib_warn};
use std::collections::BTreeMap;

/// Broadcast to anyone observing commits — the binary's `--show-routes`
/// tooling and tests subscribe here rather than polling `get_state`.
#[derive(Clone, Debug)]
pub struct CommitEvent {
    pub action_kind: &'static str,
    pub prev_state: Arc<State>,
    pub new_state: Arc<State>,
    pub propagations: Vec<Propagation>,
}

/// One RIB instance per process.
pub struct Rib {
    self_name: String,
    live: Mutex<Arc<State>>,
    events: broadcast::Sender<CommitEvent>,
}

impl Rib {
    pub fn new(self_name: impl Into<String>) -> Self {
        let (events, _rx) = broadcast::channel(256);
        Self {
            self_name: self_name.into(),
            live: Mutex::new(Arc::new(State::new())),
            events,
        }
    }

    pub fn self_name(&self) -> &str {
        &self.self_name
    }

    /// Read-only snapshot of the current state.
    pub async fn get_state(&self) -> Arc<State> {
        Arc::clone(&*self.live.lock().await)
    }

    /// Read-only per-route-name explanation of the current best-path pick.
    pub async fn get_route_metadata(&self) -> BTreeMap<String, RouteMetadata> {
        self.live.lock().await.route_metadata()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CommitEvent> {
        self.events.subscribe()
    }

    /// Compute a `Plan` against the current state without mutating
    /// anything. A fast lock-and-clone: the `Arc::clone` is the only work
    /// done under the mutex, so planning proper never blocks a concurrent
    /// `plan`/`commit` pair from another caller.
    pub async fn plan(&self, action: Action) -> Result<Plan, PlanError> {
        let current = Arc::clone(&*self.live.lock().await);
        plan::plan(&current, action, &self.self_name)
    }

    /// Apply a previously-computed `Plan`. Rejected with `StaleCommit` if
    /// the live state has moved on since the plan was computed — the
    /// optimistic-concurrency gate.
    pub async fn commit(&self, action_kind: &'static str, plan: Plan) -> Result<Vec<Propagation>, PlanError> {
        let mut live = self.live.lock().await;
        if !Arc::ptr_eq(&*live, &plan.prev_state) {
            rib_warn!(action = action_kind, "rejected stale commit");
            return Err(PlanError::StaleCommit);
        }
        *live = Arc::clone(&plan.new_state);
        rib_info!(
            action = action_kind,
            routes_changed = plan.propagations.len(),
            "committed"
        );
        let event = CommitEvent {
            action_kind,
            prev_state: plan.prev_state.clone(),
            new_state: plan.new_state.clone(),
            propagations: plan.propagations.clone(),
        };
        let _ = self.events.send(event);
        Ok(plan.propagations)
    }

    /// Convenience: plan and commit in one call, retrying once on a stale
    /// commit (another caller raced ahead between `plan` and `commit`).
    /// Callers that need to inspect the intermediate `Plan` (e.g. the
    /// Session Manager deciding how to turn a `Tick` into a redial) should
    /// call `plan`/`commit` directly instead.
    pub async fn apply(&self, action: Action) -> Result<Vec<Propagation>, PlanError> {
        let kind = action.kind();
        loop {
            let plan = self.plan(action.clone()).await?;
            match self.commit(kind, plan).await {
                Ok(props) => return Ok(props),
                Err(PlanError::StaleCommit) => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Human-readable route dump for debugging, grounded on `zebra-rs/src/bgp/show.rs`.
    pub async fn describe_routes(&self) -> String {
        let state = self.get_state().await;
        let mut out = String::new();
        for route in state.local.routes.values() {
            out.push_str(&format!(
                "local  {} {} {}\n",
                route.name, route.protocol, route.endpoint
            ));
        }
        for ((name, peer_name), route) in &state.internal.routes {
            out.push_str(&format!(
                "remote {} via {} path={:?}{}\n",
                name,
                peer_name,
                route.node_path,
                if route.is_best { " *" } else { "" }
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PeerInfo, Protocol, Route};

    fn peer(name: &str) -> PeerInfo {
        PeerInfo {
            name: name.into(),
            endpoint: format!("{name}:7400"),
            domains: vec![],
            peer_token: None,
        }
    }

    #[tokio::test]
    async fn plan_then_commit_round_trips() {
        let rib = Rib::new("a");
        let plan = rib.plan(Action::LocalPeerCreate(peer("b"))).await.unwrap();
        let props = rib.commit("LocalPeerCreate", plan).await.unwrap();
        assert!(props.is_empty());
        let state = rib.get_state().await;
        assert!(state.local.peers.contains_key("b"));
    }

    #[tokio::test]
    async fn stale_commit_is_rejected() {
        let rib = Rib::new("a");
        let plan_one = rib.plan(Action::LocalPeerCreate(peer("b"))).await.unwrap();
        // Commit something else first so plan_one's prev_state is stale.
        rib.apply(Action::LocalPeerCreate(peer("c"))).await.unwrap();
        let err = rib.commit("LocalPeerCreate", plan_one).await.unwrap_err();
        assert!(matches!(err, PlanError::StaleCommit));
    }

    #[tokio::test]
    async fn apply_fans_out_local_route_create() {
        let rib = Rib::new("a");
        rib.apply(Action::LocalPeerCreate(peer("b"))).await.unwrap();
        rib.apply(Action::InternalProtocolOpen {
            peer_info: peer("b"),
        })
        .await
        .unwrap();
        let props = rib
            .apply(Action::LocalRouteCreate(Route {
                name: "svc-x".into(),
                protocol: Protocol::Http,
                endpoint: "http://a:8080".into(),
                region: None,
                tags: vec![],
            }))
            .await
            .unwrap();
        assert_eq!(props.len(), 1);
    }
}
