//! Plan/Commit engine. `plan()` is a pure function over
//! `(currentState, action)`; dispatch is a function table keyed on the
//! action discriminator, never per-action subclasses.

mod local_peer;
mod local_route;
mod session_close;
mod session_open;
mod session_update;
mod tick;

use std::sync::Arc;

use crate::error::PlanError;
use crate::propagation::Propagation;
use crate::schema::{validate, Action};
use crate::state::State;

/// The result of a successful `plan()` call: the state it was computed
/// against, the state it would produce, and the propagations that would
/// follow a `commit()`. Nothing is mutated until `commit()` runs.
#[derive(Clone, Debug)]
pub struct Plan {
    pub prev_state: Arc<State>,
    pub new_state: Arc<State>,
    pub propagations: Vec<Propagation>,
}

/// Compute a `Plan` for `action` against `state`, without mutating
/// anything. Pure: `plan(s, a) == plan(s, a)` for any `s`, `a`.
pub fn plan(state: &Arc<State>, action: Action, self_name: &str) -> Result<Plan, PlanError> {
    validate(&action, self_name)?;

    let prev_state = Arc::clone(state);
    let mut draft = (*state).clone();
    let propagations = match action {
        Action::LocalPeerCreate(peer) => local_peer::create(&mut draft, peer)?,
        Action::LocalPeerUpdate(peer) => local_peer::update(&mut draft, peer)?,
        Action::LocalPeerDelete { name } => local_peer::delete(&mut draft, &name)?,
        Action::LocalRouteCreate(route) => local_route::create(&mut draft, route, self_name)?,
        Action::LocalRouteDelete(key) => local_route::delete(&mut draft, &key)?,
        Action::InternalProtocolOpen { peer_info } => {
            session_open::open(&mut draft, peer_info, self_name)?
        }
        Action::InternalProtocolClose { peer_info, code } => {
            session_close::close(&mut draft, peer_info, code, self_name)?
        }
        Action::InternalProtocolUpdate { peer_info, updates } => {
            session_update::update(&mut draft, peer_info, updates, self_name)?
        }
        Action::Tick { .. } => tick::tick(&draft),
    };

    Ok(Plan {
        prev_state,
        new_state: Arc::new(draft),
        propagations,
    })
}
