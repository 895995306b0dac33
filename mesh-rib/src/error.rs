use thiserror::Error;

use crate::schema::{Protocol, RouteKey};

/// Exhaustive set of errors the planner can surface to a caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("unknown peer: {0}")]
    UnknownPeer(String),

    #[error("duplicate route: {name} ({protocol})")]
    DuplicateRoute { name: String, protocol: Protocol },

    #[error("route not found: {name} ({protocol})")]
    NotFound { name: String, protocol: Protocol },

    #[error("stale commit: state has advanced since this plan was computed")]
    StaleCommit,
}

impl PlanError {
    pub fn duplicate_route(key: &RouteKey) -> Self {
        PlanError::DuplicateRoute {
            name: key.name.clone(),
            protocol: key.protocol,
        }
    }

    pub fn not_found(key: &RouteKey) -> Self {
        PlanError::NotFound {
            name: key.name.clone(),
            protocol: key.protocol,
        }
    }
}
