//! Pure, sync core of the mesh control plane: Action schema, RIB state,
//! best-path selector, plan/commit engine, and the Session Manager's
//! inward trait contracts. No concrete transport, CLI, or config lives
//! here — see the `meshd` binary crate.

pub mod error;
pub mod plan;
pub mod propagation;
pub mod rib;
pub mod schema;
pub mod selector;
pub mod session;
pub mod state;
pub mod tracing_macros;

pub use error::PlanError;
pub use plan::Plan;
pub use propagation::{PeerBatch, Propagation, PropagationMessage};
pub use rib::{CommitEvent, Rib};
pub use schema::{Action, PeerInfo, Protocol, Route, RouteKey, UpdateEntry};
pub use session::{Authenticator, AuthError, Clock, Session, Transport, TransportError, WireMessage};
pub use state::{InternalRoute, LocalPeer, RouteMetadata, State};
