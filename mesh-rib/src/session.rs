//! The inward interfaces the RIB's session manager is built against:
//! `Clock`, `Transport`, `Session`, `Authenticator`. Nothing in this
//! module does I/O — concrete implementations live in `meshd`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::{PeerInfo, UpdateEntry};

/// A source of monotonically non-decreasing time, injected so the Session
/// Manager's redial/hold-timer bookkeeping can be driven by a fake clock
/// in tests rather than `std::time::Instant` directly.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// The wire shape of a peer-to-peer protocol message: a
/// session opening, an update batch, or a session close.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WireMessage {
    Open {
        peer: PeerInfo,
    },
    Update {
        updates: Vec<UpdateEntry>,
    },
    Close {
        code: i32,
    },
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("dial failed: {0}")]
    Dial(String),
    #[error("connection closed")]
    Closed,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed message: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing peer token")]
    MissingToken,
    #[error("peer token mismatch")]
    TokenMismatch,
}

/// One live connection to a peer. Implementations own the reader/writer
/// halves; `recv` returns `None` once the peer hangs up.
#[async_trait]
pub trait Session: Send + Sync {
    async fn send(&mut self, msg: WireMessage) -> Result<(), TransportError>;
    async fn recv(&mut self) -> Option<WireMessage>;
}

/// Dials out to a peer and returns an established [`Session`]. Listening
/// for inbound dials is a `meshd`-side concern.
#[async_trait]
pub trait Transport: Send + Sync {
    type Session: Session;

    async fn dial(&self, peer: &PeerInfo) -> Result<Self::Session, TransportError>;
}

/// Verifies a peer's presented token against what this node expects of it.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, peer: &PeerInfo, token: Option<&str>) -> Result<(), AuthError>;
}
