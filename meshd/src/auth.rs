use async_trait::async_trait;
use mesh_rib::{AuthError, Authenticator, PeerInfo};

/// Compares the token presented at open against the `peerToken` this node
/// has configured for that peer. A peer configured with no token accepts
/// any (or no) presented token — shared-secret auth is opt-in per peer.
pub struct SharedTokenAuthenticator;

#[async_trait]
impl Authenticator for SharedTokenAuthenticator {
    async fn authenticate(&self, peer: &PeerInfo, token: Option<&str>) -> Result<(), AuthError> {
        match (&peer.peer_token, token) {
            (None, _) => Ok(()),
            (Some(expected), Some(presented)) if expected == presented => Ok(()),
            (Some(_), None) => Err(AuthError::MissingToken),
            (Some(_), Some(_)) => Err(AuthError::TokenMismatch),
        }
    }
}
