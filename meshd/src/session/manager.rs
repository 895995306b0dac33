//! Per-peer connection lifecycle: dial with exponential backoff, open,
//! forward inbound wire messages into the RIB as `Action`s, and drain
//! outbound `Propagation`s onto the wire. One task per configured peer,
//! driven by a `tokio::select!` loop over the inbound session and the
//! peer's outbound queue.
//!
//! Only the active dial-out direction is implemented: every node dials
//! every configured peer, and a node's own listener/accept loop is left
//! for a future revision — the loopback test exercises both read and
//! write halves of the same `TcpSession` type regardless of which side
//! initiated it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoffBuilder;
use mesh_rib::{
    Action, Authenticator, Clock, PeerBatch, PeerInfo, PropagationMessage, Rib, Session,
    Transport, WireMessage,
};
use mesh_rib::{rib_debug, rib_warn};
use tokio::sync::{mpsc, Mutex};

pub struct SessionManager<T: Transport, C: Clock, A: Authenticator> {
    rib: Arc<Rib>,
    transport: Arc<T>,
    clock: Arc<C>,
    authenticator: Arc<A>,
    self_info: PeerInfo,
    outboxes: Mutex<HashMap<String, mpsc::UnboundedSender<PropagationMessage>>>,
}

impl<T, C, A> SessionManager<T, C, A>
where
    T: Transport + 'static,
    T::Session: 'static,
    C: Clock + 'static,
    A: Authenticator + 'static,
{
    pub fn new(rib: Arc<Rib>, transport: T, clock: C, authenticator: A, self_info: PeerInfo) -> Arc<Self> {
        Arc::new(Self {
            rib,
            transport: Arc::new(transport),
            clock: Arc::new(clock),
            authenticator: Arc::new(authenticator),
            self_info,
            outboxes: Mutex::new(HashMap::new()),
        })
    }

    /// Start a redialing task for a configured peer. `LocalPeerCreate`
    /// must already have been committed for this peer.
    pub async fn connect_peer(self: &Arc<Self>, peer: PeerInfo) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.outboxes.lock().await.insert(peer.name.clone(), tx);
        let mgr = Arc::clone(self);
        tokio::spawn(async move { mgr.run_peer(peer, rx).await });
    }

    /// Hand a batch of propagations addressed to one peer off to that
    /// peer's session task. Silently dropped if the peer has no active
    /// task (not yet connected, or never configured) — the RIB has
    /// already committed and a later `Tick`-driven redial will re-sync.
    pub async fn dispatch(&self, batch: PeerBatch) {
        if let Some(tx) = self.outboxes.lock().await.get(&batch.peer.name) {
            for msg in batch.messages {
                let _ = tx.send(msg);
            }
        }
    }

    async fn run_peer(
        self: Arc<Self>,
        peer: PeerInfo,
        mut outbound: mpsc::UnboundedReceiver<PropagationMessage>,
    ) {
        let mut backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(200))
            .with_max_interval(Duration::from_secs(30))
            .with_max_elapsed_time(None)
            .build();

        'redial: loop {
            let mut session = loop {
                match self.transport.dial(&peer).await {
                    Ok(session) => break session,
                    Err(err) => {
                        rib_warn!(peer = %peer.name, error = %err.to_string(), "dial failed");
                        let delay = backoff
                            .next_backoff()
                            .unwrap_or_else(|| Duration::from_secs(30));
                        tokio::time::sleep(delay).await;
                    }
                }
            };

            // Present the token configured locally for this specific peer,
            // not our own — that's what the peer's authenticator checks us
            // against.
            let open_peer = PeerInfo {
                peer_token: peer.peer_token.clone(),
                ..self.self_info.clone()
            };
            if session
                .send(WireMessage::Open { peer: open_peer })
                .await
                .is_err()
            {
                continue 'redial;
            }

            // Authentication is only meaningful once the peer has replied
            // with its own Open: the token we check against must come off
            // the wire, not out of our own config.
            let remote_open = loop {
                match session.recv().await {
                    Some(WireMessage::Open { peer }) => break Some(peer),
                    Some(_) | None => break None,
                }
            };
            let Some(remote_open) = remote_open else {
                rib_warn!(peer = %peer.name, "peer closed before completing the open handshake");
                continue 'redial;
            };

            if let Err(err) = self
                .authenticator
                .authenticate(&peer, remote_open.peer_token.as_deref())
                .await
            {
                rib_warn!(peer = %peer.name, error = %err.to_string(), "authentication failed");
                let delay = backoff
                    .next_backoff()
                    .unwrap_or_else(|| Duration::from_secs(30));
                tokio::time::sleep(delay).await;
                continue 'redial;
            }

            backoff.reset();
            let _ = self.clock.now_millis();

            let _ = self
                .rib
                .apply(Action::InternalProtocolOpen {
                    peer_info: peer.clone(),
                })
                .await;
            rib_debug!(peer = %peer.name, "session opened");

            loop {
                tokio::select! {
                    incoming = session.recv() => {
                        match incoming {
                            Some(WireMessage::Open { .. }) => {
                                // Already open on this side; a duplicate
                                // Open from the peer is not a new session.
                            }
                            Some(WireMessage::Update { updates }) => {
                                let _ = self.rib.apply(Action::InternalProtocolUpdate {
                                    peer_info: peer.clone(),
                                    updates,
                                }).await;
                            }
                            Some(WireMessage::Close { code }) => {
                                let _ = self.rib.apply(Action::InternalProtocolClose {
                                    peer_info: peer.clone(),
                                    code,
                                }).await;
                                break;
                            }
                            None => {
                                let _ = self.rib.apply(Action::InternalProtocolClose {
                                    peer_info: peer.clone(),
                                    code: 0,
                                }).await;
                                break;
                            }
                        }
                    }
                    Some(msg) = outbound.recv() => {
                        let wire = match msg {
                            PropagationMessage::Update(updates) => WireMessage::Update { updates },
                            PropagationMessage::Close { code } => WireMessage::Close { code },
                        };
                        if session.send(wire).await.is_err() {
                            rib_warn!(peer = %peer.name, "send failed, closing session");
                            let _ = self.rib.apply(Action::InternalProtocolClose {
                                peer_info: peer.clone(),
                                code: 0,
                            }).await;
                            break;
                        }
                    }
                }
            }

            rib_debug!(peer = %peer.name, "session closed, will redial");
        }
    }
}
