use std::sync::Arc;

use clap::Parser;
use mesh_rib::{propagation::group_by_peer, Action, PeerInfo, Rib};

use meshd::auth::SharedTokenAuthenticator;
use meshd::clock::SystemClock;
use meshd::logging::{self, LoggingOutput};
use meshd::session::manager::SessionManager;
use meshd::transport::tcp::TcpTransport;
use meshd::{cli, config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let arg = cli::Arg::parse();

    logging::setup_tracing(match &arg.log_file {
        Some(path) => LoggingOutput::File(path.clone()),
        None => LoggingOutput::Stdout,
    })?;

    let node_config = config::load(&arg.config)?;
    tracing::info!(node = %node_config.name, "meshd starting");

    let rib = Arc::new(Rib::new(node_config.name.clone()));

    for peer in &node_config.peers {
        rib.apply(Action::LocalPeerCreate(peer.clone())).await?;
    }
    for route in node_config.routes {
        rib.apply(Action::LocalRouteCreate(route)).await?;
    }

    if arg.show_routes {
        print!("{}", rib.describe_routes().await);
        return Ok(());
    }

    let manager = SessionManager::new(
        Arc::clone(&rib),
        TcpTransport,
        SystemClock::new(),
        SharedTokenAuthenticator,
        PeerInfo {
            name: node_config.name.clone(),
            endpoint: node_config.listen.clone(),
            domains: vec![],
            peer_token: None,
        },
    );

    // Subscribe and spawn the dispatch task before dialing any peer —
    // `Rib::commit` drops an event with no receivers, and a fast dial can
    // otherwise commit the full-sync `InternalProtocolOpen` propagation
    // before anything is listening for it.
    let mut commits = rib.subscribe();
    let dispatch_manager = Arc::clone(&manager);
    tokio::spawn(async move {
        while let Ok(event) = commits.recv().await {
            for batch in group_by_peer(event.propagations) {
                dispatch_manager.dispatch(batch).await;
            }
        }
    });

    for peer in node_config.peers {
        manager.connect_peer(peer).await;
    }

    let mut ticks = tokio::time::interval(std::time::Duration::from_secs(1));
    loop {
        ticks.tick().await;
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let _ = rib.apply(Action::Tick { now }).await;
    }
}
