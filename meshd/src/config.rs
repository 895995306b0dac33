//! Node configuration file loading. Read-to-string, parse, surface a
//! contextual error on failure. A mesh node's bootstrap config is a flat
//! declarative document — name, listen address, peers, locally
//! originated routes — so a plain YAML document is enough; there's no
//! command tree to parse.

use std::path::Path;

use anyhow::Context;
use mesh_rib::{PeerInfo, Route};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct NodeConfig {
    pub name: String,
    pub listen: String,
    #[serde(default)]
    pub peers: Vec<PeerInfo>,
    #[serde(default)]
    pub routes: Vec<Route>,
}

pub fn load(path: &Path) -> anyhow::Result<NodeConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let config: NodeConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("parsing config file {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_documented_shape() {
        let yaml = r#"
name: node-a
listen: "0.0.0.0:7400"
peers:
  - name: node-b
    endpoint: "node-b.internal:7400"
    domains: ["svc.node-b.mesh"]
    peerToken: "shared-secret"
routes:
  - name: checkout
    protocol: http
    endpoint: "http://127.0.0.1:8080"
"#;
        let config: NodeConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.name, "node-a");
        assert_eq!(config.peers.len(), 1);
        assert_eq!(config.peers[0].peer_token.as_deref(), Some("shared-secret"));
        assert_eq!(config.routes[0].protocol, mesh_rib::Protocol::Http);
    }
}
