//! Newline-delimited JSON over TCP: the concrete [`Transport`] a running
//! `meshd` node dials peers with. Each connection is split into an
//! owned read half and write half so sending and receiving never
//! contend for the same lock.

use async_trait::async_trait;
use mesh_rib::{PeerInfo, Session, Transport, TransportError, WireMessage};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

pub struct TcpTransport;

#[async_trait]
impl Transport for TcpTransport {
    type Session = TcpSession;

    async fn dial(&self, peer: &PeerInfo) -> Result<Self::Session, TransportError> {
        let stream = TcpStream::connect(&peer.endpoint)
            .await
            .map_err(|e| TransportError::Dial(e.to_string()))?;
        Ok(TcpSession::from_stream(stream))
    }
}

/// One established connection, framed as one JSON document per line.
pub struct TcpSession {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TcpSession {
    pub fn from_stream(stream: TcpStream) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer: write_half,
        }
    }
}

#[async_trait]
impl Session for TcpSession {
    async fn send(&mut self, msg: WireMessage) -> Result<(), TransportError> {
        let mut line = serde_json::to_string(&msg)
            .map_err(|e| TransportError::Malformed(e.to_string()))?;
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<WireMessage> {
        let mut line = String::new();
        match self.reader.read_line(&mut line).await {
            Ok(0) => None, // peer hung up
            Ok(_) => serde_json::from_str(line.trim_end()).ok(),
            Err(_) => None,
        }
    }
}
