//! Bridge client
//!
//! A [`ChipOpTransport`] that forwards each exchange to a bridge server.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::config::Config;
use crate::error::{ChipOpError, Result};
use crate::transport::{ChipOpTransport, TransportError};
use super::{read_frame, write_frame, BridgeReply, BridgeRequest};

/// Remote target reached through a bridge server
pub struct BridgeTransport {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Timeout sent with the next chip-op
    timeout_ms: u32,

    /// Extra time allowed for the reply to cross the network
    slack_ms: u32,

    /// Set once a reply was abandoned; the stream can no longer be trusted
    desynced: bool,

    /// Peer address for logging
    peer_addr: String,
}

impl BridgeTransport {
    /// Connect to a bridge server
    pub fn connect(addr: impl ToSocketAddrs, config: &Config) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        tracing::debug!("Connected to bridge at {}", peer_addr);

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            timeout_ms: config.fallback_timeout_ms,
            slack_ms: config.bridge_slack_ms,
            desynced: false,
            peer_addr,
        })
    }

    /// Round-trip a ping
    pub fn ping(&mut self) -> Result<()> {
        match self.round_trip(&BridgeRequest::Ping)? {
            BridgeReply::Pong => Ok(()),
            other => Err(ChipOpError::Protocol(format!(
                "Unexpected reply to ping: {:?}",
                other
            ))),
        }
    }

    /// Timeout that will accompany the next chip-op
    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    fn round_trip(&mut self, request: &BridgeRequest) -> Result<BridgeReply> {
        if self.desynced {
            return Err(ChipOpError::Protocol(format!(
                "Connection to {} abandoned a reply; reconnect",
                self.peer_addr
            )));
        }

        let wait = Duration::from_millis(self.timeout_ms as u64 + self.slack_ms as u64);
        self.reader.get_ref().set_read_timeout(Some(wait))?;

        write_frame(&mut self.writer, request)?;
        let reply = read_frame(&mut self.reader);

        if let Err(ChipOpError::Io(ref e)) = reply {
            if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) {
                self.desynced = true;
            }
        }

        reply
    }
}

impl ChipOpTransport for BridgeTransport {
    fn set_timeout(&mut self, timeout_ms: u32) {
        self.timeout_ms = timeout_ms;
    }

    fn execute(&mut self, request: &[u8], expected_len: u32) -> std::result::Result<Vec<u8>, TransportError> {
        let message = BridgeRequest::Execute {
            timeout_ms: self.timeout_ms,
            expected_len,
            request: request.to_vec(),
        };

        match self.round_trip(&message) {
            Ok(BridgeReply::Response(bytes)) => Ok(bytes),
            Ok(BridgeReply::Timeout) => Err(TransportError::Timeout),
            Ok(BridgeReply::Failure(message)) => Err(TransportError::Failure(message)),
            Ok(BridgeReply::Pong) => Err(TransportError::Failure(
                "Unexpected pong in reply to chip-op".to_string(),
            )),
            Err(ChipOpError::Io(ref e))
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                tracing::warn!("No reply from bridge {} within timeout", self.peer_addr);
                Err(TransportError::Timeout)
            }
            Err(e) => Err(TransportError::Failure(e.to_string())),
        }
    }
}
