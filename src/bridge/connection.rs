//! Connection Handler
//!
//! Handles individual bridge clients.

use std::io::{BufRead, BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ChipOpError, Result};
use crate::protocol::Command;
use crate::transport::{ChipOpTransport, SharedTarget, TransportError};
use super::{read_frame, write_frame, BridgeReply, BridgeRequest};

/// How often an idle connection checks for shutdown
const IDLE_POLL: Duration = Duration::from_millis(200);

/// Longest stall tolerated once a frame has started arriving
const FRAME_STALL_LIMIT: Duration = Duration::from_secs(5);

/// Handles a single client connection
pub struct Connection<T> {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// The target every chip-op runs against
    target: Arc<SharedTarget<T>>,

    /// Set by the server when it stops
    shutdown: Arc<AtomicBool>,

    /// Peer address for logging
    peer_addr: String,
}

impl<T: ChipOpTransport> Connection<T> {
    /// Create a new connection handler
    pub fn new(
        stream: TcpStream,
        target: Arc<SharedTarget<T>>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            target,
            shutdown,
            peer_addr,
        })
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Returns when the client disconnects, the server shuts down, or an
    /// error occurs.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Bridge client connected from {}", self.peer_addr);

        loop {
            if !self.wait_for_request()? {
                return Ok(());
            }

            let request: BridgeRequest = match read_frame(&mut self.reader) {
                Ok(req) => req,
                Err(ChipOpError::Io(ref e))
                    if matches!(
                        e.kind(),
                        ErrorKind::UnexpectedEof
                            | ErrorKind::ConnectionReset
                            | ErrorKind::ConnectionAborted
                    ) =>
                {
                    tracing::debug!("Client {} disconnected mid-frame", self.peer_addr);
                    return Ok(());
                }
                Err(ChipOpError::Io(ref e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    tracing::warn!(
                        "Client {} stalled mid-frame for {:?}; closing",
                        self.peer_addr,
                        FRAME_STALL_LIMIT
                    );
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    let _ = write_frame(&mut self.writer, &BridgeReply::Failure(e.to_string()));
                    return Err(e);
                }
            };

            let reply = self.dispatch(request);

            if let Err(e) = write_frame(&mut self.writer, &reply) {
                if let ChipOpError::Io(ref io_err) = e {
                    if matches!(
                        io_err.kind(),
                        ErrorKind::ConnectionAborted
                            | ErrorKind::ConnectionReset
                            | ErrorKind::BrokenPipe
                    ) {
                        tracing::debug!(
                            "Client {} disconnected before reply could be sent: {}",
                            self.peer_addr,
                            e
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Block until request bytes arrive; false on disconnect or shutdown
    fn wait_for_request(&mut self) -> Result<bool> {
        self.reader.get_ref().set_read_timeout(Some(IDLE_POLL))?;

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                tracing::debug!("Closing {} for shutdown", self.peer_addr);
                return Ok(false);
            }

            match self.reader.fill_buf() {
                Ok([]) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(false);
                }
                Ok(_) => break,
                Err(ref e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    continue;
                }
                Err(ref e)
                    if matches!(
                        e.kind(),
                        ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted
                    ) =>
                {
                    tracing::debug!("Connection reset by client {}", self.peer_addr);
                    return Ok(false);
                }
                Err(e) => return Err(e.into()),
            }
        }

        // A client that stops mid-frame must not pin this worker
        self.reader.get_ref().set_read_timeout(Some(FRAME_STALL_LIMIT))?;
        Ok(true)
    }

    /// Run one request against the target
    fn dispatch(&self, request: BridgeRequest) -> BridgeReply {
        match request {
            BridgeRequest::Ping => BridgeReply::Pong,
            BridgeRequest::Execute {
                timeout_ms,
                expected_len,
                request,
            } => {
                if let Ok(command) = Command::from_bytes(&request) {
                    tracing::trace!(
                        "Client {} issued {} (timeout={} ms)",
                        self.peer_addr,
                        command.opcode(),
                        timeout_ms
                    );
                }

                let result = self.target.with_transport(|transport| {
                    transport.set_timeout(timeout_ms);
                    transport.execute(&request, expected_len)
                });

                match result {
                    Ok(bytes) => BridgeReply::Response(bytes),
                    Err(TransportError::Timeout) => BridgeReply::Timeout,
                    Err(TransportError::Failure(message)) => BridgeReply::Failure(message),
                }
            }
        }
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}
