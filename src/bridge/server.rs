//! Bridge Server
//!
//! Accepts connections and dispatches them to worker threads.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Receiver};

use crate::config::Config;
use crate::error::Result;
use crate::transport::{ChipOpTransport, SharedTarget};
use super::Connection;

/// How long the acceptor sleeps when no client is waiting
const ACCEPT_POLL: Duration = Duration::from_millis(50);

/// TCP server exposing one SBE target
pub struct BridgeServer<T> {
    listener: TcpListener,
    target: Arc<SharedTarget<T>>,
    workers: usize,
    shutdown: Arc<AtomicBool>,
}

impl<T: ChipOpTransport + Send + 'static> BridgeServer<T> {
    /// Bind the listener from `config.listen_addr`
    pub fn bind(config: &Config, target: Arc<SharedTarget<T>>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            listener,
            target,
            workers: config.max_connections,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Flag that stops `run` when set
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Start the server (blocking until shutdown)
    pub fn run(&self) -> Result<()> {
        let addr = self.local_addr()?;
        tracing::info!("Bridge listening on {} with {} workers", addr, self.workers);

        let (sender, receiver) = channel::bounded::<TcpStream>(self.workers);

        let handles: Vec<_> = (0..self.workers)
            .map(|id| {
                let receiver = receiver.clone();
                let target = Arc::clone(&self.target);
                let shutdown = Arc::clone(&self.shutdown);
                thread::Builder::new()
                    .name(format!("bridge-worker-{}", id))
                    .spawn(move || worker_loop(receiver, target, shutdown))
            })
            .collect::<std::io::Result<_>>()?;
        drop(receiver);

        while !self.shutdown.load(Ordering::Relaxed) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    tracing::trace!("Accepted {}", peer);
                    stream.set_nonblocking(false)?;
                    if sender.send(stream).is_err() {
                        tracing::error!("All bridge workers exited");
                        break;
                    }
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL);
                }
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                }
            }
        }

        tracing::info!("Bridge shutting down");
        drop(sender);
        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("Bridge worker panicked");
            }
        }

        Ok(())
    }
}

fn worker_loop<T: ChipOpTransport>(
    receiver: Receiver<TcpStream>,
    target: Arc<SharedTarget<T>>,
    shutdown: Arc<AtomicBool>,
) {
    for stream in receiver.iter() {
        let mut connection = match Connection::new(stream, Arc::clone(&target), Arc::clone(&shutdown)) {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!("Failed to set up connection: {}", e);
                continue;
            }
        };

        if let Err(e) = connection.handle() {
            tracing::warn!("Connection {} ended with error: {}", connection.peer_addr(), e);
        }
    }
}
