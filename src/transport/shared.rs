//! Shared Target
//!
//! Serializes chip-ops issued against one physical target.

use parking_lot::Mutex;

use crate::config::Config;
use crate::executor::Executor;
use super::ChipOpTransport;

/// A transport shared between threads
///
/// Timeout configuration is a side effect on the target, so the lock is
/// held for a whole chip-op: timeout, transport call, and any supplemental
/// FFDC fetch.
pub struct SharedTarget<T> {
    /// The resolved target (exclusive access needed per chip-op)
    transport: Mutex<T>,

    /// Configuration handed to every executor
    config: Config,
}

impl<T: ChipOpTransport> SharedTarget<T> {
    pub fn new(transport: T, config: Config) -> Self {
        Self {
            transport: Mutex::new(transport),
            config,
        }
    }

    /// Run `f` with an executor that owns the target until it returns
    pub fn run<R>(&self, f: impl FnOnce(&mut Executor<'_, T>) -> R) -> R {
        let mut transport = self.transport.lock();
        let mut executor = Executor::new(&mut *transport, &self.config);
        f(&mut executor)
    }

    /// Run `f` with raw access to the transport, under the same lock
    pub fn with_transport<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut transport = self.transport.lock();
        f(&mut transport)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_inner(self) -> T {
        self.transport.into_inner()
    }
}
