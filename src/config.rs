//! Configuration for sbe-chipop
//!
//! Centralized configuration with sensible defaults.

use crate::error::{ChipOpError, Result};

/// Main configuration for chip-op execution and the bridge
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Policy Configuration
    // -------------------------------------------------------------------------
    /// Timeout for opcodes without a policy table entry (milliseconds)
    pub fallback_timeout_ms: u32,

    /// Expected response size for opcodes without a policy table entry (bytes)
    pub fallback_response_size: u32,

    // -------------------------------------------------------------------------
    // FFDC Configuration
    // -------------------------------------------------------------------------
    /// When to issue the supplemental GET_FFDC chip-op after a failure
    pub ffdc_strategy: FfdcStrategy,

    // -------------------------------------------------------------------------
    // Bridge Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address for the bridge server
    pub listen_addr: String,

    /// Number of bridge worker threads (max concurrently served clients)
    pub max_connections: usize,

    /// Added to the chip-op timeout when waiting on a bridge reply (milliseconds)
    pub bridge_slack_ms: u32,
}

/// Supplemental FFDC strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfdcStrategy {
    /// Fetch after every response-bearing failure
    OnFailure,

    /// Fetch only when the failed response carried no FFDC of its own
    WhenEmpty,

    /// Never fetch
    Never,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fallback_timeout_ms: 5000,
            fallback_response_size: 4096,
            ffdc_strategy: FfdcStrategy::OnFailure,
            listen_addr: "127.0.0.1:7711".to_string(),
            max_connections: 4,
            bridge_slack_ms: 2000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject values that would make every chip-op fail
    pub fn validate(&self) -> Result<()> {
        if self.fallback_timeout_ms == 0 {
            return Err(ChipOpError::Config(
                "fallback timeout must be nonzero".to_string(),
            ));
        }
        if self.fallback_response_size < 12 {
            return Err(ChipOpError::Config(format!(
                "fallback response size {} cannot hold a status header",
                self.fallback_response_size
            )));
        }
        if self.max_connections == 0 {
            return Err(ChipOpError::Config(
                "bridge needs at least one worker".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the timeout used for unrecognized opcodes (in milliseconds)
    pub fn fallback_timeout_ms(mut self, ms: u32) -> Self {
        self.config.fallback_timeout_ms = ms;
        self
    }

    /// Set the response size used for unrecognized opcodes (in bytes)
    pub fn fallback_response_size(mut self, size: u32) -> Self {
        self.config.fallback_response_size = size;
        self
    }

    /// Set the supplemental FFDC strategy
    pub fn ffdc_strategy(mut self, strategy: FfdcStrategy) -> Self {
        self.config.ffdc_strategy = strategy;
        self
    }

    /// Set the bridge listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the number of bridge worker threads
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the bridge reply slack (in milliseconds)
    pub fn bridge_slack_ms(mut self, ms: u32) -> Self {
        self.config.bridge_slack_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
