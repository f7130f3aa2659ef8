//! Executor Module
//!
//! Runs one chip-op end to end against a transport.
//!
//! ## Steps
//! 1. Encode the command
//! 2. Configure the transport timeout from the policy table
//! 3. Blocking transport call bounded by the policy response size
//! 4. Decode the response
//! 5. Classify: success iff both status halves are zero
//! 6. On a response-bearing failure, fetch supplemental FFDC once
//!
//! Transport errors are returned as-is, without a supplemental fetch.

use crate::config::{Config, FfdcStrategy};
use crate::error::{ChipOpError, Result};
use crate::protocol::{
    decode_response, Command, DumpRequest, FfdcRecord, Opcode, Policy, ResponseEnvelope, Status,
};
use crate::transport::{ChipOpTransport, TransportError};

/// Result of a successful chip-op
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipOpResponse {
    pub opcode: Opcode,
    pub status: Status,
    pub payload: Vec<u8>,
    pub ffdc: Vec<FfdcRecord>,
}

/// Executes chip-ops against a borrowed transport
///
/// The executor holds the transport mutably for its whole lifetime, so two
/// executors can never interleave on the same target.
pub struct Executor<'t, T: ChipOpTransport> {
    transport: &'t mut T,
    policy: Policy,
    ffdc_strategy: FfdcStrategy,
}

impl<'t, T: ChipOpTransport> Executor<'t, T> {
    pub fn new(transport: &'t mut T, config: &Config) -> Self {
        Self {
            transport,
            policy: Policy::from_config(config),
            ffdc_strategy: config.ffdc_strategy,
        }
    }

    /// Use an explicit policy instead of one derived from a config
    pub fn with_policy(transport: &'t mut T, policy: Policy, ffdc_strategy: FfdcStrategy) -> Self {
        Self {
            transport,
            policy,
            ffdc_strategy,
        }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    // =========================================================================
    // Chip-ops
    // =========================================================================

    /// Collect a hardware dump; the dump is the response payload
    pub fn get_dump(&mut self, request: DumpRequest) -> Result<ChipOpResponse> {
        self.execute(&Command::get_dump(request))
    }

    /// Retrieve pending FFDC
    pub fn get_ffdc(&mut self) -> Result<ChipOpResponse> {
        self.execute(&Command::get_ffdc())
    }

    /// Reset the SBE FIFO
    pub fn reset_fifo(&mut self) -> Result<ChipOpResponse> {
        self.execute(&Command::reset_fifo())
    }

    /// Execute an arbitrary command
    pub fn execute(&mut self, command: &Command) -> Result<ChipOpResponse> {
        let opcode = command.opcode();
        let (envelope, raw_len) = self.exchange(command)?;

        if envelope.is_success() {
            tracing::info!(
                "SBE response for {}: {}, payload={} bytes, FFDC={}",
                opcode,
                envelope.status,
                envelope.payload.len(),
                envelope.ffdc_list.len()
            );
            return Ok(ChipOpResponse {
                opcode,
                status: envelope.status,
                payload: envelope.payload,
                ffdc: envelope.ffdc_list,
            });
        }

        if envelope.malformed {
            tracing::warn!("Malformed SBE response for {}: {} bytes", opcode, raw_len);
        } else {
            tracing::warn!(
                "SBE response for {}: {}, payload={} bytes, FFDC={}",
                opcode,
                envelope.status,
                envelope.payload.len(),
                envelope.ffdc_list.len()
            );
        }

        let ResponseEnvelope {
            payload,
            status,
            mut ffdc_list,
            malformed,
        } = envelope;

        if self.wants_supplement(opcode, &ffdc_list) {
            self.merge_supplemental_ffdc(&mut ffdc_list);
        }

        if malformed {
            Err(ChipOpError::MalformedResponse {
                opcode,
                len: raw_len,
                ffdc: ffdc_list,
            })
        } else {
            Err(ChipOpError::ChipOpFailed {
                opcode,
                status,
                payload,
                ffdc: ffdc_list,
            })
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Configure timeout, run the transport, decode
    fn exchange(&mut self, command: &Command) -> Result<(ResponseEnvelope, usize)> {
        let opcode = command.opcode();
        let request = command.to_bytes();
        let limits = self.policy.lookup(opcode);

        tracing::debug!(
            "Issuing {} ({} words, timeout={} ms, max response={} bytes)",
            opcode,
            command.words().len(),
            limits.timeout_ms,
            limits.response_size
        );

        self.transport.set_timeout(limits.timeout_ms);

        let raw = self
            .transport
            .execute(&request, limits.response_size)
            .map_err(|err| match err {
                TransportError::Timeout => ChipOpError::TransportTimeout { opcode },
                TransportError::Failure(message) => ChipOpError::Transport { opcode, message },
            })?;

        Ok((decode_response(&raw), raw.len()))
    }

    fn wants_supplement(&self, opcode: Opcode, ffdc: &[FfdcRecord]) -> bool {
        // A failed GET_FFDC is not retried through itself
        if opcode == Opcode::GET_FFDC {
            return false;
        }
        match self.ffdc_strategy {
            FfdcStrategy::OnFailure => true,
            FfdcStrategy::WhenEmpty => ffdc.is_empty(),
            FfdcStrategy::Never => false,
        }
    }

    /// Best-effort GET_FFDC; errors are logged and dropped
    fn merge_supplemental_ffdc(&mut self, ffdc: &mut Vec<FfdcRecord>) {
        match self.fetch_supplemental_ffdc() {
            Ok(extra) => {
                tracing::debug!("Merged {} supplemental FFDC records", extra.len());
                ffdc.extend(extra);
            }
            Err(e) => {
                tracing::warn!("Supplemental FFDC fetch failed: {}", e);
            }
        }
    }

    fn fetch_supplemental_ffdc(&mut self) -> Result<Vec<FfdcRecord>> {
        let (envelope, raw_len) = self.exchange(&Command::get_ffdc())?;

        if envelope.malformed {
            return Err(ChipOpError::MalformedResponse {
                opcode: Opcode::GET_FFDC,
                len: raw_len,
                ffdc: Vec::new(),
            });
        }

        if !envelope.status.is_success() {
            return Err(ChipOpError::ChipOpFailed {
                opcode: Opcode::GET_FFDC,
                status: envelope.status,
                payload: envelope.payload,
                ffdc: envelope.ffdc_list,
            });
        }

        Ok(envelope.ffdc_list)
    }
}
