//! Scripted replies

use crate::protocol::{FfdcRecord, Status};

/// What the simulated SBE does with one chip-op
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimReply {
    /// Answer with an encoded response
    Respond {
        payload: Vec<u8>,
        status: Status,
        ffdc: Vec<FfdcRecord>,
    },

    /// Answer with these exact bytes
    Raw(Vec<u8>),

    /// Report a transport timeout
    Timeout,

    /// Report a transport failure
    Fail(String),
}

impl SimReply {
    /// Zero status with `payload`
    pub fn ok(payload: Vec<u8>) -> Self {
        SimReply::Respond {
            payload,
            status: Status::SUCCESS,
            ffdc: Vec::new(),
        }
    }

    /// Nonzero status with attached FFDC
    pub fn failed(status: Status, ffdc: Vec<FfdcRecord>) -> Self {
        SimReply::Respond {
            payload: Vec::new(),
            status,
            ffdc,
        }
    }

    /// Zero status carrying FFDC records (a GET_FFDC answer)
    pub fn ffdc(ffdc: Vec<FfdcRecord>) -> Self {
        SimReply::Respond {
            payload: Vec::new(),
            status: Status::SUCCESS,
            ffdc,
        }
    }
}
