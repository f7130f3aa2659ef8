//! Tests for the chip-op Executor
//!
//! These tests verify:
//! - Timeout configuration before every transport call
//! - Status classification
//! - Supplemental FFDC fetch and merge on failure
//! - Transport errors short-circuit without a supplement
//! - Malformed responses are never reported as success

use chipop::protocol::{
    Command, DumpRequest, FfdcRecord, Opcode, Policy, PolicyEntry, Status, FFDC_MAGIC_HWP,
    FFDC_MAGIC_SBE,
};
use chipop::sim::{SimReply, SimulatedSbe};
use chipop::{ChipOpError, Config, Executor, FfdcStrategy};

// =============================================================================
// Helper Functions
// =============================================================================

fn record(slid: u8) -> FfdcRecord {
    FfdcRecord::build(FFDC_MAGIC_HWP, slid, 1, 0, &[slid; 4]).unwrap()
}

fn config_with(strategy: FfdcStrategy) -> Config {
    Config::builder().ffdc_strategy(strategy).build()
}

fn dump() -> DumpRequest {
    DumpRequest::new(1, 0, true)
}

// =============================================================================
// Success Path Tests
// =============================================================================

#[test]
fn test_successful_dump_returns_payload() {
    let mut sbe = SimulatedSbe::new().with_reply(Opcode::GET_DUMP, SimReply::ok(vec![0xAB; 64]));
    let config = Config::default();

    let response = Executor::new(&mut sbe, &config).get_dump(dump()).unwrap();

    assert_eq!(response.opcode, Opcode::GET_DUMP);
    assert_eq!(response.status, Status::SUCCESS);
    assert_eq!(response.payload, vec![0xAB; 64]);
    assert!(response.ffdc.is_empty());
    assert_eq!(sbe.opcodes(), vec![Opcode::GET_DUMP]);
}

#[test]
fn test_timeout_set_before_transport_call() {
    let mut sbe = SimulatedSbe::new();
    let config = Config::default();

    Executor::new(&mut sbe, &config).get_dump(dump()).unwrap();

    assert_eq!(sbe.timeouts(), &[60_000]);
    assert_eq!(sbe.requests()[0].1, Some(60_000));
}

#[test]
fn test_transport_sees_encoded_command() {
    let mut sbe = SimulatedSbe::new();
    let config = Config::default();

    Executor::new(&mut sbe, &config).get_dump(dump()).unwrap();

    assert_eq!(sbe.requests()[0].0, Command::get_dump(dump()));
    assert_eq!(sbe.requests()[0].0.words(), &[3, 0xAA01, 0x0001_0001]);
}

#[test]
fn test_success_keeps_inline_ffdc() {
    let mut sbe = SimulatedSbe::new().with_reply(
        Opcode::RESET_FIFO,
        SimReply::Respond {
            payload: Vec::new(),
            status: Status::SUCCESS,
            ffdc: vec![record(3)],
        },
    );
    let config = Config::default();

    let response = Executor::new(&mut sbe, &config).reset_fifo().unwrap();

    assert_eq!(response.ffdc, vec![record(3)]);
    assert_eq!(sbe.opcodes(), vec![Opcode::RESET_FIFO]);
}

#[test]
fn test_unknown_opcode_uses_fallback_timeout() {
    let mut sbe = SimulatedSbe::new();
    let config = Config::builder().fallback_timeout_ms(777).build();

    Executor::new(&mut sbe, &config)
        .execute(&Command::encode(0x55, 0x01, &[1, 2]))
        .unwrap();

    assert_eq!(sbe.timeouts(), &[777]);
}

// =============================================================================
// Status Failure Tests
// =============================================================================

#[test]
fn test_failure_merges_supplemental_ffdc() {
    let mut sbe = SimulatedSbe::new()
        .with_reply(Opcode::GET_DUMP, SimReply::failed(Status::new(0xFE, 0x0A), Vec::new()))
        .with_reply(Opcode::GET_FFDC, SimReply::ffdc(vec![record(1), record(2)]));
    let config = Config::default();

    let err = Executor::new(&mut sbe, &config).get_dump(dump()).unwrap_err();

    match err {
        ChipOpError::ChipOpFailed { opcode, status, ffdc, .. } => {
            assert_eq!(opcode, Opcode::GET_DUMP);
            assert_eq!(status, Status::new(0xFE, 0x0A));
            assert_eq!(ffdc, vec![record(1), record(2)]);
        }
        other => panic!("Expected ChipOpFailed, got {:?}", other),
    }
    assert_eq!(sbe.opcodes(), vec![Opcode::GET_DUMP, Opcode::GET_FFDC]);
    assert_eq!(sbe.timeouts(), &[60_000, 5_000]);
}

#[test]
fn test_supplement_failure_preserves_original_status() {
    let mut sbe = SimulatedSbe::new()
        .with_reply(Opcode::GET_DUMP, SimReply::failed(Status::new(0x02, 0x01), Vec::new()))
        .with_reply(Opcode::GET_FFDC, SimReply::Fail("fifo wedged".to_string()));
    let config = Config::default();

    let err = Executor::new(&mut sbe, &config).get_dump(dump()).unwrap_err();

    match err {
        ChipOpError::ChipOpFailed { status, ffdc, .. } => {
            assert_eq!(status, Status::new(0x02, 0x01));
            assert!(ffdc.is_empty());
        }
        other => panic!("Expected ChipOpFailed, got {:?}", other),
    }
}

#[test]
fn test_supplement_timeout_is_swallowed() {
    let mut sbe = SimulatedSbe::new()
        .with_reply(Opcode::GET_DUMP, SimReply::failed(Status::new(1, 0), Vec::new()))
        .with_reply(Opcode::GET_FFDC, SimReply::Timeout);
    let config = Config::default();

    let err = Executor::new(&mut sbe, &config).get_dump(dump()).unwrap_err();

    assert!(matches!(err, ChipOpError::ChipOpFailed { .. }));
    assert!(err.ffdc().is_empty());
}

#[test]
fn test_supplement_appends_after_inline_ffdc() {
    let mut sbe = SimulatedSbe::new()
        .with_reply(Opcode::GET_DUMP, SimReply::failed(Status::new(1, 0), vec![record(10)]))
        .with_reply(Opcode::GET_FFDC, SimReply::ffdc(vec![record(20)]));
    let config = Config::default();

    let err = Executor::new(&mut sbe, &config).get_dump(dump()).unwrap_err();

    assert_eq!(err.ffdc(), &[record(10), record(20)]);
}

#[test]
fn test_failed_status_keeps_payload() {
    let mut sbe = SimulatedSbe::new().with_reply(
        Opcode::GET_DUMP,
        SimReply::Respond {
            payload: vec![1, 2, 3, 4],
            status: Status::new(0, 0x10),
            ffdc: Vec::new(),
        },
    );
    let config = config_with(FfdcStrategy::Never);

    let err = Executor::new(&mut sbe, &config).get_dump(dump()).unwrap_err();

    match err {
        ChipOpError::ChipOpFailed { payload, status, .. } => {
            assert_eq!(payload, vec![1, 2, 3, 4]);
            assert_eq!(status.secondary, 0x10);
        }
        other => panic!("Expected ChipOpFailed, got {:?}", other),
    }
}

#[test]
fn test_supplement_with_failed_status_is_discarded() {
    let mut sbe = SimulatedSbe::new()
        .with_reply(Opcode::GET_DUMP, SimReply::failed(Status::new(1, 0), Vec::new()))
        .with_reply(Opcode::GET_FFDC, SimReply::failed(Status::new(3, 3), vec![record(7)]));
    let config = Config::default();

    let err = Executor::new(&mut sbe, &config).get_dump(dump()).unwrap_err();

    match err {
        ChipOpError::ChipOpFailed { status, ffdc, .. } => {
            assert_eq!(status, Status::new(1, 0));
            assert!(ffdc.is_empty());
        }
        other => panic!("Expected ChipOpFailed, got {:?}", other),
    }
    assert_eq!(sbe.opcodes(), vec![Opcode::GET_DUMP, Opcode::GET_FFDC]);
}

#[test]
fn test_supplement_with_failed_status_keeps_inline_ffdc() {
    let mut sbe = SimulatedSbe::new()
        .with_reply(Opcode::RESET_FIFO, SimReply::failed(Status::new(2, 0), vec![record(1)]))
        .with_reply(Opcode::GET_FFDC, SimReply::failed(Status::new(3, 3), vec![record(7)]));
    let config = Config::default();

    let err = Executor::new(&mut sbe, &config).reset_fifo().unwrap_err();

    assert_eq!(err.ffdc(), &[record(1)][..]);
}

#[test]
fn test_failed_get_ffdc_is_not_supplemented() {
    let mut sbe = SimulatedSbe::new()
        .with_reply(Opcode::GET_FFDC, SimReply::failed(Status::new(5, 0), Vec::new()));
    let config = Config::default();

    let err = Executor::new(&mut sbe, &config).get_ffdc().unwrap_err();

    assert!(matches!(err, ChipOpError::ChipOpFailed { .. }));
    assert_eq!(sbe.opcodes(), vec![Opcode::GET_FFDC]);
}

// =============================================================================
// Supplement Strategy Tests
// =============================================================================

#[test]
fn test_when_empty_skips_fetch_if_inline_ffdc_present() {
    let mut sbe = SimulatedSbe::new()
        .with_reply(Opcode::GET_DUMP, SimReply::failed(Status::new(1, 0), vec![record(1)]))
        .with_reply(Opcode::GET_FFDC, SimReply::ffdc(vec![record(2)]));
    let config = config_with(FfdcStrategy::WhenEmpty);

    let err = Executor::new(&mut sbe, &config).get_dump(dump()).unwrap_err();

    assert_eq!(err.ffdc(), &[record(1)]);
    assert_eq!(sbe.opcodes(), vec![Opcode::GET_DUMP]);
}

#[test]
fn test_when_empty_fetches_if_no_inline_ffdc() {
    let mut sbe = SimulatedSbe::new()
        .with_reply(Opcode::GET_DUMP, SimReply::failed(Status::new(1, 0), Vec::new()))
        .with_reply(Opcode::GET_FFDC, SimReply::ffdc(vec![record(2)]));
    let config = config_with(FfdcStrategy::WhenEmpty);

    let err = Executor::new(&mut sbe, &config).get_dump(dump()).unwrap_err();

    assert_eq!(err.ffdc(), &[record(2)]);
}

#[test]
fn test_never_skips_fetch() {
    let mut sbe = SimulatedSbe::new()
        .with_reply(Opcode::GET_DUMP, SimReply::failed(Status::new(1, 0), Vec::new()))
        .with_reply(Opcode::GET_FFDC, SimReply::ffdc(vec![record(2)]));
    let config = config_with(FfdcStrategy::Never);

    let err = Executor::new(&mut sbe, &config).get_dump(dump()).unwrap_err();

    assert!(err.ffdc().is_empty());
    assert_eq!(sbe.opcodes(), vec![Opcode::GET_DUMP]);
}

// =============================================================================
// Transport Error Tests
// =============================================================================

#[test]
fn test_transport_timeout_is_surfaced_without_supplement() {
    let mut sbe = SimulatedSbe::new().with_reply(Opcode::GET_DUMP, SimReply::Timeout);
    let config = Config::default();

    let err = Executor::new(&mut sbe, &config).get_dump(dump()).unwrap_err();

    assert!(matches!(
        err,
        ChipOpError::TransportTimeout { opcode } if opcode == Opcode::GET_DUMP
    ));
    assert!(err.is_transport());
    assert_eq!(sbe.opcodes(), vec![Opcode::GET_DUMP]);
}

#[test]
fn test_transport_failure_is_surfaced_unchanged() {
    let mut sbe =
        SimulatedSbe::new().with_reply(Opcode::RESET_FIFO, SimReply::Fail("EIO".to_string()));
    let config = Config::default();

    let err = Executor::new(&mut sbe, &config).reset_fifo().unwrap_err();

    match err {
        ChipOpError::Transport { opcode, message } => {
            assert_eq!(opcode, Opcode::RESET_FIFO);
            assert_eq!(message, "EIO");
        }
        other => panic!("Expected Transport, got {:?}", other),
    }
    assert_eq!(sbe.opcodes(), vec![Opcode::RESET_FIFO]);
}

#[test]
fn test_response_larger_than_policy_size_fails() {
    // RESET_FIFO allows 4096 bytes
    let mut sbe =
        SimulatedSbe::new().with_reply(Opcode::RESET_FIFO, SimReply::ok(vec![0; 8192]));
    let config = Config::default();

    let err = Executor::new(&mut sbe, &config).reset_fifo().unwrap_err();

    assert!(matches!(err, ChipOpError::Transport { .. }));
}

// =============================================================================
// Malformed Response Tests
// =============================================================================

#[test]
fn test_all_zero_response_is_not_success() {
    let mut sbe = SimulatedSbe::new()
        .with_reply(Opcode::GET_DUMP, SimReply::Raw(vec![0; 12]))
        .with_reply(Opcode::GET_FFDC, SimReply::ffdc(vec![record(9)]));
    let config = Config::default();

    let err = Executor::new(&mut sbe, &config).get_dump(dump()).unwrap_err();

    match err {
        ChipOpError::MalformedResponse { opcode, len, ffdc } => {
            assert_eq!(opcode, Opcode::GET_DUMP);
            assert_eq!(len, 12);
            assert_eq!(ffdc, vec![record(9)]);
        }
        other => panic!("Expected MalformedResponse, got {:?}", other),
    }
}

#[test]
fn test_short_response_is_malformed() {
    let mut sbe = SimulatedSbe::new().with_reply(Opcode::RESET_FIFO, SimReply::Raw(vec![0; 4]));
    let config = config_with(FfdcStrategy::Never);

    let err = Executor::new(&mut sbe, &config).reset_fifo().unwrap_err();

    assert!(matches!(err, ChipOpError::MalformedResponse { len: 4, .. }));
}

#[test]
fn test_malformed_supplement_is_swallowed() {
    let mut sbe = SimulatedSbe::new()
        .with_reply(Opcode::GET_DUMP, SimReply::failed(Status::new(1, 1), Vec::new()))
        .with_reply(Opcode::GET_FFDC, SimReply::Raw(vec![0xFF; 8]));
    let config = Config::default();

    let err = Executor::new(&mut sbe, &config).get_dump(dump()).unwrap_err();

    assert!(matches!(err, ChipOpError::ChipOpFailed { .. }));
    assert!(err.ffdc().is_empty());
}

#[test]
fn test_ffdc_record_fields_survive_execution() {
    let inline = FfdcRecord::build(FFDC_MAGIC_SBE, 0x42, 7, 0x3C, b"sbe").unwrap();
    let mut sbe = SimulatedSbe::new()
        .with_reply(Opcode::GET_DUMP, SimReply::failed(Status::new(1, 0), vec![inline.clone()]));
    let config = config_with(FfdcStrategy::Never);

    let err = Executor::new(&mut sbe, &config).get_dump(dump()).unwrap_err();

    let ffdc = err.ffdc();
    assert_eq!(ffdc.len(), 1);
    assert_eq!(ffdc[0].slid, 0x42);
    assert_eq!(ffdc[0].severity, 7);
    assert_eq!(ffdc[0].chip_id, 0x3C);
    assert_eq!(ffdc[0], inline);
}

// =============================================================================
// Scripted Sequence Tests
// =============================================================================

#[test]
fn test_queued_reply_is_used_before_persistent_reply() {
    let mut sbe = SimulatedSbe::new().with_reply(Opcode::GET_DUMP, SimReply::ok(vec![0x11; 8]));
    sbe.push(
        Opcode::GET_DUMP,
        SimReply::failed(Status::new(0x0F, 0), vec![record(3)]),
    );
    let config = config_with(FfdcStrategy::Never);
    let mut executor = Executor::new(&mut sbe, &config);

    // First dump fails with the queued reply, retry succeeds
    let err = executor.get_dump(dump()).unwrap_err();
    assert_eq!(err.ffdc(), &[record(3)][..]);

    let response = executor.get_dump(dump()).unwrap();
    assert_eq!(response.payload, vec![0x11; 8]);
    let response = executor.get_dump(dump()).unwrap();
    assert_eq!(response.payload, vec![0x11; 8]);
}

#[test]
fn test_queued_replies_are_consumed_in_order() {
    let mut sbe = SimulatedSbe::new();
    sbe.push(Opcode::RESET_FIFO, SimReply::Timeout)
        .push(Opcode::RESET_FIFO, SimReply::Fail("fifo busy".to_string()));
    let config = Config::default();
    let mut executor = Executor::new(&mut sbe, &config);

    assert!(matches!(
        executor.reset_fifo(),
        Err(ChipOpError::TransportTimeout { .. })
    ));
    match executor.reset_fifo() {
        Err(ChipOpError::Transport { message, .. }) => assert_eq!(message, "fifo busy"),
        other => panic!("Expected Transport error, got {:?}", other),
    }
    // Queue drained; unscripted opcodes answer with an empty success
    assert!(executor.reset_fifo().unwrap().payload.is_empty());
}

// =============================================================================
// Explicit Policy Tests
// =============================================================================

#[test]
fn test_with_policy_uses_given_fallback() {
    let mut sbe = SimulatedSbe::new();
    let policy = Policy::new(250, 64);
    let mut executor = Executor::with_policy(&mut sbe, policy, FfdcStrategy::Never);

    assert_eq!(executor.policy().fallback(), PolicyEntry { timeout_ms: 250, response_size: 64 });

    let unknown = Command::encode(0xA9, 0x7F, &[]);
    executor.execute(&unknown).unwrap();
    executor.reset_fifo().unwrap();

    assert_eq!(sbe.timeouts(), &[250, 5_000]);
}

#[test]
fn test_with_policy_strategy_is_honored() {
    let mut sbe = SimulatedSbe::new()
        .with_reply(Opcode::GET_DUMP, SimReply::failed(Status::new(1, 0), Vec::new()))
        .with_reply(Opcode::GET_FFDC, SimReply::ffdc(vec![record(9)]));

    let err = Executor::with_policy(&mut sbe, Policy::default(), FfdcStrategy::Never)
        .get_dump(dump())
        .unwrap_err();

    assert!(err.ffdc().is_empty());
    assert_eq!(sbe.opcodes(), vec![Opcode::GET_DUMP]);
}
