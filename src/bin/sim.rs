//! Chip-op Simulator Binary
//!
//! Serves a simulated SBE over the bridge protocol.

use std::sync::Arc;

use chipop::bridge::BridgeServer;
use chipop::protocol::{FfdcRecord, Opcode, Status, FFDC_MAGIC_HWP, FFDC_MAGIC_SBE};
use chipop::sim::{SimReply, SimulatedSbe};
use chipop::{Config, SharedTarget};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// Chip-op Simulator
#[derive(Parser, Debug)]
#[command(name = "chipop-sim")]
#[command(about = "Simulated SBE served over the chip-op bridge")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7711")]
    listen: String,

    /// Bridge worker threads
    #[arg(short, long, default_value = "4")]
    max_connections: usize,

    /// Size of the simulated dump payload in bytes
    #[arg(short, long, default_value = "4096")]
    dump_size: usize,

    /// Fail GET_DUMP with this primary status
    #[arg(long, value_parser = parse_u16)]
    fail_dump: Option<u16>,

    /// Number of FFDC records returned by GET_FFDC
    #[arg(long, default_value = "1")]
    ffdc_records: u8,
}

fn parse_u16(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid status '{}': {}", s, e))
}

fn build_simulator(args: &Args) -> chipop::Result<SimulatedSbe> {
    let mut sbe = SimulatedSbe::new();

    let dump_reply = match args.fail_dump {
        Some(primary) => SimReply::failed(
            Status::new(primary, 0),
            vec![FfdcRecord::build(FFDC_MAGIC_SBE, 1, 2, 0, b"simulated dump failure")?],
        ),
        None => SimReply::ok((0..args.dump_size).map(|i| i as u8).collect()),
    };
    sbe.on(Opcode::GET_DUMP, dump_reply);

    let records = (0..args.ffdc_records)
        .map(|i| FfdcRecord::build(FFDC_MAGIC_HWP, i, 1, 0, format!("ffdc #{}", i).as_bytes()))
        .collect::<chipop::Result<Vec<_>>>()?;
    sbe.on(Opcode::GET_FFDC, SimReply::ffdc(records));

    Ok(sbe)
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,chipop=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("chipop-sim v{}", chipop::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    let config = Config::builder()
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .build();

    let sbe = match build_simulator(&args) {
        Ok(sbe) => sbe,
        Err(e) => {
            tracing::error!("Failed to build simulator: {}", e);
            std::process::exit(1);
        }
    };

    let target = Arc::new(SharedTarget::new(sbe, config.clone()));

    let server = match BridgeServer::bind(&config, target) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to bind bridge: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
