//! Chip-op CLI Client
//!
//! Issues chip-ops against a target exposed by a bridge server.

use std::path::PathBuf;

use chipop::bridge::BridgeTransport;
use chipop::dump::save_artifacts;
use chipop::protocol::{DumpRequest, FfdcRecord};
use chipop::{ChipOpError, ChipOpResponse, Config, Executor, FfdcStrategy};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

/// Chip-op CLI
#[derive(Parser, Debug)]
#[command(name = "chipop-cli")]
#[command(about = "Run SBE chip-ops through a chip-op bridge")]
#[command(version)]
struct Args {
    /// Bridge address
    #[arg(short, long, default_value = "127.0.0.1:7711")]
    bridge: String,

    /// Directory for payload and FFDC files
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// When to fetch supplemental FFDC after a failure
    #[arg(long, value_enum, default_value = "on-failure")]
    ffdc: FfdcArg,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FfdcArg {
    OnFailure,
    WhenEmpty,
    Never,
}

impl From<FfdcArg> for FfdcStrategy {
    fn from(arg: FfdcArg) -> Self {
        match arg {
            FfdcArg::OnFailure => FfdcStrategy::OnFailure,
            FfdcArg::WhenEmpty => FfdcStrategy::WhenEmpty,
            FfdcArg::Never => FfdcStrategy::Never,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Collect a hardware dump
    Dump {
        /// Dump type (0-15)
        #[arg(short = 't', long = "type", default_value = "1")]
        dump_type: u8,

        /// Clock state (0-3)
        #[arg(short, long, default_value = "0")]
        clock: u8,

        /// Also collect fast-array data
        #[arg(long)]
        fa: bool,
    },

    /// Retrieve pending FFDC
    Ffdc,

    /// Reset the SBE FIFO
    ResetFifo,

    /// Check that the bridge answers
    Ping,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_target(false).init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("error: {}", e);
        print_ffdc(e.ffdc());
        if let Err(save_err) = save_failure(&args, &e) {
            eprintln!("error: could not save FFDC: {}", save_err);
        }
        std::process::exit(1);
    }
}

fn run(args: &Args) -> chipop::Result<()> {
    let config = Config::builder().ffdc_strategy(args.ffdc.into()).build();
    let mut transport = BridgeTransport::connect(args.bridge.as_str(), &config)?;

    let (name, response) = match args.command {
        Commands::Ping => {
            transport.ping()?;
            println!("bridge {} is alive", transport.peer_addr());
            return Ok(());
        }
        Commands::Dump {
            dump_type,
            clock,
            fa,
        } => {
            if dump_type > 0xF || clock > 0x3 {
                return Err(ChipOpError::Config(format!(
                    "dump type {} / clock {} out of range",
                    dump_type, clock
                )));
            }
            let mut executor = Executor::new(&mut transport, &config);
            ("dump", executor.get_dump(DumpRequest::new(dump_type, clock, fa))?)
        }
        Commands::Ffdc => ("ffdc", Executor::new(&mut transport, &config).get_ffdc()?),
        Commands::ResetFifo => (
            "reset-fifo",
            Executor::new(&mut transport, &config).reset_fifo()?,
        ),
    };

    report(args, name, &response)
}

fn report(args: &Args, name: &str, response: &ChipOpResponse) -> chipop::Result<()> {
    println!(
        "{}: {} ({} payload bytes, {} FFDC records)",
        response.opcode,
        response.status,
        response.payload.len(),
        response.ffdc.len()
    );
    print_ffdc(&response.ffdc);

    let artifacts = save_artifacts(&args.output, name, &response.payload, &response.ffdc)?;
    if let Some(path) = artifacts.payload_path {
        println!("payload written to {}", path.display());
    }
    Ok(())
}

fn save_failure(args: &Args, error: &ChipOpError) -> chipop::Result<()> {
    if error.ffdc().is_empty() {
        return Ok(());
    }
    let payload = match error {
        ChipOpError::ChipOpFailed { payload, .. } => payload.as_slice(),
        _ => &[],
    };
    save_artifacts(&args.output, "failed", payload, error.ffdc())?;
    Ok(())
}

fn print_ffdc(records: &[FfdcRecord]) {
    for (index, record) in records.iter().enumerate() {
        println!(
            "  ffdc[{}]: magic={} slid={} severity={} chip={} {} bytes",
            index,
            record
                .magic()
                .map(|m| format!("0x{:04X}", m))
                .unwrap_or_else(|| "?".to_string()),
            record.slid,
            record.severity,
            record.chip_id,
            record.raw_data.len()
        );
    }
}
