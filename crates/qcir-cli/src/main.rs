//! qcir Command-Line Interface
//!
//! Inspect, transform and convert quantum circuits stored in the qcir
//! protobuf wire format, and read simulation results.
//!
//! ```text
//! qcir ghz 5 -o ghz.pb
//! qcir inspect ghz.pb
//! qcir transform ghz.pb -o flat.pb --decompose --remove-unused
//! qcir convert flat.pb -o flat.json
//! qcir results run.pb --format json
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{convert, ghz, inspect, results, transform};
use config::Config;

/// qcir - quantum circuit IR toolkit
#[derive(Parser)]
#[command(name = "qcir")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (YAML)
    #[arg(long, global = true, env = "QCIR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print registers, operation counts and the instruction listing
    Inspect {
        /// Circuit file (.pb or .json)
        input: PathBuf,

        /// Output format (table, json)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Run structural passes over a circuit
    Transform {
        /// Input circuit file
        input: PathBuf,

        /// Output circuit file
        #[arg(short, long)]
        output: PathBuf,

        /// Expand composite gates into primitives
        #[arg(long)]
        decompose: bool,

        /// Also rewrite measurements and resets into the Z basis
        #[arg(long)]
        z_basis: bool,

        /// Eliminate SWAP gates by relabelling qubits
        #[arg(long)]
        remove_swaps: bool,

        /// Descend into blocks and gate declarations when removing SWAPs
        #[arg(long, requires = "remove_swaps")]
        recursive: bool,

        /// Drop unused qubits, bits and z-variables
        #[arg(long)]
        remove_unused: bool,
    },

    /// Convert between protobuf and JSON encodings
    Convert {
        /// Input circuit file
        input: PathBuf,

        /// Output circuit file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write a GHZ sample circuit
    Ghz {
        /// Number of qubits
        qubits: usize,

        /// Output circuit file
        #[arg(short, long)]
        output: PathBuf,

        /// Measure every qubit at the end
        #[arg(long)]
        measure: bool,
    },

    /// Display a simulation results file
    Results {
        /// Results file (protobuf)
        input: PathBuf,

        /// Output format (table, json)
        #[arg(short, long)]
        format: Option<String>,
    },
}

fn init_logging(verbose: u8, config: &Config) {
    let level = match verbose {
        0 => config.logging.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    init_logging(cli.verbose, &config);
    tracing::debug!(?config, "loaded configuration");

    match cli.command {
        Commands::Inspect { input, format } => inspect::execute(&input, format.as_deref(), &config),

        Commands::Transform {
            input,
            output,
            decompose,
            z_basis,
            remove_swaps,
            recursive,
            remove_unused,
        } => transform::execute(
            &input,
            &output,
            transform::Passes {
                decompose,
                z_basis,
                remove_swaps,
                recursive,
                remove_unused,
            },
            &config,
        ),

        Commands::Convert { input, output } => convert::execute(&input, &output, &config),

        Commands::Ghz {
            qubits,
            output,
            measure,
        } => ghz::execute(qubits, &output, measure, &config),

        Commands::Results { input, format } => results::execute(&input, format.as_deref(), &config),
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}
