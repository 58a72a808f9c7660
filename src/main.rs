//! MPI What-If CLI
//!
//! Rewrites an MPE textual trace as if selected ranks computed faster
//! or selected links delivered messages faster.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use mpi_whatif::commands::{
    execute_simulate, parse_hardware_factor, parse_link_factor, validate_args, validate_trace_file,
    SimulateArgs,
};
use mpi_whatif::parser::Rank;
use mpi_whatif::utils::config::{DEFAULT_INPUT_TRACE, DEFAULT_OUTPUT_TRACE, SCHEMA_VERSION};

/// MPI What-If - causal timing analysis for MPI traces
#[derive(Parser, Debug)]
#[command(name = "mpi-whatif")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply acceleration factors and rewrite the trace
    Simulate {
        /// Textual trace to analyse
        #[arg(short, long, default_value = DEFAULT_INPUT_TRACE)]
        input: PathBuf,

        /// Output path for the rewritten trace
        #[arg(short, long, default_value = DEFAULT_OUTPUT_TRACE)]
        output: PathBuf,

        /// Output path for JSON report (optional)
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Compute acceleration for a rank, as <rank>=<factor> (repeatable)
        #[arg(long = "hw", value_parser = parse_hardware_factor)]
        hardware: Vec<(Rank, f64)>,

        /// Link acceleration, as <from>:<to>=<factor> (repeatable)
        #[arg(long = "link", value_parser = parse_link_factor)]
        links: Vec<(Rank, Rank, f64)>,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Check that a trace parses and its messages match
    Validate {
        /// Path to textual trace
        #[arg(short, long, default_value = DEFAULT_INPUT_TRACE)]
        file: PathBuf,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Simulate {
            input,
            output,
            report,
            hardware,
            links,
            summary,
        } => {
            let args = SimulateArgs {
                input,
                output,
                report,
                hardware,
                links,
                print_summary: summary,
            };

            // Validate args first
            validate_args(&args)?;

            execute_simulate(args)?;
        }

        Commands::Validate { file } => {
            let resolution = validate_trace_file(file)?;
            if !resolution.is_complete() {
                log::warn!("{} messages could not be matched", resolution.unmatched.len());
            }
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

/// Display version information
///
/// **Private** - internal command implementation
fn display_version() {
    println!("MPI What-If v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Causal what-if timing analysis for MPE/MPI execution traces.");
}
