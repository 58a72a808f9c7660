//! Simulate command implementation.
//!
//! The simulate command:
//! 1. Reads the textual trace
//! 2. Builds the causal graph and resolves messages
//! 3. Applies the acceleration factors
//! 4. Writes the rewritten trace (and optional JSON report)

use super::models::SimulateArgs;
use crate::backprop::{validate_factor, AccelerationPlan, FactorTarget};
use crate::engine::{simulate, Simulation};
use crate::output::{write_report, write_trace};
use crate::report::to_report;
use anyhow::{Context, Result};
use log::{debug, info};
use std::time::Instant;

/// Execute the simulate command
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `args` - Simulate configuration
///
/// # Returns
/// The finished simulation, for callers that want to inspect it
///
/// # Errors
/// * Trace read or parse errors
/// * Invalid factors
/// * File write errors
///
/// # Example
/// ```ignore
/// let args = SimulateArgs {
///     input: PathBuf::from("Unknown.textlog"),
///     output: PathBuf::from("new.textlog"),
///     hardware: vec![(0, 2.0)],
///     ..Default::default()
/// };
/// execute_simulate(args)?;
/// ```
pub fn execute_simulate(args: SimulateArgs) -> Result<Simulation> {
    let start_time = Instant::now();

    info!("Starting simulation for trace: {}", args.input.display());

    // Step 1: Read trace
    info!("Step 1/3: Reading trace...");
    let input = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read trace {}", args.input.display()))?;

    // Step 2: Build graph and apply factors
    info!("Step 2/3: Building causal graph and applying factors...");
    let plan = AccelerationPlan::from_entries(&args.hardware, &args.links);
    debug!("Plan: {} factor entries", plan.len());
    let mut simulation = simulate(&input, &plan).context("Failed to simulate trace")?;

    // Step 3: Write outputs
    info!("Step 3/3: Writing output files...");
    write_trace(&mut simulation.trace, &args.output).context("Failed to write trace")?;
    info!("✓ Trace written to: {}", args.output.display());

    let source = args.input.display().to_string();
    if let Some(report_path) = &args.report {
        let report = to_report(&mut simulation, &source);
        write_report(&report, report_path).context("Failed to write report JSON")?;
        info!("✓ Report written to: {}", report_path.display());
    }

    if args.print_summary {
        print_summary(&mut simulation, &source);
    }

    let elapsed = start_time.elapsed();
    info!("Simulation completed in {:.2}s", elapsed.as_secs_f64());

    Ok(simulation)
}

/// Print a text summary to stdout
///
/// **Private** - internal helper for execute_simulate
fn print_summary(simulation: &mut Simulation, source: &str) {
    let report = to_report(simulation, source);

    println!("\n{}", "=".repeat(80));
    println!("WHAT-IF SUMMARY");
    println!("{}", "=".repeat(80));
    println!("Trace:       {}", report.trace_source);
    println!("Primitives:  {}", report.summary.primitives);
    println!("Ranks:       {}", report.summary.ranks);
    println!("Messages:    {}/{} matched", report.messages.matched, report.messages.total);
    for applied in &report.factors {
        println!(
            "Factor:      {} x{} ({} nodes)",
            applied.target, applied.factor, applied.nodes_rescaled
        );
    }
    println!(
        "Makespan:    {:.6} -> {:.6}{}",
        report.makespan.before,
        report.makespan.after,
        report
            .makespan
            .speedup
            .map(|s| format!(" (x{:.3})", s))
            .unwrap_or_default()
    );
    for rank in &report.ranks {
        println!(
            "  rank {:>4}: {:.6} -> {:.6}",
            rank.rank,
            rank.before.duration(),
            rank.after.duration()
        );
    }
    println!("{}", "=".repeat(80));
}

/// Validate simulate arguments
///
/// **Public** - can be called before execute_simulate for early validation
pub fn validate_args(args: &SimulateArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Input trace path cannot be empty");
    }

    if args.output.as_os_str().is_empty() {
        anyhow::bail!("Output trace path cannot be empty");
    }

    if args.input == args.output {
        anyhow::bail!("Output trace must not overwrite the input trace");
    }

    for &(rank, factor) in &args.hardware {
        validate_factor(FactorTarget::Hardware { rank }, factor)?;
    }

    for &(from, to, factor) in &args.links {
        validate_factor(FactorTarget::Network { from, to }, factor)?;
    }

    Ok(())
}
