//! Validate command: check that a trace parses and its messages match.

use crate::graph::ResolutionReport;
use crate::parser::parse_trace_file;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse a trace, resolve its messages and print what was found
///
/// A malformed trace is an error; unmatched messages are only listed.
pub fn validate_trace_file(path: impl AsRef<Path>) -> Result<ResolutionReport> {
    let path = path.as_ref();
    println!("Validating trace: {}", path.display());

    let mut trace = parse_trace_file(path)
        .with_context(|| format!("Failed to parse trace {}", path.display()))?;
    let resolution = trace.graph.resolve_deferred_arrows();

    println!("✓ Valid trace");
    println!("  Categories: {}", trace.categories.len());
    println!("  Primitives: {}", trace.primitives.len());
    println!("  Ranks: {}", trace.graph.ranks().count());
    println!("  Graph Nodes: {}", trace.graph.len());
    println!("  Messages: {}/{} matched", resolution.matched, resolution.total());

    for arrow in &resolution.unmatched {
        println!(
            "  ✗ Unmatched message {} -> {} [{:?}, {:?}]: {:?}",
            arrow.from_rank, arrow.to_rank, arrow.start_time, arrow.end_time, arrow.reason
        );
    }

    Ok(resolution)
}
