//! Textual trace writer.
//!
//! Output layout: the category lines exactly as read, one blank line,
//! then one primitive line per input primitive in original order.

use crate::parser::{ParsedTrace, Primitive};
use crate::utils::error::OutputError;
use log::info;
use std::path::Path;

/// Refresh every primitive from the graph and render the whole trace
pub fn render_trace(trace: &mut ParsedTrace) -> String {
    for primitive in &mut trace.primitives {
        primitive.refresh_times(&trace.graph);
    }

    let mut out = String::new();
    for line in &trace.category_lines {
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
    for primitive in &trace.primitives {
        out.push_str(&primitive_line(primitive));
        out.push('\n');
    }
    out
}

/// Format one primitive in the trace grammar
pub fn primitive_line(primitive: &Primitive) -> String {
    let start = primitive.start_text();
    let end = primitive.end_text();
    format!(
        "Primitive[ TimeBBox({start},{end}) Category={} ({start}, {}) ({end}, {}) ]",
        primitive.category, primitive.from_rank, primitive.to_rank
    )
}

/// Render the trace and write it to `output_path`
///
/// **Public** - main entry point for trace output
///
/// # Arguments
/// * `trace` - Parsed trace; its primitives are refreshed from the graph
/// * `output_path` - Path to the rewritten textual trace
///
/// # Errors
/// * `OutputError::InvalidPath` - path is empty or a directory
/// * `OutputError::WriteFailed` - I/O error during write
///
/// # Example
/// ```ignore
/// let mut simulation = simulate(&input, &plan)?;
/// write_trace(&mut simulation.trace, "new.textlog")?;
/// ```
pub fn write_trace(trace: &mut ParsedTrace, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    super::prepare_output_path(output_path)?;

    std::fs::write(output_path, render_trace(trace))?;

    info!("Trace written to: {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_line_format() {
        let primitive = Primitive::new(0.5, 1.25, 0, 1, 3);
        assert_eq!(
            primitive_line(&primitive),
            "Primitive[ TimeBBox(0.5,1.25) Category=3 (0.5, 0) (1.25, 1) ]"
        );
    }

    #[test]
    fn test_write_trace_to_directory_fails() {
        let mut trace = crate::parser::parse_trace("").unwrap();
        let dir = tempfile::tempdir().unwrap();
        assert!(write_trace(&mut trace, dir.path()).is_err());
    }
}
