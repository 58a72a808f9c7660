//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that can occur during trace parsing
///
/// All of these are fatal: a trace that cannot be parsed aborts the run.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed trace at line {line_number}: {reason}: {line}")]
    Malformed {
        line_number: usize,
        line: String,
        reason: String,
    },

    #[error("unknown category {id} at line {line_number} (categories must be defined before use): {line}")]
    UnknownCategory {
        id: u32,
        line_number: usize,
        line: String,
    },

    #[error("failed to read trace: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while applying acceleration factors or restoring timings
#[derive(Error, Debug, PartialEq)]
pub enum BackpropError {
    #[error("invalid acceleration factor {factor} for {target}: factors must be positive and finite")]
    InvalidFactor { factor: f64, target: String },

    #[error("timing snapshot has {snapshot} nodes but the graph has {graph}")]
    SnapshotMismatch { snapshot: usize, graph: usize },
}

/// Errors surfaced by the `run` entry point
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Backprop(#[from] BackpropError),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
