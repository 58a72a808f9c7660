//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod models;
pub mod simulate;
pub mod validate;

// Re-export main command functions
pub use models::{parse_hardware_factor, parse_link_factor, SimulateArgs};
pub use simulate::{execute_simulate, validate_args};
pub use validate::validate_trace_file;
