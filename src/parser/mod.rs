//! Trace parsing.
//!
//! This module handles:
//! - Parsing category definitions
//! - Parsing primitive lines into ordered `Primitive` records
//! - Expanding each primitive into graph nodes as it is read

pub mod category;
pub mod primitive;
pub mod textlog;

// Re-export main types
pub use category::{Category, CategoryKind, CategoryMap};
pub use primitive::{format_time, Primitive, Rank};
pub use textlog::{parse_trace, parse_trace_file, ParsedTrace, PrimitiveFields};
