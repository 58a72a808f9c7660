//! Configuration and constants for the engine and CLI.

/// Current what-if report schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Trace file produced by the slog2 text converter
pub const DEFAULT_INPUT_TRACE: &str = "Unknown.textlog";

/// Rewritten trace handed to the viewer
pub const DEFAULT_OUTPUT_TRACE: &str = "new.textlog";

/// A factor of exactly this value leaves the graph untouched
pub const NEUTRAL_FACTOR: f64 = 1.0;

// Category names emitted by the MPE logging library.
// Anything not listed here is modelled as a generic state.
pub const SEND_CATEGORY_NAME: &str = "MPI_Send";
pub const RECV_CATEGORY_NAME: &str = "MPI_Recv";
pub const MESSAGE_CATEGORY_NAME: &str = "message";
pub const FINALIZE_CATEGORY_NAME: &str = "MPE_Comm_finalize";

// Line prefixes of the textual trace grammar
pub const CATEGORY_LINE_PREFIX: &str = "Category";
pub const PRIMITIVE_LINE_PREFIX: &str = "Primitive";
