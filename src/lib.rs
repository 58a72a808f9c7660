//! MPI What-If
//!
//! Causal what-if analysis for MPE/MPI execution traces.
//!
//! A textual trace is turned into a happens-before graph (per-rank
//! chains plus message edges). Rescaling a rank's compute time or a
//! link's latency then shifts every causally dependent event, and the
//! trace is written back with the new timestamps.
//!
//! ## Getting Started
//!
//! ```bash
//! mpi-whatif simulate --input Unknown.textlog --output new.textlog --hw 0=2.0 --link 0:1=4.0
//! ```
//!
//! Library users call [`run`] or [`engine::simulate`].

pub mod backprop;
pub mod commands;
pub mod engine;
pub mod graph;
pub mod output;
pub mod parser;
pub mod report;
pub mod utils;

pub use engine::{run, simulate, Simulation};
