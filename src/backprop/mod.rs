//! What-if rescaling of compute and communication time.
//!
//! This module handles:
//! - Validating acceleration factors
//! - Ordering a plan of hardware and network factors
//! - Rescaling the affected nodes and propagating the change

pub mod driver;
pub mod factors;

// Re-export main types and functions
pub use driver::{apply_hardware_factor, apply_network_factor, apply_plan, AppliedFactor};
pub use factors::{validate_factor, AccelerationPlan, FactorTarget};
