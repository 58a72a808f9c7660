//! Causal dependency graph.
//!
//! This module transforms parsed primitives into:
//! - Per-rank chains of timing nodes
//! - Cross-rank message edges (resolved after parsing)
//! - Time propagation along those edges

pub mod causal;
pub mod factory;
pub mod node;
pub mod propagate;

// Re-export main types and functions
pub use causal::{
    CausalGraph, EdgeKind, ResolutionReport, TimingSnapshot, UnmatchedArrow, UnmatchedReason,
};
pub use factory::spawn_nodes;
pub use node::{ArrowNeed, GraphNode, Moved, NodeId, NodeKind, PredecessorSlot};
