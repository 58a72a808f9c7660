//! What-if report generation.
//!
//! Summarises a simulation: trace size, message matching, applied
//! factors and how the per-rank and overall spans moved.

pub mod metrics;
pub mod schema;

use crate::engine::Simulation;
use crate::utils::config::SCHEMA_VERSION;
use chrono::Utc;

// Re-export main types and functions
pub use metrics::{calculate_makespan, rank_spans};
pub use schema::{MakespanChange, MessageSummary, RankSpan, Span, TraceSummary, WhatIfReport};

/// Build the report for a finished simulation
///
/// Primitives are refreshed from the graph first, so this can run
/// before or after the trace is rendered.
pub fn to_report(simulation: &mut Simulation, trace_source: &str) -> WhatIfReport {
    simulation.refresh_primitives();
    let trace = &simulation.trace;

    WhatIfReport {
        version: SCHEMA_VERSION.to_string(),
        trace_source: trace_source.to_string(),
        generated_at: Utc::now().to_rfc3339(),
        summary: TraceSummary {
            categories: trace.categories.len(),
            primitives: trace.primitives.len(),
            nodes: trace.graph.len(),
            ranks: trace.graph.ranks().count(),
        },
        messages: MessageSummary {
            total: simulation.resolution.total(),
            matched: simulation.resolution.matched,
            unmatched: simulation.resolution.unmatched.clone(),
        },
        factors: simulation.applied.clone(),
        makespan: calculate_makespan(&trace.primitives),
        ranks: rank_spans(trace),
    }
}
