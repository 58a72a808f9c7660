//! Output JSON schema definitions for what-if reports.
//!
//! Schema is versioned to allow future evolution.

use crate::backprop::AppliedFactor;
use crate::graph::UnmatchedArrow;
use crate::parser::Rank;
use serde::{Deserialize, Serialize};

/// Top-level report structure written to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatIfReport {
    /// Schema version for compatibility checking
    pub version: String,

    /// Trace file the analysis ran on
    pub trace_source: String,

    /// Timestamp when report was generated
    pub generated_at: String,

    pub summary: TraceSummary,

    pub messages: MessageSummary,

    /// Factors in the order they were applied
    pub factors: Vec<AppliedFactor>,

    pub makespan: MakespanChange,

    /// Per-rank activity span before and after
    pub ranks: Vec<RankSpan>,
}

/// Size of the parsed trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceSummary {
    pub categories: usize,
    pub primitives: usize,
    pub nodes: usize,
    pub ranks: usize,
}

/// Message matching outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSummary {
    pub total: usize,
    pub matched: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unmatched: Vec<UnmatchedArrow>,
}

/// Closed time interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: f64,
    pub end: f64,
}

impl Span {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Activity of one rank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankSpan {
    pub rank: Rank,
    pub before: Span,
    pub after: Span,
}

/// Whole-trace duration before and after acceleration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MakespanChange {
    pub before: f64,
    pub after: f64,
    /// `before / after`; absent for an empty or zero-length trace
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speedup: Option<f64>,
}

impl MakespanChange {
    pub fn new(before: f64, after: f64) -> Self {
        let speedup = (after > 0.0).then_some(before / after);
        Self {
            before,
            after,
            speedup,
        }
    }
}
