//! Primitive records: one logged span from the trace.

use crate::graph::{CausalGraph, NodeId};

/// Rank of a process in the traced program
pub type Rank = u32;

/// One logged timed event
///
/// Times start out as parsed and are refreshed once from the graph
/// right before serialization. The original text of each time is kept
/// so that untouched times are written back exactly as they were read.
#[derive(Debug, Clone)]
pub struct Primitive {
    pub start_time: f64,
    pub end_time: f64,
    pub from_rank: Rank,
    pub to_rank: Rank,
    pub category: u32,

    /// First node spawned from this primitive
    pub start_node: Option<NodeId>,

    /// Distinct closing node, if the template spawns one
    pub end_node: Option<NodeId>,

    original: OriginalTimes,
}

#[derive(Debug, Clone)]
struct OriginalTimes {
    start: f64,
    end: f64,
    start_text: String,
    end_text: String,
}

impl Primitive {
    pub fn new(start_time: f64, end_time: f64, from_rank: Rank, to_rank: Rank, category: u32) -> Self {
        Self::with_source_text(
            start_time,
            end_time,
            format_time(start_time),
            format_time(end_time),
            from_rank,
            to_rank,
            category,
        )
    }

    /// Build a primitive that remembers the exact text its times were parsed from
    pub fn with_source_text(
        start_time: f64,
        end_time: f64,
        start_text: String,
        end_text: String,
        from_rank: Rank,
        to_rank: Rank,
        category: u32,
    ) -> Self {
        Self {
            start_time,
            end_time,
            from_rank,
            to_rank,
            category,
            start_node: None,
            end_node: None,
            original: OriginalTimes {
                start: start_time,
                end: end_time,
                start_text,
                end_text,
            },
        }
    }

    /// Time span as parsed, before any acceleration
    pub fn original_span(&self) -> (f64, f64) {
        (self.original.start, self.original.end)
    }

    /// Pull the final timestamps back from the spawned nodes
    ///
    /// Without a distinct end node both times come from the start node.
    /// A time the graph never resolved keeps its parsed value.
    pub fn refresh_times(&mut self, graph: &CausalGraph) {
        let Some(start_id) = self.start_node else {
            return;
        };
        let start_node = graph.node(start_id);
        if let Some(start) = start_node.start() {
            self.start_time = start;
        }

        let closing = match self.end_node {
            Some(end_id) => graph.node(end_id),
            None => start_node,
        };
        if let Some(end) = closing.end() {
            self.end_time = end;
        }
    }

    pub fn start_text(&self) -> String {
        if self.start_time.to_bits() == self.original.start.to_bits() {
            self.original.start_text.clone()
        } else {
            format_time(self.start_time)
        }
    }

    pub fn end_text(&self) -> String {
        if self.end_time.to_bits() == self.original.end.to_bits() {
            self.original.end_text.clone()
        } else {
            format_time(self.end_time)
        }
    }
}

/// Shortest text that reads back as the same `f64`
pub fn format_time(value: f64) -> String {
    format!("{:?}", value)
}
