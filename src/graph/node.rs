//! Graph nodes: the atomic timing units of the causal model.
//!
//! Nodes live in one arena owned by `CausalGraph` and refer to each
//! other only through `NodeId`. Times start out partially unknown
//! (`None`) and are filled in while the graph is built.

use crate::parser::Rank;
use petgraph::graph::NodeIndex;

/// Stable index of a node in the graph; nodes are never removed
pub type NodeId = NodeIndex;

/// Node variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    SendStart,
    SendEnd,
    RecvStart,
    RecvEnd,
    Worker,
    /// Message transit between two ranks
    Arrow,
    Final,
    Other,
}

/// Whether a node still waits for a message edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowNeed {
    None,
    Outgoing,
    Incoming,
}

/// Which predecessor an update comes from
///
/// Only `RecvEnd` distinguishes the two: it waits for both its local
/// predecessor and the arriving message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredecessorSlot {
    Local = 0,
    Message = 1,
}

impl PredecessorSlot {
    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone)]
pub struct GraphNode {
    pub kind: NodeKind,
    start: Option<f64>,
    end: Option<f64>,
    length: Option<f64>,
    pub from_rank: Rank,
    pub to_rank: Rank,
    /// Receiving rank of the matched message, `SendEnd` only
    pub associated_rank: Option<Rank>,
    pub(crate) need: ArrowNeed,
    ancestor_end_times: [Option<f64>; 2],
    /// `RecvStart` <-> `Arrow` pairing used for clamping
    pub(crate) arrival: Option<NodeId>,
}

/// How far a node moved, handed on to its successors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moved {
    /// New end time, if the node has one
    pub end: Option<f64>,
    /// Change of the end, or of the start while the end is unknown
    pub shift: f64,
}

impl GraphNode {
    pub fn new(
        kind: NodeKind,
        start: Option<f64>,
        end: Option<f64>,
        need: ArrowNeed,
        from_rank: Rank,
        to_rank: Rank,
    ) -> Self {
        let mut node = Self {
            kind,
            start,
            end,
            length: None,
            from_rank,
            to_rank,
            associated_rank: None,
            need,
            ancestor_end_times: [None, None],
            arrival: None,
        };
        node.refresh_length();
        node
    }

    pub fn start(&self) -> Option<f64> {
        self.start
    }

    pub fn end(&self) -> Option<f64> {
        self.end
    }

    /// `end - start`, known once both times are
    pub fn length(&self) -> Option<f64> {
        self.length
    }

    pub fn need(&self) -> ArrowNeed {
        self.need
    }

    pub fn arrival(&self) -> Option<NodeId> {
        self.arrival
    }

    pub fn ancestor_end_time(&self, slot: PredecessorSlot) -> Option<f64> {
        self.ancestor_end_times[slot.index()]
    }

    pub(crate) fn set_ancestor_end_time(&mut self, slot: PredecessorSlot, time: f64) {
        self.ancestor_end_times[slot.index()] = Some(time);
    }

    pub(crate) fn set_start(&mut self, start: f64) {
        self.start = Some(start);
        self.refresh_length();
    }

    pub(crate) fn set_end(&mut self, end: f64) {
        self.end = Some(end);
        self.refresh_length();
    }

    /// Back-fill the start time; a known start is never overwritten
    pub(crate) fn fill_start(&mut self, start: f64) {
        if self.start.is_none() {
            self.set_start(start);
        }
    }

    /// Back-fill the end time; a known end is never overwritten
    pub(crate) fn fill_end(&mut self, end: f64) {
        if self.end.is_none() {
            self.set_end(end);
        }
    }

    fn refresh_length(&mut self) {
        self.length = match (self.start, self.end) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        };
    }

    /// Move the node to a new start and return its new end
    ///
    /// Every kind but `RecvEnd` shifts rigidly. `RecvEnd` records the
    /// predecessor's end in `slot` and starts at the later of the two
    /// recorded ends.
    pub fn update_start(&mut self, new_start: f64, slot: PredecessorSlot) -> Option<f64> {
        self.shift_start(Some(new_start), 0.0, slot).end
    }

    /// Move the node after a predecessor moved
    ///
    /// `new_start` is the predecessor's new end. When that end is
    /// unknown the node moves by `shift` instead. A node whose length
    /// never resolved (an unmatched send or receive) keeps the times it
    /// does know in step with its start, so the shift still reaches
    /// everything after it.
    pub(crate) fn shift_start(
        &mut self,
        new_start: Option<f64>,
        shift: f64,
        slot: PredecessorSlot,
    ) -> Moved {
        let (old_start, old_end) = (self.start, self.end);

        if self.kind == NodeKind::RecvEnd {
            let previous = self.ancestor_end_times[slot.index()];
            if let Some(arrival) = new_start.or_else(|| previous.map(|time| time + shift)) {
                self.ancestor_end_times[slot.index()] = Some(arrival);
            }
            let latest = self.ancestor_end_times.iter().flatten().copied().reduce(f64::max);
            // an unmatched receive never learns when it unblocked
            if let (Some(_), Some(latest)) = (old_start, latest) {
                self.start = Some(latest);
            }
        } else if let Some(start) = new_start.or_else(|| old_start.map(|start| start + shift)) {
            self.start = Some(start);
        }

        let start_shift = match (old_start, self.start) {
            (Some(before), Some(after)) => after - before,
            _ => shift,
        };
        self.end = match (self.start, self.length) {
            (Some(start), Some(length)) => Some(start + length),
            _ => old_end.map(|end| end + start_shift),
        };

        let shift = match (old_end, self.end) {
            (Some(before), Some(after)) => after - before,
            _ => start_shift,
        };
        Moved { end: self.end, shift }
    }

    /// Divide the length by `factor` and return the new end
    ///
    /// Nodes whose span never resolved are left alone.
    pub(crate) fn rescale(&mut self, factor: f64) -> Option<f64> {
        let (start, length) = (self.start?, self.length?);
        let length = length / factor;
        self.length = Some(length);
        self.end = Some(start + length);
        self.end
    }

    /// Keep the end at or after `earliest`, adjusting the length to match
    pub(crate) fn clamp_end(&mut self, earliest: f64) -> Option<f64> {
        if let Some(end) = self.end {
            if end < earliest {
                self.set_end(earliest);
            }
        }
        self.end
    }
}
