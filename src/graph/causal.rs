//! Causal "happens-before" graph over trace nodes.
//!
//! Built in two passes:
//! 1. While parsing, every non-message node is appended to its rank's
//!    chain (`add_chain_node`). Chains are append-only.
//! 2. After parsing, message arrows are matched to a sender and a
//!    receiver window (`resolve_deferred_arrows`).
//!
//! Arrow matching takes the first structurally valid candidate in graph
//! insertion order. That tie-break decides which send/receive a message
//! binds to when windows overlap, so insertion order must not change.

use super::node::{ArrowNeed, GraphNode, NodeId, NodeKind, PredecessorSlot};
use crate::parser::Rank;
use crate::utils::error::BackpropError;
use log::{debug, warn};
use petgraph::graph::DiGraph;
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of a happens-before edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Consecutive nodes on one rank
    Chain,
    /// Send start to arrow, arrow to receive end
    Message,
}

impl EdgeKind {
    /// Slot an update along this edge lands in on a `RecvEnd`
    pub fn slot(self) -> PredecessorSlot {
        match self {
            Self::Chain => PredecessorSlot::Local,
            Self::Message => PredecessorSlot::Message,
        }
    }
}

/// Directed acyclic graph of timing nodes
///
/// Nodes are only ever added, so petgraph indices stay stable and
/// serve as `NodeId`s.
#[derive(Debug, Clone, Default)]
pub struct CausalGraph {
    graph: DiGraph<GraphNode, EdgeKind>,
    /// Order in which nodes joined the graph (arrows join at resolution)
    insertion_order: Vec<NodeId>,
    rank_tails: BTreeMap<Rank, NodeId>,
    deferred_arrows: Vec<NodeId>,
}

/// Why an arrow could not be placed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedReason {
    NoSender,
    NoReceiver,
}

/// A message that could not be attached to the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedArrow {
    pub from_rank: Rank,
    pub to_rank: Rank,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub reason: UnmatchedReason,
}

/// Outcome of deferred arrow resolution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionReport {
    pub matched: usize,
    pub unmatched: Vec<UnmatchedArrow>,
}

impl ResolutionReport {
    pub fn total(&self) -> usize {
        self.matched + self.unmatched.len()
    }

    pub fn is_complete(&self) -> bool {
        self.unmatched.is_empty()
    }
}

/// Captured timings of every node, see `CausalGraph::snapshot`
#[derive(Debug, Clone)]
pub struct TimingSnapshot {
    nodes: Vec<GraphNode>,
}

impl CausalGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node to the chain of `rank`
    ///
    /// With `backfill`, a tail whose end is still unknown ends where the
    /// new node starts.
    pub fn add_chain_node(&mut self, rank: Rank, node: GraphNode, backfill: bool) -> NodeId {
        let new_start = node.start();
        let id = self.graph.add_node(node);
        self.insertion_order.push(id);

        if let Some(tail) = self.rank_tails.insert(rank, id) {
            self.add_edge(tail, id, EdgeKind::Chain);
            if backfill {
                if let Some(start) = new_start {
                    self.graph[tail].fill_end(start);
                }
            }
        }
        id
    }

    /// Hold a message arrow until every chain is built
    pub fn defer_arrow(&mut self, node: GraphNode) -> NodeId {
        let id = self.graph.add_node(node);
        self.deferred_arrows.push(id);
        id
    }

    pub(crate) fn add_edge(&mut self, from: NodeId, to: NodeId, kind: EdgeKind) {
        self.graph.add_edge(from, to, kind);
    }

    pub fn node(&self, id: NodeId) -> &GraphNode {
        &self.graph[id]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut GraphNode {
        &mut self.graph[id]
    }

    /// Outgoing edges, most recently added first
    pub(crate) fn out_edges(&self, id: NodeId) -> impl Iterator<Item = (NodeId, EdgeKind)> + '_ {
        self.graph
            .edges_directed(id, Direction::Outgoing)
            .map(|edge| (edge.target(), *edge.weight()))
    }

    /// Direct successors in the order their edges were added
    pub fn successors(&self, id: NodeId) -> Vec<NodeId> {
        let mut successors: Vec<NodeId> = self.out_edges(id).map(|(target, _)| target).collect();
        successors.reverse();
        successors
    }

    /// Next node on the same rank, if any
    pub fn chain_successor(&self, id: NodeId) -> Option<NodeId> {
        self.out_edges(id)
            .find(|&(_, kind)| kind == EdgeKind::Chain)
            .map(|(target, _)| target)
    }

    /// Nodes that have joined the graph, in insertion order
    pub fn nodes_in_order(&self) -> impl Iterator<Item = (NodeId, &GraphNode)> + '_ {
        self.insertion_order.iter().map(move |&id| (id, &self.graph[id]))
    }

    /// Number of allocated nodes, pending arrows included
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn pending_arrows(&self) -> usize {
        self.deferred_arrows.len()
    }

    /// Ranks that own at least one chain node, ascending
    pub fn ranks(&self) -> impl Iterator<Item = Rank> + '_ {
        self.rank_tails.keys().copied()
    }

    /// Attach every deferred arrow to its sender and receiver
    ///
    /// Arrows are processed in the order they were deferred. An arrow
    /// with no sender or no receiver window is reported and left
    /// disconnected; nothing is mutated for it.
    pub fn resolve_deferred_arrows(&mut self) -> ResolutionReport {
        let mut report = ResolutionReport::default();
        let arrows = std::mem::take(&mut self.deferred_arrows);
        debug!("Resolving {} deferred arrows", arrows.len());

        for arrow in arrows {
            self.insertion_order.push(arrow);
            match self.place_arrow(arrow) {
                Ok(()) => report.matched += 1,
                Err(reason) => {
                    let node = &self.graph[arrow];
                    warn!(
                        "Unmatched message {} -> {} [{:?}, {:?}]: {:?}",
                        node.from_rank,
                        node.to_rank,
                        node.start(),
                        node.end(),
                        reason
                    );
                    report.unmatched.push(UnmatchedArrow {
                        from_rank: node.from_rank,
                        to_rank: node.to_rank,
                        start_time: node.start(),
                        end_time: node.end(),
                        reason,
                    });
                }
            }
        }

        debug!(
            "Arrow resolution: {} matched, {} unmatched",
            report.matched,
            report.unmatched.len()
        );
        report
    }

    fn place_arrow(&mut self, arrow: NodeId) -> Result<(), UnmatchedReason> {
        let (from_rank, to_rank, sent, arrived) = {
            let node = &self.graph[arrow];
            (node.from_rank, node.to_rank, node.start(), node.end())
        };
        let sent = sent.ok_or(UnmatchedReason::NoSender)?;
        let arrived = arrived.ok_or(UnmatchedReason::NoReceiver)?;

        let sender = self
            .find_window(NodeKind::SendStart, ArrowNeed::Outgoing, from_rank, sent)
            .ok_or(UnmatchedReason::NoSender)?;
        let receiver = self
            .find_window(NodeKind::RecvStart, ArrowNeed::Incoming, to_rank, arrived)
            .ok_or(UnmatchedReason::NoReceiver)?;
        // Both windows come with a chain successor
        let (Some(send_end), Some(recv_end)) =
            (self.chain_successor(sender), self.chain_successor(receiver))
        else {
            return Err(UnmatchedReason::NoSender);
        };

        let send_start = &mut self.graph[sender];
        send_start.set_end(sent);
        send_start.need = ArrowNeed::None;
        let send_end_node = &mut self.graph[send_end];
        send_end_node.set_start(sent);
        send_end_node.associated_rank = Some(to_rank);
        self.add_edge(sender, arrow, EdgeKind::Message);

        let recv_end_node = &mut self.graph[recv_end];
        recv_end_node.set_start(arrived);
        recv_end_node.set_ancestor_end_time(PredecessorSlot::Message, arrived);
        let recv_start = &mut self.graph[receiver];
        recv_start.arrival = Some(arrow);
        recv_start.need = ArrowNeed::None;
        self.graph[arrow].arrival = Some(receiver);
        self.add_edge(arrow, recv_end, EdgeKind::Message);

        Ok(())
    }

    /// First node in insertion order whose `[start, successor end]`
    /// window on `rank` contains `time`
    fn find_window(&self, kind: NodeKind, need: ArrowNeed, rank: Rank, time: f64) -> Option<NodeId> {
        self.nodes_in_order()
            .filter(|(_, node)| node.kind == kind && node.need == need && node.from_rank == rank)
            .find(|&(id, node)| {
                let Some(start) = node.start() else {
                    return false;
                };
                let Some(window_end) = self.chain_successor(id).and_then(|next| self.graph[next].end())
                else {
                    return false;
                };
                start <= time && time <= window_end
            })
            .map(|(id, _)| id)
    }

    /// Capture the timing state of every node
    pub fn snapshot(&self) -> TimingSnapshot {
        TimingSnapshot {
            nodes: self.graph.node_weights().cloned().collect(),
        }
    }

    /// Put back timings captured by `snapshot`
    ///
    /// Edges are not part of the snapshot, so it should come from this
    /// graph after resolution.
    ///
    /// # Errors
    /// * `BackpropError::SnapshotMismatch` - the node counts differ; the graph is left untouched
    pub fn restore(&mut self, snapshot: &TimingSnapshot) -> Result<(), BackpropError> {
        if snapshot.nodes.len() != self.graph.node_count() {
            return Err(BackpropError::SnapshotMismatch {
                snapshot: snapshot.nodes.len(),
                graph: self.graph.node_count(),
            });
        }
        for (node, saved) in self.graph.node_weights_mut().zip(&snapshot.nodes) {
            node.clone_from(saved);
        }
        Ok(())
    }
}
