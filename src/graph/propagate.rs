//! Time propagation through the causal graph.
//!
//! When a node's end time changes, every causal descendant moves with
//! it. Traversal is depth-first and follows edges only, so it stops at
//! nodes without successors. An explicit frame stack replaces call
//! recursion; chains in large traces are far deeper than the native
//! stack allows.
//!
//! Each frame carries the predecessor's new end and how far that end
//! moved. Nodes with an unresolved length (unmatched sends and
//! receives) have no end to hand on and pass the shift through instead.
//!
//! No visited set is kept: a node reached along two paths is updated
//! twice. Only `RecvEnd` has two predecessors and it merges them with
//! `max`, so the final state does not depend on visit order.

use super::causal::CausalGraph;
use super::node::{Moved, NodeId, PredecessorSlot};

/// A pending `shift_start` call
#[derive(Debug, Clone, Copy)]
struct Frame {
    node: NodeId,
    new_start: Option<f64>,
    shift: f64,
    slot: PredecessorSlot,
}

impl CausalGraph {
    /// Push the end of `origin`, moved from `previous_end` to `new_end`,
    /// through all its descendants
    ///
    /// Returns the number of node updates performed.
    pub fn propagate(&mut self, origin: NodeId, previous_end: f64, new_end: f64) -> usize {
        let mut stack = Vec::new();
        let moved = Moved {
            end: Some(new_end),
            shift: new_end - previous_end,
        };
        self.push_successors(&mut stack, origin, moved);

        let mut updates = 0;
        while let Some(frame) = stack.pop() {
            updates += 1;
            let moved = self
                .node_mut(frame.node)
                .shift_start(frame.new_start, frame.shift, frame.slot);
            if moved.end.is_some() || moved.shift != 0.0 {
                self.push_successors(&mut stack, frame.node, moved);
            }
        }
        updates
    }

    /// Queue one frame per successor
    ///
    /// petgraph lists the newest edge first, so pushing in that order
    /// pops the first successor first.
    fn push_successors(&self, stack: &mut Vec<Frame>, node: NodeId, moved: Moved) {
        for (successor, kind) in self.out_edges(node) {
            stack.push(Frame {
                node: successor,
                new_start: moved.end,
                shift: moved.shift,
                slot: kind.slot(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::{ArrowNeed, GraphNode, NodeKind};

    fn chain(graph: &mut CausalGraph, len: usize) -> Vec<NodeId> {
        (0..len)
            .map(|i| {
                let start = i as f64;
                graph.add_chain_node(
                    0,
                    GraphNode::new(NodeKind::Other, Some(start), Some(start + 1.0), ArrowNeed::None, 0, 0),
                    true,
                )
            })
            .collect()
    }

    #[test]
    fn test_propagate_shifts_descendants() {
        let mut graph = CausalGraph::new();
        let ids = chain(&mut graph, 3);

        let updates = graph.propagate(ids[0], 1.0, 0.5);

        assert_eq!(updates, 2);
        assert_eq!(graph.node(ids[1]).start(), Some(0.5));
        assert_eq!(graph.node(ids[1]).end(), Some(1.5));
        assert_eq!(graph.node(ids[2]).start(), Some(1.5));
        assert_eq!(graph.node(ids[2]).end(), Some(2.5));
    }

    #[test]
    fn test_propagate_leaf_is_noop() {
        let mut graph = CausalGraph::new();
        let ids = chain(&mut graph, 2);
        assert_eq!(graph.propagate(ids[1], 2.0, 10.0), 0);
        assert_eq!(graph.node(ids[1]).end(), Some(2.0));
    }

    #[test]
    fn test_propagate_deep_chain() {
        let mut graph = CausalGraph::new();
        let ids = chain(&mut graph, 200_000);

        graph.propagate(ids[0], 1.0, 0.0);

        let last = *ids.last().unwrap();
        assert_eq!(graph.node(last).start(), Some(199_998.0));
    }
}
