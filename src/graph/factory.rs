//! Expansion of primitives into graph nodes.
//!
//! | Category | Nodes                                 | Primitive refs        |
//! |----------|---------------------------------------|-----------------------|
//! | Send     | SendStart -> SendEnd -> Worker        | SendStart, SendEnd    |
//! | Receive  | RecvStart -> RecvEnd -> Worker        | RecvStart, RecvEnd    |
//! | Message  | Arrow (deferred, not on a chain)      | Arrow                 |
//! | Finalize | Final                                 | Final                 |
//! | Other    | Other -> Worker                       | Other                 |
//!
//! A `Worker` models the compute interval after an event; its end is
//! back-filled by whatever the rank does next.

use super::causal::CausalGraph;
use super::node::{ArrowNeed, GraphNode, NodeId, NodeKind, PredecessorSlot};
use crate::parser::{CategoryKind, Primitive};

/// Spawn the nodes for one primitive and append them to the graph
///
/// Returns the primitive's start node and, for send/receive, its
/// distinct end node.
pub fn spawn_nodes(
    graph: &mut CausalGraph,
    kind: CategoryKind,
    primitive: &Primitive,
) -> (NodeId, Option<NodeId>) {
    let start = primitive.start_time;
    let end = primitive.end_time;
    let rank = primitive.from_rank;
    let node = |node_kind: NodeKind, start: Option<f64>, end: Option<f64>, need: ArrowNeed| {
        GraphNode::new(node_kind, start, end, need, primitive.from_rank, primitive.to_rank)
    };

    match kind {
        CategoryKind::Send => {
            let send_start = graph.add_chain_node(
                rank,
                node(NodeKind::SendStart, Some(start), None, ArrowNeed::Outgoing),
                true,
            );
            let send_end = graph.add_chain_node(
                rank,
                node(NodeKind::SendEnd, None, Some(end), ArrowNeed::None),
                false,
            );
            graph.add_chain_node(rank, node(NodeKind::Worker, Some(end), None, ArrowNeed::None), true);
            (send_start, Some(send_end))
        }

        CategoryKind::Receive => {
            let recv_start = graph.add_chain_node(
                rank,
                node(NodeKind::RecvStart, Some(start), Some(start), ArrowNeed::Incoming),
                true,
            );
            let mut recv_end = node(NodeKind::RecvEnd, None, Some(end), ArrowNeed::None);
            recv_end.set_ancestor_end_time(PredecessorSlot::Local, start);
            let recv_end = graph.add_chain_node(rank, recv_end, true);
            graph.add_chain_node(rank, node(NodeKind::Worker, Some(end), None, ArrowNeed::None), true);
            (recv_start, Some(recv_end))
        }

        CategoryKind::Message => {
            let arrow = graph.defer_arrow(node(NodeKind::Arrow, Some(start), Some(end), ArrowNeed::None));
            (arrow, None)
        }

        CategoryKind::FinalizeMarker => {
            let last = graph.add_chain_node(
                rank,
                node(NodeKind::Final, Some(start), Some(end), ArrowNeed::None),
                true,
            );
            (last, None)
        }

        CategoryKind::Other => {
            let other = graph.add_chain_node(
                rank,
                node(NodeKind::Other, Some(start), Some(end), ArrowNeed::None),
                true,
            );
            graph.add_chain_node(rank, node(NodeKind::Worker, Some(end), None, ArrowNeed::None), true);
            (other, None)
        }
    }
}
