use mpi_whatif::backprop::{apply_hardware_factor, apply_network_factor};
use mpi_whatif::graph::{
    ArrowNeed, GraphNode, NodeKind, PredecessorSlot, UnmatchedReason,
};
use mpi_whatif::parser::parse_trace;

const HEADER: &str = "Category[ index=0 name=MPI_Send topo=State ]
Category[ index=1 name=MPI_Recv topo=State ]
Category[ index=2 name=message topo=Arrow ]
";

/// `n` messages from rank 0 to rank 1, each with exactly one sender
/// and one receiver window
fn ping_trace(n: usize) -> String {
    let mut trace = HEADER.to_string();
    for i in 0..n {
        let t = 10.0 * i as f64;
        trace.push_str(&format!(
            "Primitive[ TimeBBox({},{}) Category=0 ({}, 0) ({}, 0) ]\n",
            t, t + 2.0, t, t + 2.0
        ));
    }
    for i in 0..n {
        let t = 10.0 * i as f64;
        trace.push_str(&format!(
            "Primitive[ TimeBBox({},{}) Category=1 ({}, 1) ({}, 1) ]\n",
            t + 1.0, t + 6.0, t + 1.0, t + 6.0
        ));
    }
    for i in 0..n {
        let t = 10.0 * i as f64;
        trace.push_str(&format!(
            "Primitive[ TimeBBox({},{}) Category=2 ({}, 0) ({}, 1) ]\n",
            t + 1.0, t + 5.0, t + 1.0, t + 5.0
        ));
    }
    trace
}

#[test]
fn test_matching_completeness() {
    let mut trace = parse_trace(&ping_trace(25)).unwrap();
    let report = trace.graph.resolve_deferred_arrows();

    assert_eq!(report.matched, 25);
    assert!(report.is_complete());

    // every send and receive got exactly one message edge
    for (id, node) in trace.graph.nodes_in_order() {
        match node.kind {
            NodeKind::SendStart => {
                assert_eq!(node.need(), ArrowNeed::None);
                assert_eq!(trace.graph.successors(id).len(), 2);
            }
            NodeKind::RecvStart => {
                assert_eq!(node.need(), ArrowNeed::None);
                assert!(node.arrival().is_some());
            }
            _ => {}
        }
    }
}

#[test]
fn test_resolution_sets_send_and_receive_times() {
    let mut trace = parse_trace(&ping_trace(1)).unwrap();
    trace.graph.resolve_deferred_arrows();
    let graph = &trace.graph;

    let send = &trace.primitives[0];
    let send_start = graph.node(send.start_node.unwrap());
    let send_end = graph.node(send.end_node.unwrap());
    assert_eq!(send_start.end(), Some(1.0));
    assert_eq!(send_end.start(), Some(1.0));
    assert_eq!(send_end.associated_rank, Some(1));

    let recv = &trace.primitives[1];
    let recv_end = graph.node(recv.end_node.unwrap());
    assert_eq!(recv_end.start(), Some(5.0));
    assert_eq!(recv_end.length(), Some(1.0));
    assert_eq!(recv_end.ancestor_end_time(PredecessorSlot::Local), Some(1.0));
    assert_eq!(recv_end.ancestor_end_time(PredecessorSlot::Message), Some(5.0));

    let arrow_id = trace.primitives[2].start_node.unwrap();
    assert_eq!(graph.node(arrow_id).arrival(), recv.start_node);
    assert_eq!(graph.node(recv.start_node.unwrap()).arrival(), Some(arrow_id));
    assert_eq!(graph.successors(arrow_id), vec![recv.end_node.unwrap()]);
}

#[test]
fn test_first_match_wins() {
    // Two overlapping sends on rank 0 could both host the message;
    // the earlier one in the file takes it.
    let input = format!(
        "{HEADER}\
Primitive[ TimeBBox(0.0,5.0) Category=0 (0.0, 0) (5.0, 0) ]
Primitive[ TimeBBox(0.0,5.0) Category=0 (0.0, 0) (5.0, 0) ]
Primitive[ TimeBBox(0.0,6.0) Category=1 (0.0, 1) (6.0, 1) ]
Primitive[ TimeBBox(1.0,3.0) Category=2 (1.0, 0) (3.0, 1) ]
"
    );
    let mut trace = parse_trace(&input).unwrap();
    trace.graph.resolve_deferred_arrows();

    let first = trace.primitives[0].start_node.unwrap();
    let second = trace.primitives[1].start_node.unwrap();
    assert_eq!(trace.graph.node(first).need(), ArrowNeed::None);
    assert_eq!(trace.graph.node(second).need(), ArrowNeed::Outgoing);
}

#[test]
fn test_unmatched_message_is_left_disconnected() {
    // The message arrives long after the receive completed
    let input = format!(
        "{HEADER}\
Primitive[ TimeBBox(0.0,2.0) Category=0 (0.0, 0) (2.0, 0) ]
Primitive[ TimeBBox(1.0,4.0) Category=1 (1.0, 1) (4.0, 1) ]
Primitive[ TimeBBox(1.0,9.0) Category=2 (1.0, 0) (9.0, 1) ]
"
    );
    let mut trace = parse_trace(&input).unwrap();
    let report = trace.graph.resolve_deferred_arrows();

    assert_eq!(report.matched, 0);
    assert_eq!(report.unmatched.len(), 1);
    assert_eq!(report.unmatched[0].reason, UnmatchedReason::NoReceiver);
    assert_eq!(report.unmatched[0].end_time, Some(9.0));

    // The sender was not touched either
    let send_start = trace.graph.node(trace.primitives[0].start_node.unwrap());
    assert_eq!(send_start.need(), ArrowNeed::Outgoing);
    assert_eq!(send_start.end(), None);
    let arrow = trace.primitives[2].start_node.unwrap();
    assert!(trace.graph.successors(arrow).is_empty());
}

#[test]
fn test_max_of_two_on_detached_node() {
    let make = || GraphNode::new(NodeKind::RecvEnd, Some(3.0), Some(4.0), ArrowNeed::None, 1, 1);

    let mut node = make();
    node.update_start(5.0, PredecessorSlot::Local);
    node.update_start(9.0, PredecessorSlot::Message);
    assert_eq!(node.start(), Some(9.0));

    let mut node = make();
    node.update_start(9.0, PredecessorSlot::Message);
    node.update_start(5.0, PredecessorSlot::Local);
    assert_eq!(node.start(), Some(9.0));
    assert_eq!(node.end(), Some(10.0));
}

#[test]
fn test_snapshot_and_restore() {
    let mut trace = parse_trace(&ping_trace(3)).unwrap();
    trace.graph.resolve_deferred_arrows();
    let send_end = trace.primitives[1].end_node.unwrap();
    let before = trace.graph.node(send_end).end();

    let snapshot = trace.graph.snapshot();
    apply_network_factor(&mut trace.graph, 0, 1, 4.0).unwrap();
    assert_ne!(trace.graph.node(send_end).end(), before);

    trace.graph.restore(&snapshot).unwrap();
    assert_eq!(trace.graph.node(send_end).end(), before);
}

#[test]
fn test_out_of_range_targets_are_noops() {
    let mut trace = parse_trace(&ping_trace(2)).unwrap();
    trace.graph.resolve_deferred_arrows();

    assert_eq!(apply_hardware_factor(&mut trace.graph, 42, 2.0).unwrap(), 0);
    assert_eq!(apply_network_factor(&mut trace.graph, 1, 0, 2.0).unwrap(), 0);
    assert_eq!(apply_network_factor(&mut trace.graph, 7, 8, 2.0).unwrap(), 0);
}

#[test]
fn test_invalid_factor_rejected_before_mutation() {
    let mut trace = parse_trace(&ping_trace(2)).unwrap();
    trace.graph.resolve_deferred_arrows();
    let recv_end = trace.primitives[2].end_node.unwrap();
    let before = trace.graph.node(recv_end).start();

    assert!(apply_hardware_factor(&mut trace.graph, 0, 0.0).is_err());
    assert!(apply_network_factor(&mut trace.graph, 0, 1, -3.0).is_err());
    assert!(apply_network_factor(&mut trace.graph, 0, 1, f64::NAN).is_err());

    assert_eq!(trace.graph.node(recv_end).start(), before);
}
