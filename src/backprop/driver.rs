//! Backpropagation driver.
//!
//! Locates the nodes an acceleration factor applies to, rescales them
//! and propagates the new end times. Passes compose: each one reads
//! whatever state the previous pass left behind.

use super::factors::{is_neutral, validate_factor, AccelerationPlan, FactorTarget};
use crate::graph::{CausalGraph, NodeId, NodeKind};
use crate::parser::Rank;
use crate::utils::error::BackpropError;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Record of one applied factor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedFactor {
    pub target: FactorTarget,
    pub factor: f64,
    /// Nodes whose length was rescaled
    pub nodes_rescaled: usize,
}

/// Rescale every `Worker` on `rank` and propagate
///
/// # Arguments
/// * `graph` - Resolved causal graph
/// * `rank` - Rank whose compute time is scaled
/// * `factor` - Speedup, 2.0 halves every compute span
///
/// # Returns
/// The number of rescaled nodes; a rank absent from the trace simply
/// matches nothing.
///
/// # Errors
/// * `BackpropError::InvalidFactor` - raised before any node is touched
pub fn apply_hardware_factor(
    graph: &mut CausalGraph,
    rank: Rank,
    factor: f64,
) -> Result<usize, BackpropError> {
    validate_factor(FactorTarget::Hardware { rank }, factor)?;
    if is_neutral(factor) {
        return Ok(0);
    }

    let targets: Vec<NodeId> = graph
        .nodes_in_order()
        .filter(|(_, node)| node.kind == NodeKind::Worker && node.from_rank == rank)
        .map(|(id, _)| id)
        .collect();

    let mut rescaled = 0;
    for id in targets {
        let previous_end = graph.node(id).end();
        let (Some(previous_end), Some(end)) = (previous_end, graph.node_mut(id).rescale(factor)) else {
            debug!("Worker {:?} on rank {} has no resolved span, skipping", id, rank);
            continue;
        };
        rescaled += 1;
        graph.propagate(id, previous_end, end);
    }

    info!("Applied factor {} to rank {}: {} workers", factor, rank, rescaled);
    Ok(rescaled)
}

/// Rescale every message arrow and send completion on link `from -> to`
///
/// A sped-up arrow never arrives before its receiver started waiting.
/// Send completions are not clamped.
///
/// # Arguments
/// * `graph` - Resolved causal graph
/// * `from`, `to` - Sending and receiving rank of the link
/// * `factor` - Speedup applied to the latency of every message on the link
///
/// # Returns
/// The number of rescaled nodes
///
/// # Errors
/// * `BackpropError::InvalidFactor` - raised before any node is touched
pub fn apply_network_factor(
    graph: &mut CausalGraph,
    from: Rank,
    to: Rank,
    factor: f64,
) -> Result<usize, BackpropError> {
    validate_factor(FactorTarget::Network { from, to }, factor)?;
    if is_neutral(factor) {
        return Ok(0);
    }

    let targets: Vec<NodeId> = graph
        .nodes_in_order()
        .filter(|(_, node)| match node.kind {
            NodeKind::Arrow => node.from_rank == from && node.to_rank == to,
            NodeKind::SendEnd => node.from_rank == from && node.associated_rank == Some(to),
            _ => false,
        })
        .map(|(id, _)| id)
        .collect();

    let mut rescaled = 0;
    for id in targets {
        let previous_end = graph.node(id).end();
        let (Some(previous_end), Some(mut end)) = (previous_end, graph.node_mut(id).rescale(factor)) else {
            continue;
        };

        if graph.node(id).kind == NodeKind::Arrow {
            let earliest = graph
                .node(id)
                .arrival()
                .and_then(|receiver| graph.node(receiver).start());
            if let Some(earliest) = earliest {
                end = graph.node_mut(id).clamp_end(earliest).unwrap_or(end);
            }
        }

        rescaled += 1;
        graph.propagate(id, previous_end, end);
    }

    info!("Applied factor {} to link {} -> {}: {} nodes", factor, from, to, rescaled);
    Ok(rescaled)
}

/// Apply every non-neutral entry of `plan` in order
///
/// The whole plan is validated first, so an invalid entry anywhere
/// leaves the graph untouched.
pub fn apply_plan(
    graph: &mut CausalGraph,
    plan: &AccelerationPlan,
) -> Result<Vec<AppliedFactor>, BackpropError> {
    plan.validate()?;

    let mut applied = Vec::new();
    for (target, factor) in plan.steps() {
        let nodes_rescaled = match target {
            FactorTarget::Hardware { rank } => apply_hardware_factor(graph, rank, factor)?,
            FactorTarget::Network { from, to } => apply_network_factor(graph, from, to, factor)?,
        };
        applied.push(AppliedFactor {
            target,
            factor,
            nodes_rescaled,
        });
    }
    Ok(applied)
}
