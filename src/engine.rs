//! Pipeline entry point.
//!
//! parse → resolve message arrows → apply factors → serialize.
//! Stages never interleave: arrow resolution needs every rank chain,
//! and factors need a fully resolved graph.

use crate::backprop::{apply_plan, AccelerationPlan, AppliedFactor};
use crate::graph::ResolutionReport;
use crate::output::render_trace;
use crate::parser::{parse_trace, ParsedTrace};
use crate::utils::error::EngineError;
use log::{debug, info};

/// A trace after all factors have been applied
#[derive(Debug, Clone)]
pub struct Simulation {
    pub trace: ParsedTrace,
    pub resolution: ResolutionReport,
    pub applied: Vec<AppliedFactor>,
}

impl Simulation {
    /// Copy final node timings back into the primitives
    pub fn refresh_primitives(&mut self) {
        for primitive in &mut self.trace.primitives {
            primitive.refresh_times(&self.trace.graph);
        }
    }

    /// Rewritten trace text
    pub fn render(&mut self) -> String {
        render_trace(&mut self.trace)
    }
}

/// Run the full analysis and keep every intermediate result
///
/// # Errors
/// * `EngineError::Backprop` - an invalid factor; checked before parsing
/// * `EngineError::Parse` - malformed trace
pub fn simulate(input: &str, plan: &AccelerationPlan) -> Result<Simulation, EngineError> {
    plan.validate()?;

    let mut trace = parse_trace(input)?;
    let resolution = trace.graph.resolve_deferred_arrows();

    if plan.is_identity() {
        debug!("All factors are neutral, graph left untouched");
    }
    let applied = apply_plan(&mut trace.graph, plan)?;
    info!(
        "Simulation done: {} primitives, {}/{} messages matched, {} factors applied",
        trace.primitives.len(),
        resolution.matched,
        resolution.total(),
        applied.len()
    );

    Ok(Simulation {
        trace,
        resolution,
        applied,
    })
}

/// Rewrite `input` with the given factors applied
///
/// **Public** - library entry point
///
/// # Arguments
/// * `input` - Textual trace
/// * `hardware` - `hardware[rank]` scales the compute time of `rank`
/// * `network` - `network[from][to]` scales the latency of link `from -> to`
///
/// Missing entries default to 1.0.
///
/// # Returns
/// The rewritten trace text
///
/// # Errors
/// * `EngineError::Backprop` - a factor is not positive and finite
/// * `EngineError::Parse` - malformed trace
///
/// # Example
/// ```
/// # fn main() -> Result<(), mpi_whatif::utils::EngineError> {
/// let input = "\
/// Category[ index=0 name=MPI_Send topo=State ]
/// Category[ index=1 name=MPI_Recv topo=State ]
/// Category[ index=2 name=message topo=Arrow ]
/// Primitive[ TimeBBox(0,2) Category=0 (0, 0) (2, 0) ]
/// Primitive[ TimeBBox(1,4) Category=1 (1, 1) (4, 1) ]
/// Primitive[ TimeBBox(1,3) Category=2 (1, 0) (3, 1) ]
/// ";
/// // link 0 -> 1 delivers twice as fast
/// let rewritten = mpi_whatif::run(input, &[], &[vec![1.0, 2.0]])?;
/// assert!(rewritten.contains("Primitive[ TimeBBox(1,2.0) Category=2 (1, 0) (2.0, 1) ]"));
/// # Ok(())
/// # }
/// ```
pub fn run(input: &str, hardware: &[f64], network: &[Vec<f64>]) -> Result<String, EngineError> {
    let plan = AccelerationPlan::new(hardware.to_vec(), network.to_vec());
    let mut simulation = simulate(input, &plan)?;
    Ok(simulation.render())
}
