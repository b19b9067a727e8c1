use spyglass_protocol_core::{
    AdapterEdge, AdapterGraph, AdapterStep, ConnectionContext, ProtocolPipeline,
};
use spyglass_types::ProtocolVersion;
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    /// No adapter chain connects the two versions. Misconfiguration, not
    /// a transient fault: callers must abort instead of retrying.
    #[error("no adapter path from {from} to {to}")]
    NoPathFound {
        from: ProtocolVersion,
        to: ProtocolVersion,
    },
}

/// Compute the ordered adapter chain connecting `from` to `to`.
///
/// Identity translation resolves to an empty chain. Otherwise this is a
/// breadth-first shortest-path search over the adapter graph; adjacency
/// order (primary edges first, then newest target) makes the result
/// deterministic when several minimal paths exist.
pub fn resolve_path(
    graph: &AdapterGraph,
    from: &ProtocolVersion,
    to: &ProtocolVersion,
) -> Result<Vec<AdapterStep>, ResolveError> {
    if from == to {
        return Ok(Vec::new());
    }

    let mut prev: HashMap<i32, AdapterEdge> = HashMap::new();
    let mut visited: HashSet<i32> = HashSet::new();
    visited.insert(from.id);
    let mut queue: VecDeque<i32> = VecDeque::new();
    queue.push_back(from.id);

    while let Some(node) = queue.pop_front() {
        for edge in graph.edges_from(node) {
            if !visited.insert(edge.to.id) {
                continue;
            }
            prev.insert(edge.to.id, edge.clone());
            if edge.to.id == to.id {
                return Ok(reconstruct(&prev, from.id, to.id));
            }
            queue.push_back(edge.to.id);
        }
    }

    Err(ResolveError::NoPathFound {
        from: from.clone(),
        to: to.clone(),
    })
}

fn reconstruct(prev: &HashMap<i32, AdapterEdge>, from_id: i32, to_id: i32) -> Vec<AdapterStep> {
    let mut steps = Vec::new();
    let mut cursor = to_id;
    while cursor != from_id {
        let edge = &prev[&cursor];
        steps.push(AdapterStep {
            from: edge.from.clone(),
            to: edge.to.clone(),
            adapter: edge.adapter.clone(),
        });
        cursor = edge.from.id;
    }
    steps.reverse();
    steps
}

/// Resolve the path and build the connection's pipeline, initializing
/// each step's adapter against the context exactly once.
pub fn resolve_pipeline(
    graph: &AdapterGraph,
    from: &ProtocolVersion,
    to: &ProtocolVersion,
    connection: &ConnectionContext,
) -> Result<ProtocolPipeline, ResolveError> {
    let steps = resolve_path(graph, from, to)?;
    let mut pipeline = ProtocolPipeline::new();
    for step in steps {
        step.adapter.init(connection);
        pipeline.add(step);
    }
    Ok(pipeline)
}
