use crate::connection::ConnectionContext;
use anyhow::Result;
use bytes::BytesMut;
use spyglass_types::ProtocolVersion;
use std::collections::HashMap;
use std::sync::Arc;

/// Trait for a packet adapter translating between two adjacent protocol
/// versions. Implementations are supplied by external platform modules;
/// this layer only drives their lifecycle and ordering.
pub trait PacketAdapter: Send + Sync {
    /// Called exactly once when the adapter is placed into a connection's
    /// pipeline. Must be idempotent.
    fn init(&self, connection: &ConnectionContext);

    /// Rewrite a serverbound frame in place. Defaults to pass-through.
    fn transform_serverbound(&self, _frame: &mut BytesMut) -> Result<()> {
        Ok(())
    }

    /// Rewrite a clientbound frame in place. Defaults to pass-through.
    fn transform_clientbound(&self, _frame: &mut BytesMut) -> Result<()> {
        Ok(())
    }
}

/// One hop of a translation chain.
#[derive(Clone)]
pub struct AdapterStep {
    pub from: ProtocolVersion,
    pub to: ProtocolVersion,
    pub adapter: Arc<dyn PacketAdapter>,
}

impl std::fmt::Debug for AdapterStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AdapterStep({} -> {})", self.from, self.to)
    }
}

/// An ordered adapter chain. Insertion order is application order and is
/// never reordered or deduplicated after resolution.
#[derive(Default, Clone)]
pub struct ProtocolPipeline {
    steps: Vec<AdapterStep>,
}

impl ProtocolPipeline {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn add(&mut self, step: AdapterStep) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[AdapterStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl std::fmt::Debug for ProtocolPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hops: Vec<String> = self
            .steps
            .iter()
            .map(|s| format!("{}->{}", s.from.name, s.to.name))
            .collect();
        write!(f, "ProtocolPipeline[{}]", hops.join(", "))
    }
}

/// A directed adapter edge in the version graph.
#[derive(Clone)]
pub struct AdapterEdge {
    pub from: ProtocolVersion,
    pub to: ProtocolVersion,
    pub adapter: Arc<dyn PacketAdapter>,
    /// Registry hint: preferred over sibling edges of equal path length.
    pub primary: bool,
}

/// Accumulates adapter registrations during platform load.
#[derive(Default)]
pub struct AdapterGraphBuilder {
    edges: HashMap<i32, Vec<AdapterEdge>>,
}

impl AdapterGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        from: ProtocolVersion,
        to: ProtocolVersion,
        adapter: Arc<dyn PacketAdapter>,
    ) -> &mut Self {
        self.insert(from, to, adapter, false);
        self
    }

    pub fn register_primary(
        &mut self,
        from: ProtocolVersion,
        to: ProtocolVersion,
        adapter: Arc<dyn PacketAdapter>,
    ) -> &mut Self {
        self.insert(from, to, adapter, true);
        self
    }

    fn insert(
        &mut self,
        from: ProtocolVersion,
        to: ProtocolVersion,
        adapter: Arc<dyn PacketAdapter>,
        primary: bool,
    ) {
        self.edges.entry(from.id).or_default().push(AdapterEdge {
            from,
            to,
            adapter,
            primary,
        });
    }

    /// Freeze the graph. Adjacency lists are ordered primary edges first,
    /// then by descending target id, so path searches are deterministic.
    pub fn build(mut self) -> AdapterGraph {
        for edges in self.edges.values_mut() {
            edges.sort_by_key(|e| (!e.primary, std::cmp::Reverse(e.to.id)));
        }
        AdapterGraph { edges: self.edges }
    }
}

/// The version graph: nodes are protocol version ids, edges are adapters.
/// Built once during bootstrap and read-only afterwards.
pub struct AdapterGraph {
    edges: HashMap<i32, Vec<AdapterEdge>>,
}

impl AdapterGraph {
    pub fn edges_from(&self, version_id: i32) -> &[AdapterEdge] {
        self.edges
            .get(&version_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(|v| v.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopAdapter;

    impl PacketAdapter for NoopAdapter {
        fn init(&self, _connection: &ConnectionContext) {}
    }

    #[test]
    fn test_adjacency_order_is_primary_then_newest() {
        let a = ProtocolVersion::stream("a", 10);
        let b = ProtocolVersion::stream("b", 9);
        let c = ProtocolVersion::stream("c", 8);
        let d = ProtocolVersion::stream("d", 7);

        let mut builder = AdapterGraphBuilder::new();
        builder.register(a.clone(), d.clone(), Arc::new(NoopAdapter));
        builder.register(a.clone(), b.clone(), Arc::new(NoopAdapter));
        builder.register_primary(a.clone(), c.clone(), Arc::new(NoopAdapter));
        let graph = builder.build();

        let order: Vec<i32> = graph.edges_from(10).iter().map(|e| e.to.id).collect();
        assert_eq!(order, vec![8, 9, 7]);
    }

    #[test]
    fn test_edges_from_unknown_version_is_empty() {
        let graph = AdapterGraphBuilder::new().build();
        assert!(graph.edges_from(42).is_empty());
        assert_eq!(graph.edge_count(), 0);
    }
}
