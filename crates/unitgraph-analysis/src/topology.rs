//! Interned, read-only view of a [`DependencyGraph`] for the hot loops.
//!
//! # Overview
//!
//! Cycle enumeration and bridge sampling walk the graph many times. Rather
//! than hashing identifiers on every step, registered nodes are interned to
//! contiguous `usize` ids once, in identifier order, and adjacency is stored
//! as sorted `Vec<usize>` lists. Identifier order doubles as the iteration
//! order of every traversal, which keeps results deterministic.
//!
//! ## Dangling Targets
//!
//! Placeholders are not interned. Edges into them are dropped from the
//! traversal adjacency but still counted in `out_degree`, so a node whose
//! only edges dangle is not a dead end. Dependent counts come straight from
//! the graph's reverse index.

use std::collections::HashMap;

use tracing::instrument;
use unitgraph_core::{DependencyGraph, UnitKind};

/// Contiguous-id snapshot of the registered nodes of one graph.
#[derive(Debug, Clone)]
pub struct Topology<'g> {
    ids: Vec<&'g str>,
    kinds: Vec<UnitKind>,
    index: HashMap<&'g str, usize>,
    /// Registered targets of each node, sorted and deduplicated.
    forward: Vec<Vec<usize>>,
    /// Distinct targets including placeholders.
    out_degree: Vec<usize>,
    /// Distinct dependents, as recorded by the graph.
    dependents: Vec<usize>,
    edge_count: usize,
    dangling_edge_count: usize,
}

impl<'g> Topology<'g> {
    /// Intern the registered nodes of `graph`.
    #[must_use]
    #[instrument(skip(graph), fields(nodes = graph.node_count()))]
    pub fn build(graph: &'g DependencyGraph) -> Self {
        let nodes = graph.nodes();
        let n = nodes.len();

        let ids: Vec<&'g str> = nodes.iter().map(|node| node.identifier).collect();
        let kinds: Vec<UnitKind> = nodes.iter().map(|node| node.kind).collect();
        let index: HashMap<&'g str, usize> =
            ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let mut forward = Vec::with_capacity(n);
        let mut out_degree = Vec::with_capacity(n);
        let mut dependents = Vec::with_capacity(n);

        for id in &ids {
            let targets = graph.dependencies_of(id);
            out_degree.push(targets.len());
            // BTreeSet iteration is in identifier order, and ids are interned
            // in identifier order, so the mapped list is already sorted.
            forward.push(
                targets
                    .into_iter()
                    .filter_map(|target| index.get(target).copied())
                    .collect::<Vec<usize>>(),
            );
            dependents.push(graph.dependents_of(id).len());
        }

        Self {
            ids,
            kinds,
            index,
            forward,
            out_degree,
            dependents,
            edge_count: graph.edge_count(),
            dangling_edge_count: graph.dangling_edge_count(),
        }
    }

    /// Number of registered nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifier of interned node `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    #[must_use]
    pub fn id(&self, i: usize) -> &'g str {
        self.ids[i]
    }

    #[must_use]
    pub fn ids(&self) -> &[&'g str] {
        &self.ids
    }

    #[must_use]
    pub fn index_of(&self, identifier: &str) -> Option<usize> {
        self.index.get(identifier).copied()
    }

    /// Kind of interned node `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    #[must_use]
    pub fn kind(&self, i: usize) -> UnitKind {
        self.kinds[i]
    }

    /// Registered forward neighbours of `i`, ascending.
    #[must_use]
    pub fn successors(&self, i: usize) -> &[usize] {
        self.forward.get(i).map_or(&[], Vec::as_slice)
    }

    /// Forward edges leaving `i`, dangling ones included.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    #[must_use]
    pub fn out_degree(&self, i: usize) -> usize {
        self.out_degree[i]
    }

    /// Distinct units depending on `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.len()`.
    #[must_use]
    pub fn dependent_count(&self, i: usize) -> usize {
        self.dependents[i]
    }

    /// Forward edges in the source graph, dangling ones included.
    #[must_use]
    pub const fn edge_count(&self) -> usize {
        self.edge_count
    }

    #[must_use]
    pub const fn dangling_edge_count(&self) -> usize {
        self.dangling_edge_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unitgraph_core::UnitRecord;

    #[test]
    fn interns_in_identifier_order_and_drops_placeholders() {
        let mut graph = DependencyGraph::new();
        graph
            .register(
                UnitRecord::new("Zed", UnitKind::Service)
                    .depends_on("Alpha", "method_call")
                    .depends_on("Ghost", "method_call")
                    .depends_on("Alpha", "association"),
            )
            .expect("register");
        graph
            .register(UnitRecord::new("Alpha", UnitKind::Model))
            .expect("register");

        let topo = Topology::build(&graph);

        assert_eq!(topo.ids(), &["Alpha", "Zed"]);
        assert_eq!(topo.index_of("Ghost"), None);
        let zed = topo.index_of("Zed").expect("Zed interned");
        let alpha = topo.index_of("Alpha").expect("Alpha interned");
        assert_eq!(topo.successors(zed), &[alpha]);
        assert_eq!(topo.out_degree(zed), 2, "distinct targets, dangling included");
        assert_eq!(topo.dependent_count(alpha), 1);
        assert_eq!(topo.edge_count(), 3);
        assert_eq!(topo.dangling_edge_count(), 1);
    }

    #[test]
    fn empty_graph_builds_empty_topology() {
        let graph = DependencyGraph::new();
        let topo = Topology::build(&graph);
        assert!(topo.is_empty());
        assert!(topo.successors(0).is_empty());
    }

    #[test]
    #[should_panic(expected = "index out of bounds")]
    fn out_of_range_degree_panics() {
        let graph = DependencyGraph::new();
        let _ = Topology::build(&graph).out_degree(0);
    }
}
