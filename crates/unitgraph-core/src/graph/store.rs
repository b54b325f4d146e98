//! Node storage and adjacency for the dependency graph.
//!
//! Identifiers are interned to petgraph [`NodeIndex`] values on first sight,
//! so every traversal after registration walks integer indices. The string
//! map is only consulted at the input/output boundary.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use petgraph::{
    Direction,
    graph::{DiGraph, EdgeIndex, NodeIndex},
    visit::EdgeRef,
};
use tracing::{debug, instrument};

use crate::{
    error::GraphError,
    unit::{UnitKind, UnitRecord},
};

// ---------------------------------------------------------------------------
// Stored weights
// ---------------------------------------------------------------------------

/// What a registered unit contributes to its node.
#[derive(Debug, Clone, PartialEq, Eq)]
struct UnitMeta {
    kind: UnitKind,
    file_path: String,
}

/// Node weight. `unit` is `None` for placeholders.
#[derive(Debug, Clone)]
struct NodeData {
    identifier: String,
    unit: Option<UnitMeta>,
}

/// Edge weight: the labels carried over from [`crate::Dependency`].
#[derive(Debug, Clone, PartialEq, Eq)]
struct EdgeData {
    relationship: String,
    via: Option<String>,
    target_kind: String,
}

// ---------------------------------------------------------------------------
// Borrowed views
// ---------------------------------------------------------------------------

/// A registered node, borrowed from the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRef<'g> {
    pub identifier: &'g str,
    pub kind: UnitKind,
    pub file_path: &'g str,
}

/// A forward edge, borrowed from the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeView<'g> {
    pub source: &'g str,
    pub target: &'g str,
    pub relationship: &'g str,
    pub via: Option<&'g str>,
    /// Declared kind of the target as reported by extraction.
    pub target_kind: &'g str,
}

// ---------------------------------------------------------------------------
// DependencyGraph
// ---------------------------------------------------------------------------

/// In-memory directed dependency graph keyed by unit identifier.
///
/// Built once per extraction run. Registration is the only mutation; there
/// is no edge removal beyond re-registering a unit, which replaces its
/// forward edges (last write wins).
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<NodeData, EdgeData>,
    node_map: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a unit and its forward edges.
    ///
    /// Every target becomes known to the graph: unregistered targets get a
    /// placeholder so that dependent counting still sees the edge. A
    /// placeholder registered later is promoted in place and keeps the
    /// dependents it already had.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidUnit`] if the record fails validation.
    /// The graph is left untouched in that case.
    pub fn register(&mut self, unit: UnitRecord) -> Result<(), GraphError> {
        unit.validate()?;
        self.insert_validated(unit);
        Ok(())
    }

    /// Register a batch of units, stopping at the first invalid one.
    ///
    /// Units before the failing one stay registered.
    ///
    /// # Errors
    ///
    /// Returns the first validation error encountered.
    #[instrument(skip_all)]
    pub fn register_all<I>(&mut self, units: I) -> Result<usize, GraphError>
    where
        I: IntoIterator<Item = UnitRecord>,
    {
        let mut count = 0;
        for unit in units {
            self.register(unit)?;
            count += 1;
        }
        debug!(count, nodes = self.node_count(), "registered unit batch");
        Ok(count)
    }

    #[instrument(level = "debug", skip_all, fields(identifier = %unit.identifier))]
    pub(crate) fn insert_validated(&mut self, unit: UnitRecord) {
        let UnitRecord {
            identifier,
            kind,
            file_path,
            dependencies,
        } = unit;

        let idx = self.intern(&identifier);
        let previous = self.graph[idx]
            .unit
            .replace(UnitMeta { kind, file_path });
        if previous.is_some() {
            self.clear_forward_edges(idx);
        }

        // Pruning may have moved the node; look it up again.
        let idx = self.intern(&identifier);
        for dep in dependencies {
            let target = self.intern(&dep.target);
            self.graph.add_edge(
                idx,
                target,
                EdgeData {
                    relationship: dep.relationship,
                    via: dep.via,
                    target_kind: dep.kind,
                },
            );
        }

        debug!(
            replaced = previous.is_some(),
            out_degree = self.graph.edges(idx).count(),
            "registered unit"
        );
    }

    /// Return the index for `identifier`, adding a placeholder if unknown.
    fn intern(&mut self, identifier: &str) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(identifier) {
            return idx;
        }
        let idx = self.graph.add_node(NodeData {
            identifier: identifier.to_string(),
            unit: None,
        });
        self.node_map.insert(identifier.to_string(), idx);
        idx
    }

    /// Drop every outgoing edge of `idx` and any placeholder left without
    /// dependents as a result.
    fn clear_forward_edges(&mut self, idx: NodeIndex) {
        let mut edges: Vec<EdgeIndex> = self.graph.edges(idx).map(|e| e.id()).collect();
        let targets: HashSet<NodeIndex> = self.graph.edges(idx).map(|e| e.target()).collect();

        // petgraph swaps the last edge into a removed slot, so remove from
        // the highest index down to keep the remaining ids valid.
        edges.sort_unstable_by(|a, b| b.cmp(a));
        for edge in edges {
            self.graph.remove_edge(edge);
        }

        let mut orphaned: Vec<NodeIndex> = targets
            .into_iter()
            .filter(|&t| {
                self.graph[t].unit.is_none()
                    && self
                        .graph
                        .neighbors_directed(t, Direction::Incoming)
                        .next()
                        .is_none()
            })
            .collect();
        orphaned.sort_unstable_by(|a, b| b.cmp(a));
        for placeholder in orphaned {
            self.remove_placeholder(placeholder);
        }
    }

    fn remove_placeholder(&mut self, idx: NodeIndex) {
        let last = NodeIndex::new(self.graph.node_count() - 1);
        if let Some(removed) = self.graph.remove_node(idx) {
            self.node_map.remove(&removed.identifier);
        }
        // petgraph moved the last node into `idx`; repoint its map entry.
        if idx != last {
            if let Some(moved) = self.graph.node_weight(idx) {
                self.node_map.insert(moved.identifier.clone(), idx);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    fn index_of(&self, identifier: &str) -> Option<NodeIndex> {
        self.node_map.get(identifier).copied()
    }

    fn identifier(&self, idx: NodeIndex) -> &str {
        self.graph
            .node_weight(idx)
            .map_or("", |node| node.identifier.as_str())
    }

    /// Identifiers with a forward edge into `identifier`.
    ///
    /// Works for placeholders too. Unknown identifiers yield an empty set.
    #[must_use]
    pub fn dependents_of(&self, identifier: &str) -> BTreeSet<&str> {
        self.index_of(identifier)
            .map(|idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .map(|n| self.identifier(n))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Identifiers `identifier` forward-declares, dangling targets included.
    #[must_use]
    pub fn dependencies_of(&self, identifier: &str) -> BTreeSet<&str> {
        self.index_of(identifier)
            .map(|idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .map(|n| self.identifier(n))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Full forward edges of `identifier`, sorted by target then label.
    #[must_use]
    pub fn edges_of(&self, identifier: &str) -> Vec<EdgeView<'_>> {
        let Some(idx) = self.index_of(identifier) else {
            return Vec::new();
        };
        let mut edges: Vec<EdgeView<'_>> = self
            .graph
            .edges(idx)
            .map(|edge| EdgeView {
                source: self.identifier(edge.source()),
                target: self.identifier(edge.target()),
                relationship: edge.weight().relationship.as_str(),
                via: edge.weight().via.as_deref(),
                target_kind: edge.weight().target_kind.as_str(),
            })
            .collect();
        edges.sort_unstable_by(|a, b| {
            (a.target, a.relationship, a.via).cmp(&(b.target, b.relationship, b.via))
        });
        edges
    }

    /// Every forward edge in the graph, sorted.
    #[must_use]
    pub fn edges(&self) -> Vec<EdgeView<'_>> {
        let mut edges: Vec<EdgeView<'_>> = self
            .graph
            .edge_references()
            .map(|edge| EdgeView {
                source: self.identifier(edge.source()),
                target: self.identifier(edge.target()),
                relationship: edge.weight().relationship.as_str(),
                via: edge.weight().via.as_deref(),
                target_kind: edge.weight().target_kind.as_str(),
            })
            .collect();
        edges.sort_unstable_by(|a, b| {
            (a.source, a.target, a.relationship, a.via, a.target_kind)
                .cmp(&(b.source, b.target, b.relationship, b.via, b.target_kind))
        });
        edges
    }

    /// Registered nodes in identifier order. Placeholders are excluded.
    #[must_use]
    pub fn nodes(&self) -> Vec<NodeRef<'_>> {
        let mut nodes: Vec<NodeRef<'_>> = self
            .graph
            .node_weights()
            .filter_map(|node| {
                node.unit.as_ref().map(|meta| NodeRef {
                    identifier: node.identifier.as_str(),
                    kind: meta.kind,
                    file_path: meta.file_path.as_str(),
                })
            })
            .collect();
        nodes.sort_unstable_by(|a, b| a.identifier.cmp(b.identifier));
        nodes
    }

    /// Look up a registered node.
    #[must_use]
    pub fn node(&self, identifier: &str) -> Option<NodeRef<'_>> {
        let idx = self.index_of(identifier)?;
        let node = self.graph.node_weight(idx)?;
        node.unit.as_ref().map(|meta| NodeRef {
            identifier: node.identifier.as_str(),
            kind: meta.kind,
            file_path: meta.file_path.as_str(),
        })
    }

    /// Whether `identifier` is a registered node (not a placeholder).
    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        self.node(identifier).is_some()
    }

    /// Whether `identifier` is only known as a dangling edge target.
    #[must_use]
    pub fn is_placeholder(&self, identifier: &str) -> bool {
        self.index_of(identifier)
            .and_then(|idx| self.graph.node_weight(idx))
            .is_some_and(|node| node.unit.is_none())
    }

    /// Number of registered nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph
            .node_weights()
            .filter(|node| node.unit.is_some())
            .count()
    }

    /// Number of placeholder entries created for dangling targets.
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.graph.node_count() - self.node_count()
    }

    /// Number of forward edges, dangling ones included.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of forward edges whose target is a placeholder.
    #[must_use]
    pub fn dangling_edge_count(&self) -> usize {
        self.graph
            .edge_references()
            .filter(|edge| self.graph[edge.target()].unit.is_none())
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node_count() == 0
    }

    /// Registered identifiers of the given kind, sorted.
    #[must_use]
    pub fn units_of_kind(&self, kind: UnitKind) -> Vec<&str> {
        self.nodes()
            .into_iter()
            .filter(|node| node.kind == kind)
            .map(|node| node.identifier)
            .collect()
    }

    /// Units that depend on `identifier` directly or through a chain.
    ///
    /// Breadth-first over reverse edges, nearest first and identifier order
    /// within one level. `max_depth` bounds the number of hops (`None` walks
    /// the whole reverse closure). The start node itself is never included,
    /// even when it sits on a cycle.
    #[must_use]
    pub fn transitive_dependents(&self, identifier: &str, max_depth: Option<usize>) -> Vec<String> {
        let Some(start) = self.index_of(identifier) else {
            return Vec::new();
        };

        let mut visited: HashSet<NodeIndex> = HashSet::from([start]);
        let mut queue: VecDeque<(NodeIndex, usize)> = VecDeque::from([(start, 0)]);
        let mut result = Vec::new();

        while let Some((current, depth)) = queue.pop_front() {
            if max_depth.is_some_and(|max| depth >= max) {
                continue;
            }

            let mut next: Vec<NodeIndex> = self
                .graph
                .neighbors_directed(current, Direction::Incoming)
                .filter(|n| !visited.contains(n))
                .collect();
            next.sort_unstable_by(|a, b| self.identifier(*a).cmp(self.identifier(*b)));
            next.dedup();

            for n in next {
                visited.insert(n);
                result.push(self.identifier(n).to_string());
                queue.push_back((n, depth + 1));
            }
        }

        result
    }

    /// Units defined in any of `changed_files`, plus everything that
    /// transitively depends on them. Sorted and deduplicated.
    #[must_use]
    pub fn affected_by<S: AsRef<str>>(&self, changed_files: &[S]) -> Vec<String> {
        let changed: HashSet<&str> = changed_files
            .iter()
            .map(|path| normalize_path(path.as_ref()))
            .collect();

        let mut affected: BTreeSet<String> = BTreeSet::new();
        for node in self.nodes() {
            if node.file_path.is_empty() || !changed.contains(normalize_path(node.file_path)) {
                continue;
            }
            affected.insert(node.identifier.to_string());
            affected.extend(self.transitive_dependents(node.identifier, None));
        }

        affected.into_iter().collect()
    }
}

fn normalize_path(path: &str) -> &str {
    path.trim().trim_start_matches("./")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::Dependency;

    fn unit(id: &str, deps: &[&str]) -> UnitRecord {
        deps.iter().fold(UnitRecord::new(id, UnitKind::Service), |u, d| {
            u.depends_on(*d, "method_call")
        })
    }

    fn set<'a>(ids: &[&'a str]) -> BTreeSet<&'a str> {
        ids.iter().copied().collect()
    }

    #[test]
    fn empty_graph_has_no_nodes() {
        let graph = DependencyGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.dependents_of("Missing").is_empty());
        assert!(graph.dependencies_of("Missing").is_empty());
    }

    #[test]
    fn register_indexes_both_directions() {
        let mut graph = DependencyGraph::new();
        graph.register(unit("User", &[])).expect("register");
        graph.register(unit("Order", &["User"])).expect("register");

        assert_eq!(graph.dependencies_of("Order"), set(&["User"]));
        assert_eq!(graph.dependents_of("User"), set(&["Order"]));
        assert!(graph.dependents_of("Order").is_empty());
    }

    #[test]
    fn dangling_target_counts_dependents_but_is_not_a_node() {
        let mut graph = DependencyGraph::new();
        graph.register(unit("Order", &["Ghost"])).expect("register");

        assert_eq!(graph.dependents_of("Ghost"), set(&["Order"]));
        assert!(graph.is_placeholder("Ghost"));
        assert!(!graph.contains("Ghost"));
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.placeholder_count(), 1);
        assert_eq!(graph.dangling_edge_count(), 1);
        let ids: Vec<&str> = graph.nodes().iter().map(|n| n.identifier).collect();
        assert_eq!(ids, vec!["Order"]);
    }

    #[test]
    fn placeholder_is_promoted_on_registration() {
        let mut graph = DependencyGraph::new();
        graph.register(unit("Order", &["User"])).expect("register");
        graph.register(unit("User", &[])).expect("register");

        assert!(graph.contains("User"));
        assert!(!graph.is_placeholder("User"));
        assert_eq!(graph.dependents_of("User"), set(&["Order"]));
        assert_eq!(graph.dangling_edge_count(), 0);
    }

    #[test]
    fn re_registration_replaces_forward_edges() {
        let mut graph = DependencyGraph::new();
        graph.register(unit("A", &[])).expect("register");
        graph.register(unit("B", &[])).expect("register");
        graph.register(unit("C", &["A", "B"])).expect("register");
        graph.register(unit("C", &["B"])).expect("register");

        assert_eq!(graph.dependencies_of("C"), set(&["B"]));
        assert!(graph.dependents_of("A").is_empty());
        assert_eq!(graph.dependents_of("B"), set(&["C"]));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn re_registration_does_not_duplicate_dependents() {
        let mut graph = DependencyGraph::new();
        graph.register(unit("User", &[])).expect("register");
        for _ in 0..3 {
            graph.register(unit("Order", &["User"])).expect("register");
        }

        assert_eq!(graph.dependents_of("User"), set(&["Order"]));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn replacing_edges_prunes_abandoned_placeholders() {
        let mut graph = DependencyGraph::new();
        graph.register(unit("A", &["Ghost1", "Ghost2"])).expect("register");
        graph.register(unit("B", &["Ghost2"])).expect("register");
        graph.register(unit("A", &["Ghost3"])).expect("register");

        assert!(!graph.is_placeholder("Ghost1"));
        assert!(graph.is_placeholder("Ghost2"));
        assert!(graph.is_placeholder("Ghost3"));
        assert_eq!(graph.dependents_of("Ghost2"), set(&["B"]));
        assert_eq!(graph.dependents_of("Ghost3"), set(&["A"]));
        assert_eq!(graph.dependencies_of("B"), set(&["Ghost2"]));
        assert_eq!(graph.placeholder_count(), 2);
    }

    #[test]
    fn invalid_unit_leaves_graph_untouched() {
        let mut graph = DependencyGraph::new();
        graph.register(unit("User", &[])).expect("register");

        let bad = UnitRecord::new("Order", UnitKind::Model)
            .depends_on("User", "association")
            .depends_on("", "association");
        let err = graph.register(bad).expect_err("empty target");

        assert!(matches!(err, GraphError::InvalidUnit { .. }));
        assert!(!graph.contains("Order"));
        assert!(graph.dependents_of("User").is_empty());
    }

    #[test]
    fn register_all_stops_at_first_invalid() {
        let mut graph = DependencyGraph::new();
        let result = graph.register_all(vec![
            unit("A", &[]),
            UnitRecord::new("", UnitKind::Model),
            unit("C", &[]),
        ]);

        assert!(result.is_err());
        assert!(graph.contains("A"));
        assert!(!graph.contains("C"));
    }

    #[test]
    fn edges_of_keeps_labels() {
        let mut graph = DependencyGraph::new();
        graph
            .register(
                UnitRecord::new("Order", UnitKind::Model)
                    .with_dependency(
                        Dependency::new("User", "association")
                            .with_kind("model")
                            .via("belongs_to"),
                    )
                    .depends_on("User", "method_call"),
            )
            .expect("register");

        let edges = graph.edges_of("Order");
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].relationship, "association");
        assert_eq!(edges[0].via, Some("belongs_to"));
        assert_eq!(edges[0].target_kind, "model");
        assert_eq!(edges[1].relationship, "method_call");
        assert_eq!(graph.dependencies_of("Order"), set(&["User"]));
    }

    #[test]
    fn self_dependency_is_kept() {
        let mut graph = DependencyGraph::new();
        graph.register(unit("Loop", &["Loop"])).expect("register");

        assert_eq!(graph.dependents_of("Loop"), set(&["Loop"]));
        assert_eq!(graph.dependencies_of("Loop"), set(&["Loop"]));
    }

    #[test]
    fn units_of_kind_filters_registered_nodes() {
        let mut graph = DependencyGraph::new();
        graph
            .register(UnitRecord::new("User", UnitKind::Model).depends_on("Ghost", "association"))
            .expect("register");
        graph
            .register(UnitRecord::new("UsersController", UnitKind::Controller))
            .expect("register");

        assert_eq!(graph.units_of_kind(UnitKind::Model), vec!["User"]);
        assert_eq!(graph.units_of_kind(UnitKind::Controller), vec!["UsersController"]);
        assert!(graph.units_of_kind(UnitKind::Job).is_empty());
    }

    #[test]
    fn transitive_dependents_walks_reverse_edges() {
        let mut graph = DependencyGraph::new();
        graph.register(unit("D", &[])).expect("register");
        graph.register(unit("C", &["D"])).expect("register");
        graph.register(unit("B", &["C"])).expect("register");
        graph.register(unit("A", &["B"])).expect("register");
        graph.register(unit("X", &["D"])).expect("register");

        assert_eq!(graph.transitive_dependents("D", None), vec!["C", "X", "B", "A"]);
        assert_eq!(graph.transitive_dependents("D", Some(1)), vec!["C", "X"]);
        assert!(graph.transitive_dependents("A", None).is_empty());
        assert!(graph.transitive_dependents("Nope", None).is_empty());
    }

    #[test]
    fn transitive_dependents_terminates_on_cycles() {
        let mut graph = DependencyGraph::new();
        graph.register(unit("A", &["B"])).expect("register");
        graph.register(unit("B", &["A"])).expect("register");

        assert_eq!(graph.transitive_dependents("A", None), vec!["B"]);
    }

    #[test]
    fn affected_by_maps_files_to_units_and_dependents() {
        let mut graph = DependencyGraph::new();
        graph
            .register(UnitRecord::new("User", UnitKind::Model).with_file("app/models/user.rb"))
            .expect("register");
        graph
            .register(
                UnitRecord::new("Order", UnitKind::Model)
                    .with_file("app/models/order.rb")
                    .depends_on("User", "association"),
            )
            .expect("register");
        graph
            .register(
                UnitRecord::new("Product", UnitKind::Model).with_file("app/models/product.rb"),
            )
            .expect("register");

        assert_eq!(
            graph.affected_by(&["./app/models/user.rb"]),
            vec!["Order".to_string(), "User".to_string()]
        );
        assert!(graph.affected_by(&["README.md"]).is_empty());
    }
}
