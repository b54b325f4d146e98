//! Serializable export of a [`DependencyGraph`].
//!
//! A [`GraphSnapshot`] is a plain node map plus a sorted edge list, suitable
//! for JSON inspection and for tests. Re-registering every node of a
//! snapshot rebuilds a graph with identical adjacency.
//!
//! The snapshot carries a BLAKE3 content hash over its nodes and edges so
//! callers can tell whether two extraction runs produced the same graph.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    error::GraphError,
    graph::store::DependencyGraph,
    unit::{Dependency, UnitKind, UnitRecord},
};

/// One registered node in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub kind: UnitKind,
    #[serde(default)]
    pub file_path: String,
}

/// One forward edge in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeEntry {
    pub source: String,
    pub target: String,
    pub relationship: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub target_kind: String,
}

/// Point-in-time export of a dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Registered nodes keyed by identifier. Placeholders are not listed;
    /// they only appear as edge targets.
    pub nodes: BTreeMap<String, NodeEntry>,
    /// Forward edges sorted by `(source, target, relationship, via)`.
    pub edges: Vec<EdgeEntry>,
    /// `blake3:<hex>` over every field of the sorted node and edge lists.
    pub content_hash: String,
}

impl GraphSnapshot {
    /// Turn the snapshot back into unit records, one per node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Snapshot`] when an edge's source is not a
    /// listed node.
    pub fn to_units(&self) -> Result<Vec<UnitRecord>, GraphError> {
        let mut units: BTreeMap<&str, UnitRecord> = self
            .nodes
            .iter()
            .map(|(id, entry)| {
                (
                    id.as_str(),
                    UnitRecord::new(id.clone(), entry.kind).with_file(entry.file_path.clone()),
                )
            })
            .collect();

        for edge in &self.edges {
            let Some(unit) = units.get_mut(edge.source.as_str()) else {
                return Err(GraphError::Snapshot(format!(
                    "edge source {:?} is not a node",
                    edge.source
                )));
            };
            let mut dep = Dependency::new(edge.target.clone(), edge.relationship.clone())
                .with_kind(edge.target_kind.clone());
            dep.via.clone_from(&edge.via);
            unit.dependencies.push(dep);
        }

        Ok(units.into_values().collect())
    }

    /// Recompute the content hash and compare it with the stored one.
    #[must_use]
    pub fn verify_hash(&self) -> bool {
        compute_content_hash(&self.nodes, &self.edges) == self.content_hash
    }
}

impl DependencyGraph {
    /// Export the graph (the `to_h` view): node map and sorted edge list.
    #[must_use]
    pub fn to_snapshot(&self) -> GraphSnapshot {
        let nodes: BTreeMap<String, NodeEntry> = self
            .nodes()
            .into_iter()
            .map(|node| {
                (
                    node.identifier.to_string(),
                    NodeEntry {
                        kind: node.kind,
                        file_path: node.file_path.to_string(),
                    },
                )
            })
            .collect();

        let edges: Vec<EdgeEntry> = self
            .edges()
            .into_iter()
            .map(|edge| EdgeEntry {
                source: edge.source.to_string(),
                target: edge.target.to_string(),
                relationship: edge.relationship.to_string(),
                via: edge.via.map(str::to_string),
                target_kind: edge.target_kind.to_string(),
            })
            .collect();

        let content_hash = compute_content_hash(&nodes, &edges);

        GraphSnapshot {
            nodes,
            edges,
            content_hash,
        }
    }

    /// Rebuild a graph by re-registering every node of `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Snapshot`] for edges whose source is missing and
    /// [`GraphError::InvalidUnit`] for nodes that fail validation.
    #[instrument(skip(snapshot), fields(nodes = snapshot.nodes.len(), edges = snapshot.edges.len()))]
    pub fn from_snapshot(snapshot: &GraphSnapshot) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        graph.register_all(snapshot.to_units()?)?;
        Ok(graph)
    }
}

fn compute_content_hash(nodes: &BTreeMap<String, NodeEntry>, edges: &[EdgeEntry]) -> String {
    let mut hasher = blake3::Hasher::new();
    for (id, entry) in nodes {
        hasher.update(id.as_bytes());
        hasher.update(b"\x00");
        hasher.update(entry.kind.as_str().as_bytes());
        hasher.update(b"\x00");
        hasher.update(entry.file_path.as_bytes());
        hasher.update(b"\x00");
    }
    hasher.update(b"\x01");

    // Sort a local view so hand-built snapshots hash like exported ones.
    let mut sorted: Vec<&EdgeEntry> = edges.iter().collect();
    sorted.sort_unstable();
    for edge in sorted {
        hasher.update(edge.source.as_bytes());
        hasher.update(b"\x00");
        hasher.update(edge.target.as_bytes());
        hasher.update(b"\x00");
        hasher.update(edge.relationship.as_bytes());
        hasher.update(b"\x00");
        match &edge.via {
            Some(via) => {
                hasher.update(b"\x02");
                hasher.update(via.as_bytes());
            }
            None => {
                hasher.update(b"\x03");
            }
        }
        hasher.update(b"\x00");
        hasher.update(edge.target_kind.as_bytes());
        hasher.update(b"\x00");
    }
    format!("blake3:{}", hasher.finalize())
}
