//! Degree-based code-health diagnostics.
//!
//! - [`orphans`]: units nobody depends on (vendored kinds exempt)
//! - [`dead_ends`]: units that depend on nothing
//! - [`hubs`]: units ranked by how many units depend on them

use serde::{Deserialize, Serialize};

use crate::topology::Topology;

/// A unit ranked by dependent count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hub {
    pub identifier: String,
    pub dependent_count: usize,
}

/// Units with zero dependents, excluding externally-vendored kinds.
///
/// Sorted by identifier.
#[must_use]
pub fn orphans(topo: &Topology<'_>) -> Vec<String> {
    (0..topo.len())
        .filter(|&i| topo.dependent_count(i) == 0 && !topo.kind(i).is_vendored())
        .map(|i| topo.id(i).to_string())
        .collect()
}

/// Units with zero forward edges. Sorted by identifier.
///
/// An edge to an unregistered target still counts as an edge.
#[must_use]
pub fn dead_ends(topo: &Topology<'_>) -> Vec<String> {
    (0..topo.len())
        .filter(|&i| topo.out_degree(i) == 0)
        .map(|i| topo.id(i).to_string())
        .collect()
}

/// The `limit` units with the most dependents.
///
/// Only units with at least one dependent are eligible. Ties are broken by
/// identifier so the ranking is reproducible.
#[must_use]
pub fn hubs(topo: &Topology<'_>, limit: usize) -> Vec<Hub> {
    let mut ranked: Vec<usize> = (0..topo.len())
        .filter(|&i| topo.dependent_count(i) > 0)
        .collect();

    // Interned ids are in identifier order, so the index is the tiebreak.
    ranked.sort_by(|&a, &b| {
        topo.dependent_count(b)
            .cmp(&topo.dependent_count(a))
            .then(a.cmp(&b))
    });
    ranked.truncate(limit);

    ranked
        .into_iter()
        .map(|i| Hub {
            identifier: topo.id(i).to_string(),
            dependent_count: topo.dependent_count(i),
        })
        .collect()
}
