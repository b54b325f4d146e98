//! Bridge ranking by sampled shortest-path betweenness.
//!
//! # Overview
//!
//! A bridge is a unit that many dependency paths pass through. Exact
//! betweenness (Brandes) costs O(V * E); here we approximate it by tallying
//! the interior nodes of one BFS shortest path per (source, target) pair.
//!
//! # Sampling
//!
//! - Graphs smaller than `min_nodes` return no bridges.
//! - When `n * (n - 1) <= sample_size`, every ordered pair of distinct nodes
//!   is evaluated. One BFS per source covers all of its targets.
//! - Otherwise `sample_size` pairs of distinct nodes are drawn (with
//!   replacement) from the caller's RNG, each resolved with a BFS that stops
//!   at the target.
//!
//! Neighbours are expanded in identifier order, so with a fixed RNG the
//! chosen shortest path (and therefore the tally) is reproducible.

use std::collections::VecDeque;

use fixedbitset::FixedBitSet;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{error::AnalysisError, topology::Topology};

const SECTION: &str = "bridges";
const NO_PARENT: usize = usize::MAX;

/// A unit and how many sampled shortest paths pass through it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bridge {
    pub identifier: String,
    pub count: usize,
}

/// Reusable BFS buffers, sized once per ranking.
struct Search {
    visited: FixedBitSet,
    parent: Vec<usize>,
    queue: VecDeque<usize>,
}

impl Search {
    fn new(n: usize) -> Self {
        Self {
            visited: FixedBitSet::with_capacity(n),
            parent: vec![NO_PARENT; n],
            queue: VecDeque::with_capacity(n),
        }
    }

    /// BFS from `source`, recording a parent tree. Stops early once `stop`
    /// is reached.
    fn run(&mut self, topo: &Topology<'_>, source: usize, stop: Option<usize>) {
        self.visited.clear();
        self.parent.fill(NO_PARENT);
        self.queue.clear();

        self.visited.insert(source);
        self.queue.push_back(source);

        while let Some(v) = self.queue.pop_front() {
            if Some(v) == stop {
                return;
            }
            for &w in topo.successors(v) {
                if !self.visited.put(w) {
                    self.parent[w] = v;
                    self.queue.push_back(w);
                }
            }
        }
    }

    /// Walk the parent tree back from `target`, tallying interior nodes.
    ///
    /// Unreachable targets contribute nothing.
    fn tally_path(
        &self,
        topo: &Topology<'_>,
        source: usize,
        target: usize,
        tally: &mut [usize],
    ) -> Result<(), AnalysisError> {
        if !self.visited.contains(target) {
            return Ok(());
        }

        let mut current = self.parent[target];
        let mut steps = 0usize;
        while current != source {
            if current == NO_PARENT || steps > topo.len() {
                return Err(AnalysisError::invariant(
                    SECTION,
                    format!(
                        "broken BFS parent chain from {} to {}",
                        topo.id(source),
                        topo.id(target)
                    ),
                ));
            }
            tally[current] += 1;
            current = self.parent[current];
            steps += 1;
        }
        Ok(())
    }
}

/// Rank the `limit` nodes that most often sit inside a shortest path.
///
/// # Errors
///
/// Returns [`AnalysisError::Invariant`] if a BFS parent chain is broken.
#[instrument(skip(topo, rng), fields(nodes = topo.len()))]
pub fn rank_bridges<R: Rng>(
    topo: &Topology<'_>,
    limit: usize,
    sample_size: usize,
    min_nodes: usize,
    rng: &mut R,
) -> Result<Vec<Bridge>, AnalysisError> {
    let n = topo.len();
    if n < min_nodes.max(2) || limit == 0 {
        return Ok(Vec::new());
    }

    let mut tally = vec![0usize; n];
    let mut search = Search::new(n);
    let ordered_pairs = n.saturating_mul(n - 1);

    if ordered_pairs <= sample_size {
        debug!(pairs = ordered_pairs, "evaluating every ordered pair");
        for source in 0..n {
            search.run(topo, source, None);
            for target in (0..n).filter(|&t| t != source) {
                search.tally_path(topo, source, target, &mut tally)?;
            }
        }
    } else {
        debug!(pairs = sample_size, "sampling random pairs");
        for _ in 0..sample_size {
            let source = rng.gen_range(0..n);
            let mut target = rng.gen_range(0..n - 1);
            if target >= source {
                target += 1;
            }
            search.run(topo, source, Some(target));
            search.tally_path(topo, source, target, &mut tally)?;
        }
    }

    let mut ranked: Vec<usize> = (0..n).filter(|&i| tally[i] > 0).collect();
    ranked.sort_by(|&a, &b| tally[b].cmp(&tally[a]).then(a.cmp(&b)));
    ranked.truncate(limit);

    Ok(ranked
        .into_iter()
        .map(|i| Bridge {
            identifier: topo.id(i).to_string(),
            count: tally[i],
        })
        .collect())
}
