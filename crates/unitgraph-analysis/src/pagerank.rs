//! PageRank over dependency edges.
//!
//! # Overview
//!
//! Rank flows along `A → B` ("A depends on B"), so a unit that many
//! important units depend on accumulates rank. This is the downstream
//! importance signal: a change to a high-rank unit ripples the furthest.
//!
//! # Algorithm
//!
//! Power iteration:
//!
//! ```text
//! PR(v) = (1 - d) / N + d * Σ PR(u) / out_degree(u)   for each u → v
//! ```
//!
//! Nodes with no registered successors (dead ends, or units whose every
//! edge dangles) spread their rank uniformly. Iteration stops when the L1
//! norm of the rank delta drops below the tolerance, or at `max_iter`.

use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};
use unitgraph_core::AnalysisConfig;

use crate::topology::Topology;

/// Parameters for [`pagerank`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRankConfig {
    /// Probability of following an edge rather than teleporting.
    pub damping: f64,
    /// Stop when the L1 norm of the rank delta falls below this.
    pub tolerance: f64,
    pub max_iter: usize,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            tolerance: 1e-6,
            max_iter: 100,
        }
    }
}

impl From<&AnalysisConfig> for PageRankConfig {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            damping: config.pagerank_damping,
            tolerance: config.pagerank_tolerance,
            max_iter: config.pagerank_max_iter,
        }
    }
}

/// A unit and its PageRank score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedUnit {
    pub identifier: String,
    pub score: f64,
}

/// Scores plus convergence metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRankResult {
    /// Sorted by score descending, then identifier.
    pub ranks: Vec<RankedUnit>,
    pub iterations: usize,
    pub converged: bool,
}

/// Compute PageRank for every registered node.
#[must_use]
#[instrument(skip(topo, config), fields(nodes = topo.len()))]
#[allow(clippy::cast_precision_loss)]
pub fn pagerank(topo: &Topology<'_>, config: &PageRankConfig) -> PageRankResult {
    let n = topo.len();
    if n == 0 {
        return PageRankResult {
            ranks: Vec::new(),
            iterations: 0,
            converged: true,
        };
    }

    let n_f64 = n as f64;
    let base = (1.0 - config.damping) / n_f64;

    let mut ranks = vec![1.0 / n_f64; n];
    let mut next = vec![0.0_f64; n];
    let mut iterations = 0;
    let mut converged = false;

    for _ in 0..config.max_iter {
        iterations += 1;

        let dangling: f64 = (0..n)
            .filter(|&i| topo.successors(i).is_empty())
            .map(|i| ranks[i])
            .sum();
        next.fill(base + config.damping * dangling / n_f64);

        for (i, rank) in ranks.iter().enumerate() {
            let successors = topo.successors(i);
            if successors.is_empty() {
                continue;
            }
            let share = config.damping * rank / successors.len() as f64;
            for &j in successors {
                next[j] += share;
            }
        }

        let delta: f64 = ranks
            .iter()
            .zip(&next)
            .map(|(old, new)| (old - new).abs())
            .sum();

        std::mem::swap(&mut ranks, &mut next);

        if delta < config.tolerance {
            converged = true;
            break;
        }
    }

    if !converged {
        warn!(iterations, "pagerank did not converge");
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| ranks[b].total_cmp(&ranks[a]).then(a.cmp(&b)));

    PageRankResult {
        ranks: order
            .into_iter()
            .map(|i| RankedUnit {
                identifier: topo.id(i).to_string(),
                score: ranks[i],
            })
            .collect(),
        iterations,
        converged,
    }
}
