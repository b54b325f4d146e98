//! Query-phase entry point: every analysis over one borrowed graph.
//!
//! A [`GraphAnalyzer`] interns the graph once into a [`Topology`] and then
//! answers any number of queries against it. It never mutates the graph, so
//! several analyzers may share one `&DependencyGraph` across threads.

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use unitgraph_core::{AnalysisConfig, DependencyGraph};

use crate::{
    bridges::{Bridge, rank_bridges},
    cycles::{CycleSearch, find_cycles},
    diagnostics::{self, Hub},
    error::AnalysisError,
    pagerank::{PageRankConfig, PageRankResult, RankedUnit, pagerank},
    topology::Topology,
};

/// An analysis section that failed and was left empty in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionError {
    pub section: String,
    /// Stable `E####` code.
    pub code: String,
    pub message: String,
}

impl SectionError {
    fn new(section: &str, err: &AnalysisError) -> Self {
        Self {
            section: section.to_string(),
            code: err.code().code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Aggregate counts for an [`AnalysisReport`].
///
/// A count is `None` when its section failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub dangling_edge_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orphan_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dead_end_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hub_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bridge_count: Option<usize>,
    /// Cycle enumeration hit `max_cycles`.
    #[serde(default)]
    pub cycles_truncated: bool,
}

/// Everything [`GraphAnalyzer::analyze`] computes in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub orphans: Vec<String>,
    pub dead_ends: Vec<String>,
    pub hubs: Vec<Hub>,
    pub cycles: Vec<Vec<String>>,
    pub bridges: Vec<Bridge>,
    pub stats: AnalysisStats,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<SectionError>,
}

/// Read-only analyzer over one [`DependencyGraph`].
#[derive(Debug, Clone)]
pub struct GraphAnalyzer<'g> {
    graph: &'g DependencyGraph,
    topo: Topology<'g>,
    config: AnalysisConfig,
}

impl<'g> GraphAnalyzer<'g> {
    #[must_use]
    pub fn new(graph: &'g DependencyGraph, config: AnalysisConfig) -> Self {
        Self {
            graph,
            topo: Topology::build(graph),
            config,
        }
    }

    #[must_use]
    pub const fn graph(&self) -> &'g DependencyGraph {
        self.graph
    }

    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    #[must_use]
    pub const fn topology(&self) -> &Topology<'g> {
        &self.topo
    }

    /// Registered units nothing depends on, vendored kinds excluded.
    #[must_use]
    pub fn orphans(&self) -> Vec<String> {
        diagnostics::orphans(&self.topo)
    }

    /// Registered units with no outgoing dependency.
    #[must_use]
    pub fn dead_ends(&self) -> Vec<String> {
        diagnostics::dead_ends(&self.topo)
    }

    /// The `limit` most depended-upon units.
    #[must_use]
    pub fn hubs(&self, limit: usize) -> Vec<Hub> {
        diagnostics::hubs(&self.topo, limit)
    }

    /// Distinct dependency cycles, each closed and rotated to its smallest
    /// member.
    ///
    /// Enumeration stops at `config.max_cycles`; use [`Self::try_cycles`]
    /// to see whether it did.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<String>> {
        self.try_cycles().map_or_else(
            |err| {
                warn!(error = %err, "cycle detection failed");
                Vec::new()
            },
            |search| search.cycles,
        )
    }

    /// Cycle search with the truncation flag and errors exposed.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] if the search breaks an internal invariant.
    pub fn try_cycles(&self) -> Result<CycleSearch, AnalysisError> {
        find_cycles(&self.topo, self.config.max_cycles)
    }

    /// Units most often inside a sampled shortest path.
    ///
    /// Samples with `config.seed` when set, OS entropy otherwise.
    #[must_use]
    pub fn bridges(&self, limit: usize, sample_size: usize) -> Vec<Bridge> {
        let mut rng = self.sampling_rng();
        self.bridges_with_rng(limit, sample_size, &mut rng)
    }

    /// [`Self::bridges`] with a caller-supplied RNG.
    #[must_use]
    pub fn bridges_with_rng<R: Rng>(
        &self,
        limit: usize,
        sample_size: usize,
        rng: &mut R,
    ) -> Vec<Bridge> {
        self.try_bridges_with_rng(limit, sample_size, rng)
            .unwrap_or_else(|err| {
                warn!(error = %err, "bridge ranking failed");
                Vec::new()
            })
    }

    /// # Errors
    ///
    /// Returns [`AnalysisError`] if path reconstruction breaks an internal
    /// invariant.
    pub fn try_bridges_with_rng<R: Rng>(
        &self,
        limit: usize,
        sample_size: usize,
        rng: &mut R,
    ) -> Result<Vec<Bridge>, AnalysisError> {
        rank_bridges(
            &self.topo,
            limit,
            sample_size,
            self.config.bridge_min_nodes,
            rng,
        )
    }

    /// Units ranked by PageRank along dependency edges, highest first.
    #[must_use]
    pub fn pagerank(&self) -> Vec<RankedUnit> {
        self.pagerank_detailed().ranks
    }

    /// PageRank with iteration and convergence metadata.
    #[must_use]
    pub fn pagerank_detailed(&self) -> PageRankResult {
        pagerank(&self.topo, &PageRankConfig::from(&self.config))
    }

    /// Run every section and collect the results.
    ///
    /// Sections are independent: a failed cycle search still yields orphans,
    /// hubs, and bridges.
    #[must_use]
    #[instrument(skip(self), fields(nodes = self.topo.len()))]
    pub fn analyze(&self) -> AnalysisReport {
        let cycles = self.try_cycles();
        let mut rng = self.sampling_rng();
        let bridges = self.try_bridges_with_rng(
            self.config.bridge_limit,
            self.config.bridge_sample_size,
            &mut rng,
        );
        self.assemble_report(cycles, bridges)
    }

    /// Fold the fallible section results into a report next to the
    /// degree-based sections.
    fn assemble_report(
        &self,
        cycles: Result<CycleSearch, AnalysisError>,
        bridges: Result<Vec<Bridge>, AnalysisError>,
    ) -> AnalysisReport {
        let mut errors = Vec::new();

        let orphans = self.orphans();
        let dead_ends = self.dead_ends();
        let hubs = self.hubs(self.config.hub_limit);

        let (cycles, cycle_count, cycles_truncated) = match cycles {
            Ok(search) => {
                let count = search.cycles.len();
                (search.cycles, Some(count), search.truncated)
            }
            Err(err) => {
                warn!(error = %err, "cycle section failed");
                errors.push(SectionError::new("cycles", &err));
                (Vec::new(), None, false)
            }
        };

        let (bridges, bridge_count) = match bridges {
            Ok(bridges) => {
                let count = bridges.len();
                (bridges, Some(count))
            }
            Err(err) => {
                warn!(error = %err, "bridge section failed");
                errors.push(SectionError::new("bridges", &err));
                (Vec::new(), None)
            }
        };

        let stats = AnalysisStats {
            node_count: self.topo.len(),
            edge_count: self.topo.edge_count(),
            dangling_edge_count: self.topo.dangling_edge_count(),
            orphan_count: Some(orphans.len()),
            dead_end_count: Some(dead_ends.len()),
            hub_count: Some(hubs.len()),
            cycle_count,
            bridge_count,
            cycles_truncated,
        };

        info!(
            nodes = stats.node_count,
            edges = stats.edge_count,
            cycles = ?stats.cycle_count,
            failed_sections = errors.len(),
            "analysis complete"
        );

        AnalysisReport {
            orphans,
            dead_ends,
            hubs,
            cycles,
            bridges,
            stats,
            errors,
        }
    }

    fn sampling_rng(&self) -> StdRng {
        self.config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
    }
}
