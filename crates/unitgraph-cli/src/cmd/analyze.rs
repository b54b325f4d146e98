//! `ug analyze`: orphans, dead ends, hubs, cycles, and bridges in one report.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use unitgraph_analysis::{AnalysisReport, GraphAnalyzer, RankedUnit};
use unitgraph_core::AnalysisConfig;

use super::{Rejected, load_graph};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `ug analyze`.
#[derive(Args, Debug, Default)]
pub struct AnalyzeArgs {
    /// Unit record dumps or exported snapshots.
    #[arg(required = true, value_name = "FILE")]
    pub inputs: Vec<PathBuf>,

    /// Number of hubs to report.
    #[arg(long)]
    pub hub_limit: Option<usize>,

    /// Number of bridges to report.
    #[arg(long)]
    pub bridge_limit: Option<usize>,

    /// Node pairs sampled for bridge ranking.
    #[arg(long)]
    pub sample_size: Option<usize>,

    /// Stop cycle enumeration after this many cycles.
    #[arg(long)]
    pub max_cycles: Option<usize>,

    /// Seed for bridge sampling.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Also list the top N units by PageRank.
    #[arg(long, value_name = "N")]
    pub pagerank: Option<usize>,
}

impl AnalyzeArgs {
    fn apply(&self, base: &AnalysisConfig) -> AnalysisConfig {
        let mut config = base.clone();
        if let Some(limit) = self.hub_limit {
            config.hub_limit = limit;
        }
        if let Some(limit) = self.bridge_limit {
            config.bridge_limit = limit;
        }
        if let Some(size) = self.sample_size {
            config.bridge_sample_size = size;
        }
        if let Some(max) = self.max_cycles {
            config.max_cycles = max;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config
    }
}

#[derive(Debug, Serialize)]
struct AnalyzeOutput {
    #[serde(flatten)]
    report: AnalysisReport,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pagerank: Vec<RankedUnit>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    rejected: Vec<Rejected>,
}

/// Execute `ug analyze`.
pub fn run_analyze(
    args: &AnalyzeArgs,
    config: &AnalysisConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let loaded = load_graph(&args.inputs)?;
    let analyzer = GraphAnalyzer::new(&loaded.graph, args.apply(config));

    let report = analyzer.analyze();
    let pagerank = args.pagerank.map_or_else(Vec::new, |top| {
        let mut ranks = analyzer.pagerank();
        ranks.truncate(top);
        ranks
    });

    let payload = AnalyzeOutput {
        report,
        pagerank,
        rejected: loaded.rejected,
    };

    render_mode(output, &payload, render_analyze_text, render_analyze_pretty)
}

fn render_analyze_text(payload: &AnalyzeOutput, w: &mut dyn Write) -> std::io::Result<()> {
    let report = &payload.report;
    writeln!(w, "nodes\t{}", report.stats.node_count)?;
    writeln!(w, "edges\t{}", report.stats.edge_count)?;
    writeln!(w, "dangling_edges\t{}", report.stats.dangling_edge_count)?;
    for id in &report.orphans {
        writeln!(w, "orphan\t{id}")?;
    }
    for id in &report.dead_ends {
        writeln!(w, "dead_end\t{id}")?;
    }
    for hub in &report.hubs {
        writeln!(w, "hub\t{}\t{}", hub.identifier, hub.dependent_count)?;
    }
    for cycle in &report.cycles {
        writeln!(w, "cycle\t{}", cycle.join(" -> "))?;
    }
    for bridge in &report.bridges {
        writeln!(w, "bridge\t{}\t{}", bridge.identifier, bridge.count)?;
    }
    for ranked in &payload.pagerank {
        writeln!(w, "pagerank\t{}\t{:.6}", ranked.identifier, ranked.score)?;
    }
    if report.stats.cycles_truncated {
        writeln!(w, "warning\tcycle enumeration truncated")?;
    }
    for err in &report.errors {
        writeln!(w, "error\t{}\t{}\t{}", err.section, err.code, err.message)?;
    }
    for rejected in &payload.rejected {
        writeln!(
            w,
            "rejected\t{}#{}\t{}",
            rejected.source, rejected.index, rejected.message
        )?;
    }
    Ok(())
}

fn render_analyze_pretty(payload: &AnalyzeOutput, w: &mut dyn Write) -> std::io::Result<()> {
    let report = &payload.report;
    let stats = &report.stats;

    pretty_section(w, "Graph")?;
    pretty_kv(w, "Nodes", stats.node_count.to_string())?;
    pretty_kv(w, "Edges", stats.edge_count.to_string())?;
    pretty_kv(w, "Dangling edges", stats.dangling_edge_count.to_string())?;

    writeln!(w)?;
    pretty_section(w, &format!("Orphans ({})", report.orphans.len()))?;
    write_list(w, &report.orphans)?;

    writeln!(w)?;
    pretty_section(w, &format!("Dead ends ({})", report.dead_ends.len()))?;
    write_list(w, &report.dead_ends)?;

    writeln!(w)?;
    pretty_section(w, "Hubs")?;
    if report.hubs.is_empty() {
        writeln!(w, "  (none)")?;
    }
    for hub in &report.hubs {
        writeln!(w, "  {:>5}  {}", hub.dependent_count, hub.identifier)?;
    }

    writeln!(w)?;
    let truncated = if stats.cycles_truncated { ", truncated" } else { "" };
    pretty_section(w, &format!("Cycles ({}{truncated})", report.cycles.len()))?;
    if report.cycles.is_empty() {
        writeln!(w, "  No dependency cycles found.")?;
    }
    for cycle in &report.cycles {
        writeln!(w, "  {}", cycle.join(" -> "))?;
    }

    writeln!(w)?;
    pretty_section(w, "Bridges")?;
    if report.bridges.is_empty() {
        writeln!(w, "  (none)")?;
    }
    for bridge in &report.bridges {
        writeln!(w, "  {:>5}  {}", bridge.count, bridge.identifier)?;
    }

    if !payload.pagerank.is_empty() {
        writeln!(w)?;
        pretty_section(w, "PageRank")?;
        for ranked in &payload.pagerank {
            writeln!(w, "  {:.6}  {}", ranked.score, ranked.identifier)?;
        }
    }

    if !report.errors.is_empty() || !payload.rejected.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Problems")?;
        for err in &report.errors {
            writeln!(w, "  [{}] {} failed: {}", err.code, err.section, err.message)?;
        }
        for rejected in &payload.rejected {
            writeln!(
                w,
                "  [{}] {}#{} skipped: {}",
                rejected.code, rejected.source, rejected.index, rejected.message
            )?;
        }
    }

    Ok(())
}

fn write_list(w: &mut dyn Write, ids: &[String]) -> std::io::Result<()> {
    if ids.is_empty() {
        writeln!(w, "  (none)")?;
    }
    for id in ids {
        writeln!(w, "  {id}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use unitgraph_analysis::{AnalysisStats, Bridge, Hub};

    fn sample_payload() -> AnalyzeOutput {
        AnalyzeOutput {
            report: AnalysisReport {
                orphans: vec!["Product".into()],
                dead_ends: vec!["User".into()],
                hubs: vec![Hub {
                    identifier: "User".into(),
                    dependent_count: 3,
                }],
                cycles: vec![vec!["A".into(), "B".into(), "A".into()]],
                bridges: vec![Bridge {
                    identifier: "B".into(),
                    count: 2,
                }],
                stats: AnalysisStats {
                    node_count: 5,
                    edge_count: 4,
                    ..AnalysisStats::default()
                },
                errors: Vec::new(),
            },
            pagerank: Vec::new(),
            rejected: Vec::new(),
        }
    }

    #[test]
    fn args_override_config() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: AnalyzeArgs,
        }

        let parsed =
            Wrapper::parse_from(["test", "units.json", "--hub-limit", "3", "--seed", "11"]);
        let config = parsed.args.apply(&AnalysisConfig::default());
        assert_eq!(config.hub_limit, 3);
        assert_eq!(config.seed, Some(11));
        assert_eq!(config.bridge_limit, AnalysisConfig::default().bridge_limit);
    }

    #[test]
    fn text_lines_are_tab_separated() {
        let mut out = Vec::new();
        render_analyze_text(&sample_payload(), &mut out).expect("render");
        let rendered = String::from_utf8(out).expect("utf8");

        assert!(rendered.contains("hub\tUser\t3\n"));
        assert!(rendered.contains("cycle\tA -> B -> A\n"));
        assert!(rendered.contains("bridge\tB\t2\n"));
        assert!(!rendered.contains("warning"));
    }

    #[test]
    fn pretty_output_has_sections() {
        let mut out = Vec::new();
        render_analyze_pretty(&sample_payload(), &mut out).expect("render");
        let rendered = String::from_utf8(out).expect("utf8");

        assert!(rendered.contains("Orphans (1)"));
        assert!(rendered.contains("Cycles (1)"));
        assert!(rendered.contains("A -> B -> A"));
        assert!(!rendered.contains("Problems"));
    }

    #[test]
    fn json_payload_flattens_report() {
        let value = serde_json::to_value(sample_payload()).expect("json");
        assert_eq!(value["hubs"][0]["identifier"], "User");
        assert_eq!(value["stats"]["node_count"], 5);
        assert!(value.get("rejected").is_none());
        assert!(value.get("errors").is_none());
    }
}
