//! `ug export`: print the built graph as a snapshot.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use tracing::warn;
use unitgraph_core::GraphSnapshot;

use super::load_graph;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `ug export`.
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Unit record dumps or exported snapshots.
    #[arg(required = true, value_name = "FILE")]
    pub inputs: Vec<PathBuf>,
}

/// Execute `ug export`.
///
/// JSON output is exactly a [`GraphSnapshot`], so it can be passed back to
/// any command as an input file.
pub fn run_export(args: &ExportArgs, output: OutputMode) -> anyhow::Result<()> {
    let loaded = load_graph(&args.inputs)?;
    if !loaded.rejected.is_empty() {
        warn!(
            rejected = loaded.rejected.len(),
            "some unit records were skipped"
        );
    }

    let snapshot = loaded.graph.to_snapshot();
    render_mode(output, &snapshot, render_export_text, render_export_pretty)
}

fn render_export_text(snapshot: &GraphSnapshot, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "hash\t{}", snapshot.content_hash)?;
    for (id, node) in &snapshot.nodes {
        writeln!(w, "node\t{id}\t{}\t{}", node.kind, node.file_path)?;
    }
    for edge in &snapshot.edges {
        writeln!(
            w,
            "edge\t{}\t{}\t{}",
            edge.source, edge.target, edge.relationship
        )?;
    }
    Ok(())
}

fn render_export_pretty(snapshot: &GraphSnapshot, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Snapshot")?;
    pretty_kv(w, "Nodes", snapshot.nodes.len().to_string())?;
    pretty_kv(w, "Edges", snapshot.edges.len().to_string())?;
    pretty_kv(w, "Content hash", &snapshot.content_hash)?;

    writeln!(w)?;
    pretty_section(w, "Edges")?;
    if snapshot.edges.is_empty() {
        writeln!(w, "  (none)")?;
    }
    for edge in &snapshot.edges {
        let dangling = if snapshot.nodes.contains_key(&edge.target) {
            ""
        } else {
            "  (unregistered)"
        };
        match &edge.via {
            Some(via) => writeln!(
                w,
                "  {} -> {} [{} via {via}]{dangling}",
                edge.source, edge.target, edge.relationship
            )?,
            None => writeln!(
                w,
                "  {} -> {} [{}]{dangling}",
                edge.source, edge.target, edge.relationship
            )?,
        }
    }
    Ok(())
}
