//! `ug impact`: which units need re-extraction after files change.

use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use unitgraph_core::{DependencyGraph, UnitKind};

use super::load_graph;
use crate::output::{OutputMode, pretty_section, render_mode};

/// Arguments for `ug impact`.
#[derive(Args, Debug, Default)]
pub struct ImpactArgs {
    /// Unit record dump or exported snapshot.
    #[arg(value_name = "UNITS")]
    pub input: PathBuf,

    /// Changed source files, as recorded in unit `file_path`s.
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<String>,

    /// Only report affected units of this kind (e.g. `model`, `job`).
    #[arg(long, value_name = "KIND")]
    pub kind: Option<UnitKind>,
}

#[derive(Debug, Serialize)]
struct ImpactOutput {
    changed_files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<UnitKind>,
    /// Units defined in the changed files plus everything that depends on
    /// them, sorted.
    affected: Vec<String>,
}

/// Execute `ug impact`.
pub fn run_impact(args: &ImpactArgs, output: OutputMode) -> anyhow::Result<()> {
    let loaded = load_graph(std::slice::from_ref(&args.input))?;
    let affected = affected_units(&loaded.graph, &args.files, args.kind);

    let payload = ImpactOutput {
        changed_files: args.files.clone(),
        kind: args.kind,
        affected,
    };

    render_mode(output, &payload, render_impact_text, render_impact_pretty)
}

fn affected_units(
    graph: &DependencyGraph,
    files: &[String],
    kind: Option<UnitKind>,
) -> Vec<String> {
    let affected = graph.affected_by(files);
    let Some(kind) = kind else {
        return affected;
    };
    let of_kind: HashSet<&str> = graph.units_of_kind(kind).into_iter().collect();
    affected
        .into_iter()
        .filter(|id| of_kind.contains(id.as_str()))
        .collect()
}

fn render_impact_text(payload: &ImpactOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for id in &payload.affected {
        writeln!(w, "{id}")?;
    }
    Ok(())
}

fn render_impact_pretty(payload: &ImpactOutput, w: &mut dyn Write) -> std::io::Result<()> {
    let kind = payload
        .kind
        .map_or_else(String::new, |kind| format!(", {kind} only"));
    pretty_section(
        w,
        &format!(
            "Affected units ({}) for {} changed file(s){kind}",
            payload.affected.len(),
            payload.changed_files.len()
        ),
    )?;
    if payload.affected.is_empty() {
        writeln!(w, "  No registered unit is defined in the changed files.")?;
    }
    for id in &payload.affected {
        writeln!(w, "  {id}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_parse_input_then_files() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: ImpactArgs,
        }

        let parsed = Wrapper::parse_from(["test", "units.json", "a.rb", "b.rb"]);
        assert_eq!(parsed.args.input, PathBuf::from("units.json"));
        assert_eq!(parsed.args.files, vec!["a.rb", "b.rb"]);
    }

    #[test]
    fn pretty_reports_empty_impact() {
        let payload = ImpactOutput {
            changed_files: vec!["README.md".into()],
            kind: None,
            affected: Vec::new(),
        };
        let mut out = Vec::new();
        render_impact_pretty(&payload, &mut out).expect("render");
        let rendered = String::from_utf8(out).expect("utf8");
        assert!(rendered.contains("Affected units (0)"));
        assert!(rendered.contains("No registered unit"));
    }

    #[test]
    fn kind_filter_narrows_affected_units() {
        use unitgraph_core::UnitRecord;

        let mut graph = DependencyGraph::new();
        graph
            .register_all([
                UnitRecord::new("User", UnitKind::Model).with_file("app/models/user.rb"),
                UnitRecord::new("Order", UnitKind::Model).depends_on("User", "association"),
                UnitRecord::new("SyncUserJob", UnitKind::Job).depends_on("User", "method_call"),
            ])
            .expect("register");
        let files = vec!["app/models/user.rb".to_string()];

        assert_eq!(
            affected_units(&graph, &files, None),
            vec!["Order", "SyncUserJob", "User"]
        );
        assert_eq!(
            affected_units(&graph, &files, Some(UnitKind::Job)),
            vec!["SyncUserJob"]
        );
        assert!(affected_units(&graph, &files, Some(UnitKind::Mailer)).is_empty());
    }

    #[test]
    fn kind_flag_accepts_aliases() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: ImpactArgs,
        }

        let parsed = Wrapper::parse_from(["test", "units.json", "a.rb", "--kind", "Model"]);
        assert_eq!(parsed.args.kind, Some(UnitKind::Model));
        assert!(Wrapper::try_parse_from(["test", "units.json", "a.rb", "--kind", "widget"]).is_err());
    }
}
