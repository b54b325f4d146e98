//! Command handlers and the shared unit loader.
//!
//! Every command starts from one or more input files. Each file is either:
//!
//! - a JSON array of unit records (one extraction dump),
//! - an object with a `units` array, or
//! - a snapshot written by `ug export --json`.
//!
//! Files are loaded by one worker each, all registering into a single
//! [`SharedGraph`]. A malformed record is reported and skipped; it never
//! stops the rest of the load.

pub mod analyze;
pub mod export;
pub mod impact;

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{Context, Result, anyhow, bail};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};
use unitgraph_core::{DependencyGraph, GraphError, GraphSnapshot, SharedGraph, UnitRecord};

/// A unit record left out of the graph because it failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejected {
    pub source: String,
    /// Position of the record in its input array.
    pub index: usize,
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct LoadedGraph {
    pub graph: DependencyGraph,
    pub rejected: Vec<Rejected>,
}

enum Input {
    Units(Vec<Value>),
    Snapshot(Box<GraphSnapshot>),
}

fn read_input(path: &Path) -> Result<Input> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {} as JSON", path.display()))?;

    if value.get("nodes").is_some() {
        let snapshot: GraphSnapshot = serde_json::from_value(value)
            .with_context(|| format!("{} is not a valid graph snapshot", path.display()))?;
        if !snapshot.verify_hash() {
            warn!(path = %path.display(), "snapshot content hash mismatch");
        }
        return Ok(Input::Snapshot(Box::new(snapshot)));
    }

    match value {
        Value::Array(units) => Ok(Input::Units(units)),
        Value::Object(mut map) => match map.remove("units") {
            Some(Value::Array(units)) => Ok(Input::Units(units)),
            _ => bail!("{}: object input needs a `units` array", path.display()),
        },
        _ => bail!(
            "{}: expected a JSON array of unit records or a graph snapshot",
            path.display()
        ),
    }
}

fn register_input(
    shared: &SharedGraph,
    source: &Path,
    input: Input,
) -> Result<Vec<Rejected>, GraphError> {
    let source_name = source.display().to_string();
    let mut rejected = Vec::new();

    match input {
        Input::Units(values) => {
            debug!(source = %source_name, units = values.len(), "registering unit records");
            for (index, value) in values.into_iter().enumerate() {
                match UnitRecord::from_value(value).and_then(|unit| shared.register(unit)) {
                    Ok(()) => {}
                    Err(GraphError::Poisoned) => return Err(GraphError::Poisoned),
                    Err(err) => {
                        warn!(source = %source_name, index, error = %err, "skipping unit record");
                        rejected.push(Rejected {
                            source: source_name.clone(),
                            index,
                            code: err.code().code(),
                            message: err.to_string(),
                        });
                    }
                }
            }
        }
        Input::Snapshot(snapshot) => {
            debug!(source = %source_name, nodes = snapshot.nodes.len(), "registering snapshot");
            for unit in snapshot.to_units()? {
                shared.register(unit)?;
            }
        }
    }

    Ok(rejected)
}

/// Load every input into one graph.
///
/// Registration order is preserved within a file. Across files, a unit
/// registered by more than one input resolves to whichever worker wrote last.
#[instrument(skip_all, fields(inputs = paths.len()))]
pub fn load_graph(paths: &[PathBuf]) -> Result<LoadedGraph> {
    let inputs = paths
        .iter()
        .map(|path| read_input(path).map(|input| (path.as_path(), input)))
        .collect::<Result<Vec<_>>>()?;

    let shared = SharedGraph::new();
    let rejected = thread::scope(|scope| -> Result<Vec<Rejected>> {
        let handles: Vec<_> = inputs
            .into_iter()
            .map(|(path, input)| {
                let shared = &shared;
                scope.spawn(move || register_input(shared, path, input))
            })
            .collect();

        let mut rejected = Vec::new();
        for handle in handles {
            let batch = handle
                .join()
                .map_err(|_| anyhow!("loader worker panicked"))??;
            rejected.extend(batch);
        }
        Ok(rejected)
    })?;

    let graph = shared.finish()?;
    Ok(LoadedGraph { graph, rejected })
}
