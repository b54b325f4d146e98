#![forbid(unsafe_code)]
//! unitgraph-analysis library.
//!
//! Read-only structural diagnostics over a built
//! [`unitgraph_core::DependencyGraph`]. Start with [`GraphAnalyzer`]:
//!
//! ```rust
//! use unitgraph_analysis::GraphAnalyzer;
//! use unitgraph_core::{AnalysisConfig, DependencyGraph, UnitKind, UnitRecord};
//!
//! let mut graph = DependencyGraph::new();
//! graph.register(UnitRecord::new("A", UnitKind::Service).depends_on("B", "method_call")).unwrap();
//! graph.register(UnitRecord::new("B", UnitKind::Service).depends_on("A", "method_call")).unwrap();
//!
//! let analyzer = GraphAnalyzer::new(&graph, AnalysisConfig::default().with_seed(7));
//! assert_eq!(analyzer.cycles(), vec![vec!["A", "B", "A"]]);
//! ```
//!
//! # Conventions
//!
//! - **Errors**: Internal invariant violations are [`AnalysisError`] values;
//!   the public query methods recover from them and log a warning.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod analyzer;
pub mod bridges;
pub mod cycles;
pub mod diagnostics;
pub mod error;
pub mod pagerank;
pub mod topology;

pub use analyzer::{AnalysisReport, AnalysisStats, GraphAnalyzer, SectionError};
pub use bridges::Bridge;
pub use diagnostics::Hub;
pub use error::AnalysisError;
pub use pagerank::{PageRankResult, RankedUnit};
pub use topology::Topology;
