//! Dependency graph module.
//!
//! # Overview
//!
//! Extraction produces a batch of [`crate::UnitRecord`]s. Each record is
//! registered into one [`DependencyGraph`] per run; once registration is
//! complete the graph is treated as immutable and handed to the analyzers.
//!
//! ## Pipeline
//!
//! ```text
//! extractor workers (many threads)
//!        ↓  shared::SharedGraph::register()   (serialized, atomic per unit)
//! SharedGraph
//!        ↓  shared::SharedGraph::finish()     ("extraction done" barrier)
//! DependencyGraph (immutable, Sync)
//!        ↓  snapshot::GraphSnapshot            (export / re-import)
//! ```
//!
//! ## Edge Direction
//!
//! An edge `A → B` means "A depends on B". `B`'s dependents are therefore
//! the sources of its incoming edges.
//!
//! ## Dangling Targets
//!
//! An edge may point at an identifier that was never registered. The target
//! is kept as a placeholder so its dependents are still counted, but it is
//! not a node: it never shows up in [`DependencyGraph::nodes`].
//!
//! ## Typical Usage
//!
//! ```rust
//! use unitgraph_core::{DependencyGraph, UnitKind, UnitRecord};
//!
//! let mut graph = DependencyGraph::new();
//! graph.register(UnitRecord::new("User", UnitKind::Model)).unwrap();
//! graph
//!     .register(UnitRecord::new("Order", UnitKind::Model).depends_on("User", "association"))
//!     .unwrap();
//!
//! assert!(graph.dependents_of("User").contains("Order"));
//! ```

pub mod shared;
pub mod snapshot;
pub mod store;

pub use shared::SharedGraph;
pub use snapshot::{EdgeEntry, GraphSnapshot, NodeEntry};
pub use store::{DependencyGraph, EdgeView, NodeRef};
