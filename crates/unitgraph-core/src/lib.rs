#![forbid(unsafe_code)]
//! unitgraph-core library.
//!
//! Owns the input contract ([`UnitRecord`]), the in-memory
//! [`DependencyGraph`], the build-phase [`SharedGraph`] handle, and the
//! serializable [`GraphSnapshot`] export.
//!
//! # Conventions
//!
//! - **Errors**: Library boundaries return [`GraphError`]; configuration
//!   loading uses `anyhow::Result` with context.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod graph;
pub mod unit;

pub use config::AnalysisConfig;
pub use error::{ErrorCode, GraphError};
pub use graph::{DependencyGraph, EdgeView, GraphSnapshot, NodeRef, SharedGraph};
pub use unit::{Dependency, UnitKind, UnitRecord};
