//! Build-phase handle shared by concurrent extractor workers.
//!
//! Registration mutates forward and reverse adjacency together, so calls
//! are serialized behind one mutex. Each unit is validated before the lock
//! is taken: a malformed record from one producer never reaches the shared
//! graph and never holds up the others.
//!
//! [`SharedGraph::finish`] is the "extraction done" barrier. It consumes the
//! handle and returns the plain [`DependencyGraph`], which is `Sync` and
//! read without locking from then on.

use std::sync::Mutex;

use tracing::{info, instrument};

use crate::{error::GraphError, graph::store::DependencyGraph, unit::UnitRecord};

/// Mutex-guarded [`DependencyGraph`] for the shared-write build phase.
#[derive(Debug, Default)]
pub struct SharedGraph {
    inner: Mutex<DependencyGraph>,
}

impl SharedGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one unit. Atomic per unit.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidUnit`] for malformed records (shared
    /// state untouched) and [`GraphError::Poisoned`] if another producer
    /// panicked while holding the lock.
    pub fn register(&self, unit: UnitRecord) -> Result<(), GraphError> {
        unit.validate()?;
        let mut graph = self.inner.lock().map_err(|_| GraphError::Poisoned)?;
        graph.insert_validated(unit);
        Ok(())
    }

    /// Number of registered nodes so far.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Poisoned`] if the lock is poisoned.
    pub fn node_count(&self) -> Result<usize, GraphError> {
        let graph = self.inner.lock().map_err(|_| GraphError::Poisoned)?;
        Ok(graph.node_count())
    }

    /// Close the build phase and hand back the immutable graph.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Poisoned`] if a producer panicked mid-registration.
    #[instrument(skip(self))]
    pub fn finish(self) -> Result<DependencyGraph, GraphError> {
        let graph = self.inner.into_inner().map_err(|_| GraphError::Poisoned)?;
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            placeholders = graph.placeholder_count(),
            "build phase complete"
        );
        Ok(graph)
    }
}

impl From<DependencyGraph> for SharedGraph {
    fn from(graph: DependencyGraph) -> Self {
        Self {
            inner: Mutex::new(graph),
        }
    }
}
