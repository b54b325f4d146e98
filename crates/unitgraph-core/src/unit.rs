//! Unit records: the facts upstream extraction hands to the graph.
//!
//! A [`UnitRecord`] describes one code artifact (model, controller, service,
//! ...) and the forward [`Dependency`] edges it declares. Records are
//! immutable once built; the graph copies what it needs at registration.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::GraphError;

/// Closed set of unit kinds produced by extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Model,
    Controller,
    Service,
    Job,
    Mailer,
    Component,
    Concern,
    Helper,
    Serializer,
    Policy,
    Validator,
    Route,
    Middleware,
    Migration,
    #[serde(alias = "graph_ql")]
    Graphql,
    /// Externally-vendored source (framework or gem internals). These have
    /// no in-app dependents by construction and are never orphans.
    #[serde(alias = "rails_source", alias = "gem_source", alias = "vendored")]
    Framework,
    Other,
}

impl UnitKind {
    pub const ALL: [Self; 17] = [
        Self::Model,
        Self::Controller,
        Self::Service,
        Self::Job,
        Self::Mailer,
        Self::Component,
        Self::Concern,
        Self::Helper,
        Self::Serializer,
        Self::Policy,
        Self::Validator,
        Self::Route,
        Self::Middleware,
        Self::Migration,
        Self::Graphql,
        Self::Framework,
        Self::Other,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Controller => "controller",
            Self::Service => "service",
            Self::Job => "job",
            Self::Mailer => "mailer",
            Self::Component => "component",
            Self::Concern => "concern",
            Self::Helper => "helper",
            Self::Serializer => "serializer",
            Self::Policy => "policy",
            Self::Validator => "validator",
            Self::Route => "route",
            Self::Middleware => "middleware",
            Self::Migration => "migration",
            Self::Graphql => "graphql",
            Self::Framework => "framework",
            Self::Other => "other",
        }
    }

    /// Whether this kind marks externally-vendored source.
    #[must_use]
    pub const fn is_vendored(self) -> bool {
        matches!(self, Self::Framework)
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitKind {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "rails_source" | "gem_source" | "vendored" => Ok(Self::Framework),
            "graph_ql" => Ok(Self::Graphql),
            other => Self::ALL
                .into_iter()
                .find(|kind| kind.as_str() == other)
                .ok_or_else(|| GraphError::UnknownKind(s.to_string())),
        }
    }
}

fn default_relationship() -> String {
    "dependency".to_string()
}

/// A forward edge declared by a unit.
///
/// `relationship` and `via` are open-ended labels; the graph stores them but
/// no algorithm interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    /// Declared kind of the target, as extraction reported it.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Identifier of the unit this edge points at.
    pub target: String,
    /// Relationship label such as `association` or `method_call`.
    #[serde(default = "default_relationship")]
    pub relationship: String,
    /// How the relationship was discovered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via: Option<String>,
}

impl Dependency {
    #[must_use]
    pub fn new(target: impl Into<String>, relationship: impl Into<String>) -> Self {
        Self {
            kind: String::new(),
            target: target.into(),
            relationship: relationship.into(),
            via: None,
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    #[must_use]
    pub fn via(mut self, via: impl Into<String>) -> Self {
        self.via = Some(via.into());
        self
    }
}

/// One extracted code artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub identifier: String,
    #[serde(alias = "type")]
    pub kind: UnitKind,
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl UnitRecord {
    #[must_use]
    pub fn new(identifier: impl Into<String>, kind: UnitKind) -> Self {
        Self {
            identifier: identifier.into(),
            kind,
            file_path: String::new(),
            dependencies: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_file(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = file_path.into();
        self
    }

    /// Append a forward edge with the given relationship label.
    #[must_use]
    pub fn depends_on(mut self, target: impl Into<String>, relationship: impl Into<String>) -> Self {
        self.dependencies.push(Dependency::new(target, relationship));
        self
    }

    #[must_use]
    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Decode a record from loosely-typed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidUnit`] when required fields are missing
    /// or have the wrong shape (e.g. `dependencies` is not a list), and
    /// whatever [`UnitRecord::validate`] rejects.
    pub fn from_value(value: serde_json::Value) -> Result<Self, GraphError> {
        let identifier = value
            .get("identifier")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();

        let record: Self = serde_json::from_value(value)
            .map_err(|err| GraphError::invalid(&identifier, err.to_string()))?;
        record.validate()?;
        Ok(record)
    }

    /// Check the input contract.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidUnit`] for an empty identifier or an
    /// empty dependency target.
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.identifier.trim().is_empty() {
            return Err(GraphError::invalid(&self.identifier, "identifier is empty"));
        }

        if let Some(pos) = self
            .dependencies
            .iter()
            .position(|dep| dep.target.trim().is_empty())
        {
            return Err(GraphError::invalid(
                &self.identifier,
                format!("dependency #{pos} has an empty target"),
            ));
        }

        Ok(())
    }
}
