//! Error types for the safe-apply planner.
//!
//! This module provides the error hierarchy for every stage of a planning
//! run: loading the deployment declaration, building the dependency graph,
//! and producing the change plan.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the safe-apply planner.
#[derive(Debug, Error)]
pub enum SafeApplyError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Dependency graph errors.
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Planning errors.
    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },
}

/// Dependency graph errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// An edge references a node that was never registered.
    #[error("Unknown graph node: {name}")]
    UnknownNode {
        /// Name of the missing node.
        name: String,
    },

    /// No path exists between the requested endpoints.
    #[error("No dependency path from {from} to {to}")]
    NoPath {
        /// Start of the requested path.
        from: String,
        /// End of the requested path.
        to: String,
    },
}

/// Planning errors.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The plan output and the graph export were both to be read from stdin.
    #[error("Plan output and graph export cannot both be read from stdin")]
    StdinConflict,

    /// Plan output could not be read.
    #[error("Failed to read plan output from {source_name}: {message}")]
    UnreadableInput {
        /// Where the input was read from.
        source_name: String,
        /// Description of the failure.
        message: String,
    },
}

/// Result type alias for safe-apply operations.
pub type Result<T> = std::result::Result<T, SafeApplyError>;

impl SafeApplyError {
    /// Returns true if planning cannot continue after this error.
    ///
    /// A missing dependency path only means no dependency information is
    /// available for one item.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::Graph(GraphError::NoPath { .. }))
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }
}

impl GraphError {
    /// Creates a missing-path error.
    #[must_use]
    pub fn no_path(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::NoPath {
            from: from.into(),
            to: to.into(),
        }
    }
}
