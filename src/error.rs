//! Error types for the land-record-search library.
//!
//! This module provides custom error types using `thiserror` for better error handling
//! and more specific error messages throughout the application.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A single violated constraint on a named request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Wire name of the offending field (e.g. `mobileNumber`)
    pub field: String,
    /// Human readable reason
    pub reason: String,
}

impl FieldViolation {
    /// Build a violation for `field`.
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// A malformed or incomplete search request, with every violated constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// All field-level violations found in the request
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// Record another violation.
    pub fn push(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.violations.push(FieldViolation::new(field, reason));
    }

    /// True when no constraint was violated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// True when `field` has at least one violation.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    /// Field names with violations, in reporting order.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.field.as_str()).collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .violations
            .iter()
            .map(|v| format!("{}: {}", v.field, v.reason))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationError {}

/// Errors that can occur in the land-record-search application.
#[derive(Error, Debug)]
pub enum LandRecordError {
    /// The request failed shape or field validation
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A point lookup referenced an entity that does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind (state, district, ...)
        entity: &'static str,
        /// Identifier that was looked up
        id: u64,
    },

    /// An insert referenced a parent that does not exist
    #[error("{entity} references unknown parent {parent_id}")]
    UnknownParent {
        /// Entity kind being inserted
        entity: &'static str,
        /// Missing parent identifier
        parent_id: u64,
    },

    /// A sibling with the same code already exists under the parent
    #[error("Duplicate {entity} code: {code}")]
    DuplicateCode {
        /// Entity kind being inserted
        entity: &'static str,
        /// Code that is already taken
        code: String,
    },

    /// A land record with the same property UID already exists
    #[error("Duplicate property UID: {0}")]
    DuplicatePropertyUid(String),

    /// A search request status change that would leave a terminal state
    #[error("Search request {id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Search request identifier
        id: u64,
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// Backing store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Generic search failure surfaced to callers
    #[error("{0}")]
    Search(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML seed file errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Binary serialization errors
    #[error("Binary serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Embedded audit log errors
    #[error("Cache error: {0}")]
    Cache(String),
}

/// Convenience type alias for Result with `LandRecordError`
pub type Result<T> = std::result::Result<T, LandRecordError>;

impl From<sled::Error> for LandRecordError {
    fn from(err: sled::Error) -> Self {
        Self::Cache(err.to_string())
    }
}
