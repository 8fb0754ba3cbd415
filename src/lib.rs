//! Land Record Search - hierarchical land record lookup for India
//!
//! A Rust library and HTTP service for finding land records (7/12 extracts,
//! 8A extracts, property cards, K-prat) by walking the
//! state → district → taluka → village hierarchy or by property UID.
//!
//! # Features
//!
//! - Cascading location lookups with English, Hindi and regional names
//! - Search by survey/subdivision, owner name fragment, or property UID
//! - Field-level validation of every search request
//! - Audit trail of every accepted search (in memory or sled-backed)
//! - Captcha issue and optional verification

/// HTTP routes and error mapping
pub mod api;
/// Persistent search audit log
pub mod audit_log;
/// Captcha challenges
pub mod captcha;
/// Configuration management
pub mod config;
/// Error types
pub mod error;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Repository pattern for data access
pub mod repository;
/// Seed datasets
pub mod seed;
/// Search orchestration
pub mod service;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use error::{LandRecordError, Result, ValidationError};
pub use models::{LandRecord, RawSearchRequest, RecordType, SearchOutcome, SearchStatus};
pub use repository::InMemoryRepository;
pub use service::SearchService;
