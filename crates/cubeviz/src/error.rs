//! Error types for cubeviz operations.
//!
//! The taxonomy distinguishes user precondition errors, transport-level fetch
//! failures, and scope-store IO failures. Domain failure statuses carried
//! inside a successful response are surfaced as view notices, not errors.
//! Precondition violations on cluster operations (unknown node ids) are not
//! represented here: they are usage defects and panic instead.

use std::io;
use thiserror::Error;

/// The error type for cubeviz operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No cube is selected in the hosting application, so there is nothing
    /// to visualize. No backend call is attempted.
    #[error("no cube selected")]
    NoCubeSelected,

    /// Transport-level failure while calling the backend. Distinct from a
    /// domain failure status carried inside a successful response.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// IO error from the persisted scope store.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Serialization error while reading or writing the persisted scope store.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A specialized Result type for cubeviz operations.
pub type Result<T> = std::result::Result<T, Error>;
