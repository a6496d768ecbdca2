//! Error Types
//!
//! This module defines the error type used throughout the engine.
//!
//! # Overview
//!
//! [`EngineError`] covers every failure mode of the core:
//! - Handle lookups that miss (`NotFound`)
//! - Managed objects whose setup step fails (`InitializationFailed`)
//! - Requests that would break an invariant (`InvalidOperation`)
//! - Loader I/O and decode problems
//! - GPU errors reported by a graphics context
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, EngineError>`.
//!
//! ```rust,ignore
//! use lantern::errors::{EngineError, Result};
//!
//! fn lookup(scene: &Scene, id: MeshId) -> Result<usize> {
//!     Ok(scene.resources().mesh(id)?.vertex_count())
//! }
//! ```

use thiserror::Error;

/// The main error type for the Lantern engine.
#[derive(Error, Debug)]
pub enum EngineError {
    // ========================================================================
    // Identity & Lifecycle Errors
    // ========================================================================
    /// A handle did not resolve to a live instance.
    ///
    /// Returned for unknown ids, ids that were already deleted, and the null
    /// id when the manager has no fallback instance.
    #[error("{kind} not found (id: {id})")]
    NotFound {
        /// Resource kind name, e.g. `"Mesh"`
        kind: &'static str,
        /// Raw handle value
        id: u64,
    },

    /// A managed object's post-construction setup step failed.
    ///
    /// The creation call is aborted and nothing is stored.
    #[error("Failed to initialize {kind}: {reason}")]
    InitializationFailed {
        /// Resource kind name
        kind: &'static str,
        /// What the setup step reported
        reason: String,
    },

    /// The request would break a structural invariant (cycles, placement
    /// rules, writes to shared vertex stores, ...).
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    // ========================================================================
    // Geometry Errors
    // ========================================================================
    /// A triangle referenced a vertex that does not exist.
    ///
    /// Triangle indices are not checked when added; this surfaces when a
    /// vertex buffer is built.
    #[error("Vertex index {index} out of range (vertex count: {count})")]
    VertexIndexOutOfRange {
        /// Offending index
        index: u32,
        /// Number of vertices visible to the part
        count: usize,
    },

    // ========================================================================
    // I/O & Decode Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image data could not be decoded.
    #[error("Image decode error: {0}")]
    ImageDecode(String),

    // ========================================================================
    // GPU Errors
    // ========================================================================
    /// The graphics API reported an error after a state-mutating call.
    #[error("GPU error at {site}: {message}")]
    Gpu {
        /// Call site that issued the failing command
        site: &'static str,
        /// Message reported by the graphics API
        message: String,
    },

    /// The owning thread's task queue was shut down before a queued upload ran.
    #[error("Upload queue closed")]
    UploadQueueClosed,
}

impl From<image::ImageError> for EngineError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(io) => Self::Io(io),
            other => Self::ImageDecode(other.to_string()),
        }
    }
}

impl EngineError {
    /// Shorthand for a [`EngineError::NotFound`] built from a kind name and raw id.
    #[must_use]
    pub fn not_found(kind: &'static str, id: u64) -> Self {
        Self::NotFound { kind, id }
    }

    /// Returns `true` for the not-found condition.
    ///
    /// Callers that treat a miss as recoverable can branch on this instead of
    /// matching the variant.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Alias for `Result<T, EngineError>`.
pub type Result<T> = std::result::Result<T, EngineError>;
