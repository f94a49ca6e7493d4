//! Unified error types for the dwa ecosystem
//!
//! This module provides a common error type [`DwaError`] that can represent
//! errors from any part of the system: ingestion, tree assembly, and the
//! store boundary. Two variants are fatal per sector and abort only that
//! sector's analysis: [`DwaError::RootNotFound`] and
//! [`DwaError::StructuralCycle`]. Measurement inconsistencies (negative
//! waste) are never errors; they travel through results as data.

use crate::{MeterId, SectorId};
use thiserror::Error;

/// Unified error type for all dwa operations.
#[derive(Error, Debug)]
pub enum DwaError {
    /// No generator root and no configured override resolvable for a sector.
    #[error("no root meter found for sector {0}")]
    RootNotFound(SectorId),

    /// Cyclic parent/child edges detected during tree assembly.
    #[error("cyclic parent/child edge at meter {0}")]
    StructuralCycle(MeterId),

    /// Raw node-type label not in the ingestion mapping table.
    #[error("unrecognized meter kind label: {0:?}")]
    UnknownMeterKind(String),

    /// Strict-mode rejection of a child kind not allowed under its parent.
    #[error("meter {child} ({child_kind}) is not an allowed child of {parent} ({parent_kind})")]
    InvalidChild {
        parent: MeterId,
        parent_kind: crate::MeterKind,
        child: MeterId,
        child_kind: crate::MeterKind,
    },

    /// Upstream data-access failure, propagated unchanged. The engine
    /// performs no retries; retry policy belongs to the store.
    #[error("store error: {0}")]
    Store(String),

    /// I/O errors (snapshot files etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("parse error: {0}")]
    Parse(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using DwaError.
pub type DwaResult<T> = Result<T, DwaError>;

impl From<anyhow::Error> for DwaError {
    fn from(err: anyhow::Error) -> Self {
        DwaError::Other(err.to_string())
    }
}

impl From<String> for DwaError {
    fn from(s: String) -> Self {
        DwaError::Other(s)
    }
}

impl From<&str> for DwaError {
    fn from(s: &str) -> Self {
        DwaError::Other(s.to_string())
    }
}
