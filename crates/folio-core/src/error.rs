// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Folio.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all Folio operations.
#[derive(Debug, Error)]
pub enum FolioError {
    // -- Pipeline errors --
    #[error("{0} is not a valid post-processing operation")]
    UnsupportedOperation(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Image errors --
    #[error("failed to decode {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("error in {}: {reason}", .path.display())]
    Storage { path: PathBuf, reason: String },

    // -- Batch execution --
    #[error("worker pool error: {0}")]
    WorkerPool(String),

    // -- Ambient --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FolioError {
    /// The image file the error refers to, when there is one.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Decode { path, .. } | Self::Storage { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FolioError>;
