// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The closed set of post-processing operations understood by the processor.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FolioError, Result};

/// A single post-processing step. A list of these is an ordered pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// If the page is wider than it is tall, rotate it 90 degrees.
    RotateDoublePages,
    /// If the page is wider than it is tall, split it into two halves.
    SplitDoublePages,
    /// Conservatively remove uniform borders.
    TrimBorders,
    /// Disable processing for the whole pipeline, wherever it appears.
    #[serde(rename = "none", alias = "no_postprocessing")]
    NoPostprocessing,
}

impl Operation {
    /// Every member of the set, in declaration order.
    pub const ALL: [Operation; 4] = [
        Self::RotateDoublePages,
        Self::SplitDoublePages,
        Self::TrimBorders,
        Self::NoPostprocessing,
    ];

    /// Canonical identifier, as accepted by [`FromStr`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RotateDoublePages => "rotate_double_pages",
            Self::SplitDoublePages => "split_double_pages",
            Self::TrimBorders => "trim_borders",
            Self::NoPostprocessing => "none",
        }
    }

    /// Whether `operations` disables processing altogether.
    pub fn disables_processing(operations: &[Operation]) -> bool {
        operations.contains(&Self::NoPostprocessing)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "rotate_double_pages" => Ok(Self::RotateDoublePages),
            "split_double_pages" => Ok(Self::SplitDoublePages),
            "trim_borders" => Ok(Self::TrimBorders),
            "none" | "no_postprocessing" => Ok(Self::NoPostprocessing),
            other => Err(FolioError::UnsupportedOperation(other.to_string())),
        }
    }
}

/// Parse a whole pipeline of identifiers, rejecting it on the first unknown
/// one so nothing is dispatched with a partially valid list.
pub fn parse_operations<S: AsRef<str>>(identifiers: &[S]) -> Result<Vec<Operation>> {
    identifiers.iter().map(|id| id.as_ref().parse()).collect()
}
