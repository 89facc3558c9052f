// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Processing configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FolioError, Result};

/// Direction used when turning a double-page spread upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationDirection {
    #[default]
    CounterClockwise,
    Clockwise,
}

/// Noise suppression applied to the background difference before the
/// bounding box is taken: each channel becomes `(d + d) / scale + offset`,
/// clamped to the channel range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimPolicy {
    pub scale: f32,
    pub offset: f32,
}

impl Default for TrimPolicy {
    fn default() -> Self {
        Self {
            scale: 2.0,
            offset: -100.0,
        }
    }
}

/// Settings shared by every page in a processing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Keep the right half of a split spread instead of the left.
    pub right_to_left: bool,
    /// Number of pages processed concurrently in batch mode.
    pub max_workers: usize,
    /// Rotation applied by `rotate_double_pages`.
    pub rotation: RotationDirection,
    /// Border trim constants.
    pub trim: TrimPolicy,
    /// Inserted between the file stem and extension of the split-off half.
    /// Only emptiness and path separators are rejected: `"."` gives
    /// `05..png` and `".png"` gives `05.png.png`, so pick a suffix the
    /// downstream packager will sort after the source page.
    pub split_suffix: String,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            right_to_left: false,
            max_workers: 4,
            rotation: RotationDirection::default(),
            trim: TrimPolicy::default(),
            split_suffix: ".5".into(),
        }
    }
}

impl ProcessConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the processor cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(FolioError::InvalidConfig(
                "max_workers must be at least 1".into(),
            ));
        }
        if !self.trim.scale.is_finite() || self.trim.scale <= 0.0 {
            return Err(FolioError::InvalidConfig(format!(
                "trim scale must be a positive number, got {}",
                self.trim.scale
            )));
        }
        if !self.trim.offset.is_finite() {
            return Err(FolioError::InvalidConfig("trim offset must be finite".into()));
        }
        if self.split_suffix.is_empty() {
            return Err(FolioError::InvalidConfig("split_suffix must not be empty".into()));
        }
        if self.split_suffix.contains(['/', '\\']) {
            return Err(FolioError::InvalidConfig(format!(
                "split_suffix must not contain a path separator: {:?}",
                self.split_suffix
            )));
        }
        Ok(())
    }
}
