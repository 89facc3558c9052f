// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page transforms — double-page rotation, double-page splitting, and border
// trimming. Each transform is a pure function from the current image to a
// `Transform` value; persistence is left to the `Processor`.

use std::path::{Path, PathBuf};

use folio_core::error::{FolioError, Result};
use folio_core::{Operation, ProcessConfig, RotationDirection, TrimPolicy};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use imageproc::map::map_colors2;
use imageproc::rect::Rect;
use tracing::{debug, info, instrument};

/// A secondary page produced while processing a primary one, waiting to be
/// written next to it.
#[derive(Debug, Clone)]
pub struct DerivedImage {
    pub image: DynamicImage,
    pub path: PathBuf,
}

/// Result of running one transform.
#[derive(Debug, Default)]
pub struct Transform {
    /// Replacement for the primary image, or `None` if it is unchanged.
    pub image: Option<DynamicImage>,
    /// Pages split off the primary image, in the order they were produced.
    pub derived: Vec<DerivedImage>,
}

impl Transform {
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn replaced(image: DynamicImage) -> Self {
        Self {
            image: Some(image),
            derived: Vec::new(),
        }
    }

    pub fn with_derived(mut self, derived: DerivedImage) -> Self {
        self.derived.push(derived);
        self
    }

    pub fn is_unchanged(&self) -> bool {
        self.image.is_none() && self.derived.is_empty()
    }
}

/// What a transform knows about the page beyond its pixels.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    /// File the page was loaded from; derived pages are named after it.
    pub source: &'a Path,
    pub config: &'a ProcessConfig,
}

pub type TransformFn = fn(&DynamicImage, &TransformContext<'_>) -> Result<Transform>;

/// Map an operation to its transform. `NoPostprocessing` has none: it is a
/// pipeline-level switch, not a step.
pub fn transform_for(operation: Operation) -> Option<TransformFn> {
    match operation {
        Operation::RotateDoublePages => Some(rotate_double_pages),
        Operation::SplitDoublePages => Some(split_double_pages),
        Operation::TrimBorders => Some(trim_borders),
        Operation::NoPostprocessing => None,
    }
}

fn is_spread(image: &DynamicImage) -> bool {
    image.width() > image.height()
}

/// Rotate a landscape page by 90 degrees, expanding the canvas so the page
/// becomes portrait. Portrait and square pages are left alone.
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn rotate_double_pages(image: &DynamicImage, ctx: &TransformContext<'_>) -> Result<Transform> {
    if !is_spread(image) {
        debug!("Page is not a spread, skipping rotation");
        return Ok(Transform::unchanged());
    }

    let rotated = match ctx.config.rotation {
        RotationDirection::CounterClockwise => image.rotate270(),
        RotationDirection::Clockwise => image.rotate90(),
    };
    info!(direction = ?ctx.config.rotation, "Rotated double page");
    Ok(Transform::replaced(rotated))
}

/// Split a landscape page down the middle. The half that stays in place
/// depends on the reading direction; the other half is returned as a derived
/// page named after the source file.
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn split_double_pages(image: &DynamicImage, ctx: &TransformContext<'_>) -> Result<Transform> {
    if !is_spread(image) {
        debug!("Page is not a spread, skipping split");
        return Ok(Transform::unchanged());
    }

    let (width, height) = image.dimensions();
    let mid = width / 2;
    let left = image.crop_imm(0, 0, mid, height);
    let right = image.crop_imm(mid, 0, width - mid, height);

    let (kept, split_off) = if ctx.config.right_to_left {
        (right, left)
    } else {
        (left, right)
    };

    let path = derived_path(ctx.source, &ctx.config.split_suffix)?;
    info!(
        at = mid,
        right_to_left = ctx.config.right_to_left,
        derived = %path.display(),
        "Split double page"
    );
    Ok(Transform::replaced(kept).with_derived(DerivedImage {
        image: split_off,
        path,
    }))
}

/// Crop away a uniform border whose colour is taken from the top-left pixel.
/// A page with no content distinguishable from that colour is left alone.
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn trim_borders(image: &DynamicImage, ctx: &TransformContext<'_>) -> Result<Transform> {
    let Some(bounds) = content_bounds(image, &ctx.config.trim) else {
        debug!("No content found against background, skipping trim");
        return Ok(Transform::unchanged());
    };

    if bounds.left() == 0
        && bounds.top() == 0
        && bounds.width() == image.width()
        && bounds.height() == image.height()
    {
        debug!("Content reaches every edge, nothing to trim");
        return Ok(Transform::unchanged());
    }

    info!(
        x = bounds.left(),
        y = bounds.top(),
        w = bounds.width(),
        h = bounds.height(),
        "Trimmed borders"
    );
    Ok(Transform::replaced(image.crop_imm(
        bounds.left() as u32,
        bounds.top() as u32,
        bounds.width(),
        bounds.height(),
    )))
}

/// Bounding box of every pixel that differs from the top-left background
/// colour by more than the noise floor set by `policy`.
pub fn content_bounds(image: &DynamicImage, policy: &TrimPolicy) -> Option<Rect> {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let background = RgbaImage::from_pixel(width, height, *rgba.get_pixel(0, 0));
    let amplified = map_colors2(&rgba, &background, |p: Rgba<u8>, q: Rgba<u8>| {
        let mut out = [0u8; 4];
        for (channel, (a, b)) in out.iter_mut().zip(p.0.iter().zip(q.0.iter())) {
            *channel = amplify(a.abs_diff(*b), policy);
        }
        Rgba(out)
    });

    let mut min = (u32::MAX, u32::MAX);
    let mut max = (0u32, 0u32);
    for (x, y, pixel) in amplified.enumerate_pixels() {
        if pixel.0.iter().any(|&c| c != 0) {
            min = (min.0.min(x), min.1.min(y));
            max = (max.0.max(x), max.1.max(y));
        }
    }

    if min.0 == u32::MAX {
        return None;
    }
    Some(Rect::at(min.0 as i32, min.1 as i32).of_size(max.0 - min.0 + 1, max.1 - min.1 + 1))
}

fn amplify(diff: u8, policy: &TrimPolicy) -> u8 {
    let d = f32::from(diff);
    ((d + d) / policy.scale + policy.offset).clamp(0.0, 255.0) as u8
}

/// Destination of the half split off `source`: the suffix goes between the
/// file stem and the extension, so `ch1/05.jpeg` becomes `ch1/05.5.jpeg`.
pub fn derived_path(source: &Path, suffix: &str) -> Result<PathBuf> {
    let stem = source.file_stem().ok_or_else(|| FolioError::Storage {
        path: source.to_path_buf(),
        reason: "cannot name a split page for a path without a file name".into(),
    })?;

    let mut name = stem.to_os_string();
    name.push(suffix);
    if let Some(ext) = source.extension() {
        name.push(".");
        name.push(ext);
    }

    let derived = source.with_file_name(name);
    if derived == source {
        return Err(FolioError::Storage {
            path: source.to_path_buf(),
            reason: format!("split suffix {suffix:?} would overwrite the page itself"),
        });
    }
    Ok(derived)
}

// -- Tests --------------------------------------------------------------------
