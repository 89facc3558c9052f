// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page processor — loads one page, runs a pipeline of operations over it, and
// writes the page (plus any split-off halves) back only if something changed.

use std::path::{Path, PathBuf};

use folio_core::error::{FolioError, Result};
use folio_core::{Operation, ProcessConfig, parse_operations};
use image::{DynamicImage, ImageFormat, ImageReader};
use tracing::{debug, info, instrument};

use crate::transform::{DerivedImage, TransformContext, transform_for};

/// What happened to a page after its pipeline ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The pipeline contained `none`; nothing was run.
    Skipped,
    /// Every operation was a no-op; nothing was written.
    Unchanged,
    /// Files written, primary page first.
    Written(Vec<PathBuf>),
}

/// Runs a pipeline of operations against a single page.
///
/// A processor lives for one page: load it, call [`Processor::apply`], and it
/// is consumed once the results are on disk.
///
/// ```ignore
/// let outcome = Processor::load("ch1/05.png", false)?
///     .apply(&[Operation::SplitDoublePages, Operation::TrimBorders], None)?;
/// ```
pub struct Processor {
    /// File the page was loaded from.
    path: PathBuf,
    /// Format sniffed from the file contents, used when the destination
    /// extension does not name one.
    format: Option<ImageFormat>,
    /// The current working image.
    image: DynamicImage,
    /// Set by every reassignment of `image`.
    modified: bool,
    /// Pages split off so far, written after the primary page.
    derived: Vec<DerivedImage>,
    config: ProcessConfig,
}

impl Processor {
    // -- Construction ---------------------------------------------------------

    /// Load a page with the default policy.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, ProcessConfig::default())
    }

    /// Load a page, choosing which half of a spread stays in place.
    pub fn load(path: impl AsRef<Path>, right_to_left: bool) -> Result<Self> {
        Self::open_with(
            path,
            ProcessConfig {
                right_to_left,
                ..Default::default()
            },
        )
    }

    /// Load a page with an explicit configuration.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open_with(path: impl AsRef<Path>, config: ProcessConfig) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref();
        let decode_error = |reason: String| FolioError::Decode {
            path: path.to_path_buf(),
            reason,
        };

        let reader = ImageReader::open(path)
            .map_err(|err| decode_error(err.to_string()))?
            .with_guessed_format()
            .map_err(|err| decode_error(err.to_string()))?;
        let format = reader.format();
        let image = reader.decode().map_err(|err| decode_error(err.to_string()))?;

        debug!(width = image.width(), height = image.height(), "Page loaded");
        Ok(Self {
            path: path.to_path_buf(),
            format,
            image,
            modified: false,
            derived: Vec::new(),
            config,
        })
    }

    /// Wrap an already-decoded page that will be written to `path`.
    pub fn from_dynamic(image: DynamicImage, path: impl Into<PathBuf>, config: ProcessConfig) -> Result<Self> {
        config.validate()?;
        let path = path.into();
        Ok(Self {
            format: ImageFormat::from_path(&path).ok(),
            path,
            image,
            modified: false,
            derived: Vec::new(),
            config,
        })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Borrow the current working image.
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Pages split off so far, not yet written.
    pub fn derived(&self) -> &[DerivedImage] {
        &self.derived
    }

    /// Whether any operation has replaced the image.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    fn set_image(&mut self, image: DynamicImage) {
        self.image = image;
        self.modified = true;
    }

    // -- Pipeline -------------------------------------------------------------

    /// Run `operations` in memory without writing anything. Each operation
    /// sees the output of the one before it. A page is split at most once:
    /// later splits are no-ops once a half has been split off.
    #[instrument(skip_all, fields(path = %self.path.display(), ops = operations.len()))]
    pub fn run(&mut self, operations: &[Operation]) -> Result<()> {
        if Operation::disables_processing(operations) {
            debug!("Processing disabled for this page");
            return Ok(());
        }

        for &operation in operations {
            let Some(transform) = transform_for(operation) else {
                continue;
            };
            if operation == Operation::SplitDoublePages && !self.derived.is_empty() {
                debug!("Page already split, skipping");
                continue;
            }
            let ctx = TransformContext {
                source: &self.path,
                config: &self.config,
            };
            let result = transform(&self.image, &ctx).map_err(|err| self.attach_path(err))?;

            if let Some(image) = result.image {
                self.set_image(image);
            }
            self.derived.extend(result.derived);
        }
        Ok(())
    }

    /// Run `operations` and persist the result. The primary page goes to
    /// `output` (default: the file it was loaded from), split-off halves to
    /// their own paths. Nothing is written unless an operation changed the page.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn apply(mut self, operations: &[Operation], output: Option<&Path>) -> Result<ProcessOutcome> {
        if Operation::disables_processing(operations) {
            return Ok(ProcessOutcome::Skipped);
        }

        self.run(operations)?;

        if !self.modified {
            debug!("Page unchanged, not writing");
            return Ok(ProcessOutcome::Unchanged);
        }
        let written = self.write(output)?;
        Ok(ProcessOutcome::Written(written))
    }

    /// Parse `identifiers` and apply them. An unknown identifier fails before
    /// any operation runs.
    pub fn apply_named<S: AsRef<str>>(self, identifiers: &[S], output: Option<&Path>) -> Result<ProcessOutcome> {
        let operations = parse_operations(identifiers)?;
        self.apply(&operations, output)
    }

    // -- Output ---------------------------------------------------------------

    /// Write the current page to `output` (default: its source path), then
    /// every split-off half. Returns the paths written, primary page first.
    pub fn write(&self, output: Option<&Path>) -> Result<Vec<PathBuf>> {
        let target = output.unwrap_or(&self.path);
        self.save(&self.image, target)?;

        let mut written = Vec::with_capacity(1 + self.derived.len());
        written.push(target.to_path_buf());
        for derived in &self.derived {
            self.save(&derived.image, &derived.path)?;
            written.push(derived.path.clone());
        }

        info!(files = written.len(), "Page written");
        Ok(written)
    }

    fn save(&self, image: &DynamicImage, target: &Path) -> Result<()> {
        let format = ImageFormat::from_path(target).ok().or(self.format);
        let saved = match format {
            Some(format) => image.save_with_format(target, format),
            None => image.save(target),
        };
        saved.map_err(|err| FolioError::Storage {
            path: self.path.clone(),
            reason: format!("failed to save {}: {}", target.display(), err),
        })
    }

    /// Attach this page's path to I/O failures raised inside a transform.
    fn attach_path(&self, err: FolioError) -> FolioError {
        match err {
            FolioError::Io(err) => FolioError::Storage {
                path: self.path.clone(),
                reason: err.to_string(),
            },
            other => other,
        }
    }
}

// -- Tests --------------------------------------------------------------------
