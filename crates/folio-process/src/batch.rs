// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch driver — applies one pipeline to every page in a set of folders on a
// bounded worker pool, reporting each page as it completes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use folio_core::error::{FolioError, Result};
use folio_core::{Operation, ProcessConfig};
use tracing::{info, instrument, warn};

use crate::pool::WorkerPool;
use crate::processor::{ProcessOutcome, Processor};

/// One page to process. The operation list is shared by every item in a batch.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub path: PathBuf,
    pub operations: Arc<[Operation]>,
}

impl WorkItem {
    /// Load the page, run the pipeline, and write it back.
    pub fn execute(self, config: &ProcessConfig) -> Result<Completion> {
        let outcome = Processor::open_with(&self.path, config.clone())?.apply(&self.operations, None)?;
        Ok(Completion {
            path: self.path,
            outcome,
        })
    }
}

/// Signal that one page has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub path: PathBuf,
    pub outcome: ProcessOutcome,
}

/// Totals from a fully drained batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub written: usize,
    pub unchanged: usize,
    pub skipped: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &ProcessOutcome) {
        match outcome {
            ProcessOutcome::Written(_) => self.written += 1,
            ProcessOutcome::Unchanged => self.unchanged += 1,
            ProcessOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.written + self.unchanged + self.skipped
    }
}

/// Build one work item per regular file directly inside each folder.
/// Subfolders are not descended into. Items come out folder by folder, sorted
/// by file name within a folder.
pub fn collect_work_items<P: AsRef<Path>>(folders: &[P], operations: &Arc<[Operation]>) -> Result<Vec<WorkItem>> {
    let mut items = Vec::new();
    for folder in folders {
        let folder = folder.as_ref();
        let storage_error = |err: std::io::Error| FolioError::Storage {
            path: folder.to_path_buf(),
            reason: err.to_string(),
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(folder).map_err(storage_error)? {
            let path = entry.map_err(storage_error)?.path();
            if path.is_file() {
                files.push(std::path::absolute(&path).map_err(storage_error)?);
            }
        }
        files.sort();

        items.extend(files.into_iter().map(|path| WorkItem {
            path,
            operations: Arc::clone(operations),
        }));
    }
    Ok(items)
}

/// Completion signals for a running batch, in the order pages finish.
///
/// The batch only completes if the stream is drained. Dropping it early skips
/// every page that has not started; pages already being processed are
/// finished before the drop returns.
pub struct BatchStream {
    pool: WorkerPool<Result<Completion>>,
}

impl BatchStream {
    /// Number of pages in the batch.
    pub fn total(&self) -> usize {
        self.pool.total()
    }

    /// Pages whose completion has not been observed yet.
    pub fn remaining(&self) -> usize {
        self.pool.remaining()
    }
}

impl Iterator for BatchStream {
    type Item = Result<Completion>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.pool.next()?.and_then(|r| r);
        if let Err(err) = &result {
            warn!(error = %err, "Page failed");
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.pool.size_hint()
    }
}

/// Start processing every page in `folders` with `operations`, running at
/// most `config.max_workers` pages at once.
///
/// A failing page does not stop its siblings: its error is yielded in its
/// place and the remaining pages keep going for as long as the stream is read.
#[instrument(skip_all, fields(folders = folders.len(), ops = operations.len()))]
pub fn stream<P: AsRef<Path>>(folders: &[P], operations: &[Operation], config: &ProcessConfig) -> Result<BatchStream> {
    config.validate()?;

    let operations: Arc<[Operation]> = Arc::from(operations);
    let items = collect_work_items(folders, &operations)?;
    info!(pages = items.len(), workers = config.max_workers, "Starting batch");

    let shared = Arc::new(config.clone());
    let pool = WorkerPool::spawn(config.max_workers, items, move |item: WorkItem| item.execute(&shared))?;
    Ok(BatchStream { pool })
}

/// Process every page and wait for the batch to finish. Stops at the first
/// failing page, abandoning pages that have not started.
pub fn run<P: AsRef<Path>>(folders: &[P], operations: &[Operation], config: &ProcessConfig) -> Result<BatchSummary> {
    let mut summary = BatchSummary::default();
    for completion in stream(folders, operations, config)? {
        summary.record(&completion?.outcome);
    }
    info!(
        written = summary.written,
        unchanged = summary.unchanged,
        skipped = summary.skipped,
        "Batch finished"
    );
    Ok(summary)
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GenericImageView, Rgb, RgbImage};

    fn write_page(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let img = RgbImage::from_fn(width, height, |x, _| {
            if x < width / 2 { Rgb([250, 250, 250]) } else { Rgb([10, 10, 10]) }
        });
        let path = dir.join(name);
        DynamicImage::ImageRgb8(img).save(&path).expect("write page");
        path
    }

    /// Two chapter folders holding `per_folder` landscape pages each.
    fn chapters(root: &Path, per_folder: usize) -> Vec<PathBuf> {
        (1..=2)
            .map(|ch| {
                let folder = root.join(format!("ch{ch}"));
                std::fs::create_dir(&folder).unwrap();
                for page in 0..per_folder {
                    write_page(&folder, &format!("{page:02}.png"), 30, 20);
                }
                folder
            })
            .collect()
    }

    fn config(max_workers: usize) -> ProcessConfig {
        ProcessConfig {
            max_workers,
            ..Default::default()
        }
    }

    #[test]
    fn collects_top_level_files_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        let folders = chapters(dir.path(), 3);
        let nested = folders[0].join("extras");
        std::fs::create_dir(&nested).unwrap();
        write_page(&nested, "99.png", 30, 20);

        let ops: Arc<[Operation]> = Arc::from(vec![Operation::TrimBorders]);
        let items = collect_work_items(&folders, &ops).unwrap();

        assert_eq!(items.len(), 6);
        assert!(items.iter().all(|item| item.path.is_absolute()));
        assert!(items.iter().all(|item| !item.path.starts_with(&nested)));
        assert!(items.iter().all(|item| Arc::ptr_eq(&item.operations, &ops)));
        assert!(items[0].path.ends_with("ch1/00.png"));
        assert!(items[5].path.ends_with("ch2/02.png"));
    }

    #[test]
    fn missing_folder_is_a_storage_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope");
        let err = stream(&[&missing], &[Operation::TrimBorders], &config(2)).err().expect("error");
        assert_eq!(err.path(), Some(missing.as_path()));
    }

    #[test]
    fn yields_one_completion_per_file_for_any_worker_count() {
        let dir = tempfile::tempdir().expect("tempdir");
        let folders = chapters(dir.path(), 3);
        let total = 6;

        for workers in 1..=total {
            let batch = stream(&folders, &[Operation::NoPostprocessing], &config(workers)).unwrap();
            assert_eq!(batch.total(), total);

            let completions: Vec<Completion> = batch.map(|c| c.unwrap()).collect();
            assert_eq!(completions.len(), total, "workers = {workers}");

            let mut paths: Vec<_> = completions.iter().map(|c| c.path.clone()).collect();
            paths.sort();
            paths.dedup();
            assert_eq!(paths.len(), total);
        }
    }

    #[test]
    fn run_rotates_every_page_in_place() {
        let dir = tempfile::tempdir().expect("tempdir");
        let folders = chapters(dir.path(), 4);

        let summary = run(&folders, &[Operation::RotateDoublePages], &config(3)).unwrap();
        assert_eq!(summary, BatchSummary { written: 8, unchanged: 0, skipped: 0 });

        for folder in &folders {
            for entry in std::fs::read_dir(folder).unwrap() {
                let page = image::open(entry.unwrap().path()).unwrap();
                assert_eq!(page.dimensions(), (20, 30));
            }
        }

        // Already portrait: a second run changes nothing.
        let again = run(&folders, &[Operation::RotateDoublePages], &config(3)).unwrap();
        assert_eq!(again.unchanged, 8);
    }

    #[test]
    fn split_pages_appear_next_to_their_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let folder = dir.path().join("ch1");
        std::fs::create_dir(&folder).unwrap();
        write_page(&folder, "01.png", 30, 20);
        write_page(&folder, "02.png", 30, 20);

        run(&[&folder], &[Operation::SplitDoublePages], &config(2)).unwrap();

        for name in ["01.png", "01.5.png", "02.png", "02.5.png"] {
            let page = image::open(folder.join(name)).unwrap();
            assert_eq!(page.dimensions(), (15, 20), "{name}");
        }
    }

    #[test]
    fn failing_page_does_not_stop_its_siblings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let folders = chapters(dir.path(), 3);
        let broken = folders[1].join("01.png");
        std::fs::write(&broken, b"not an image").unwrap();

        let results: Vec<_> = stream(&folders, &[Operation::RotateDoublePages], &config(2))
            .unwrap()
            .collect();

        assert_eq!(results.len(), 6);
        let failures: Vec<_> = results.iter().filter_map(|r| r.as_ref().err()).collect();
        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0], FolioError::Decode { .. }));
        assert!(failures[0].path().is_some_and(|p| p.ends_with("ch2/01.png")));
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 5);
    }

    #[test]
    fn run_stops_at_the_first_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let folder = dir.path().join("ch1");
        std::fs::create_dir(&folder).unwrap();
        std::fs::write(folder.join("00.png"), b"not an image").unwrap();
        // Pages large enough that the worker cannot get through all of them
        // before the failing one is observed.
        for page in 1..20 {
            write_page(&folder, &format!("{page:02}.png"), 900, 600);
        }

        let err = run(&[&folder], &[Operation::RotateDoublePages], &config(1)).unwrap_err();
        assert!(matches!(err, FolioError::Decode { .. }));

        let rotated = (1..20)
            .filter(|page| {
                let page = image::open(folder.join(format!("{page:02}.png"))).unwrap();
                page.width() < page.height()
            })
            .count();
        assert!(rotated < 19, "every page was processed after the batch was abandoned");
    }

    #[test]
    fn zero_workers_is_rejected_before_enumeration() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = stream(&[dir.path().join("absent")], &[], &config(0));
        assert!(matches!(result, Err(FolioError::InvalidConfig(_))));
    }
}
