// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-process — Page post-processing for scanned comics.
//
// Provides the per-page transforms (spread rotation, spread splitting, border
// trimming), the `Processor` that runs a pipeline of them against one file and
// persists the result, and a bounded worker pool that applies a pipeline to
// every page in a set of folders.

pub mod batch;
pub mod pool;
pub mod processor;
pub mod transform;

// Re-export the primary items so callers can use `folio_process::Processor` etc.
pub use batch::{BatchStream, BatchSummary, Completion, WorkItem, run, stream};
pub use processor::{ProcessOutcome, Processor};
pub use transform::{DerivedImage, Transform, TransformContext};
