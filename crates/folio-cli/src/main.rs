// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Folio — command-line entry point.
//
// Applies a pipeline of post-processing operations in place to every page in
// one or more chapter folders, with a progress bar fed by the batch's
// completion stream.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use folio_core::{Operation, ProcessConfig};
use indicatif::{ProgressBar, ProgressStyle};

/// Process comic page folders in place.
#[derive(Parser, Debug)]
#[command(name = "folio", version, about)]
struct Cli {
    /// Folders whose top-level images are processed.
    #[arg(default_value = ".")]
    folders: Vec<PathBuf>,

    /// Operation to apply; repeat to build a pipeline, applied in order.
    /// One of: rotate_double_pages, split_double_pages, trim_borders, none.
    #[arg(short = 'o', long = "op", required = true)]
    operations: Vec<Operation>,

    /// Keep the right half of split spreads (right-to-left reading).
    #[arg(short, long)]
    right_to_left: bool,

    /// Pages processed at the same time.
    #[arg(short, long)]
    workers: Option<usize>,

    /// JSON file with processing settings; flags override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Hide the progress bar.
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match process(&cli) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            eprintln!("{failed} page(s) could not be processed");
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("Could not apply processing options: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Run the batch, returning how many pages failed.
fn process(cli: &Cli) -> folio_core::Result<usize> {
    let operations = &cli.operations;
    if Operation::disables_processing(operations) {
        tracing::info!("Processing disabled, nothing to do");
        return Ok(0);
    }

    let mut config = match &cli.config {
        Some(path) => ProcessConfig::from_json_file(path)?,
        None => ProcessConfig::default(),
    };
    if cli.right_to_left {
        config.right_to_left = true;
    }
    if let Some(workers) = cli.workers {
        config.max_workers = workers;
    }

    let names: Vec<&str> = operations.iter().map(Operation::as_str).collect();
    tracing::info!(operations = %names.join(", "), "Applying processing options");

    let batch = folio_process::stream(&cli.folders, operations, &config)?;
    let pb = if cli.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(batch.total() as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message("Processing");
        pb
    };

    let mut failed = 0;
    for completion in batch {
        if let Err(err) = completion {
            failed += 1;
            pb.suspend(|| eprintln!("{err}"));
        }
        pb.inc(1);
    }
    pb.finish_and_clear();
    Ok(failed)
}
