// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the page transforms in the folio-process crate,
// run on a synthetic double-page spread.

use std::path::Path;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgb, RgbImage};

use folio_core::ProcessConfig;
use folio_process::TransformContext;
use folio_process::transform::{split_double_pages, trim_borders};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// A 1600x1200 spread: white margins around two grey page bodies.
fn synthetic_spread() -> DynamicImage {
    let (width, height) = (1600u32, 1200u32);
    let img = RgbImage::from_fn(width, height, |x, y| {
        let in_body = (60..height - 60).contains(&y)
            && ((80..760).contains(&x) || (840..width - 80).contains(&x));
        if in_body { Rgb([90, 90, 90]) } else { Rgb([255, 255, 255]) }
    });
    DynamicImage::ImageRgb8(img)
}

fn bench_trim_borders(c: &mut Criterion) {
    let spread = synthetic_spread();
    let config = ProcessConfig::default();
    let ctx = TransformContext {
        source: Path::new("bench/01.png"),
        config: &config,
    };

    c.bench_function("trim_borders (1600x1200)", |b| {
        b.iter(|| black_box(trim_borders(black_box(&spread), &ctx).expect("trim")));
    });
}

fn bench_split_double_pages(c: &mut Criterion) {
    let spread = synthetic_spread();
    let config = ProcessConfig::default();
    let ctx = TransformContext {
        source: Path::new("bench/01.png"),
        config: &config,
    };

    c.bench_function("split_double_pages (1600x1200)", |b| {
        b.iter(|| black_box(split_double_pages(black_box(&spread), &ctx).expect("split")));
    });
}

criterion_group!(benches, bench_trim_borders, bench_split_double_pages);
criterion_main!(benches);
