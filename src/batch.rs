//! Optimize every image under a directory with one preset.
//!
//! Files are selected by extension (see [`supported_input_extensions`]) and
//! processed in parallel on a dedicated [rayon](https://docs.rs/rayon) pool
//! sized by `[processing] max_processes`. Sub-directories are mirrored under
//! the destination:
//!
//! ```text
//! incoming/                    optimized/
//! ├── 42-main.png        →     ├── 42-main.jpg
//! │                            ├── 42-main_thumb.jpg
//! └── drafts/                  └── drafts/
//!     └── 43-main.webp   →         ├── 43-main.jpg
//!                                  └── 43-main_thumb.jpg
//! ```
//!
//! A failing file is recorded in the report and never stops the others.
//! Two files that would write the same output (`a.jpg` and `a.png` in one
//! folder) never both run: the first in path order wins and the other is
//! reported as a name collision. Sources are left in place.

use crate::imaging::operations::thumbnail_path;
use crate::imaging::{ImageBackend, compression_ratio, supported_input_extensions};
use crate::naming::{filename_stem, output_filename};
use crate::optimizer::ImageOptimizer;
use crate::presets::PresetKind;
use crate::types::OptimizedImageResult;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Source is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// One file that could not be optimized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    pub source_path: PathBuf,
    pub error: String,
}

/// Outcome of a batch run, in directory-walk order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub succeeded: Vec<OptimizedImageResult>,
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn original_bytes(&self) -> u64 {
        self.succeeded.iter().map(|r| r.original_size).sum()
    }

    pub fn optimized_bytes(&self) -> u64 {
        self.succeeded.iter().map(|r| r.optimized_size).sum()
    }

    /// Percent saved over all successful files.
    pub fn overall_ratio(&self) -> f64 {
        compression_ratio(self.original_bytes(), self.optimized_bytes())
    }
}

/// Collect image files under `source_dir`, skipping `skip` and anything below it.
///
/// `skip` is matched by canonical path, so `./in/out`, `in/out` and an
/// absolute spelling all name the same directory. Sorted by path so reports
/// are stable between runs.
pub fn find_images(source_dir: &Path, skip: Option<&Path>) -> Vec<PathBuf> {
    let extensions = supported_input_extensions();
    let skip = skip.and_then(|s| s.canonicalize().ok());
    let mut files: Vec<PathBuf> = WalkDir::new(source_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| match &skip {
            Some(skip) if e.file_type().is_dir() => {
                e.path().canonicalize().map_or(true, |p| &p != skip)
            }
            _ => true,
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    extensions
                        .iter()
                        .any(|supported| supported.eq_ignore_ascii_case(ext))
                })
        })
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// One file scheduled for optimization.
#[derive(Debug, Clone, PartialEq)]
struct BatchJob {
    source: PathBuf,
    destination_dir: PathBuf,
    base_name: String,
}

/// Assign every file its output location, in `files` order.
///
/// Each job claims the paths it will write (primary output and, when the
/// preset makes one, the thumbnail). A file whose outputs are already
/// claimed by an earlier file is rejected instead of overwriting them, so
/// `a.jpg` wins over `a.png`, and `a.jpg`'s thumbnail wins over `a_thumb.png`.
fn plan_jobs<B: ImageBackend + 'static>(
    optimizer: &ImageOptimizer<B>,
    files: &[PathBuf],
    source_dir: &Path,
    destination_dir: &Path,
    kind: PresetKind,
) -> Vec<Result<BatchJob, BatchFailure>> {
    let preset = optimizer.preset(kind);
    let format = preset
        .options
        .format
        .unwrap_or(optimizer.settings().default_format);
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();

    files
        .iter()
        .map(|source| {
            let relative_dir = source
                .parent()
                .and_then(|p| p.strip_prefix(source_dir).ok())
                .unwrap_or(Path::new(""));
            let file_name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let job = BatchJob {
                source: source.clone(),
                destination_dir: destination_dir.join(relative_dir),
                base_name: filename_stem(&file_name).to_string(),
            };

            let mut outputs = vec![
                job.destination_dir
                    .join(output_filename(&job.base_name, format)),
            ];
            if preset.generate_thumbnail {
                outputs.push(thumbnail_path(&job.destination_dir, &job.base_name));
            }
            if let Some((output, owner)) = outputs
                .iter()
                .find_map(|o| claimed.get(o).map(|owner| (o, owner)))
            {
                return Err(BatchFailure {
                    source_path: source.clone(),
                    error: format!(
                        "Output name collision: {} is already written for {}",
                        output.display(),
                        owner.display()
                    ),
                });
            }
            for output in outputs {
                claimed.insert(output, source.clone());
            }
            Ok(job)
        })
        .collect()
}

/// Optimize every image under `source_dir` into `destination_dir`.
pub fn optimize_directory<B: ImageBackend + 'static>(
    optimizer: &ImageOptimizer<B>,
    source_dir: &Path,
    destination_dir: &Path,
    kind: PresetKind,
    threads: usize,
) -> Result<BatchReport, BatchError> {
    if !source_dir.is_dir() {
        return Err(BatchError::NotADirectory(source_dir.to_path_buf()));
    }

    let files = find_images(source_dir, Some(destination_dir));
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()?;

    let jobs = plan_jobs(optimizer, &files, source_dir, destination_dir, kind);
    let outcomes: Vec<Result<OptimizedImageResult, BatchFailure>> = pool.install(|| {
        jobs.par_iter()
            .map(|job| {
                let job = job.as_ref().map_err(Clone::clone)?;
                let request = optimizer.preset_request(
                    kind,
                    &job.source,
                    &job.destination_dir,
                    job.base_name.as_str(),
                );
                optimizer
                    .optimize_image_blocking(&request)
                    .map_err(|e| BatchFailure {
                        source_path: job.source.clone(),
                        error: e.to_string(),
                    })
            })
            .collect()
    });

    let mut report = BatchReport::default();
    for outcome in outcomes {
        match outcome {
            Ok(result) => report.succeeded.push(result),
            Err(failure) => report.failed.push(failure),
        }
    }
    Ok(report)
}
