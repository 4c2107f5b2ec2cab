//! Report files for meter-load runs
//!
//! A run with `N` workers and `M` iterations each produces two files in the
//! output directory:
//!
//! - `test_<N>_<M>.csv`: one `<epoch_second>,<count>` line per second that saw
//!   at least one request, in ascending order
//! - `test_<N>_<M>.stat`: `min = `, `max = `, `avg = ` and `std = ` lines for
//!   request durations in seconds

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use meter_load_core::{AggregatedResult, DurationStats};
use thiserror::Error;

/// Report writing errors
#[derive(Error, Debug)]
pub enum ReportError {
    /// IO error
    #[error("IO error writing {path}: {source}")]
    Io {
        /// File or directory being written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// CSV error
    #[error("CSV error writing {path}: {source}")]
    Csv {
        /// File being written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: csv::Error,
    },
}

/// Paths of the two files written for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    /// Arrival series
    pub csv: PathBuf,
    /// Duration statistics
    pub stat: PathBuf,
}

/// File stem shared by both report files
pub fn file_stem(workers: usize, iterations: usize) -> String {
    format!("test_{workers}_{iterations}")
}

/// Writes aggregated results into an output directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    /// Create a writer targeting `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Paths the report for `workers` x `iterations` is written to
    pub fn paths(&self, workers: usize, iterations: usize) -> ReportPaths {
        let stem = file_stem(workers, iterations);
        ReportPaths {
            csv: self.output_dir.join(format!("{stem}.csv")),
            stat: self.output_dir.join(format!("{stem}.stat")),
        }
    }

    /// Write both files, creating the output directory if needed
    pub fn write(
        &self,
        result: &AggregatedResult,
        workers: usize,
        iterations: usize,
    ) -> Result<ReportPaths, ReportError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| ReportError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let paths = self.paths(workers, iterations);
        write_arrival_series(&paths.csv, result.arrival_series())?;
        write_stats(&paths.stat, result.stats())?;

        tracing::info!(
            csv = %paths.csv.display(),
            stat = %paths.stat.display(),
            seconds = result.per_second().len(),
            points = result.total(),
            "Report written"
        );

        Ok(paths)
    }
}

fn write_arrival_series(
    path: &Path,
    series: impl Iterator<Item = (i64, usize)>,
) -> Result<(), ReportError> {
    let csv_err = |source| ReportError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_err)?;

    for (second, count) in series {
        wtr.write_record([second.to_string(), count.to_string()])
            .map_err(csv_err)?;
    }

    wtr.flush().map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_stats(path: &Path, stats: &DurationStats) -> Result<(), ReportError> {
    let io_err = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_err)?;
    let mut out = BufWriter::new(file);
    writeln!(out, "min = {}", stats.min).map_err(io_err)?;
    writeln!(out, "max = {}", stats.max).map_err(io_err)?;
    writeln!(out, "avg = {}", stats.mean).map_err(io_err)?;
    writeln!(out, "std = {}", stats.std_dev).map_err(io_err)?;
    out.flush().map_err(io_err)
}
