// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Report generation for benchmark results.
//!
//! `JsonReporter` saves full reports to timestamped JSON files.
//! `CsvReporter` writes one row per result, times in seconds, so runs from
//! different machines or builds can be appended to a single sheet.

use crate::metrics::{BenchmarkReport, BenchmarkResult};
use chrono::Utc;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// CSV column names, in row order.
pub const CSV_HEADER: [&str; 10] = [
    "test",
    "iterations",
    "mean",
    "stddev",
    "total",
    "bridgebench version",
    "server mode",
    "os version",
    "cpu count",
    "date",
];

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("Report I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// JSON reporter for benchmark results.
pub struct JsonReporter {
    /// Output directory for benchmark data
    output_dir: PathBuf,
}

impl JsonReporter {
    /// Create a new JSON reporter with the specified output directory.
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self, ReporterError> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    /// Save a benchmark report to a JSON file.
    ///
    /// Returns the path to the created file.
    pub fn save(&self, report: &BenchmarkReport) -> Result<PathBuf, ReporterError> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%SZ");
        let filename = format!("{}_{}.json", report.benchmark_suite, timestamp);
        let filepath = self.output_dir.join(&filename);

        let file = File::create(&filepath)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, report)?;

        Ok(filepath)
    }

    /// Load an existing benchmark report from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<BenchmarkReport, ReporterError> {
        let file = File::open(path)?;
        let report = serde_json::from_reader(file)?;
        Ok(report)
    }
}

/// CSV reporter for benchmark results.
///
/// Numeric fields are written bare, everything else is double-quoted.
pub struct CsvReporter {
    path: PathBuf,
    append: bool,
}

impl CsvReporter {
    /// `append` keeps existing rows and skips the header when the file exists.
    pub fn new(path: impl AsRef<Path>, append: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            append,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write every result of the report.
    pub fn write(&self, report: &BenchmarkReport) -> Result<(), ReporterError> {
        let appending = self.append && self.path.exists();

        let file = if appending {
            OpenOptions::new().append(true).open(&self.path)?
        } else {
            File::create(&self.path)?
        };
        let mut writer = BufWriter::new(file);

        if !appending {
            let header: Vec<String> = CSV_HEADER.iter().map(|h| quote(h)).collect();
            writeln!(writer, "{}", header.join(","))?;
        }

        for result in &report.results {
            writeln!(writer, "{}", Self::row(report, result))?;
        }

        writer.flush()?;
        Ok(())
    }

    fn row(report: &BenchmarkReport, result: &BenchmarkResult) -> String {
        let fields = [
            quote(&result.name),
            result.iterations.to_string(),
            result.latency.mean_secs().to_string(),
            result.latency.std_dev_secs().to_string(),
            result.latency.total_secs().to_string(),
            quote(&report.version),
            quote(result.server_mode.name()),
            quote(&report.system_info.os_label()),
            report.system_info.cpu_cores.to_string(),
            quote(
                &result
                    .timestamp
                    .format("%Y-%m-%d %H:%M:%S%.6f")
                    .to_string(),
            ),
        ];
        fields.join(",")
    }
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
