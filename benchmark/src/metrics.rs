// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Standardized metrics types for benchmark results.
//!
//! This module defines the data structures used to capture and serialize
//! benchmark measurements.

use bridgebench_core::ServerMode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use sysinfo::System;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Categories of benchmarks supported by the framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkCategory {
    /// Small opaque values bounced off the server
    Echo,
    /// Large strings and byte buffers
    Payload,
    /// Server-initiated calls into driver objects
    Callback,
    /// Many concurrent callers on one connection
    Concurrency,
}

impl std::fmt::Display for BenchmarkCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BenchmarkCategory::Echo => write!(f, "echo"),
            BenchmarkCategory::Payload => write!(f, "payload"),
            BenchmarkCategory::Callback => write!(f, "callback"),
            BenchmarkCategory::Concurrency => write!(f, "concurrency"),
        }
    }
}

/// Running mean and sample variance (Welford), plus the running total.
///
/// Variance uses one delta degree of freedom; with fewer than two samples it
/// is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OnlineStats {
    count: u64,
    mean: f64,
    m2: f64,
    total: f64,
}

impl OnlineStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one observation into the running statistics.
    pub fn include(&mut self, datum: f64) {
        self.count += 1;
        self.total += datum;
        let delta = datum - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (datum - self.mean);
    }

    pub fn size(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn variance(&self) -> f64 {
        if self.count > 1 {
            self.m2 / (self.count - 1) as f64
        } else {
            0.0
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}

impl FromIterator<f64> for OnlineStats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = Self::new();
        for datum in iter {
            stats.include(datum);
        }
        stats
    }
}

/// Latency metrics with statistical analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencyMetrics {
    /// Minimum observed latency in nanoseconds
    pub min_ns: u64,
    /// Maximum observed latency in nanoseconds
    pub max_ns: u64,
    /// Arithmetic mean latency in nanoseconds
    pub mean_ns: f64,
    /// Median (p50) latency in nanoseconds
    pub median_ns: u64,
    /// 95th percentile latency in nanoseconds
    pub p95_ns: u64,
    /// 99th percentile latency in nanoseconds
    pub p99_ns: u64,
    /// Sample standard deviation in nanoseconds
    pub std_dev_ns: f64,
    /// Sum of all samples in nanoseconds
    pub total_ns: u64,
    /// Raw sample data for visualization (optional, may be truncated)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub samples: Option<Vec<u64>>,
}

impl LatencyMetrics {
    /// Calculate metrics from a vector of latency samples (in nanoseconds).
    pub fn from_samples(mut samples: Vec<u64>, keep_raw: bool) -> Self {
        if samples.is_empty() {
            return Self {
                min_ns: 0,
                max_ns: 0,
                mean_ns: 0.0,
                median_ns: 0,
                p95_ns: 0,
                p99_ns: 0,
                std_dev_ns: 0.0,
                total_ns: 0,
                samples: None,
            };
        }

        // Stats in arrival order, before sorting.
        let stats: OnlineStats = samples.iter().map(|&x| x as f64).collect();

        samples.sort_unstable();
        let len = samples.len();

        let min_ns = samples[0];
        let max_ns = samples[len - 1];
        let median_ns = samples[len / 2];
        let p95_ns = samples[(len as f64 * 0.95) as usize];
        let p99_ns = samples[(len as f64 * 0.99) as usize];
        let total_ns = samples.iter().sum();

        // Optionally keep raw samples (truncate if too large for visualization)
        let raw_samples = if keep_raw {
            if len > 10000 {
                Some(samples.iter().step_by(len / 1000).copied().collect())
            } else {
                Some(samples)
            }
        } else {
            None
        };

        Self {
            min_ns,
            max_ns,
            mean_ns: stats.mean(),
            median_ns,
            p95_ns,
            p99_ns,
            std_dev_ns: stats.std_dev(),
            total_ns,
            samples: raw_samples,
        }
    }

    pub fn mean_secs(&self) -> f64 {
        self.mean_ns / NANOS_PER_SEC
    }

    pub fn std_dev_secs(&self) -> f64 {
        self.std_dev_ns / NANOS_PER_SEC
    }

    pub fn total_secs(&self) -> f64 {
        self.total_ns as f64 / NANOS_PER_SEC
    }

    /// Format latency in human-readable form (auto-selects ns/μs/ms).
    pub fn format_latency(ns: u64) -> String {
        if ns < 1_000 {
            format!("{}ns", ns)
        } else if ns < 1_000_000 {
            format!("{:.2}μs", ns as f64 / 1_000.0)
        } else if ns < 1_000_000_000 {
            format!("{:.2}ms", ns as f64 / 1_000_000.0)
        } else {
            format!("{:.2}s", ns as f64 / NANOS_PER_SEC)
        }
    }
}

/// System information captured at benchmark time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system name
    pub os: String,
    /// OS version
    pub os_version: String,
    /// Kernel version
    pub kernel_version: Option<String>,
    /// CPU model name
    pub cpu_model: String,
    /// Number of logical CPUs
    pub cpu_cores: usize,
    /// Total system memory in bytes
    pub memory_bytes: u64,
    /// Hostname
    pub hostname: String,
}

impl SystemInfo {
    /// Collect current system information.
    pub fn collect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        Self {
            os: System::name().unwrap_or_else(|| "Unknown".to_string()),
            os_version: System::os_version().unwrap_or_else(|| "Unknown".to_string()),
            kernel_version: System::kernel_version(),
            cpu_model: sys
                .cpus()
                .first()
                .map(|cpu| cpu.brand().to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            cpu_cores: sys.cpus().len(),
            memory_bytes: sys.total_memory(),
            hostname: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
        }
    }

    /// OS name and release, e.g. `Ubuntu 6.8.0-45-generic`.
    pub fn os_label(&self) -> String {
        let release = self.kernel_version.as_deref().unwrap_or(&self.os_version);
        format!("{} {}", self.os, release)
    }
}

/// A single benchmark result with all associated metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Name of the benchmark case
    pub name: String,
    /// Category of the benchmark
    pub category: BenchmarkCategory,
    /// How the server scheduled calls during this run
    pub server_mode: ServerMode,
    /// When the case started
    pub timestamp: DateTime<Utc>,
    /// Latency metrics
    pub latency: LatencyMetrics,
    /// Number of measured iterations
    pub iterations: u64,
    /// Additional metadata specific to this benchmark
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl BenchmarkResult {
    /// Create a new latency benchmark result.
    pub fn latency(
        name: impl Into<String>,
        category: BenchmarkCategory,
        server_mode: ServerMode,
        samples: Vec<u64>,
        keep_raw_samples: bool,
    ) -> Self {
        let iterations = samples.len() as u64;
        Self {
            name: name.into(),
            category,
            server_mode,
            timestamp: Utc::now(),
            latency: LatencyMetrics::from_samples(samples, keep_raw_samples),
            iterations,
            metadata: HashMap::new(),
        }
    }

    /// Override the start timestamp.
    pub fn started_at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Add metadata to the result. Values that fail to serialize are skipped.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.metadata.insert(key.into(), value);
        }
        self
    }
}

/// Complete benchmark suite report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Suite identifier
    pub benchmark_suite: String,
    /// Framework version
    pub version: String,
    /// Timestamp when benchmarks were run
    pub timestamp: DateTime<Utc>,
    /// System information
    pub system_info: SystemInfo,
    /// Individual benchmark results
    pub results: Vec<BenchmarkResult>,
}

impl BenchmarkReport {
    /// Create a new benchmark report.
    pub fn new() -> Self {
        Self {
            benchmark_suite: "bridgebench".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            system_info: SystemInfo::collect(),
            results: Vec::new(),
        }
    }

    /// Add a result to the report.
    pub fn add_result(&mut self, result: BenchmarkResult) {
        self.results.push(result);
    }
}

impl Default for BenchmarkReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_online_stats() {
        let stats: OnlineStats = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0].into_iter().collect();

        assert_eq!(stats.size(), 8);
        assert!((stats.mean() - 5.0).abs() < 1e-12);
        assert!((stats.total() - 40.0).abs() < 1e-12);
        // Sum of squared deviations is 32, sample variance 32 / 7.
        assert!((stats.variance() - 32.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_online_stats_degenerate() {
        let mut stats = OnlineStats::new();
        assert_eq!(stats.variance(), 0.0);

        stats.include(3.5);
        assert_eq!(stats.mean(), 3.5);
        assert_eq!(stats.std_dev(), 0.0);
    }

    #[test]
    fn test_latency_metrics_from_samples() {
        let samples = vec![100, 200, 300, 400, 500, 600, 700, 800, 900, 1000];
        let metrics = LatencyMetrics::from_samples(samples, false);

        assert_eq!(metrics.min_ns, 100);
        assert_eq!(metrics.max_ns, 1000);
        assert_eq!(metrics.median_ns, 600);
        assert_eq!(metrics.total_ns, 5500);
        assert!((metrics.mean_ns - 550.0).abs() < 0.01);
        assert!((metrics.std_dev_ns - (825_000.0f64 / 9.0).sqrt()).abs() < 1e-6);
        assert!(metrics.samples.is_none());
    }

    #[test]
    fn test_latency_seconds() {
        let metrics = LatencyMetrics::from_samples(vec![1_000_000_000, 3_000_000_000], false);
        assert!((metrics.mean_secs() - 2.0).abs() < 1e-12);
        assert!((metrics.total_secs() - 4.0).abs() < 1e-12);
        assert!((metrics.std_dev_secs() - 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_latency_format() {
        assert_eq!(LatencyMetrics::format_latency(500), "500ns");
        assert_eq!(LatencyMetrics::format_latency(1500), "1.50μs");
        assert_eq!(LatencyMetrics::format_latency(1_500_000), "1.50ms");
        assert_eq!(LatencyMetrics::format_latency(1_500_000_000), "1.50s");
    }

    #[test]
    fn test_system_info_collect() {
        let info = SystemInfo::collect();
        assert!(!info.os.is_empty());
        assert!(info.cpu_cores > 0);
        assert!(info.os_label().starts_with(&info.os));
    }

    #[test]
    fn test_benchmark_result_serialization() {
        let result = BenchmarkResult::latency(
            "echo-bytes",
            BenchmarkCategory::Payload,
            ServerMode::Pinned,
            vec![100, 200, 300],
            false,
        )
        .with_metadata("payload_size_bytes", 1024);

        let json = serde_json::to_string_pretty(&result).unwrap();
        assert!(json.contains("echo-bytes"));
        assert!(json.contains("payload"));
        assert!(json.contains("pinned"));
        assert!(json.contains("payload_size_bytes"));
    }
}
