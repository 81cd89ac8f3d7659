// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! bridgebench Benchmarking Framework
//!
//! Drives a bridgebench server through a fixed suite of call patterns and
//! records per-call latency.
//!
//! # Benchmark Categories
//!
//! - **Echo**: round trips of small opaque values
//! - **Payload**: strings and byte buffers from 1 KiB up to 10 MiB
//! - **Callback**: the server calling back into driver-exported objects
//! - **Concurrency**: many tasks sharing one connection
//!
//! # Data Output
//!
//! Results are written as JSON reports and as CSV rows (times in seconds).

pub mod harness;
pub mod metrics;
pub mod reporter;
pub mod suite;

pub use harness::BenchmarkHarness;
pub use metrics::{
    BenchmarkCategory, BenchmarkReport, BenchmarkResult, LatencyMetrics, OnlineStats, SystemInfo,
};
pub use reporter::{CsvReporter, JsonReporter, ReporterError};
pub use suite::{BenchmarkSuite, SuiteError, SuiteOptions, CASES};
