// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! The standard benchmark suite.
//!
//! Every case drives one call shape through a connected [`BridgeClient`] and
//! checks each answer outside the timed region. A wrong answer aborts the run
//! rather than producing numbers for broken behavior.

use std::sync::Arc;

use bridgebench_core::{
    BridgeClient, BridgeError, ByteGenerator, Countdown, EntryPointProxy, Seed, ServerMode, Value,
    ValueEcho,
};
use chrono::Utc;
use thiserror::Error;

use crate::harness::BenchmarkHarness;
use crate::metrics::{BenchmarkCategory, BenchmarkReport, BenchmarkResult};

pub const DEFAULT_MAX_BYTES: usize = 268_435_456;
pub const DEFAULT_MAX_ITERATIONS: u64 = 100;
pub const DEFAULT_MAX_THREADS: usize = 50;

/// 1 KiB
pub const MEDIUM_BYTES: usize = 1024;
/// 1 MiB
pub const LARGE_BYTES: usize = 1024 * 1024;
/// 10 MiB
pub const EXTRA_LARGE_BYTES: usize = 10 * 1024 * 1024;

/// 64 bytes once encoded to UTF-8.
pub const DEFAULT_STRING: &str = "Hello\nWorld\n\nTest1234567\néééééééééééééèèèèèè\n";

const RECURSIVE_COUNT: i64 = 20;
/// Driver-side invocations for a countdown of 20 started by the server.
const RECURSIVE_DRIVER_CALLS: u64 = 11;
const VERIFY_LEN: usize = 16;

/// Case names in run order.
pub const CASES: [&str; 11] = [
    "echo",
    "type-conversion",
    "medium-string",
    "large-string",
    "extra-large-string",
    "medium-bytes",
    "large-bytes",
    "echo-bytes",
    "multiple-calling-threads",
    "simple-callback",
    "recursive-callback",
];

/// Errors that abort a suite run.
#[derive(Debug, Error)]
pub enum SuiteError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("Server seed {actual} does not match expected seed {expected}")]
    SeedMismatch { expected: Seed, actual: Seed },

    #[error("Server byte stream differs from a local generator seeded with {seed}; is the server fresh?")]
    GeneratorMismatch { seed: Seed },

    #[error("Unexpected response in '{case}': {detail}")]
    UnexpectedResponse { case: &'static str, detail: String },

    #[error("Unknown benchmark case: {0}")]
    UnknownCase(String),

    #[error("Calling task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

fn unexpected(case: &'static str, detail: impl Into<String>) -> SuiteError {
    SuiteError::UnexpectedResponse {
        case,
        detail: detail.into(),
    }
}

fn expect_value(case: &'static str, actual: &Value, expected: &Value) -> Result<(), SuiteError> {
    if actual == expected {
        Ok(())
    } else {
        Err(unexpected(
            case,
            format!("expected {:?}, got {:?}", expected, actual),
        ))
    }
}

/// Limits applied to every case.
#[derive(Debug, Clone)]
pub struct SuiteOptions {
    /// Cap on any single payload
    pub max_bytes: usize,
    /// Measured iterations per case
    pub max_iterations: u64,
    /// Concurrent callers in `multiple-calling-threads`
    pub max_threads: usize,
    /// Seed the server is expected to run with
    pub seed: Seed,
    /// Keep raw samples in the JSON report
    pub keep_samples: bool,
}

impl SuiteOptions {
    /// `DEFAULT_STRING` repeated to fill at most `limit` bytes.
    pub fn string_payload(&self, limit: usize) -> String {
        DEFAULT_STRING.repeat(limit.min(self.max_bytes) / DEFAULT_STRING.len())
    }

    pub fn payload_len(&self, limit: usize) -> usize {
        limit.min(self.max_bytes)
    }
}

impl Default for SuiteOptions {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_threads: DEFAULT_MAX_THREADS,
            seed: Seed::DEFAULT,
            keep_samples: true,
        }
    }
}

/// Runs the standard cases against one connected server.
pub struct BenchmarkSuite<'a> {
    client: &'a BridgeClient,
    entry: EntryPointProxy,
    mode: ServerMode,
    options: SuiteOptions,
}

impl<'a> BenchmarkSuite<'a> {
    /// `mode` is recorded in every result; it does not change what is run.
    pub fn new(client: &'a BridgeClient, mode: ServerMode, options: SuiteOptions) -> Self {
        Self {
            client,
            entry: client.entry_point(),
            mode,
            options,
        }
    }

    /// Check that the server runs the expected seed and that its byte
    /// stream starts where a local generator with that seed starts.
    ///
    /// Consumes the head of the server's stream, so it only passes once per
    /// server process.
    pub async fn verify(&self) -> Result<(), SuiteError> {
        let actual = self.entry.seed().await?;
        if actual != self.options.seed {
            return Err(SuiteError::SeedMismatch {
                expected: self.options.seed,
                actual,
            });
        }

        let expected = ByteGenerator::new(actual).get_bytes(VERIFY_LEN);
        if self.entry.get_bytes(VERIFY_LEN).await? != expected {
            return Err(SuiteError::GeneratorMismatch { seed: actual });
        }

        tracing::debug!(seed = %actual, "Server generator verified");
        Ok(())
    }

    /// Run the named cases in order, adding one result per case.
    pub async fn run(&self, cases: &[&str], report: &mut BenchmarkReport) -> Result<(), SuiteError> {
        for case in cases {
            tracing::info!(case = %case, mode = %self.mode, "Running benchmark");
            let result = self.run_case(case).await?;
            tracing::info!(
                case = %case,
                iterations = result.iterations,
                mean_s = result.latency.mean_secs(),
                stddev_s = result.latency.std_dev_secs(),
                total_s = result.latency.total_secs(),
                "Benchmark finished"
            );
            report.add_result(result);
        }
        Ok(())
    }

    /// Run a single case by name.
    pub async fn run_case(&self, name: &str) -> Result<BenchmarkResult, SuiteError> {
        let started = Utc::now();
        let iterations = match name {
            "extra-large-string" => (self.options.max_iterations / 100).max(10),
            _ => self.options.max_iterations,
        };
        let harness = self.harness(iterations);
        let h = &harness;

        let (category, samples) = match name {
            "echo" => (BenchmarkCategory::Echo, self.echo(h).await?),
            "type-conversion" => (BenchmarkCategory::Echo, self.type_conversion(h).await?),
            "medium-string" => (
                BenchmarkCategory::Payload,
                self.echo_string(h, "medium-string", MEDIUM_BYTES).await?,
            ),
            "large-string" => (
                BenchmarkCategory::Payload,
                self.echo_string(h, "large-string", LARGE_BYTES).await?,
            ),
            "extra-large-string" => (
                BenchmarkCategory::Payload,
                self.echo_string(h, "extra-large-string", EXTRA_LARGE_BYTES)
                    .await?,
            ),
            "medium-bytes" => (
                BenchmarkCategory::Payload,
                self.get_bytes(h, "medium-bytes", MEDIUM_BYTES).await?,
            ),
            "large-bytes" => (
                BenchmarkCategory::Payload,
                self.get_bytes(h, "large-bytes", LARGE_BYTES).await?,
            ),
            "echo-bytes" => (BenchmarkCategory::Payload, self.echo_bytes(h).await?),
            "multiple-calling-threads" => (
                BenchmarkCategory::Concurrency,
                self.multiple_callers(h).await?,
            ),
            "simple-callback" => (BenchmarkCategory::Callback, self.simple_callback(h).await?),
            "recursive-callback" => (
                BenchmarkCategory::Callback,
                self.recursive_callback(h).await?,
            ),
            other => return Err(SuiteError::UnknownCase(other.to_string())),
        };

        Ok(BenchmarkResult::latency(
            name,
            category,
            self.mode,
            samples,
            harness.should_keep_samples(),
        )
        .started_at(started)
        .with_metadata("seed", self.options.seed.value()))
    }

    fn harness(&self, iterations: u64) -> BenchmarkHarness {
        BenchmarkHarness::new()
            .warmup(iterations / 10)
            .iterations(iterations)
            .keep_samples(self.options.keep_samples)
    }

    async fn echo(&self, harness: &BenchmarkHarness) -> Result<Vec<u64>, SuiteError> {
        let entry = &self.entry;
        harness
            .run_with_setup(
                || (),
                move |()| entry.echo(1i64),
                |response| expect_value("echo", &response, &Value::Int(1)),
            )
            .await
    }

    /// One call per primitive kind the bridge converts.
    async fn type_conversion(&self, harness: &BenchmarkHarness) -> Result<Vec<u64>, SuiteError> {
        let entry = &self.entry;
        harness
            .run(move || async move {
                let values = [
                    Value::from("a"),
                    Value::Int(-2),
                    Value::Bool(true),
                    Value::Int(3_000_000_000_000),
                    Value::Float(1.0 / 3.0),
                ];
                for value in values {
                    let response = entry.echo(value.clone()).await?;
                    expect_value("type-conversion", &response, &value)?;
                }
                Ok::<_, SuiteError>(())
            })
            .await
    }

    async fn echo_string(
        &self,
        harness: &BenchmarkHarness,
        case: &'static str,
        limit: usize,
    ) -> Result<Vec<u64>, SuiteError> {
        let payload = self.options.string_payload(limit);
        let expected_len = payload.len();
        let entry = &self.entry;

        harness
            .run_with_setup(
                || Value::Str(payload.clone()),
                move |value| entry.echo(value),
                |response| match response {
                    Value::Str(s) if s.len() == expected_len => Ok(()),
                    other => Err(unexpected(
                        case,
                        format!("expected a {}-byte str, got {}", expected_len, other.kind()),
                    )),
                },
            )
            .await
    }

    async fn get_bytes(
        &self,
        harness: &BenchmarkHarness,
        case: &'static str,
        limit: usize,
    ) -> Result<Vec<u64>, SuiteError> {
        let length = self.options.payload_len(limit);
        let entry = &self.entry;

        harness
            .run_with_setup(
                || (),
                move |()| entry.get_bytes(length),
                |bytes| {
                    if bytes.len() == length {
                        Ok(())
                    } else {
                        Err(unexpected(
                            case,
                            format!("asked for {} bytes, got {}", length, bytes.len()),
                        ))
                    }
                },
            )
            .await
    }

    async fn echo_bytes(&self, harness: &BenchmarkHarness) -> Result<Vec<u64>, SuiteError> {
        let length = self.options.payload_len(LARGE_BYTES).max(1);
        let buffer = ByteGenerator::new(self.options.seed).get_bytes(length);
        let entry = &self.entry;

        harness
            .run_with_setup(
                || buffer.clone(),
                move |buffer| entry.echo_bytes(buffer),
                |result| {
                    let marked = result.len() == length
                        && result.first() == Some(&1)
                        && result.last() == Some(&2);
                    if marked {
                        Ok(())
                    } else {
                        Err(unexpected("echo-bytes", "buffer was not marked"))
                    }
                },
            )
            .await
    }

    /// `max_threads` callers, each on its own connection, calling at once.
    ///
    /// Connections are opened before timing starts. In pinned mode every
    /// caller gets its own server thread.
    async fn multiple_callers(&self, harness: &BenchmarkHarness) -> Result<Vec<u64>, SuiteError> {
        let connection = self.client.connection();
        let (addr, codec) = (connection.peer_addr(), connection.codec());

        let mut clients = Vec::with_capacity(self.options.max_threads);
        for _ in 0..self.options.max_threads {
            clients.push(BridgeClient::connect(addr, codec).await?);
        }
        let entries: Vec<EntryPointProxy> = clients.iter().map(BridgeClient::entry_point).collect();
        let entries = &entries;

        let samples = harness
            .run(move || async move {
                let tasks: Vec<_> = entries
                    .iter()
                    .cloned()
                    .map(|entry| {
                        tokio::spawn(async move {
                            entry.echo(1i64).await?;
                            entry.echo("hello").await?;
                            Ok::<_, BridgeError>(())
                        })
                    })
                    .collect();

                for task in tasks {
                    task.await??;
                }
                Ok::<_, SuiteError>(())
            })
            .await;

        for client in clients {
            client.close().await?;
        }
        samples
    }

    async fn simple_callback(&self, harness: &BenchmarkHarness) -> Result<Vec<u64>, SuiteError> {
        let echo_id = self.client.export_echo(Arc::new(ValueEcho));
        let peer = &echo_id;
        let entry = &self.entry;

        let samples = harness
            .run_with_setup(
                || (),
                move |()| entry.call_echo(peer, 1i64),
                |response| expect_value("simple-callback", &response, &Value::Int(1)),
            )
            .await;

        self.client.unexport(&echo_id)?;
        samples
    }

    async fn recursive_callback(&self, harness: &BenchmarkHarness) -> Result<Vec<u64>, SuiteError> {
        let driver = self.client.export_countdown()?;
        let peer = driver.as_ref();
        let entry = &self.entry;

        let samples = harness
            .run_with_setup(
                || (),
                move |()| entry.start_countdown(RECURSIVE_COUNT, peer),
                |_| {
                    let calls = peer.calls();
                    peer.reset();
                    if calls == RECURSIVE_DRIVER_CALLS {
                        Ok(())
                    } else {
                        Err(unexpected(
                            "recursive-callback",
                            format!(
                                "driver invoked {} times, expected {}",
                                calls, RECURSIVE_DRIVER_CALLS
                            ),
                        ))
                    }
                },
            )
            .await;

        if let Some(id) = driver.object_id() {
            self.client.unexport(id)?;
        }
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_string_is_64_bytes() {
        assert_eq!(DEFAULT_STRING.len(), 64);
    }

    #[test]
    fn test_string_payload_respects_max_bytes() {
        let options = SuiteOptions::default();
        assert_eq!(options.string_payload(MEDIUM_BYTES).len(), 1024);
        assert_eq!(options.string_payload(LARGE_BYTES).len(), LARGE_BYTES);

        let capped = SuiteOptions {
            max_bytes: 200,
            ..SuiteOptions::default()
        };
        // Whole repetitions only.
        assert_eq!(capped.string_payload(LARGE_BYTES).len(), 192);
        assert_eq!(capped.payload_len(LARGE_BYTES), 200);
    }

    #[test]
    fn test_case_names_are_unique() {
        let mut names = CASES.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CASES.len());
    }
}
