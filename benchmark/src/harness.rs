// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Benchmark harness for running and timing bridge calls.
//!
//! Each iteration is `setup -> operation -> cleanup`; only the operation is
//! timed. Samples are collected in nanoseconds for statistical analysis.

use std::future::Future;
use std::time::Instant;

/// A benchmark harness for measuring call latency.
pub struct BenchmarkHarness {
    /// Number of warmup iterations before measurement
    warmup_iterations: u64,
    /// Number of measurement iterations
    measurement_iterations: u64,
    /// Whether to keep raw sample data
    keep_raw_samples: bool,
}

impl BenchmarkHarness {
    /// Create a new benchmark harness with default settings.
    pub fn new() -> Self {
        Self {
            warmup_iterations: 10,
            measurement_iterations: 100,
            keep_raw_samples: true,
        }
    }

    /// Set the number of warmup iterations.
    pub fn warmup(mut self, iterations: u64) -> Self {
        self.warmup_iterations = iterations;
        self
    }

    /// Set the number of measurement iterations.
    pub fn iterations(mut self, iterations: u64) -> Self {
        self.measurement_iterations = iterations;
        self
    }

    /// Set whether to keep raw sample data.
    pub fn keep_samples(mut self, keep: bool) -> Self {
        self.keep_raw_samples = keep;
        self
    }

    /// Run an async operation and collect latency samples.
    ///
    /// The first error aborts the run.
    pub async fn run<F, Fut, T, E>(&self, mut operation: F) -> Result<Vec<u64>, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_with_setup(|| (), |()| operation(), |_| Ok(())).await
    }

    /// Run with per-iteration setup and cleanup phases.
    ///
    /// `setup` produces the operation's input and `cleanup` receives its
    /// output. Neither is timed, so payload copies and result checks belong
    /// there. Warmup iterations go through all three phases as well.
    pub async fn run_with_setup<S, I, O, Fut, T, OpErr, C, E>(
        &self,
        mut setup: S,
        mut operation: O,
        mut cleanup: C,
    ) -> Result<Vec<u64>, E>
    where
        S: FnMut() -> I,
        O: FnMut(I) -> Fut,
        Fut: Future<Output = Result<T, OpErr>>,
        C: FnMut(T) -> Result<(), E>,
        E: From<OpErr>,
    {
        // Warmup phase
        for _ in 0..self.warmup_iterations {
            let input = setup();
            let output = operation(input).await?;
            cleanup(output)?;
        }

        // Measurement phase
        let mut samples = Vec::with_capacity(self.measurement_iterations as usize);
        for _ in 0..self.measurement_iterations {
            let input = setup();

            let start = Instant::now();
            let output = operation(input).await?;
            let elapsed = start.elapsed();

            cleanup(output)?;
            samples.push(elapsed.as_nanos() as u64);
        }

        Ok(samples)
    }

    /// Check if raw samples should be kept.
    pub fn should_keep_samples(&self) -> bool {
        self.keep_raw_samples
    }
}

impl Default for BenchmarkHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_harness_basic() {
        let harness = BenchmarkHarness::new().warmup(2).iterations(20);

        let samples = harness
            .run(|| async {
                tokio::time::sleep(Duration::from_micros(100)).await;
                Ok::<_, ()>(())
            })
            .await
            .unwrap();

        assert_eq!(samples.len(), 20);
        // Each sample should be at least 100μs
        for sample in &samples {
            assert!(*sample >= 100_000, "Sample {} < 100μs", sample);
        }
    }

    #[tokio::test]
    async fn test_setup_and_cleanup_run_every_iteration() {
        let harness = BenchmarkHarness::new().warmup(3).iterations(7);
        let mut setups = 0;
        let mut cleanups = Vec::new();

        let samples = harness
            .run_with_setup(
                || {
                    setups += 1;
                    setups
                },
                |n| async move { Ok::<_, ()>(n * 10) },
                |out| {
                    cleanups.push(out);
                    Ok::<_, ()>(())
                },
            )
            .await
            .unwrap();

        assert_eq!(samples.len(), 7);
        assert_eq!(setups, 10);
        assert_eq!(cleanups.len(), 10);
        assert_eq!(cleanups[9], 100);
    }

    #[tokio::test]
    async fn test_cleanup_is_not_timed() {
        let harness = BenchmarkHarness::new().warmup(0).iterations(5);

        let samples = harness
            .run_with_setup(
                || std::thread::sleep(Duration::from_millis(5)),
                |()| async { Ok::<_, ()>(()) },
                |()| {
                    std::thread::sleep(Duration::from_millis(5));
                    Ok::<_, ()>(())
                },
            )
            .await
            .unwrap();

        for sample in &samples {
            assert!(*sample < 5_000_000, "Sample {} includes setup/cleanup", sample);
        }
    }

    #[tokio::test]
    async fn test_error_aborts_run() {
        let harness = BenchmarkHarness::new().warmup(0).iterations(10);
        let mut calls = 0;

        let result = harness
            .run(|| {
                calls += 1;
                let current = calls;
                async move {
                    if current == 3 {
                        Err("boom")
                    } else {
                        Ok(())
                    }
                }
            })
            .await;

        assert_eq!(result, Err("boom"));
        assert_eq!(calls, 3);
    }
}
