// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI tool to run the benchmark suite and generate reports.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use bridgebench_benchmark::suite::{DEFAULT_MAX_BYTES, DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_THREADS};
use bridgebench_benchmark::{
    BenchmarkReport, BenchmarkSuite, CsvReporter, JsonReporter, LatencyMetrics, SuiteOptions, CASES,
};
use bridgebench_core::bridge::FrameCodec;
use bridgebench_core::{BridgeClient, BridgeServer, Seed, ServerConfig, ServerMode};
use clap::Parser;
use tokio::task::JoinHandle;

#[derive(Parser)]
#[command(name = "run_benchmarks")]
#[command(about = "Run the bridgebench suite and generate CSV/JSON reports")]
struct Args {
    /// Benchmark an already running server instead of starting one in-process
    #[arg(long)]
    connect: Option<SocketAddr>,

    /// Mode the --connect server was started with (recorded in results)
    #[arg(long, default_value = "per-call")]
    mode: ServerMode,

    /// Skip the pinned-thread run of the in-process server
    #[arg(long)]
    no_pinned_thread: bool,

    /// Where to save a CSV of the results
    #[arg(long)]
    csv_output: Option<PathBuf>,

    /// Append to the CSV file and keep its header if it exists
    #[arg(long)]
    append_to_csv: bool,

    /// Directory for a JSON report
    #[arg(long)]
    json_output: Option<PathBuf>,

    /// Maximum number of bytes transferred in a single call
    #[arg(long, default_value_t = DEFAULT_MAX_BYTES)]
    max_bytes: usize,

    /// Measured iterations per case
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    max_iterations: u64,

    /// Concurrent callers in the multiple-calling-threads case
    #[arg(long, default_value_t = DEFAULT_MAX_THREADS)]
    max_threads: usize,

    /// Seed the server runs with
    #[arg(long, default_value_t = Seed::DEFAULT)]
    seed: Seed,

    /// Cases to run (all if not specified)
    #[arg(long = "case")]
    cases: Vec<String>,

    /// Leave raw samples out of the JSON report
    #[arg(long)]
    no_raw_samples: bool,

    /// Print progress as the benchmark runs
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    let cases: Vec<&str> = if args.cases.is_empty() {
        CASES.to_vec()
    } else {
        for case in &args.cases {
            anyhow::ensure!(CASES.contains(&case.as_str()), "unknown case '{}'", case);
        }
        args.cases.iter().map(String::as_str).collect()
    };

    let options = SuiteOptions {
        max_bytes: args.max_bytes,
        max_iterations: args.max_iterations,
        max_threads: args.max_threads,
        seed: args.seed,
        keep_samples: !args.no_raw_samples,
    };

    println!("bridgebench Benchmark Suite");
    println!("===========================");
    println!("Iterations: {}", options.max_iterations);
    println!("Seed:       {}", options.seed);
    println!();

    let mut report = BenchmarkReport::new();

    match args.connect {
        Some(addr) => {
            run_suite(addr, args.mode, &options, &cases, &mut report).await?;
        }
        None => {
            let mut modes = vec![ServerMode::PerCall];
            if !args.no_pinned_thread {
                modes.push(ServerMode::Pinned);
            }

            for mode in modes {
                let (addr, server) = start_server(mode, &options).await?;
                let outcome = run_suite(addr, mode, &options, &cases, &mut report).await;
                server.abort();
                outcome?;
            }
        }
    }

    if let Some(path) = &args.csv_output {
        CsvReporter::new(path, args.append_to_csv)
            .write(&report)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("CSV results written to: {}", path.display());
    }

    if let Some(dir) = &args.json_output {
        let path = JsonReporter::new(dir)?.save(&report)?;
        println!("Benchmark report saved to: {}", path.display());
    }

    println!();
    print_summary(&report);

    Ok(())
}

/// In-process server on an ephemeral loopback port.
async fn start_server(
    mode: ServerMode,
    options: &SuiteOptions,
) -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
    let config = ServerConfig {
        mode,
        seed: options.seed,
        ..ServerConfig::default()
    };
    let server = BridgeServer::bind_addr(SocketAddr::from(([127, 0, 0, 1], 0)), &config).await?;
    let addr = server.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = server.serve().await {
            tracing::error!(error = %e, "Benchmark server stopped");
        }
    });
    Ok((addr, handle))
}

async fn run_suite(
    addr: SocketAddr,
    mode: ServerMode,
    options: &SuiteOptions,
    cases: &[&str],
    report: &mut BenchmarkReport,
) -> anyhow::Result<()> {
    println!("Running {} tests against {}", mode, addr);

    let client = BridgeClient::connect(addr, FrameCodec::default())
        .await
        .with_context(|| format!("connecting to {}", addr))?;

    let suite = BenchmarkSuite::new(&client, mode, options.clone());
    suite.verify().await?;
    suite.run(cases, report).await?;

    client.close().await?;
    Ok(())
}

fn print_summary(report: &BenchmarkReport) {
    println!("Summary");
    println!("-------");
    println!();

    for result in &report.results {
        println!(
            "{} [{}]: mean={}, stddev={}, p99={}, total={}",
            result.name,
            result.server_mode,
            LatencyMetrics::format_latency(result.latency.mean_ns as u64),
            LatencyMetrics::format_latency(result.latency.std_dev_ns as u64),
            LatencyMetrics::format_latency(result.latency.p99_ns),
            LatencyMetrics::format_latency(result.latency.total_ns),
        );
    }
}
