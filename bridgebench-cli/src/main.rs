// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! bridgebench CLI
//!
//! Serves the benchmark utility over the call bridge.

use std::net::IpAddr;
use std::path::PathBuf;

use bridgebench_core::{Seed, ServerMode};
use clap::{Parser, Subcommand};

mod commands;

/// bridgebench - cross-language call benchmark target
#[derive(Parser)]
#[command(name = "bridgebench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the benchmark utility until killed
    Serve {
        /// Generator seed (default 17)
        seed: Option<Seed>,

        /// Call scheduling: per-call or pinned
        #[arg(short, long)]
        mode: Option<ServerMode>,

        /// Address to bind
        #[arg(short, long)]
        bind: Option<IpAddr>,

        /// Port to listen on (default 25333)
        #[arg(short, long)]
        port: Option<u16>,

        /// Configuration file; flags override its values
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    match cli.command {
        Commands::Serve {
            seed,
            mode,
            bind,
            port,
            config,
        } => {
            let overrides = commands::serve::Overrides {
                seed,
                mode,
                bind,
                port,
            };
            commands::serve::execute(config.as_deref(), overrides).await
        }
        Commands::Validate { file } => commands::validate::execute(&file).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["bridgebench", "serve"]).unwrap();
        match cli.command {
            Commands::Serve { seed, mode, .. } => {
                assert!(seed.is_none());
                assert!(mode.is_none());
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_serve_seed_and_mode() {
        let cli =
            Cli::try_parse_from(["bridgebench", "serve", "42", "--mode", "pinned", "-v"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Serve { seed, mode, .. } => {
                assert_eq!(seed, Some(Seed::new(42)));
                assert_eq!(mode, Some(ServerMode::Pinned));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_serve_negative_seed() {
        let cli = Cli::try_parse_from(["bridgebench", "serve", "--", "-5"]).unwrap();
        match cli.command {
            Commands::Serve { seed, .. } => assert_eq!(seed, Some(Seed::new(-5))),
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_non_numeric_seed_fails_fast() {
        assert!(Cli::try_parse_from(["bridgebench", "serve", "seventeen"]).is_err());
    }

    #[test]
    fn test_invalid_mode_rejected() {
        assert!(Cli::try_parse_from(["bridgebench", "serve", "--mode", "pooled"]).is_err());
    }
}
