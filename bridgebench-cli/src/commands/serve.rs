// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `bridgebench serve` command - Serve the benchmark utility.

use std::net::IpAddr;
use std::path::Path;

use bridgebench_core::{BridgeServer, ConfigLoader, Port, Seed, ServerConfig, ServerMode};

/// Command-line values that take precedence over the configuration file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub seed: Option<Seed>,
    pub mode: Option<ServerMode>,
    pub bind: Option<IpAddr>,
    pub port: Option<u16>,
}

impl Overrides {
    pub fn apply(self, mut server: ServerConfig) -> Result<ServerConfig, Box<dyn std::error::Error>> {
        if let Some(seed) = self.seed {
            server.seed = seed;
        }
        if let Some(mode) = self.mode {
            server.mode = mode;
        }
        if let Some(bind) = self.bind {
            server.bind = bind;
        }
        if let Some(port) = self.port {
            server.port = Port::new(port)?;
        }
        Ok(server)
    }
}

pub async fn execute(
    config_path: Option<&Path>,
    overrides: Overrides,
) -> Result<(), Box<dyn std::error::Error>> {
    // Fail fast on invalid config
    let config = ConfigLoader::load_optional(config_path)?;
    let server_config = overrides.apply(config.server)?;

    let server = BridgeServer::bind(&server_config).await?;

    println!("bridgebench {}", env!("CARGO_PKG_VERSION"));
    println!("  Listening:  {}", server.local_addr()?);
    println!("  Mode:       {}", server.mode());
    println!("  Seed:       {}", server.utility().seed());
    println!();
    println!("Press Ctrl+C to stop");

    tokio::select! {
        result = server.serve() => result?,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("Interrupted, exiting");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_take_precedence() {
        let overrides = Overrides {
            seed: Some(Seed::new(99)),
            mode: Some(ServerMode::Pinned),
            bind: Some("0.0.0.0".parse().unwrap()),
            port: Some(4000),
        };

        let server = overrides.apply(ServerConfig::default()).unwrap();
        assert_eq!(server.seed, Seed::new(99));
        assert_eq!(server.mode, ServerMode::Pinned);
        assert_eq!(server.port.value(), 4000);
        assert_eq!(server.socket_addr().to_string(), "0.0.0.0:4000");
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let base = ServerConfig::default();
        let server = Overrides::default().apply(base.clone()).unwrap();
        assert_eq!(server, base);
    }

    #[test]
    fn test_port_zero_rejected() {
        let overrides = Overrides {
            port: Some(0),
            ..Overrides::default()
        };
        assert!(overrides.apply(ServerConfig::default()).is_err());
    }
}
