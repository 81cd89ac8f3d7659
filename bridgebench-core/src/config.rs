// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! YAML configuration parser with strict validation.
//!
//! Every field has a default, so the file is optional. Whatever is present is
//! validated at startup; an invalid field is a HardValidationError and the
//! server does not start.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

use serde::Deserialize;

use crate::bridge::{FrameCodec, DEFAULT_MAX_FRAME_SIZE, MAX_FRAME_SIZE, MIN_FRAME_SIZE};
use crate::error::{BridgeError, BridgeResult, HardValidationError};
use crate::types::{Port, Seed, ServerMode};

/// Raw server section as parsed from YAML (before validation).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawServerConfig {
    #[serde(default = "default_bind")]
    bind: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_mode")]
    mode: String,
    #[serde(default = "default_seed")]
    seed: i64,
    #[serde(default = "default_max_frame_bytes")]
    max_frame_bytes: usize,
}

fn default_bind() -> String {
    Ipv4Addr::LOCALHOST.to_string()
}

fn default_port() -> u16 {
    Port::DEFAULT
}

fn default_mode() -> String {
    ServerMode::default().name().to_string()
}

fn default_seed() -> i64 {
    Seed::DEFAULT.value()
}

fn default_max_frame_bytes() -> usize {
    DEFAULT_MAX_FRAME_SIZE
}

impl Default for RawServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            mode: default_mode(),
            seed: default_seed(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

/// Raw root configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    server: RawServerConfig,
}

/// Validated server configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: Port,
    pub mode: ServerMode,
    pub seed: Seed,
    pub max_frame_bytes: usize,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port.value())
    }

    /// Frame codec honoring the configured size limit.
    pub fn codec(&self) -> FrameCodec {
        FrameCodec::new(self.max_frame_bytes)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: Port::default(),
            mode: ServerMode::default(),
            seed: Seed::DEFAULT,
            max_frame_bytes: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Complete validated configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub server: ServerConfig,
}

/// Configuration loader with strict validation.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> BridgeResult<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(BridgeError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| BridgeError::io("reading config file", e))?;

        Self::load_string(&content)
    }

    /// Load from a file when one is given, otherwise use defaults.
    pub fn load_optional(path: Option<impl AsRef<Path>>) -> BridgeResult<Config> {
        match path {
            Some(path) => Self::load_file(path),
            None => Ok(Config::default()),
        }
    }

    /// Load and validate configuration from a YAML string.
    pub fn load_string(content: &str) -> BridgeResult<Config> {
        if content.trim().is_empty() {
            return Self::validate(RawConfig::default());
        }

        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| BridgeError::ConfigParse {
                message: format!("YAML parse error: {}", e),
            })?;

        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> BridgeResult<Config> {
        Ok(Config {
            server: Self::validate_server(raw.server)?,
        })
    }

    fn validate_server(raw: RawServerConfig) -> BridgeResult<ServerConfig> {
        let bind: IpAddr =
            raw.bind
                .parse()
                .map_err(|_| HardValidationError::InvalidFieldValue {
                    field: "bind",
                    value: raw.bind.clone(),
                    reason: "Must be an IPv4 or IPv6 address".to_string(),
                })?;

        let port = Port::new(raw.port)?;
        let mode: ServerMode = raw.mode.parse()?;

        if !(MIN_FRAME_SIZE..=MAX_FRAME_SIZE).contains(&raw.max_frame_bytes) {
            return Err(HardValidationError::FrameLimitOutOfBounds {
                limit_bytes: raw.max_frame_bytes,
                min: MIN_FRAME_SIZE,
                max: MAX_FRAME_SIZE,
            }
            .into());
        }

        Ok(ServerConfig {
            bind,
            port,
            mode,
            seed: Seed::new(raw.seed),
            max_frame_bytes: raw.max_frame_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_CONFIG: &str = r#"
server:
  bind: 0.0.0.0
  port: 25334
  mode: pinned
  seed: 42
  max_frame_bytes: 1048576
"#;

    #[test]
    fn test_valid_config() {
        let config = ConfigLoader::load_string(VALID_CONFIG).unwrap();
        assert_eq!(config.server.port.value(), 25334);
        assert_eq!(config.server.mode, ServerMode::Pinned);
        assert_eq!(config.server.seed, Seed::new(42));
        assert_eq!(config.server.max_frame_bytes, 1024 * 1024);
        assert_eq!(config.server.socket_addr().to_string(), "0.0.0.0:25334");
    }

    #[test]
    fn test_defaults_applied() {
        let config = ConfigLoader::load_string("server: {}").unwrap();
        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.server.seed.value(), 17);
        assert_eq!(config.server.mode, ServerMode::PerCall);
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ConfigLoader::load_string("  \n").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_port_zero() {
        let yaml = "server:\n  port: 0\n";
        assert!(matches!(
            ConfigLoader::load_string(yaml),
            Err(BridgeError::HardValidation(HardValidationError::InvalidPort { .. }))
        ));
    }

    #[test]
    fn test_invalid_mode() {
        let yaml = "server:\n  mode: threaded\n";
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_invalid_bind() {
        let yaml = "server:\n  bind: localhost\n";
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_frame_limit_bounds() {
        let yaml = "server:\n  max_frame_bytes: 10\n";
        assert!(matches!(
            ConfigLoader::load_string(yaml),
            Err(BridgeError::HardValidation(
                HardValidationError::FrameLimitOutOfBounds { .. }
            ))
        ));
    }

    #[test]
    fn test_non_numeric_seed() {
        let yaml = "server:\n  seed: abc\n";
        assert!(matches!(
            ConfigLoader::load_string(yaml),
            Err(BridgeError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "server:\n  prot: 1234\n";
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::load_file("/nonexistent/bridgebench.yaml");
        assert!(matches!(result, Err(BridgeError::ConfigNotFound { .. })));
    }
}
