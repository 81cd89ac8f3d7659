// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `bridgebench validate` command - Validate configuration file.

use std::path::Path;

use bridgebench_core::ConfigLoader;

pub async fn execute(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(file = %file.display(), "Validating configuration");

    match ConfigLoader::load_file(file) {
        Ok(config) => {
            let server = &config.server;
            println!("✓ Configuration is valid");
            println!();
            println!("Server Settings:");
            println!("  Address:         {}", server.socket_addr());
            println!("  Mode:            {}", server.mode);
            println!("  Seed:            {}", server.seed);
            println!("  Max Frame Size:  {} bytes", server.max_frame_bytes);
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed:");
            eprintln!("  {}", e);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_validate_accepts_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  port: 26000\n  mode: pinned").unwrap();

        assert!(execute(file.path()).await.is_ok());
    }

    #[tokio::test]
    async fn test_validate_reports_invalid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  port: 0\n  mode: sideways").unwrap();

        assert!(execute(file.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_validate_reports_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = execute(&dir.path().join("absent.yaml")).await;

        let message = result.unwrap_err().to_string();
        assert!(message.contains("not found"), "{}", message);
    }
}
