//! Custom error types for bridgebench.
//!
//! Explicit enum error types only. No `Box<dyn Error>` and no `anyhow::Result`
//! in library code: every failure a caller can observe has its own variant.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ObjectId;

/// Top-level error type for the bridge and the exerciser.
#[derive(Debug, Error)]
pub enum BridgeError {
    // =========================================================================
    // Configuration Errors - Fail-Fast on Invalid Config
    // =========================================================================
    #[error("Hard validation error: {0}")]
    HardValidation(#[from] HardValidationError),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    // =========================================================================
    // Exerciser Errors
    // =========================================================================
    #[error("Invalid argument to {method}: {reason}")]
    InvalidArgument {
        method: &'static str,
        reason: String,
    },

    #[error("Countdown peer is not exported over the bridge")]
    PeerNotExported,

    #[error("Countdown object was dropped during a call")]
    ObjectDropped,

    #[error("Countdown hop failed: {0}")]
    Hop(#[from] tokio::task::JoinError),

    // =========================================================================
    // Dispatch Errors
    // =========================================================================
    #[error("Object not found: {0}")]
    ObjectNotFound(ObjectId),

    #[error("Object already exported: {0}")]
    ObjectAlreadyExported(ObjectId),

    #[error("Unknown method '{method}' on object {object}")]
    UnknownMethod { object: ObjectId, method: String },

    #[error("Remote call failed: {message}")]
    Remote { message: String },

    // =========================================================================
    // Transport Errors - No Retry
    // =========================================================================
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl BridgeError {
    /// Shorthand for an invalid-argument error.
    pub fn invalid_argument(method: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            method,
            reason: reason.into(),
        }
    }

    /// Wrap an IO error with a static context string.
    pub fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }
}

/// Hard validation errors stop the process at startup.
/// Used when configuration is invalid and the server cannot safely start.
#[derive(Debug, Error)]
pub enum HardValidationError {
    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid port: {port} - {reason}")]
    InvalidPort { port: u16, reason: String },

    #[error("Frame limit out of bounds: {limit_bytes} bytes (min: {min}, max: {max})")]
    FrameLimitOutOfBounds {
        limit_bytes: usize,
        min: usize,
        max: usize,
    },
}

/// Wire framing errors. On the read side any of these terminates the connection.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Frame size exceeds maximum: {size} > {max}")]
    TooLarge { size: usize, max: usize },

    #[error("Frame checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("Malformed frame payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Connection ended in the middle of a frame")]
    Truncated,
}

/// Result type alias using BridgeError.
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_display() {
        let err = BridgeError::invalid_argument("echo_bytes", "buffer must not be empty");
        assert!(err.to_string().contains("echo_bytes"));
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_error_chain() {
        let validation_err = HardValidationError::InvalidPort {
            port: 0,
            reason: "Port must be non-zero".to_string(),
        };
        let err: BridgeError = validation_err.into();
        assert!(matches!(err, BridgeError::HardValidation(_)));

        let frame_err = FrameError::ChecksumMismatch {
            expected: 1,
            actual: 2,
        };
        let err: BridgeError = frame_err.into();
        assert!(err.to_string().contains("0x00000001"));
    }
}
