// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Bridgebench Core Library
//!
//! Callee side of the bridgebench call benchmark. Provides the deterministic
//! byte generator, the call-pattern exerciser (echo, mutate-and-return,
//! recursive countdown), configuration parsing, and the small full-duplex
//! call bridge that exposes them to a driver process.

pub mod bridge;
pub mod config;
pub mod error;
pub mod exerciser;
pub mod rng;
pub mod types;

// Re-export commonly used types
pub use bridge::{BridgeClient, BridgeServer, EntryPointProxy, Value};
pub use config::{Config, ConfigLoader, ServerConfig};
pub use error::{BridgeError, BridgeResult, FrameError, HardValidationError};
pub use exerciser::{BenchmarkUtility, Countdown, CountdownExerciser, Echo, ValueEcho};
pub use rng::{ByteGenerator, JavaRandom};
pub use types::{ObjectId, Port, Seed, ServerMode};
