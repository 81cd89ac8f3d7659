// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Call bridge.
//!
//! Full-duplex calls over TCP with length-prefixed, checksummed JSON frames.
//! Each side exports objects by id; references passed as arguments become
//! proxies, which is what lets the countdown bounce between driver and callee.

mod client;
mod codec;
mod connection;
mod dispatch;
mod protocol;
mod proxy;
mod registry;
mod server;

pub use client::{BridgeClient, EntryPointProxy};
pub use codec::{FrameCodec, DEFAULT_MAX_FRAME_SIZE, HEADER_LEN, MAX_FRAME_SIZE, MIN_FRAME_SIZE};
pub use connection::Connection;
pub use dispatch::{CountdownObject, EchoObject, EntryPoint, Exported, Invocation};
pub use protocol::{method, CallId, Message, Value};
pub use proxy::{RemoteCountdown, RemoteEcho};
pub use registry::ObjectRegistry;
pub use server::BridgeServer;
