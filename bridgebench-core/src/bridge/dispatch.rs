// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Method dispatch for exported objects.
//!
//! An [`Exported`] object turns a named call with positional [`Value`]
//! arguments into a call on a typed exerciser. Reference arguments become
//! remote proxies bound to the connection the call arrived on.

use std::sync::Arc;

use async_trait::async_trait;

use super::connection::Connection;
use super::protocol::{method, Args, Value};
use super::proxy::{RemoteCountdown, RemoteEcho};
use crate::error::{BridgeError, BridgeResult};
use crate::exerciser::{BenchmarkUtility, Countdown, Echo};
use crate::types::ObjectId;

/// An incoming call, resolved to its target object.
pub struct Invocation<'a> {
    pub target: &'a ObjectId,
    pub method: &'a str,
    pub args: Vec<Value>,
    pub connection: &'a Connection,
}

impl Invocation<'_> {
    /// Error for a method the target does not implement.
    pub fn unknown_method(&self) -> BridgeError {
        BridgeError::UnknownMethod {
            object: self.target.clone(),
            method: self.method.to_string(),
        }
    }

    /// Move the positional arguments out, checking their count.
    fn take_args(&mut self, method: &'static str, expected: usize) -> BridgeResult<Args> {
        Args::new(method, std::mem::take(&mut self.args), expected)
    }

    /// Proxy for a countdown exported by the caller.
    fn remote_countdown(&self, id: ObjectId) -> Arc<dyn Countdown> {
        Arc::new(RemoteCountdown::new(self.connection.clone(), id))
    }
}

/// Something callable by the peer.
#[async_trait]
pub trait Exported: Send + Sync {
    async fn invoke(&self, call: Invocation<'_>) -> BridgeResult<Value>;
}

/// The callee entry point, exported as `entry_point`.
#[derive(Debug, Clone)]
pub struct EntryPoint {
    utility: Arc<BenchmarkUtility>,
}

impl EntryPoint {
    pub fn new(utility: Arc<BenchmarkUtility>) -> Self {
        Self { utility }
    }
}

#[async_trait]
impl Exported for EntryPoint {
    async fn invoke(&self, call: Invocation<'_>) -> BridgeResult<Value> {
        let mut call = call;
        let name = call.method;
        match name {
            method::SEED => {
                call.take_args(method::SEED, 0)?;
                Ok(Value::Int(self.utility.seed().value()))
            }
            method::GET_BYTES => {
                let mut args = call.take_args(method::GET_BYTES, 1)?;
                let length = args.int()?;
                let length = usize::try_from(length).map_err(|_| {
                    BridgeError::invalid_argument(
                        method::GET_BYTES,
                        format!("length must be non-negative, got {}", length),
                    )
                })?;
                // Base64 on the wire; refuse before allocating what could never be sent.
                let encoded = length.div_ceil(3).saturating_mul(4);
                let limit = call.connection.codec().max_frame_size();
                if encoded > limit {
                    return Err(BridgeError::invalid_argument(
                        method::GET_BYTES,
                        format!(
                            "reply of {} encoded bytes exceeds the {} byte frame limit",
                            encoded, limit
                        ),
                    ));
                }
                Ok(Value::Bytes(self.utility.get_bytes(length)))
            }
            method::ECHO => {
                let mut args = call.take_args(method::ECHO, 1)?;
                Ok(self.utility.echo(args.value()?))
            }
            method::ECHO_BYTES => {
                let mut args = call.take_args(method::ECHO_BYTES, 1)?;
                let buffer = self.utility.echo_bytes(args.bytes()?)?;
                Ok(Value::Bytes(buffer))
            }
            method::COUNTDOWN => {
                let mut args = call.take_args(method::COUNTDOWN, 2)?;
                let count = args.int()?;
                let peer = call.remote_countdown(args.object()?);
                Ok(Value::Int(self.utility.countdown(count, peer).await?))
            }
            method::START_COUNTDOWN => {
                let mut args = call.take_args(method::START_COUNTDOWN, 2)?;
                let count = args.int()?;
                let peer = call.remote_countdown(args.object()?);
                Ok(Value::Int(self.utility.start_countdown(count, peer).await?))
            }
            method::CALL_ECHO => {
                let mut args = call.take_args(method::CALL_ECHO, 2)?;
                let peer = RemoteEcho::new(call.connection.clone(), args.object()?);
                self.utility.call_echo(&peer, args.value()?).await
            }
            _ => Err(call.unknown_method()),
        }
    }
}

/// Exports a local [`Countdown`] so the peer can bounce into it.
pub struct CountdownObject {
    inner: Arc<dyn Countdown>,
}

impl CountdownObject {
    pub fn new(inner: Arc<dyn Countdown>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Exported for CountdownObject {
    async fn invoke(&self, call: Invocation<'_>) -> BridgeResult<Value> {
        let mut call = call;
        if call.method != method::COUNTDOWN {
            return Err(call.unknown_method());
        }
        let mut args = call.take_args(method::COUNTDOWN, 2)?;
        let count = args.int()?;
        let peer = call.remote_countdown(args.object()?);
        Ok(Value::Int(self.inner.countdown(count, peer).await?))
    }
}

/// Exports a local [`Echo`].
pub struct EchoObject {
    inner: Arc<dyn Echo>,
}

impl EchoObject {
    pub fn new(inner: Arc<dyn Echo>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Exported for EchoObject {
    async fn invoke(&self, call: Invocation<'_>) -> BridgeResult<Value> {
        let mut call = call;
        if call.method != method::ECHO {
            return Err(call.unknown_method());
        }
        let mut args = call.take_args(method::ECHO, 1)?;
        self.inner.echo(args.value()?).await
    }
}
