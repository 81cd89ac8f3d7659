// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Local stand-ins for objects living on the other side of a connection.

use std::sync::Arc;

use async_trait::async_trait;

use super::connection::Connection;
use super::protocol::{method, Value};
use crate::error::{BridgeError, BridgeResult};
use crate::exerciser::{Countdown, Echo};
use crate::types::ObjectId;

/// A countdown exported by the peer.
#[derive(Debug, Clone)]
pub struct RemoteCountdown {
    connection: Connection,
    target: ObjectId,
}

impl RemoteCountdown {
    pub fn new(connection: Connection, target: ObjectId) -> Self {
        Self { connection, target }
    }

    pub fn target(&self) -> &ObjectId {
        &self.target
    }
}

#[async_trait]
impl Countdown for RemoteCountdown {
    async fn countdown(&self, count: i64, peer: Arc<dyn Countdown>) -> BridgeResult<i64> {
        let handle = peer.object_id().cloned().ok_or(BridgeError::PeerNotExported)?;
        self.connection
            .call(
                &self.target,
                method::COUNTDOWN,
                vec![Value::Int(count), Value::Ref(handle)],
            )
            .await?
            .into_int(method::COUNTDOWN)
    }

    fn is_remote(&self) -> bool {
        true
    }
}

/// An echo object exported by the peer.
#[derive(Debug, Clone)]
pub struct RemoteEcho {
    connection: Connection,
    target: ObjectId,
}

impl RemoteEcho {
    pub fn new(connection: Connection, target: ObjectId) -> Self {
        Self { connection, target }
    }
}

#[async_trait]
impl Echo for RemoteEcho {
    async fn echo(&self, value: Value) -> BridgeResult<Value> {
        self.connection
            .call(&self.target, method::ECHO, vec![value])
            .await
    }
}
