// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Driver-side bridge client.

use std::sync::Arc;

use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::task::JoinHandle;

use super::codec::FrameCodec;
use super::connection::Connection;
use super::dispatch::{CountdownObject, EchoObject};
use super::protocol::{method, Value};
use super::registry::ObjectRegistry;
use crate::error::{BridgeError, BridgeResult};
use crate::exerciser::{Countdown, CountdownExerciser, Echo};
use crate::types::{ObjectId, Seed};

/// Connection from a driver to a bridge server.
///
/// Dropping the client stops its reader task, which closes the socket.
pub struct BridgeClient {
    connection: Connection,
    reader: JoinHandle<BridgeResult<()>>,
}

impl BridgeClient {
    pub async fn connect(addr: impl ToSocketAddrs, codec: FrameCodec) -> BridgeResult<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| BridgeError::io("connecting to bridge server", e))?;
        let (connection, reader) = Connection::spawn(stream, ObjectRegistry::new_shared(), codec)?;

        tracing::debug!(peer = %connection.peer_addr(), "Connected to bridge server");
        Ok(Self { connection, reader })
    }

    /// Typed handle to the callee entry point.
    pub fn entry_point(&self) -> EntryPointProxy {
        EntryPointProxy {
            connection: self.connection.clone(),
            target: ObjectId::entry_point(),
        }
    }

    /// Export a fresh countdown the callee can bounce into.
    pub fn export_countdown(&self) -> BridgeResult<Arc<CountdownExerciser>> {
        let registry = self.connection.registry();
        let id = registry.allocate_id();
        let countdown = CountdownExerciser::exported(id.clone());
        registry.register_as(id, Arc::new(CountdownObject::new(countdown.clone())))?;
        Ok(countdown)
    }

    /// Export an echo object; the returned id can be passed to `call_echo`.
    pub fn export_echo(&self, echo: Arc<dyn Echo>) -> ObjectId {
        self.connection
            .registry()
            .register(Arc::new(EchoObject::new(echo)))
    }

    /// Stop exporting an object.
    pub fn unexport(&self, id: &ObjectId) -> BridgeResult<()> {
        self.connection.registry().unregister(id).map(|_| ())
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Close the write side so the server sees end-of-stream.
    pub async fn close(self) -> BridgeResult<()> {
        self.connection.shutdown().await
    }
}

impl Drop for BridgeClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Typed calls on the callee entry point.
#[derive(Debug, Clone)]
pub struct EntryPointProxy {
    connection: Connection,
    target: ObjectId,
}

impl EntryPointProxy {
    async fn call(&self, name: &str, args: Vec<Value>) -> BridgeResult<Value> {
        self.connection.call(&self.target, name, args).await
    }

    pub async fn seed(&self) -> BridgeResult<Seed> {
        let seed = self.call(method::SEED, Vec::new()).await?;
        Ok(Seed::new(seed.into_int(method::SEED)?))
    }

    pub async fn get_bytes(&self, length: usize) -> BridgeResult<Vec<u8>> {
        let length = i64::try_from(length).map_err(|_| {
            BridgeError::invalid_argument(method::GET_BYTES, "length does not fit in i64")
        })?;
        self.call(method::GET_BYTES, vec![Value::Int(length)])
            .await?
            .into_bytes(method::GET_BYTES)
    }

    pub async fn echo(&self, value: impl Into<Value>) -> BridgeResult<Value> {
        self.call(method::ECHO, vec![value.into()]).await
    }

    pub async fn echo_bytes(&self, buffer: Vec<u8>) -> BridgeResult<Vec<u8>> {
        self.call(method::ECHO_BYTES, vec![Value::Bytes(buffer)])
            .await?
            .into_bytes(method::ECHO_BYTES)
    }

    /// Enter the countdown on the callee side with `peer` as the driver half.
    pub async fn countdown(&self, count: i64, peer: &dyn Countdown) -> BridgeResult<i64> {
        let handle = peer.object_id().cloned().ok_or(BridgeError::PeerNotExported)?;
        self.call(method::COUNTDOWN, vec![Value::Int(count), Value::Ref(handle)])
            .await?
            .into_int(method::COUNTDOWN)
    }

    /// Have the callee start a countdown against `peer`.
    pub async fn start_countdown(&self, count: i64, peer: &dyn Countdown) -> BridgeResult<i64> {
        let handle = peer.object_id().cloned().ok_or(BridgeError::PeerNotExported)?;
        self.call(
            method::START_COUNTDOWN,
            vec![Value::Int(count), Value::Ref(handle)],
        )
        .await?
        .into_int(method::START_COUNTDOWN)
    }

    /// Have the callee call back into the driver's echo object `peer`.
    pub async fn call_echo(&self, peer: &ObjectId, value: impl Into<Value>) -> BridgeResult<Value> {
        self.call(method::CALL_ECHO, vec![Value::Ref(peer.clone()), value.into()])
            .await
    }
}
