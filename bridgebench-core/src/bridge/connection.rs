// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Full-duplex bridge connection.
//!
//! Either side may issue calls at any time. A reader task demultiplexes
//! incoming frames: returns complete the matching pending call, calls are
//! handed to a freshly spawned task so a handler can itself call back across
//! the connection while the reader keeps draining frames. Spawned tasks land
//! on whatever runtime drives the connection, which is how the server's
//! pinned mode keeps every call of a connection on one thread.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::io::{AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

use super::codec::FrameCodec;
use super::dispatch::Invocation;
use super::protocol::{CallId, Message, Value};
use super::registry::ObjectRegistry;
use crate::error::{BridgeError, BridgeResult};
use crate::types::ObjectId;

type PendingCall = oneshot::Sender<BridgeResult<Value>>;

struct Shared {
    writer: Mutex<BufWriter<OwnedWriteHalf>>,
    pending: DashMap<CallId, PendingCall>,
    next_call: AtomicU64,
    registry: Arc<ObjectRegistry>,
    codec: FrameCodec,
    closed: AtomicBool,
    peer: SocketAddr,
}

/// Removes a call from the pending table however its caller finishes,
/// including when the caller's future is dropped mid-flight.
struct PendingGuard<'a> {
    pending: &'a DashMap<CallId, PendingCall>,
    id: CallId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.id);
    }
}

/// Cheaply cloneable handle to one side of a bridge connection.
#[derive(Clone)]
pub struct Connection {
    shared: Arc<Shared>,
}

impl Connection {
    /// Wrap a connected stream and start its reader task on the current runtime.
    ///
    /// The returned handle resolves when the peer closes the connection or a
    /// frame error ends it.
    pub fn spawn(
        stream: TcpStream,
        registry: Arc<ObjectRegistry>,
        codec: FrameCodec,
    ) -> BridgeResult<(Self, JoinHandle<BridgeResult<()>>)> {
        let peer = stream
            .peer_addr()
            .map_err(|e| BridgeError::io("reading peer address", e))?;
        stream
            .set_nodelay(true)
            .map_err(|e| BridgeError::io("setting TCP_NODELAY", e))?;

        let (read_half, write_half) = stream.into_split();
        let connection = Self {
            shared: Arc::new(Shared {
                writer: Mutex::new(BufWriter::new(write_half)),
                pending: DashMap::new(),
                next_call: AtomicU64::new(1),
                registry,
                codec,
                closed: AtomicBool::new(false),
                peer,
            }),
        };

        let reader = tokio::spawn(connection.clone().read_loop(read_half));
        Ok((connection, reader))
    }

    /// Invoke `method` on the peer's object `target` and wait for the answer.
    pub async fn call(
        &self,
        target: &ObjectId,
        method: &str,
        args: Vec<Value>,
    ) -> BridgeResult<Value> {
        let id = self.shared.next_call.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.shared.pending.insert(id, tx);
        let _pending = PendingGuard {
            pending: &self.shared.pending,
            id,
        };

        // close() flips the flag before draining, so checking after the
        // insert means either we bail here or the drain sees our entry.
        if self.is_closed() {
            return Err(BridgeError::ConnectionClosed);
        }

        let message = Message::Call {
            id,
            target: target.clone(),
            method: method.to_string(),
            args,
        };
        self.send(&message).await?;

        rx.await.map_err(|_| BridgeError::ConnectionClosed)?
    }

    /// Objects this side exports to the peer.
    pub fn registry(&self) -> &Arc<ObjectRegistry> {
        &self.shared.registry
    }

    pub fn codec(&self) -> FrameCodec {
        self.shared.codec
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.shared.peer
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Number of outgoing calls still waiting for an answer.
    pub fn pending_calls(&self) -> usize {
        self.shared.pending.len()
    }

    /// Close the write side; the peer sees end-of-stream.
    pub async fn shutdown(&self) -> BridgeResult<()> {
        let mut writer = self.shared.writer.lock().await;
        writer
            .shutdown()
            .await
            .map_err(|e| BridgeError::io("shutting down connection", e))
    }

    async fn send(&self, message: &Message) -> BridgeResult<()> {
        if self.is_closed() {
            return Err(BridgeError::ConnectionClosed);
        }
        let mut writer = self.shared.writer.lock().await;
        self.shared.codec.write_frame(&mut *writer, message).await
    }

    async fn read_loop(self, read_half: OwnedReadHalf) -> BridgeResult<()> {
        let mut reader = BufReader::new(read_half);

        let result = loop {
            match self.shared.codec.read_frame(&mut reader).await {
                Ok(Some(message)) => self.dispatch(message),
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        self.close();
        result
    }

    fn dispatch(&self, message: Message) {
        match message {
            Message::Call {
                id,
                target,
                method,
                args,
            } => {
                let connection = self.clone();
                tokio::spawn(async move {
                    connection.handle_call(id, target, method, args).await;
                });
            }
            Message::Return { id, result } => self.complete(id, Ok(result)),
            Message::Error { id, message } => {
                self.complete(id, Err(BridgeError::Remote { message }))
            }
        }
    }

    async fn handle_call(&self, id: CallId, target: ObjectId, method: String, args: Vec<Value>) {
        tracing::trace!(call_id = id, target = %target, method = %method, "incoming call");

        let outcome = match self.shared.registry.get(&target) {
            Ok(object) => {
                object
                    .invoke(Invocation {
                        target: &target,
                        method: &method,
                        args,
                        connection: self,
                    })
                    .await
            }
            Err(e) => Err(e),
        };

        let reply = match outcome {
            Ok(result) => Message::Return { id, result },
            Err(e) => {
                tracing::debug!(call_id = id, target = %target, method = %method, error = %e, "call failed");
                Message::Error {
                    id,
                    message: e.to_string(),
                }
            }
        };

        match self.send(&reply).await {
            // An unencodable reply still has to settle the caller.
            Err(BridgeError::Frame(e)) => {
                tracing::debug!(call_id = id, error = %e, "reply rejected by codec");
                let fallback = Message::Error {
                    id,
                    message: e.to_string(),
                };
                if let Err(e) = self.send(&fallback).await {
                    tracing::debug!(call_id = id, error = %e, "could not deliver reply");
                }
            }
            Err(e) => tracing::debug!(call_id = id, error = %e, "could not deliver reply"),
            Ok(()) => {}
        }
    }

    fn complete(&self, id: CallId, result: BridgeResult<Value>) {
        match self.shared.pending.remove(&id) {
            Some((_, tx)) => {
                // The caller may have been cancelled; nothing to do then.
                let _ = tx.send(result);
            }
            None => tracing::debug!(call_id = id, "reply for unknown or cancelled call"),
        }
    }

    fn close(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);

        let ids: Vec<CallId> = self.shared.pending.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            if let Some((_, tx)) = self.shared.pending.remove(&id) {
                let _ = tx.send(Err(BridgeError::ConnectionClosed));
            }
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("peer", &self.shared.peer)
            .field("closed", &self.is_closed())
            .field("pending", &self.shared.pending.len())
            .finish()
    }
}
