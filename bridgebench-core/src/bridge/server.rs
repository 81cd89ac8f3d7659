// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Callee-side bridge server.
//!
//! Accepts driver connections and exports the [`BenchmarkUtility`] on each
//! as `entry_point`. All connections share one utility, so the byte
//! generator's stream continues across reconnects.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};

use super::codec::FrameCodec;
use super::connection::Connection;
use super::dispatch::EntryPoint;
use super::registry::ObjectRegistry;
use crate::config::ServerConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::exerciser::BenchmarkUtility;
use crate::types::{ObjectId, ServerMode};

/// Listening bridge server.
pub struct BridgeServer {
    listener: TcpListener,
    mode: ServerMode,
    codec: FrameCodec,
    utility: Arc<BenchmarkUtility>,
}

impl BridgeServer {
    /// Bind to the address from the configuration.
    pub async fn bind(config: &ServerConfig) -> BridgeResult<Self> {
        Self::bind_addr(config.socket_addr(), config).await
    }

    /// Bind to an explicit address (port 0 picks an ephemeral port).
    pub async fn bind_addr(addr: SocketAddr, config: &ServerConfig) -> BridgeResult<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| BridgeError::io("binding bridge listener", e))?;

        Ok(Self {
            listener,
            mode: config.mode,
            codec: config.codec(),
            utility: Arc::new(BenchmarkUtility::new(config.seed)),
        })
    }

    pub fn local_addr(&self) -> BridgeResult<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| BridgeError::io("reading listener address", e))
    }

    pub fn mode(&self) -> ServerMode {
        self.mode
    }

    /// The exported utility, shared by every connection.
    pub fn utility(&self) -> &Arc<BenchmarkUtility> {
        &self.utility
    }

    /// Accept connections until the process is terminated.
    pub async fn serve(self) -> BridgeResult<()> {
        tracing::info!(
            addr = %self.local_addr()?,
            mode = %self.mode,
            seed = %self.utility.seed(),
            "Bridge server listening"
        );

        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to accept connection");
                    continue;
                }
            };
            tracing::info!(peer = %peer, mode = %self.mode, "Driver connected");

            let registry = self.connection_registry()?;
            match self.mode {
                ServerMode::PerCall => {
                    tokio::spawn(serve_connection(stream, registry, self.codec));
                }
                ServerMode::Pinned => {
                    if let Err(e) = spawn_pinned(stream, peer, registry, self.codec) {
                        tracing::error!(peer = %peer, error = %e, "Failed to start pinned connection");
                    }
                }
            }
        }
    }

    fn connection_registry(&self) -> BridgeResult<Arc<ObjectRegistry>> {
        let registry = ObjectRegistry::new_shared();
        registry.register_as(
            ObjectId::entry_point(),
            Arc::new(EntryPoint::new(Arc::clone(&self.utility))),
        )?;
        Ok(registry)
    }
}

async fn serve_connection(stream: TcpStream, registry: Arc<ObjectRegistry>, codec: FrameCodec) {
    let (connection, reader) = match Connection::spawn(stream, registry, codec) {
        Ok(spawned) => spawned,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to set up connection");
            return;
        }
    };

    let peer = connection.peer_addr();
    match reader.await {
        Ok(Ok(())) => tracing::info!(peer = %peer, "Driver disconnected"),
        Ok(Err(e)) => tracing::warn!(peer = %peer, error = %e, "Connection terminated"),
        Err(e) => tracing::error!(peer = %peer, error = %e, "Connection reader panicked"),
    }
}

/// Move the connection onto its own thread with a current-thread runtime.
fn spawn_pinned(
    stream: TcpStream,
    peer: SocketAddr,
    registry: Arc<ObjectRegistry>,
    codec: FrameCodec,
) -> BridgeResult<()> {
    let stream = stream
        .into_std()
        .map_err(|e| BridgeError::io("detaching pinned stream", e))?;

    std::thread::Builder::new()
        .name(format!("bridge-pinned-{}", peer))
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    tracing::error!(peer = %peer, error = %e, "Failed to build pinned runtime");
                    return;
                }
            };

            runtime.block_on(async move {
                match TcpStream::from_std(stream) {
                    Ok(stream) => serve_connection(stream, registry, codec).await,
                    Err(e) => {
                        tracing::error!(peer = %peer, error = %e, "Failed to attach pinned stream")
                    }
                }
            });
        })
        .map_err(|e| BridgeError::io("spawning pinned connection thread", e))?;

    Ok(())
}
