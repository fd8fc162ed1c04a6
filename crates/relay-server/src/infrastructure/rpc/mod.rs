//! gRPC front-end: the `input.KeyInput` service.
//!
//! Architecture:
//! - `KeyInputService` implements the generated `KeyInput` trait.
//! - Each call parses the wire key, waits for a worker permit, then runs the
//!   (blocking) backend call on Tokio's blocking pool.
//! - The permit count bounds in-flight backend calls: `max_workers` normally,
//!   exactly one when the backend requires exclusive dispatch.
//!
//! # Status codes
//!
//! | Failure                         | `tonic::Code`     |
//! |---------------------------------|-------------------|
//! | wire value outside `Key` enum   | `InvalidArgument` |
//! | key not in the mapping table    | `NotFound`        |
//! | backend action failed           | `Unavailable`     |
//! | worker task panicked            | `Internal`        |
//!
//! A request dropped by the focus gate is a success.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use relay_core::{AbstractKey, KeyAction, KeyEventRequest};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{transport::Server, Request, Response, Status};
use tracing::{debug, error, info};

use crate::application::relay_keys::{RelayError, RelayService};

/// Types generated from `proto/input.proto`.
pub mod proto {
    tonic::include_proto!("input");
}

use proto::key_input_server::{KeyInput, KeyInputServer};
use proto::{KeyRequest, KeyResponse};

/// Errors that end the RPC server.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("listener I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

/// Maps a relay failure to the status returned to the caller.
pub fn status_for(err: &RelayError) -> Status {
    match err {
        RelayError::UnmappedKey(_) => Status::not_found(err.to_string()),
        RelayError::Backend { .. } => Status::unavailable(err.to_string()),
    }
}

/// The `KeyInput` service implementation.
#[derive(Clone)]
pub struct KeyInputService {
    relay: Arc<RelayService>,
    workers: Arc<Semaphore>,
    max_in_flight: usize,
}

impl KeyInputService {
    /// Wraps `relay`, allowing up to `max_workers` concurrent backend calls
    /// (one if the backend needs exclusive dispatch).  The count is clamped
    /// to `1..=Semaphore::MAX_PERMITS`.
    pub fn new(relay: Arc<RelayService>, max_workers: usize) -> Self {
        let max_in_flight = if relay.requires_exclusive_dispatch() {
            1
        } else {
            max_workers.clamp(1, Semaphore::MAX_PERMITS)
        };
        Self {
            relay,
            workers: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    pub fn into_server(self) -> KeyInputServer<Self> {
        KeyInputServer::new(self)
    }

    async fn relay(
        &self,
        request: Request<KeyRequest>,
        action: KeyAction,
    ) -> Result<Response<KeyResponse>, Status> {
        let peer = request.remote_addr();
        let raw = request.into_inner().key;
        let key = AbstractKey::try_from(raw).map_err(|e| {
            debug!(?peer, raw, %action, "rejecting unknown key value");
            Status::invalid_argument(e.to_string())
        })?;
        debug!(?peer, %key, rpc = action.rpc_name(), "key request");

        let permit = Arc::clone(&self.workers)
            .acquire_owned()
            .await
            .map_err(|_| Status::unavailable("relay is shutting down"))?;
        let relay = Arc::clone(&self.relay);
        let outcome = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            relay.dispatch(KeyEventRequest::new(key, action))
        })
        .await;

        match outcome {
            Ok(Ok(())) => Ok(Response::new(KeyResponse {})),
            Ok(Err(e)) => Err(status_for(&e)),
            Err(join) => {
                error!(%key, %action, "backend worker failed: {join}");
                Err(Status::internal("backend worker failed"))
            }
        }
    }
}

#[tonic::async_trait]
impl KeyInput for KeyInputService {
    async fn send(&self, request: Request<KeyRequest>) -> Result<Response<KeyResponse>, Status> {
        self.relay(request, KeyAction::Press).await
    }

    async fn send_up(
        &self,
        request: Request<KeyRequest>,
    ) -> Result<Response<KeyResponse>, Status> {
        self.relay(request, KeyAction::Release).await
    }

    async fn send_down(
        &self,
        request: Request<KeyRequest>,
    ) -> Result<Response<KeyResponse>, Status> {
        self.relay(request, KeyAction::HoldDown).await
    }
}

/// Binds `addr` and serves until `shutdown` resolves.
///
/// # Errors
///
/// [`RpcError::Bind`] if the address is unavailable, or a transport error.
pub async fn serve<F>(service: KeyInputService, addr: SocketAddr, shutdown: F) -> Result<(), RpcError>
where
    F: Future<Output = ()> + Send,
{
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| RpcError::Bind { addr, source })?;
    serve_with_listener(service, listener, shutdown).await
}

/// Serves on an already-bound listener until `shutdown` resolves.
///
/// # Errors
///
/// Returns a transport error if the server fails.
pub async fn serve_with_listener<F>(
    service: KeyInputService,
    listener: TcpListener,
    shutdown: F,
) -> Result<(), RpcError>
where
    F: Future<Output = ()> + Send,
{
    let local = listener.local_addr()?;
    info!(%local, workers = service.max_in_flight(), "KeyInput service listening");

    Server::builder()
        .add_service(service.into_server())
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await?;

    info!("KeyInput service stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
