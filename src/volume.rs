//! Docker volume plugin served over a Unix domain socket.
//!
//! [`VolumePlugin`] owns the socket and the accept loop. Requests are routed
//! by [`service::DockerPluginService`] to the [`forwarder::Forwarder`], which
//! translates them into calls against a [`VolumeBackend`].
use crate::backend::VolumeBackend;
use crate::error::ProxyError;
use crate::signal::ShutdownSignal;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::UnixListener;
use tracing::{error, info};

pub mod api;
pub mod error;
pub mod forwarder;
pub mod service;
pub mod types;

use forwarder::Forwarder;
use service::DockerPluginService;

pub struct VolumePlugin {
    socket: PathBuf,
    backend: Arc<dyn VolumeBackend>,
}

impl VolumePlugin {
    pub fn new(socket: impl Into<PathBuf>, backend: Arc<dyn VolumeBackend>) -> Self {
        Self {
            socket: socket.into(),
            backend,
        }
    }

    /// Serves until SIGTERM or SIGINT.
    pub async fn run(self) -> Result<(), ProxyError> {
        let shutdown = ShutdownSignal::install()?;
        self.run_until(shutdown.recv()).await
    }

    /// Serves until `shutdown` completes.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ProxyError>
    where
        F: Future<Output = ()>,
    {
        let socket_path = &self.socket;

        ensure_socket_path(socket_path).await?;
        let listener = UnixListener::bind(socket_path)?;

        let forwarder = Arc::new(Forwarder::new(self.backend.clone()));
        let service = DockerPluginService::new(forwarder);

        info!(socket = ?socket_path, "Docker Plugin listening");

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, _addr)) => {
                            let io = TokioIo::new(stream);
                            let svc = service.clone();

                            tokio::task::spawn(async move {
                                if let Err(err) = http1::Builder::new()
                                    .serve_connection(io, svc)
                                    .await
                                {
                                    error!("Error serving connection: {:?}", err);
                                }
                            });
                        }
                        Err(e) => error!("Socket accept error: {}", e),
                    }
                }

                _ = &mut shutdown => {
                    info!("Shutting down plugin listener");
                    break;
                }
            }
        }

        Ok(())
    }
}

async fn ensure_socket_path(path: &Path) -> Result<(), ProxyError> {
    if path.exists() {
        info!("Removing existing socket file: {:?}", path);
        tokio::fs::remove_file(path).await?;
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}

impl Drop for VolumePlugin {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket);
    }
}
