//! Signal handling for graceful shutdown.
//!
//! Handles SIGTERM and SIGINT so that the plugin listener can stop
//! accepting connections and clean up its socket.
use std::io;
use tokio::signal::unix::{Signal, SignalKind, signal};
use tracing::info;

pub struct ShutdownSignal {
    sigterm: Signal,
    sigint: Signal,
}

impl ShutdownSignal {
    /// Registers the handlers. Signals received after this call are not lost.
    pub fn install() -> io::Result<Self> {
        Ok(Self {
            sigterm: signal(SignalKind::terminate())?,
            sigint: signal(SignalKind::interrupt())?,
        })
    }

    /// Blocks until a shutdown signal is received.
    pub async fn recv(mut self) {
        tokio::select! {
            _ = self.sigterm.recv() => {
                info!("received SIGTERM");
            }
            _ = self.sigint.recv() => {
                info!("received SIGINT");
            }
        }
    }
}
