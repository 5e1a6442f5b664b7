use crate::{backend::RestClient, error::ProxyError, logging::Logger, volume::VolumePlugin};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use sysexits::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "docker-volume-proxy")]
#[command(version, long_about = None)]
#[command(about = "Serve a Docker volume plugin backed by a volume management REST API")]
pub struct Cli {
    /// Host of the volume management API
    #[arg(long, env = "VOLUME_PROXY_HOST", default_value = "localhost")]
    pub host: String,

    /// Port of the volume management API
    #[arg(long, env = "VOLUME_PROXY_PORT", default_value_t = 5001)]
    pub port: u16,

    /// Path of the plugin socket to create
    #[arg(env = "VOLUME_PROXY_SOCKET", value_name = "SOCKET")]
    pub socket: PathBuf,

    /// Logging configuration
    #[command(flatten)]
    pub logger: Logger,
}

pub async fn proxy(cli: Cli) -> ExitCode {
    // Errors below are only reported once a subscriber is installed.
    if let Err(e) = cli.logger.init() {
        eprintln!("docker-volume-proxy: {}", e);
        return e.exit_code();
    }

    match run(cli).await {
        Ok(()) => ExitCode::Ok,
        Err(e) => {
            let code = e.exit_code();
            error!(exit_code = code as u8, "{}", e);
            code
        }
    }
}

async fn run(cli: Cli) -> Result<(), ProxyError> {
    let backend = RestClient::new(&cli.host, cli.port)?;
    info!(socket = ?cli.socket, backend = %backend.base_url(), "Proxying volume requests");

    VolumePlugin::new(cli.socket, Arc::new(backend)).run().await?;
    info!("Volume plugin exited successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogFormat, LogLevel};

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["docker-volume-proxy", "/run/docker/plugins/titan.sock"])
            .unwrap();
        assert_eq!(cli.host, "localhost");
        assert_eq!(cli.port, 5001);
        assert_eq!(cli.socket, PathBuf::from("/run/docker/plugins/titan.sock"));
        assert_eq!(cli.logger.log_format, LogFormat::Text);
        assert_eq!(cli.logger.log_level, LogLevel::Info);
    }

    #[test]
    fn explicit_backend() {
        let cli = Cli::try_parse_from([
            "docker-volume-proxy",
            "--host",
            "titan",
            "--port",
            "6001",
            "--log-format",
            "json",
            "/tmp/plugin.sock",
        ])
        .unwrap();
        assert_eq!(cli.host, "titan");
        assert_eq!(cli.port, 6001);
        assert_eq!(cli.logger.log_format, LogFormat::Json);
    }

    #[tokio::test]
    async fn logging_failure_stops_before_serving() {
        // Only one global subscriber can be installed per process.
        let _ = Logger::default().init();

        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("plugin.sock");
        let cli = Cli::try_parse_from(["docker-volume-proxy", socket.to_str().unwrap()]).unwrap();

        assert_eq!(proxy(cli).await, ExitCode::Config);
        assert!(!socket.exists());
    }

    #[test]
    fn rejects_bad_port() {
        assert!(
            Cli::try_parse_from(["docker-volume-proxy", "--port", "http", "/tmp/plugin.sock"])
                .is_err()
        );
    }
}
