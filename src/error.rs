use crate::backend::BackendError;
use sysexits::ExitCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("failed to initialize logging: {0}")]
    Logging(String),
}

impl ProxyError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ProxyError::Io(_) => ExitCode::IoErr,
            ProxyError::Backend(e) => match e {
                BackendError::Url(_) | BackendError::Segment(_) => ExitCode::Config,
                BackendError::Transport(_) => ExitCode::Unavailable,
                BackendError::Api { .. } => ExitCode::Software,
            },
            ProxyError::Logging(_) => ExitCode::Config,
        }
    }
}
