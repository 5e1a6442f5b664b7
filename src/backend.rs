//! Volume management backend abstractions.
//!
//! This module defines the [`VolumeBackend`] trait, which abstracts over the
//! REST service that actually owns repositories and volumes, along with the
//! data model that service exchanges.
//!
//! The concrete HTTP implementation lives in [`client`].
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod client;

pub use client::RestClient;

/// Arbitrary JSON object, as used for volume config and properties.
pub type Properties = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Volume {
    pub name: String,
    #[serde(default)]
    pub config: Properties,
    #[serde(default)]
    pub properties: Properties,
}

impl Volume {
    /// Host path of the volume, if the backend reported one.
    pub fn mountpoint(&self) -> Option<&str> {
        self.config.get("mountpoint").and_then(Value::as_str)
    }
}

/// Request body for volume creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewVolume {
    pub name: String,
    pub properties: Properties,
}

/// Structured error body returned by the backend on failure.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiError {
    pub message: String,
    #[serde(default)]
    pub code: Option<Value>,
    #[serde(default)]
    pub details: Option<Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backend answered with a non-success status
    #[error("backend returned {status}")]
    Api {
        status: StatusCode,
        error: Option<ApiError>,
    },

    /// Connection, protocol or body decoding failures
    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL construction error
    #[error("url error: {0}")]
    Url(#[from] url::ParseError),

    /// Identifier that would be rewritten by URL path normalization
    #[error("{0:?} is not a valid repository or volume name")]
    Segment(String),
}

impl BackendError {
    /// The structured API error carried by this failure, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            BackendError::Api { error, .. } => error.as_ref(),
            _ => None,
        }
    }
}

/// Operations the forwarder needs from the volume management service.
///
/// Volumes are addressed by the compound key `(repository, volume)`.
#[async_trait]
pub trait VolumeBackend: Send + Sync {
    async fn list_repositories(&self) -> Result<Vec<Repository>, BackendError>;

    async fn list_volumes(&self, repository: &str) -> Result<Vec<Volume>, BackendError>;

    async fn get_volume(&self, repository: &str, volume: &str) -> Result<Volume, BackendError>;

    async fn create_volume(
        &self,
        repository: &str,
        volume: &NewVolume,
    ) -> Result<Volume, BackendError>;

    async fn delete_volume(&self, repository: &str, volume: &str) -> Result<(), BackendError>;

    async fn activate_volume(&self, repository: &str, volume: &str) -> Result<(), BackendError>;

    async fn deactivate_volume(&self, repository: &str, volume: &str)
    -> Result<(), BackendError>;
}
