//! Translation between Docker volume plugin requests and backend calls.
//!
//! Each plugin verb maps onto one or more [`VolumeBackend`] calls. Failures of
//! any kind are folded into the response's `Err` string, so the operations
//! here never fail at the transport level.
use super::api::*;
use super::types::{InvalidVolumeName, QualifiedName};
use crate::backend::{self, BackendError, NewVolume, VolumeBackend};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error(transparent)]
    InvalidName(#[from] InvalidVolumeName),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("backend volume '{name}' has no mountpoint")]
    MissingMountpoint { name: String },
}

impl ForwardError {
    /// Message placed in the `Err` field.
    ///
    /// Backend API errors contribute their `message` verbatim; everything
    /// else uses its display text.
    pub fn wire_message(&self) -> String {
        match self {
            ForwardError::Backend(e) => match e.api_error() {
                Some(api) => api.message.clone(),
                None => e.to_string(),
            },
            other => other.to_string(),
        }
    }
}

/// Converts a backend volume into its Docker representation.
pub fn to_wire_volume(repository: &str, vol: &backend::Volume) -> Result<Volume, ForwardError> {
    let name = QualifiedName::new(repository, vol.name.as_str()).to_string();
    let mountpoint = vol
        .mountpoint()
        .ok_or_else(|| ForwardError::MissingMountpoint { name: name.clone() })?
        .to_string();
    Ok(Volume {
        name,
        mountpoint,
        status: HashMap::new(),
    })
}

fn standard_response(result: Result<(), ForwardError>) -> VolumeResponse {
    match result {
        Ok(()) => VolumeResponse::default(),
        Err(e) => VolumeResponse::failed(report(e)),
    }
}

fn report(e: ForwardError) -> String {
    let msg = e.wire_message();
    warn!(error = %e, "volume operation failed");
    msg
}

#[derive(Clone)]
pub struct Forwarder {
    backend: Arc<dyn VolumeBackend>,
}

impl Forwarder {
    pub fn new(backend: Arc<dyn VolumeBackend>) -> Self {
        Self { backend }
    }

    /// `/Plugin.Activate`
    pub fn plugin_activate(&self) -> PluginDescription {
        PluginDescription {
            implements: vec!["VolumeDriver".to_string()],
        }
    }

    /// `/VolumeDriver.Capabilities`
    pub fn volume_capabilities(&self) -> VolumeCapabilitiesResponse {
        VolumeCapabilitiesResponse {
            capabilities: Capability {
                scope: "local".to_string(),
            },
        }
    }

    /// `/VolumeDriver.List`
    ///
    /// Walks every repository in order. The first failure aborts the whole
    /// listing; volumes gathered before it are discarded.
    pub async fn list_volumes(&self) -> ListVolumeResponse {
        match self.collect_volumes().await {
            Ok(volumes) => ListVolumeResponse {
                err: String::new(),
                volumes: Some(volumes),
            },
            Err(e) => ListVolumeResponse {
                err: report(e),
                volumes: None,
            },
        }
    }

    async fn collect_volumes(&self) -> Result<Vec<Volume>, ForwardError> {
        let repositories = self.backend.list_repositories().await?;
        let mut volumes = Vec::new();
        for repo in &repositories {
            for vol in self.backend.list_volumes(&repo.name).await? {
                volumes.push(to_wire_volume(&repo.name, &vol)?);
            }
        }
        debug!(count = volumes.len(), "listed volumes");
        Ok(volumes)
    }

    /// `/VolumeDriver.Get`
    pub async fn get_volume(&self, request: VolumeRequest) -> GetVolumeResponse {
        match self.fetch_volume(&request.name).await {
            Ok(volume) => GetVolumeResponse {
                err: String::new(),
                volume: Some(volume),
            },
            Err(e) => GetVolumeResponse {
                err: report(e),
                volume: None,
            },
        }
    }

    async fn fetch_volume(&self, name: &str) -> Result<Volume, ForwardError> {
        let name = QualifiedName::parse(name)?;
        let vol = self
            .backend
            .get_volume(name.repository(), name.volume())
            .await?;
        to_wire_volume(name.repository(), &vol)
    }

    /// `/VolumeDriver.Path`
    pub async fn get_path(&self, request: VolumeRequest) -> GetPathResponse {
        let resp = self.get_volume(request).await;
        GetPathResponse {
            err: resp.err,
            mountpoint: resp.volume.map(|v| v.mountpoint),
        }
    }

    /// `/VolumeDriver.Create`
    ///
    /// Driver options become the backend volume properties. Missing options
    /// are sent as an empty object.
    pub async fn create_volume(&self, request: CreateVolumeRequest) -> VolumeResponse {
        standard_response(self.try_create(request).await)
    }

    async fn try_create(&self, request: CreateVolumeRequest) -> Result<(), ForwardError> {
        let name = QualifiedName::parse(&request.name)?;
        let volume = NewVolume {
            name: name.volume().to_string(),
            properties: request.opts.unwrap_or_default(),
        };
        self.backend
            .create_volume(name.repository(), &volume)
            .await?;
        Ok(())
    }

    /// `/VolumeDriver.Remove`
    pub async fn remove_volume(&self, request: VolumeRequest) -> VolumeResponse {
        standard_response(self.try_remove(&request.name).await)
    }

    async fn try_remove(&self, name: &str) -> Result<(), ForwardError> {
        let name = QualifiedName::parse(name)?;
        self.backend
            .delete_volume(name.repository(), name.volume())
            .await?;
        Ok(())
    }

    /// `/VolumeDriver.Mount`
    ///
    /// The mount ID is not forwarded; the backend has no notion of mount
    /// sessions, so every mount activates the volume.
    pub async fn mount_volume(&self, request: MountVolumeRequest) -> VolumeResponse {
        standard_response(self.try_mount(&request).await)
    }

    async fn try_mount(&self, request: &MountVolumeRequest) -> Result<(), ForwardError> {
        let name = QualifiedName::parse(&request.name)?;
        debug!(volume = %name, id = %request.id, "activating volume");
        self.backend
            .activate_volume(name.repository(), name.volume())
            .await?;
        Ok(())
    }

    /// `/VolumeDriver.Unmount`
    pub async fn unmount_volume(&self, request: MountVolumeRequest) -> VolumeResponse {
        standard_response(self.try_unmount(&request).await)
    }

    async fn try_unmount(&self, request: &MountVolumeRequest) -> Result<(), ForwardError> {
        let name = QualifiedName::parse(&request.name)?;
        debug!(volume = %name, id = %request.id, "deactivating volume");
        self.backend
            .deactivate_volume(name.repository(), name.volume())
            .await?;
        Ok(())
    }
}
