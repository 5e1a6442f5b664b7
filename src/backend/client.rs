use super::{BackendError, NewVolume, Repository, Volume, VolumeBackend};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

/// HTTP client for the volume management REST API.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    base: Url,
}

impl RestClient {
    /// Client for a backend listening on `http://{host}:{port}`.
    pub fn new(host: &str, port: u16) -> Result<Self, BackendError> {
        let base = Url::parse(&format!("http://{}:{}", host, port))?;
        Self::with_base_url(base)
    }

    pub fn with_base_url(base: Url) -> Result<Self, BackendError> {
        let client = Client::builder().build()?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Builds `/v1/repositories/...` with each segment percent-encoded.
    ///
    /// `.` and `..` are refused: URL normalization would drop them and the
    /// request would address a different resource.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        if let Some(dot) = segments.iter().find(|s| matches!(**s, "." | "..")) {
            return Err(BackendError::Segment(dot.to_string()));
        }
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .clear()
            .extend(["v1", "repositories"])
            .extend(segments);
        Ok(url)
    }

    fn volume_endpoint(
        &self,
        repository: &str,
        volume: &str,
        action: Option<&str>,
    ) -> Result<Url, BackendError> {
        match action {
            Some(action) => self.endpoint(&[repository, "volumes", volume, action]),
            None => self.endpoint(&[repository, "volumes", volume]),
        }
    }
}

/// Passes successful responses through, converting anything else into
/// [`BackendError::Api`] with the decoded error body when there is one.
async fn check(resp: Response) -> Result<Response, BackendError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let error = resp.json().await.ok();
    Err(BackendError::Api { status, error })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, BackendError> {
    Ok(check(resp).await?.json::<T>().await?)
}

#[async_trait]
impl VolumeBackend for RestClient {
    async fn list_repositories(&self) -> Result<Vec<Repository>, BackendError> {
        let url = self.endpoint(&[])?;
        debug!(%url, "listing repositories");
        decode(self.client.get(url).send().await?).await
    }

    async fn list_volumes(&self, repository: &str) -> Result<Vec<Volume>, BackendError> {
        let url = self.endpoint(&[repository, "volumes"])?;
        debug!(%url, "listing volumes");
        decode(self.client.get(url).send().await?).await
    }

    async fn get_volume(&self, repository: &str, volume: &str) -> Result<Volume, BackendError> {
        let url = self.volume_endpoint(repository, volume, None)?;
        debug!(%url, "fetching volume");
        decode(self.client.get(url).send().await?).await
    }

    async fn create_volume(
        &self,
        repository: &str,
        volume: &NewVolume,
    ) -> Result<Volume, BackendError> {
        let url = self.endpoint(&[repository, "volumes"])?;
        debug!(%url, volume = %volume.name, "creating volume");
        decode(self.client.post(url).json(volume).send().await?).await
    }

    async fn delete_volume(&self, repository: &str, volume: &str) -> Result<(), BackendError> {
        let url = self.volume_endpoint(repository, volume, None)?;
        debug!(%url, "deleting volume");
        check(self.client.delete(url).send().await?).await?;
        Ok(())
    }

    async fn activate_volume(&self, repository: &str, volume: &str) -> Result<(), BackendError> {
        let url = self.volume_endpoint(repository, volume, Some("activate"))?;
        debug!(%url, "activating volume");
        check(self.client.post(url).send().await?).await?;
        Ok(())
    }

    async fn deactivate_volume(
        &self,
        repository: &str,
        volume: &str,
    ) -> Result<(), BackendError> {
        let url = self.volume_endpoint(repository, volume, Some("deactivate"))?;
        debug!(%url, "deactivating volume");
        check(self.client.post(url).send().await?).await?;
        Ok(())
    }
}
