use super::api::*;
use super::error::PluginError;
use super::forwarder::Forwarder;

use futures::FutureExt;
use futures::future::{self, BoxFuture};
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes, Incoming};
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, info};

type Reply = Result<Vec<u8>, PluginError>;

type BareOp = Box<dyn Fn(Arc<Forwarder>) -> BoxFuture<'static, Reply> + Send + Sync>;
type JsonOp = Box<dyn Fn(Arc<Forwarder>, Bytes) -> BoxFuture<'static, Reply> + Send + Sync>;

/// A plugin operation bound to the request type it decodes.
enum Handler {
    /// Takes no input; the request body is never read.
    Bare(BareOp),
    /// Decodes the request body as JSON before invoking the operation.
    Json(JsonOp),
}

impl Handler {
    fn bare<Resp, F, Fut>(op: F) -> Self
    where
        F: Fn(Arc<Forwarder>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Resp> + Send + 'static,
        Resp: Serialize + Send + 'static,
    {
        Handler::Bare(Box::new(move |fwd: Arc<Forwarder>| {
            let fut = op(fwd);
            async move { encode(&fut.await) }.boxed()
        }))
    }

    fn json<Req, Resp, F, Fut>(op: F) -> Self
    where
        Req: DeserializeOwned + 'static,
        F: Fn(Arc<Forwarder>, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Resp> + Send + 'static,
        Resp: Serialize + Send + 'static,
    {
        Handler::Json(Box::new(move |fwd: Arc<Forwarder>, body: Bytes| {
            match serde_json::from_slice::<Req>(&body) {
                Ok(req) => {
                    let fut = op(fwd, req);
                    async move { encode(&fut.await) }.boxed()
                }
                Err(e) => {
                    let reply: Reply = Err(PluginError::Json(e));
                    future::ready(reply).boxed()
                }
            }
        }))
    }
}

/// Fixed route table of the Docker volume plugin protocol.
pub struct Routes {
    table: HashMap<&'static str, Handler>,
}

impl Routes {
    pub fn volume_driver() -> Self {
        let table = HashMap::from([
            (
                "/Plugin.Activate",
                Handler::bare(|fwd| async move { fwd.plugin_activate() }),
            ),
            (
                "/VolumeDriver.Capabilities",
                Handler::bare(|fwd| async move { fwd.volume_capabilities() }),
            ),
            (
                "/VolumeDriver.Create",
                Handler::json(|fwd, req: CreateVolumeRequest| async move {
                    fwd.create_volume(req).await
                }),
            ),
            (
                "/VolumeDriver.Get",
                Handler::json(
                    |fwd, req: VolumeRequest| async move { fwd.get_volume(req).await },
                ),
            ),
            (
                "/VolumeDriver.Path",
                Handler::json(|fwd, req: VolumeRequest| async move { fwd.get_path(req).await }),
            ),
            (
                "/VolumeDriver.List",
                Handler::bare(|fwd| async move { fwd.list_volumes().await }),
            ),
            (
                "/VolumeDriver.Mount",
                Handler::json(|fwd, req: MountVolumeRequest| async move {
                    fwd.mount_volume(req).await
                }),
            ),
            (
                "/VolumeDriver.Unmount",
                Handler::json(|fwd, req: MountVolumeRequest| async move {
                    fwd.unmount_volume(req).await
                }),
            ),
            (
                "/VolumeDriver.Remove",
                Handler::json(|fwd, req: VolumeRequest| async move {
                    fwd.remove_volume(req).await
                }),
            ),
        ]);
        Self { table }
    }

    fn get(&self, path: &str) -> Option<&Handler> {
        self.table.get(path)
    }
}

#[derive(Clone)]
pub struct DockerPluginService {
    forwarder: Arc<Forwarder>,
    routes: Arc<Routes>,
}

impl DockerPluginService {
    pub fn new(forwarder: Arc<Forwarder>) -> Self {
        Self {
            forwarder,
            routes: Arc::new(Routes::volume_driver()),
        }
    }

    /// Runs the operation registered for `path` and returns the JSON body to
    /// send back, or `None` when no route matches.
    ///
    /// `body` is only awaited for routes that take input.
    pub async fn dispatch<B>(&self, path: &str, body: B) -> Option<Vec<u8>>
    where
        B: Future<Output = Result<Bytes, PluginError>>,
    {
        let handler = self.routes.get(path)?;
        let reply = match handler {
            Handler::Bare(op) => op(self.forwarder.clone()).await,
            Handler::Json(op) => match body.await {
                Ok(bytes) => op(self.forwarder.clone(), bytes).await,
                Err(e) => Err(e),
            },
        };
        Some(reply.unwrap_or_else(PluginError::into_body))
    }

    async fn handle(&self, req: Request<Incoming>) -> Response<Full<Bytes>> {
        let path = req.uri().path().to_string();
        info!(method = ?req.method(), path = %path, "Received request");

        match self.dispatch(&path, read_body(req.into_body())).await {
            Some(body) => json_ok(body),
            None => {
                debug!(path = %path, "no route");
                let mut not_found = Response::new(Full::default());
                *not_found.status_mut() = StatusCode::NOT_FOUND;
                not_found
            }
        }
    }
}

impl Service<Request<Incoming>> for DockerPluginService {
    type Response = Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let svc = self.clone();
        Box::pin(async move { Ok(svc.handle(req).await) })
    }
}

async fn read_body<B>(body: B) -> Result<Bytes, PluginError>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let collected = body
        .collect()
        .await
        .map_err(|e| PluginError::Body(e.to_string()))?;
    Ok(collected.to_bytes())
}

fn encode<T: Serialize>(data: &T) -> Reply {
    serde_json::to_vec(data).map_err(PluginError::Serialize)
}

fn json_ok(body: Vec<u8>) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(Bytes::from(body)));
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::forwarder::mock::{MockBackend, volume};

    fn service(backend: MockBackend) -> (DockerPluginService, Arc<MockBackend>) {
        let backend = Arc::new(backend);
        let fwd = Arc::new(Forwarder::new(backend.clone()));
        (DockerPluginService::new(fwd), backend)
    }

    async fn call(svc: &DockerPluginService, path: &str, body: &'static str) -> Option<String> {
        let reply = svc
            .dispatch(path, future::ready(Ok(Bytes::from_static(body.as_bytes()))))
            .await?;
        Some(String::from_utf8(reply).unwrap())
    }

    #[tokio::test]
    async fn unknown_route() {
        let (svc, _) = service(MockBackend::default());
        assert!(call(&svc, "/VolumeDriver.Nope", "{}").await.is_none());
        assert!(call(&svc, "/volumedriver.list", "").await.is_none());
    }

    #[tokio::test]
    async fn static_routes() {
        let (svc, _) = service(MockBackend::default());
        assert_eq!(
            call(&svc, "/Plugin.Activate", "").await.unwrap(),
            r#"{"Implements":["VolumeDriver"]}"#
        );
        assert_eq!(
            call(&svc, "/VolumeDriver.Capabilities", "").await.unwrap(),
            r#"{"Capabilities":{"Scope":"local"}}"#
        );
    }

    #[tokio::test]
    async fn bare_routes_do_not_read_body() {
        let (svc, _) = service(MockBackend::default());
        let reply = svc
            .dispatch(
                "/Plugin.Activate",
                future::lazy(|_| -> Result<Bytes, PluginError> {
                    panic!("body should not be read")
                }),
            )
            .await;
        assert!(reply.is_some());
    }

    #[tokio::test]
    async fn list_volumes() {
        let (svc, _) = service(
            MockBackend::default()
                .with_volumes("foo", vec![volume("v0", "/v0"), volume("v1", "/v1")]),
        );
        assert_eq!(
            call(&svc, "/VolumeDriver.List", "").await.unwrap(),
            r#"{"Err":"","Volumes":[{"Name":"foo/v0","Mountpoint":"/v0","Status":{}},{"Name":"foo/v1","Mountpoint":"/v1","Status":{}}]}"#
        );
    }

    #[tokio::test]
    async fn get_and_path() {
        let (svc, _) =
            service(MockBackend::default().with_volumes("foo", vec![volume("vol", "/vol")]));
        assert_eq!(
            call(&svc, "/VolumeDriver.Get", r#"{"Name":"foo/vol"}"#)
                .await
                .unwrap(),
            r#"{"Err":"","Volume":{"Name":"foo/vol","Mountpoint":"/vol","Status":{}}}"#
        );
        assert_eq!(
            call(&svc, "/VolumeDriver.Path", r#"{"Name":"foo/vol"}"#)
                .await
                .unwrap(),
            r#"{"Err":"","Mountpoint":"/vol"}"#
        );
        assert_eq!(
            call(&svc, "/VolumeDriver.Get", r#"{"Name":"foo/other"}"#)
                .await
                .unwrap(),
            r#"{"Err":"no such volume"}"#
        );
    }

    #[tokio::test]
    async fn mutating_routes() {
        let (svc, backend) = service(MockBackend::default());
        for (path, body) in [
            ("/VolumeDriver.Create", r#"{"Name":"foo/vol"}"#),
            ("/VolumeDriver.Mount", r#"{"Name":"foo/vol","ID":"0"}"#),
            ("/VolumeDriver.Unmount", r#"{"Name":"foo/vol","ID":"0"}"#),
            ("/VolumeDriver.Remove", r#"{"Name":"foo/vol"}"#),
        ] {
            assert_eq!(call(&svc, path, body).await.unwrap(), r#"{"Err":""}"#);
        }
        assert_eq!(
            backend.calls(),
            vec![
                "create_volume foo/vol",
                "activate_volume foo/vol",
                "deactivate_volume foo/vol",
                "delete_volume foo/vol",
            ]
        );
    }

    #[tokio::test]
    async fn decode_failure_skips_operation() {
        let (svc, backend) = service(MockBackend::default());
        for body in ["", "not json", r#"{"Opts":{}}"#] {
            let reply = call(&svc, "/VolumeDriver.Create", body).await.unwrap();
            let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
            let err = value["Err"].as_str().unwrap();
            assert!(err.starts_with("invalid request body: "), "{}", err);
        }
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn body_read_failure() {
        let (svc, backend) = service(MockBackend::default());
        let reply = svc
            .dispatch(
                "/VolumeDriver.Remove",
                future::ready(Err(PluginError::Body("connection reset".into()))),
            )
            .await
            .unwrap();
        assert_eq!(
            String::from_utf8(reply).unwrap(),
            r#"{"Err":"failed to read request body: connection reset"}"#
        );
        assert!(backend.calls().is_empty());
    }
}
