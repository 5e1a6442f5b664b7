//! Docker volume plugin wire types.
//!
//! Every response that can fail carries an `Err` field, which is always
//! serialized. An empty string means success.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VolumeRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateVolumeRequest {
    pub name: String,
    #[serde(default)]
    pub opts: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MountVolumeRequest {
    pub name: String,
    #[serde(rename = "ID", default)]
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Volume {
    pub name: String,
    pub mountpoint: String,
    pub status: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VolumeResponse {
    #[serde(rename = "Err")]
    pub err: String,
}

impl VolumeResponse {
    pub fn failed(err: impl Into<String>) -> Self {
        Self { err: err.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetVolumeResponse {
    pub err: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<Volume>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetPathResponse {
    pub err: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mountpoint: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListVolumeResponse {
    pub err: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volumes: Option<Vec<Volume>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Capability {
    pub scope: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VolumeCapabilitiesResponse {
    pub capabilities: Capability,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PluginDescription {
    pub implements: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_err_is_serialized() {
        let json = serde_json::to_string(&VolumeResponse::default()).unwrap();
        assert_eq!(json, r#"{"Err":""}"#);
    }

    #[test]
    fn failed_get_omits_volume() {
        let resp = GetVolumeResponse {
            err: "no such volume".into(),
            volume: None,
        };
        assert_eq!(
            serde_json::to_string(&resp).unwrap(),
            r#"{"Err":"no such volume"}"#
        );
    }

    #[test]
    fn create_without_opts() {
        let req: CreateVolumeRequest = serde_json::from_str(r#"{"Name":"foo/vol"}"#).unwrap();
        assert_eq!(req.name, "foo/vol");
        assert!(req.opts.is_none());

        let req: CreateVolumeRequest =
            serde_json::from_str(r#"{"Name":"foo/vol","Opts":null}"#).unwrap();
        assert!(req.opts.is_none());
    }

    #[test]
    fn mount_request_reads_id() {
        let req: MountVolumeRequest =
            serde_json::from_str(r#"{"Name":"foo/vol","ID":"abc"}"#).unwrap();
        assert_eq!(req.id, "abc");
    }
}
