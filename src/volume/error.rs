use serde::Serialize;
use thiserror::Error;

/// Body written when even the error envelope cannot be serialized.
pub const FALLBACK_ERROR_BODY: &[u8] = b"{\"Err\":\"Unable to serialize error response\"}";

/// Failures raised by the listener itself, outside of any volume operation.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("failed to read request body: {0}")]
    Body(String),

    #[error("invalid request body: {0}")]
    Json(#[source] serde_json::Error),

    #[error("unable to serialize response: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    #[serde(rename = "Err")]
    err: &'a str,
}

impl PluginError {
    /// JSON body reporting this error in the plugin's `Err` envelope.
    pub fn into_body(self) -> Vec<u8> {
        let err_msg = self.to_string();

        tracing::error!(error = %err_msg, "plugin request failed");

        serde_json::to_vec(&ErrorEnvelope { err: &err_msg })
            .unwrap_or_else(|_| FALLBACK_ERROR_BODY.to_vec())
    }
}
