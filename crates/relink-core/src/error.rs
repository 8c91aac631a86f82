use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by a [`DocumentService`](crate::service::DocumentService).
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the JSON shape the endpoint promises.
    #[error("malformed response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    /// The account lacks edit rights on the document.
    #[error("insufficient permission to edit {document}")]
    PermissionDenied { document: String },

    /// The server answered with a non-success status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("cannot build request URL: {0}")]
    InvalidUrl(String),
}

impl ServiceError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, ServiceError::PermissionDenied { .. })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
