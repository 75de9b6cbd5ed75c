use reqwest::StatusCode;
use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every way a WeatherLink call can fail.
///
/// Status and decode failures are kept apart: a non-success status never
/// has its body interpreted, while a decode failure means the server said
/// `200 OK` but sent something we could not read.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to read configuration file {path}: {source}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid request path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("request path is required")]
    PathRequired,

    #[error("signature parameters are missing the `t` timestamp")]
    MissingTimestamp,

    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("error making {operation} request, got status: {status}")]
    Status {
        operation: &'static str,
        status: StatusCode,
    },

    #[error("failed to decode {operation} response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn transport<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Transport(err.into())
    }

    /// The HTTP status the server answered with, for [`Error::Status`].
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
