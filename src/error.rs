/// Error types for every platform capability the application touches
///
/// Each concern gets its own enum so callers can decide how a failure
/// degrades: camera errors end the attempt, geolocation errors fall back to
/// untagged photos, storage errors are logged and swallowed, share errors
/// fall through to the next strategy and cache errors are logged at install.

use thiserror::Error;

/// Failure to acquire or use a camera stream
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("no camera device available")]
    NoDevice,
    #[error("camera is not open")]
    NotOpen,
    #[error("camera stream ended")]
    StreamEnded,
    #[error("could not encode photo: {0}")]
    Encode(String),
    #[error("camera error: {0}")]
    Other(String),
}

impl CameraError {
    /// Short text shown to the user when the camera cannot be used
    pub fn user_message(&self) -> &'static str {
        match self {
            CameraError::NotOpen => "Open the camera first.",
            CameraError::Encode(_) => "The photo could not be encoded.",
            _ => "Could not access the camera. Make sure permission is granted.",
        }
    }
}

/// Geolocation failures, mirroring the platform error codes
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeoError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("location request timed out")]
    Timeout,
    #[error("geolocation is not supported")]
    Unsupported,
    #[error("geolocation error: {0}")]
    Unknown(String),
}

impl GeoError {
    /// Distinct user-facing message per error kind
    pub fn user_message(&self) -> &'static str {
        match self {
            GeoError::PermissionDenied => "Permission denied. Check the location settings.",
            GeoError::PositionUnavailable => "The location is not available.",
            GeoError::Timeout => "The location request took too long.",
            GeoError::Unsupported => "This platform does not support geolocation.",
            GeoError::Unknown(_) => "An error occurred while getting the location.",
        }
    }
}

/// Key-value persistence failures
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage quota exceeded ({needed} bytes, limit {limit})")]
    QuotaExceeded { needed: usize, limit: usize },
    #[error("concurrent write conflict on key '{0}'")]
    Conflict(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Failure of a single share/export strategy
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ShareError {
    #[error("sharing is not supported")]
    Unsupported,
    #[error("share cancelled")]
    Cancelled,
    #[error("invalid image payload: {0}")]
    InvalidPayload(String),
    #[error("export failed: {0}")]
    Failed(String),
}

impl From<std::io::Error> for ShareError {
    fn from(err: std::io::Error) -> Self {
        ShareError::Failed(err.to_string())
    }
}

/// Offline cache storage and network failures
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },
    #[error("bad response for {url}: HTTP {status}")]
    BadStatus { url: String, status: u16 },
    #[error("invalid request url '{0}'")]
    InvalidUrl(String),
    #[error("cache storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("cache storage lock poisoned")]
    Poisoned,
    #[error("header serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Permission introspection failures
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PermissionError {
    #[error("the {0} permission cannot be queried")]
    Unsupported(&'static str),
    #[error("permission query failed: {0}")]
    QueryFailed(String),
}

/// Configuration loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
