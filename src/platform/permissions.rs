use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::PermissionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionName {
    Geolocation,
    Camera,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
}

impl PermissionName {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionName::Geolocation => "geolocation",
            PermissionName::Camera => "camera",
        }
    }
}

impl PermissionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionState::Granted => "granted",
            PermissionState::Denied => "denied",
            PermissionState::Prompt => "prompt",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "granted" => Some(PermissionState::Granted),
            "denied" => Some(PermissionState::Denied),
            "prompt" => Some(PermissionState::Prompt),
            _ => None,
        }
    }
}

/// Permission introspection. The receiver yields the current state and
/// every later out-of-band change.
#[async_trait]
pub trait Permissions: Send + Sync {
    async fn query(
        &self,
        name: PermissionName,
    ) -> Result<watch::Receiver<PermissionState>, PermissionError>;
}
