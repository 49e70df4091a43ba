use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::ShareError;

/// A file handed to the share sheet or saved to disk
#[derive(Debug, Clone, PartialEq)]
pub struct ShareFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Payload for the share sheet: files, or a url/link, plus title and text
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShareData {
    pub title: String,
    pub text: String,
    pub url: Option<String>,
    pub files: Vec<ShareFile>,
}

/// Platform share, save and view operations.
/// `share` only gets called when `Capabilities` says sharing exists.
#[async_trait]
pub trait ShareTarget: Send + Sync {
    /// Whether this particular payload would be accepted
    fn can_share(&self, data: &ShareData) -> bool;

    async fn share(&self, data: ShareData) -> Result<(), ShareError>;

    /// Save-as / download. Returns where the file went, when known.
    async fn save_as(&self, file: ShareFile) -> Result<Option<PathBuf>, ShareError>;

    /// Show the image in a separate viewer. Returns once the viewer is
    /// launched, without waiting for it to close.
    fn open_in_viewer(&self, image_url: &str) -> Result<(), ShareError>;
}
