/// Share / download of captured photos
///
/// Strategies are tried in order and the first that works wins:
/// 1. share the JPEG as a file
/// 2. share the image reference (platforms that share links but not files)
/// 3. save-as / download under a timestamped file name
/// 4. on platforms that ignore downloads, also open a viewer and ask the
///    user to save by hand
///
/// A failing step falls through to the next one.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::capture::encoding::{decode_data_url, JPEG_MIME};
use crate::config::AppConfig;
use crate::error::ShareError;
use crate::platform::share::{ShareData, ShareFile, ShareTarget};
use crate::platform::Capabilities;

/// Shown when a platform drops the download silently
pub const MANUAL_SAVE_HINT: &str =
    "If the file does not download automatically, press and hold the image and choose \"Save\".";

#[derive(Debug, Clone, PartialEq)]
pub struct ShareSettings {
    pub title: String,
    pub text: String,
}

impl Default for ShareSettings {
    fn default() -> Self {
        Self {
            title: "Photo".to_string(),
            text: "Photo taken with GeoCam".to_string(),
        }
    }
}

impl From<&AppConfig> for ShareSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            title: config.share.title.clone(),
            text: config.share.text.clone(),
        }
    }
}

/// Which strategy ended up handling the photo
#[derive(Debug, Clone, PartialEq)]
pub enum ShareOutcome {
    SharedFile,
    SharedLink,
    Downloaded(Option<PathBuf>),
    /// Download triggered and the image opened for a manual save
    DownloadedAndOpened { hint: &'static str },
    /// Download impossible, image opened as last resort
    OpenedInViewer,
    /// The user dismissed the save dialog
    Cancelled,
    Failed(String),
}

impl ShareOutcome {
    pub fn status_message(&self) -> String {
        match self {
            ShareOutcome::SharedFile | ShareOutcome::SharedLink => "Photo shared.".to_string(),
            ShareOutcome::Downloaded(Some(path)) => format!("Photo saved to {}", path.display()),
            ShareOutcome::Downloaded(None) => "Photo downloaded.".to_string(),
            ShareOutcome::DownloadedAndOpened { hint } => hint.to_string(),
            ShareOutcome::OpenedInViewer => "Photo opened in a viewer.".to_string(),
            ShareOutcome::Cancelled => "Download cancelled.".to_string(),
            ShareOutcome::Failed(reason) => format!("Could not export the photo: {}", reason),
        }
    }
}

/// `photo-<epoch millis>.jpg`
pub fn photo_file_name(now: DateTime<Utc>) -> String {
    format!("photo-{}.jpg", now.timestamp_millis())
}

/// Share or save one image payload
pub async fn share_or_download(
    image: &str,
    capabilities: &Capabilities,
    target: &dyn ShareTarget,
    settings: &ShareSettings,
) -> ShareOutcome {
    let name = photo_file_name(Utc::now());
    let file = decode_data_url(image).map(|payload| ShareFile {
        name,
        mime_type: if payload.mime_type.is_empty() {
            JPEG_MIME.to_string()
        } else {
            payload.mime_type
        },
        bytes: payload.bytes,
    });

    // 1. Share the file itself
    if capabilities.share_files {
        if let Ok(file) = &file {
            let data = ShareData {
                title: settings.title.clone(),
                text: settings.text.clone(),
                url: None,
                files: vec![file.clone()],
            };
            if target.can_share(&data) {
                match target.share(data).await {
                    Ok(()) => return ShareOutcome::SharedFile,
                    Err(e) => warn!("⚠️  File share failed: {}", e),
                }
            }
        }
    }

    // 2. Share a reference to the image
    if capabilities.share {
        let data = ShareData {
            title: settings.title.clone(),
            text: settings.text.clone(),
            url: Some(image.to_string()),
            files: Vec::new(),
        };
        match target.share(data).await {
            Ok(()) => return ShareOutcome::SharedLink,
            Err(e) => warn!("⚠️  Link share failed: {}", e),
        }
    }

    // 3. Save-as download
    let saved = match file {
        Ok(file) => target.save_as(file).await,
        Err(e) => Err(e),
    };

    match saved {
        Ok(path) if capabilities.ignores_download() => {
            // 4. The platform no-ops the download; hand the image to the user
            info!("💾 Download triggered on a platform that ignores it, opening viewer");
            match target.open_in_viewer(image) {
                Ok(()) => ShareOutcome::DownloadedAndOpened {
                    hint: MANUAL_SAVE_HINT,
                },
                Err(e) => {
                    warn!("⚠️  Could not open viewer: {}", e);
                    ShareOutcome::Downloaded(path)
                }
            }
        }
        Ok(path) => {
            info!("💾 Photo downloaded");
            ShareOutcome::Downloaded(path)
        }
        Err(ShareError::Cancelled) => ShareOutcome::Cancelled,
        Err(e) => {
            warn!("⚠️  Download failed, opening in viewer: {}", e);
            match target.open_in_viewer(image) {
                Ok(()) => ShareOutcome::OpenedInViewer,
                Err(e) => ShareOutcome::Failed(e.to_string()),
            }
        }
    }
}
