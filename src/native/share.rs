/// Desktop export: save dialog or downloads folder, plus the system viewer
///
/// There is no share sheet on the desktop, so `share` always reports
/// `Unsupported` and exports go through `save_as`.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;

use async_trait::async_trait;
use rfd::AsyncFileDialog;
use tracing::{info, warn};

use crate::capture::encoding::decode_data_url;
use crate::config::AppConfig;
use crate::error::ShareError;
use crate::export::photo_file_name;
use crate::platform::share::{ShareData, ShareFile, ShareTarget};

#[derive(Debug, Clone)]
pub struct DesktopShare {
    download_dir: PathBuf,
    viewer_dir: PathBuf,
    use_save_dialog: bool,
    viewer_command: Option<PathBuf>,
}

impl DesktopShare {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            download_dir: config.download_dir(),
            viewer_dir: config.viewer_dir(),
            use_save_dialog: config.share.use_save_dialog,
            viewer_command: config.share.viewer_command.clone(),
        }
    }

    /// Never overwrite an earlier download with the same name
    fn unique_path(dir: &Path, name: &str) -> PathBuf {
        let candidate = dir.join(name);
        if !candidate.exists() {
            return candidate;
        }
        let (stem, ext) = match name.rsplit_once('.') {
            Some((stem, ext)) => (stem, format!(".{}", ext)),
            None => (name, String::new()),
        };
        (1..)
            .map(|n| dir.join(format!("{}-{}{}", stem, n, ext)))
            .find(|path| !path.exists())
            .unwrap_or(candidate)
    }

    async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ShareError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl ShareTarget for DesktopShare {
    fn can_share(&self, _data: &ShareData) -> bool {
        false
    }

    async fn share(&self, _data: ShareData) -> Result<(), ShareError> {
        Err(ShareError::Unsupported)
    }

    async fn save_as(&self, file: ShareFile) -> Result<Option<PathBuf>, ShareError> {
        let path = if self.use_save_dialog {
            let picked = AsyncFileDialog::new()
                .set_title("Save Photo")
                .set_directory(&self.download_dir)
                .set_file_name(file.name.as_str())
                .add_filter("JPEG image", &["jpg", "jpeg"])
                .save_file()
                .await;

            match picked {
                Some(handle) => handle.path().to_path_buf(),
                None => return Err(ShareError::Cancelled),
            }
        } else {
            Self::unique_path(&self.download_dir, &file.name)
        };

        Self::write_file(&path, &file.bytes).await?;
        info!("💾 Saved {} ({} bytes)", path.display(), file.bytes.len());
        Ok(Some(path))
    }

    fn open_in_viewer(&self, image_url: &str) -> Result<(), ShareError> {
        let payload = decode_data_url(image_url)?;
        std::fs::create_dir_all(&self.viewer_dir)?;
        let path = self.viewer_dir.join(photo_file_name(chrono::Utc::now()));
        std::fs::write(&path, &payload.bytes)?;

        // Called from the UI thread: launch and move on
        let mut child = viewer(&path, self.viewer_command.as_deref()).spawn()?;
        info!("🖼️  Opened {} in the viewer", path.display());

        thread::spawn(move || match child.wait() {
            Ok(status) if !status.success() => warn!("⚠️  Viewer exited with {}", status),
            Ok(_) => {}
            Err(e) => warn!("⚠️  Lost track of the viewer: {}", e),
        });
        Ok(())
    }
}

/// Command that opens `path` with the configured program or the default
/// application
fn viewer(path: &Path, program: Option<&Path>) -> Command {
    if let Some(program) = program {
        let mut cmd = Command::new(program);
        cmd.arg(path);
        return cmd;
    }
    if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(path);
        cmd
    } else if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]).arg(path);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(path);
        cmd
    }
}
