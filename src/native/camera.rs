/// Desktop camera sources
///
/// Without a capture device crate in the stack, the desktop build offers two
/// sources behind the `MediaDevices` seam:
/// - a folder camera replaying still images from `<dir>/environment` and
///   `<dir>/user` as a slow slideshow
/// - a synthetic camera drawing an animated test pattern

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use image::{imageops::FilterType, Rgba, RgbaImage};
use tokio::task;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::CameraConfig;
use crate::error::CameraError;
use crate::platform::camera::{
    DeviceKind, FacingMode, MediaDeviceInfo, MediaDevices, MediaStream, VideoConstraints,
};

/// How long each still stays on screen in a folder stream
const SLIDE_DURATION: Duration = Duration::from_secs(2);

/// Supported still-image extensions
const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// Pick the camera source the config asks for
pub fn desktop_camera(config: &CameraConfig) -> Arc<dyn MediaDevices> {
    match &config.source_dir {
        Some(dir) => {
            info!("📁 Camera frames from {}", dir.display());
            Arc::new(FolderCamera::new(dir.clone()))
        }
        None => Arc::new(SyntheticCamera),
    }
}

// ========== Folder camera ==========

pub struct FolderCamera {
    root: PathBuf,
}

impl FolderCamera {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn device_dir(&self, facing: FacingMode) -> PathBuf {
        self.root.join(facing.as_str())
    }

    /// Facing modes that have at least one image
    fn available(&self) -> Vec<FacingMode> {
        [FacingMode::Environment, FacingMode::User]
            .into_iter()
            .filter(|facing| !list_images(&self.device_dir(*facing)).is_empty())
            .collect()
    }
}

/// Image files under `dir`, sorted by path
fn list_images(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| {
                    let ext = ext.to_string_lossy().to_lowercase();
                    IMAGE_EXTENSIONS.contains(&ext.as_str())
                })
                .unwrap_or(false)
        })
        .map(|e| e.into_path())
        .collect();
    paths.sort();
    paths
}

/// Decode and fit every still to the requested size
fn load_frames(paths: &[PathBuf], width: u32, height: u32) -> Vec<RgbaImage> {
    paths
        .iter()
        .filter_map(|path| match image::open(path) {
            Ok(img) => Some(img.resize_to_fill(width, height, FilterType::Triangle).to_rgba8()),
            Err(e) => {
                warn!("⚠️  Skipping unreadable frame {}: {}", path.display(), e);
                None
            }
        })
        .collect()
}

#[async_trait]
impl MediaDevices for FolderCamera {
    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, CameraError> {
        Ok(self
            .available()
            .into_iter()
            .map(|facing| MediaDeviceInfo {
                device_id: self.device_dir(facing).display().to_string(),
                kind: DeviceKind::VideoInput,
                label: format!("Folder camera ({})", facing.as_str()),
                facing: Some(facing),
            })
            .collect())
    }

    async fn get_user_media(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError> {
        let available = self.available();
        // Facing mode is only a preference
        let facing = if available.contains(&constraints.facing_mode) {
            constraints.facing_mode
        } else {
            *available.first().ok_or(CameraError::NoDevice)?
        };

        let paths = list_images(&self.device_dir(facing));
        let (width, height) = (constraints.width, constraints.height);

        // Decoding is CPU-bound
        let frames = task::spawn_blocking(move || load_frames(&paths, width, height))
            .await
            .map_err(|e| CameraError::Other(format!("Task join error: {}", e)))?;

        if frames.is_empty() {
            return Err(CameraError::NoDevice);
        }

        Ok(Box::new(FolderStream {
            frames,
            started: Instant::now(),
            live: true,
        }))
    }
}

struct FolderStream {
    frames: Vec<RgbaImage>,
    started: Instant,
    live: bool,
}

impl MediaStream for FolderStream {
    fn video_dimensions(&self) -> Option<(u32, u32)> {
        self.frames.first().map(|f| f.dimensions())
    }

    fn current_frame(&mut self) -> Result<RgbaImage, CameraError> {
        if !self.live {
            return Err(CameraError::StreamEnded);
        }
        let slide = (self.started.elapsed().as_millis() / SLIDE_DURATION.as_millis()) as usize;
        Ok(self.frames[slide % self.frames.len()].clone())
    }

    fn stop(&mut self) {
        self.live = false;
        self.frames.clear();
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

// ========== Synthetic camera ==========

/// Two virtual devices drawing a moving gradient
pub struct SyntheticCamera;

#[async_trait]
impl MediaDevices for SyntheticCamera {
    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, CameraError> {
        Ok([FacingMode::Environment, FacingMode::User]
            .into_iter()
            .map(|facing| MediaDeviceInfo {
                device_id: format!("synthetic-{}", facing.as_str()),
                kind: DeviceKind::VideoInput,
                label: format!("Test pattern ({})", facing.as_str()),
                facing: Some(facing),
            })
            .collect())
    }

    async fn get_user_media(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError> {
        if constraints.width == 0 || constraints.height == 0 {
            return Err(CameraError::Other("empty frame size requested".to_string()));
        }
        Ok(Box::new(SyntheticStream {
            facing: constraints.facing_mode,
            width: constraints.width,
            height: constraints.height,
            started: Instant::now(),
            live: true,
        }))
    }
}

struct SyntheticStream {
    facing: FacingMode,
    width: u32,
    height: u32,
    started: Instant,
    live: bool,
}

impl MediaStream for SyntheticStream {
    fn video_dimensions(&self) -> Option<(u32, u32)> {
        Some((self.width, self.height))
    }

    fn current_frame(&mut self) -> Result<RgbaImage, CameraError> {
        if !self.live {
            return Err(CameraError::StreamEnded);
        }
        let phase = (self.started.elapsed().as_millis() / 40) as u64;
        let (width, height) = (self.width, self.height);
        let user = self.facing == FacingMode::User;

        Ok(RgbaImage::from_fn(width, height, |x, y| {
            pattern_pixel(x, y, width, height, phase, user)
        }))
    }

    fn stop(&mut self) {
        self.live = false;
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

/// One pixel of the moving gradient; `phase` grows for as long as the
/// stream is open
fn pattern_pixel(x: u32, y: u32, width: u32, height: u32, phase: u64, user: bool) -> Rgba<u8> {
    let (w, h) = (u64::from(width.max(1)), u64::from(height.max(1)));
    let shifted = (u64::from(x) + phase % w) % w;
    let r = (shifted * 255 / w) as u8;
    let g = (u64::from(y) * 255 / h) as u8;
    let b = if user { 255 - r } else { (phase % 256) as u8 };
    Rgba([r, g, b, 255])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraints(facing_mode: FacingMode) -> VideoConstraints {
        VideoConstraints {
            facing_mode,
            width: 64,
            height: 36,
        }
    }

    fn write_still(path: &Path) {
        RgbaImage::from_pixel(120, 80, Rgba([1, 2, 3, 255]))
            .save(path)
            .unwrap();
    }

    #[tokio::test]
    async fn test_synthetic_stream_lifecycle() {
        let camera = SyntheticCamera;
        assert_eq!(camera.enumerate_devices().await.unwrap().len(), 2);

        let mut stream = camera.get_user_media(&constraints(FacingMode::User)).await.unwrap();
        assert_eq!(stream.video_dimensions(), Some((64, 36)));
        assert_eq!(stream.current_frame().unwrap().dimensions(), (64, 36));

        stream.stop();
        assert!(!stream.is_live());
        assert_eq!(stream.current_frame(), Err(CameraError::StreamEnded));
    }

    #[test]
    fn test_pattern_survives_long_sessions() {
        // Weeks of uptime push the phase far past u32 range
        let phase = u64::from(u32::MAX) * 3;
        let px = pattern_pixel(1279, 719, 1280, 720, phase, false);
        let again = pattern_pixel(1279, 719, 1280, 720, phase + 1280, false);
        assert_eq!(px.0[0], again.0[0]);
        assert_eq!(px.0[3], 255);

        let mirrored = pattern_pixel(0, 0, 1280, 720, phase, true);
        assert_eq!(mirrored.0[2], 255 - mirrored.0[0]);
    }

    #[tokio::test]
    async fn test_folder_camera_devices_and_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("environment")).unwrap();
        write_still(&dir.path().join("environment").join("a.png"));
        std::fs::write(dir.path().join("environment").join("notes.txt"), "x").unwrap();

        let camera = FolderCamera::new(dir.path().to_path_buf());
        let devices = camera.enumerate_devices().await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].facing, Some(FacingMode::Environment));

        // No "user" folder: the ideal facing mode falls back to what exists
        let mut stream = camera.get_user_media(&constraints(FacingMode::User)).await.unwrap();
        assert_eq!(stream.video_dimensions(), Some((64, 36)));
        assert!(stream.current_frame().is_ok());
        stream.stop();
    }

    #[tokio::test]
    async fn test_empty_folder_has_no_device() {
        let dir = tempfile::tempdir().unwrap();
        let camera = FolderCamera::new(dir.path().to_path_buf());

        assert!(camera.enumerate_devices().await.unwrap().is_empty());
        let err = camera
            .get_user_media(&constraints(FacingMode::Environment))
            .await
            .err();
        assert_eq!(err, Some(CameraError::NoDevice));
    }
}
