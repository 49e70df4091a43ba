use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;
use tracing::{info, warn};

use super::encoding::{draw_frame, encode_jpeg, to_data_url, JPEG_MIME};
use crate::config::AppConfig;
use crate::error::{CameraError, GeoError};
use crate::platform::camera::{
    video_input_count, FacingMode, MediaDevices, MediaStream, VideoConstraints,
};
use crate::platform::geolocation::{fix_within_timeout, Geolocation, PositionOptions};
use crate::state::data::{timestamp_now, PhotoRecord};
use crate::state::photo_store::PhotoStore;

/// Capture parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureSettings {
    /// Advisory stream size, also the buffer fallback
    pub preferred_width: u32,
    pub preferred_height: u32,
    pub jpeg_quality: u8,
    /// Budget for the location fix that tags a capture
    pub tag_timeout: Duration,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            preferred_width: 1280,
            preferred_height: 720,
            jpeg_quality: 92,
            tag_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&AppConfig> for CaptureSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            preferred_width: config.camera.preferred_width,
            preferred_height: config.camera.preferred_height,
            jpeg_quality: config.camera.jpeg_quality,
            tag_timeout: Duration::from_millis(config.location.tag_timeout_ms),
        }
    }
}

/// Owns the camera session: `Closed` while `stream` is `None`, `Open` otherwise.
/// At most one stream is held; it is stopped before another is acquired.
pub struct CaptureController {
    devices: Arc<dyn MediaDevices>,
    geolocation: Arc<dyn Geolocation>,
    store: PhotoStore,
    settings: CaptureSettings,
    facing_mode: FacingMode,
    stream: Option<Box<dyn MediaStream>>,
    /// Capture buffer size (width, height)
    buffer: (u32, u32),
    switch_available: bool,
}

impl CaptureController {
    pub fn new(
        devices: Arc<dyn MediaDevices>,
        geolocation: Arc<dyn Geolocation>,
        store: PhotoStore,
        settings: CaptureSettings,
    ) -> Self {
        Self {
            devices,
            geolocation,
            store,
            buffer: (settings.preferred_width, settings.preferred_height),
            settings,
            facing_mode: FacingMode::default(),
            stream: None,
            switch_available: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    pub fn facing_mode(&self) -> FacingMode {
        self.facing_mode
    }

    /// More than one video input was found on the last `open`
    pub fn switch_available(&self) -> bool {
        self.switch_available
    }

    pub fn buffer_size(&self) -> (u32, u32) {
        self.buffer
    }

    /// Acquire a stream for the current facing mode.
    /// On failure the controller stays closed; no retry is attempted.
    pub async fn open(&mut self) -> Result<(), CameraError> {
        self.switch_available = match self.devices.enumerate_devices().await {
            Ok(devices) => video_input_count(&devices) > 1,
            Err(e) => {
                warn!("⚠️  Could not enumerate cameras: {}", e);
                false
            }
        };

        self.release_stream();

        let constraints = VideoConstraints {
            facing_mode: self.facing_mode,
            width: self.settings.preferred_width,
            height: self.settings.preferred_height,
        };

        match self.devices.get_user_media(&constraints).await {
            Ok(stream) => {
                self.buffer = stream
                    .video_dimensions()
                    .unwrap_or((self.settings.preferred_width, self.settings.preferred_height));
                self.stream = Some(stream);
                info!(
                    "📷 Camera open ({}, {}x{})",
                    self.facing_mode.as_str(),
                    self.buffer.0,
                    self.buffer.1
                );
                Ok(())
            }
            Err(e) => {
                warn!("❌ Could not access the camera: {}", e);
                Err(e)
            }
        }
    }

    /// Flip front/back and reacquire from scratch
    pub async fn switch_camera(&mut self) -> Result<(), CameraError> {
        if !self.is_open() {
            return Err(CameraError::NotOpen);
        }
        self.facing_mode = self.facing_mode.flipped();
        self.close();
        self.open().await
    }

    /// Current frame for the live preview
    pub fn preview_frame(&mut self) -> Option<RgbaImage> {
        let stream = self.stream.as_mut()?;
        match stream.current_frame() {
            Ok(frame) => Some(frame),
            Err(e) => {
                warn!("⚠️  Preview frame unavailable: {}", e);
                None
            }
        }
    }

    /// Draw and encode the current frame. Returns as soon as the photo is
    /// encoded; tagging and persistence happen when the result is awaited.
    pub fn capture(&mut self) -> Result<PendingPhoto, CameraError> {
        let stream = self.stream.as_mut().ok_or(CameraError::NotOpen)?;

        if let Some(dimensions) = stream.video_dimensions() {
            self.buffer = dimensions;
        }
        let frame = stream.current_frame()?;
        let drawn = draw_frame(frame, self.buffer.0, self.buffer.1);
        let jpeg = encode_jpeg(drawn, self.settings.jpeg_quality)?;

        let record = PhotoRecord::new(to_data_url(JPEG_MIME, &jpeg), timestamp_now(), None);
        info!("📸 Captured {}x{} ({} KB)", self.buffer.0, self.buffer.1, jpeg.len() / 1024);

        Ok(PendingPhoto {
            record,
            geolocation: self.geolocation.clone(),
            store: self.store.clone(),
            options: PositionOptions::fresh(self.settings.tag_timeout),
        })
    }

    /// Stop every track and return to `Closed`. Safe to call when closed.
    pub fn close(&mut self) {
        if self.release_stream() {
            info!("📷 Camera closed");
        }
    }

    fn release_stream(&mut self) -> bool {
        match self.stream.take() {
            Some(mut stream) => {
                stream.stop();
                true
            }
            None => false,
        }
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for CaptureController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureController")
            .field("open", &self.is_open())
            .field("facing_mode", &self.facing_mode)
            .field("buffer", &self.buffer)
            .finish()
    }
}

/// An encoded photo waiting for its location fix
pub struct PendingPhoto {
    record: PhotoRecord,
    geolocation: Arc<dyn Geolocation>,
    store: PhotoStore,
    options: PositionOptions,
}

/// A photo after tagging and persistence
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedPhoto {
    pub record: PhotoRecord,
    /// Why the photo is untagged, if it is
    pub location_error: Option<GeoError>,
    pub persisted: bool,
}

impl PendingPhoto {
    pub fn record(&self) -> &PhotoRecord {
        &self.record
    }

    /// Request a one-shot fix, attach it when it arrives in time, then store
    /// the photo exactly once whatever the outcome
    pub async fn finish(self) -> CapturedPhoto {
        let (coordinates, location_error) =
            match fix_within_timeout(self.geolocation.as_ref(), &self.options).await {
                Ok(sample) => (Some(sample.coordinates()), None),
                Err(e) => {
                    warn!("📍 No location for photo: {}", e);
                    (None, Some(e))
                }
            };

        let record = self.record.tagged(coordinates);
        let persisted = self.store.append_record(record.clone()).is_some();

        CapturedPhoto {
            record,
            location_error,
            persisted,
        }
    }
}
