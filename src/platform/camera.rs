use async_trait::async_trait;
use image::RgbaImage;

use crate::error::CameraError;

/// Which physical camera is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacingMode {
    /// Rear camera
    #[default]
    Environment,
    /// Front camera
    User,
}

impl FacingMode {
    pub fn flipped(self) -> Self {
        match self {
            FacingMode::Environment => FacingMode::User,
            FacingMode::User => FacingMode::Environment,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::Environment => "environment",
            FacingMode::User => "user",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    VideoInput,
    AudioInput,
    AudioOutput,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaDeviceInfo {
    pub device_id: String,
    pub kind: DeviceKind,
    pub label: String,
    /// Facing mode the device reports, if any
    pub facing: Option<FacingMode>,
}

/// Stream request. All values are advisory ("ideal"), not mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoConstraints {
    pub facing_mode: FacingMode,
    pub width: u32,
    pub height: u32,
}

/// Source of camera devices and streams
#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, CameraError>;

    async fn get_user_media(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError>;
}

/// A live capture handle. Dropping it without `stop` leaks the device,
/// so owners always call `stop` first.
pub trait MediaStream: Send {
    /// Negotiated frame size; `None` until metadata is known
    fn video_dimensions(&self) -> Option<(u32, u32)>;

    /// The current video frame
    fn current_frame(&mut self) -> Result<RgbaImage, CameraError>;

    /// Stop every underlying track
    fn stop(&mut self);

    fn is_live(&self) -> bool;
}

/// Count video inputs in a device list
pub fn video_input_count(devices: &[MediaDeviceInfo]) -> usize {
    devices
        .iter()
        .filter(|d| d.kind == DeviceKind::VideoInput)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_facing_mode() {
        assert_eq!(FacingMode::Environment.flipped(), FacingMode::User);
        assert_eq!(FacingMode::User.flipped(), FacingMode::Environment);
        assert_eq!(FacingMode::default(), FacingMode::Environment);
    }

    #[test]
    fn test_video_input_count_ignores_audio() {
        let device = |kind| MediaDeviceInfo {
            device_id: "d".into(),
            kind,
            label: String::new(),
            facing: None,
        };
        let devices = vec![
            device(DeviceKind::VideoInput),
            device(DeviceKind::AudioInput),
            device(DeviceKind::VideoInput),
            device(DeviceKind::AudioOutput),
        ];
        assert_eq!(video_input_count(&devices), 2);
    }
}
