/// Camera capture module
///
/// This module handles:
/// - The camera stream lifecycle and photo capture (controller.rs)
/// - Drawing frames and encoding them to JPEG data URLs (encoding.rs)

pub mod controller;
pub mod encoding;

pub use controller::{CaptureController, CaptureSettings, CapturedPhoto};
