/// Frame drawing and still-image encoding
///
/// The only image processing the application does: draw the current frame
/// at the capture buffer size, encode it as JPEG and wrap it in a data URL.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::{imageops::FilterType, DynamicImage, RgbaImage};

use crate::error::{CameraError, ShareError};

pub const JPEG_MIME: &str = "image/jpeg";

/// Draw `frame` into a buffer of `width`×`height`
pub fn draw_frame(frame: RgbaImage, width: u32, height: u32) -> RgbaImage {
    if frame.dimensions() == (width, height) {
        frame
    } else {
        image::imageops::resize(&frame, width, height, FilterType::Triangle)
    }
}

/// Encode a frame as JPEG. Alpha is dropped, JPEG has none.
pub fn encode_jpeg(frame: RgbaImage, quality: u8) -> Result<Vec<u8>, CameraError> {
    let rgb = DynamicImage::ImageRgba8(frame).to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
        .encode_image(&rgb)
        .map_err(|e| CameraError::Encode(e.to_string()))?;
    Ok(out)
}

/// `data:<mime>;base64,<payload>`
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// A decoded inline payload
#[derive(Debug, Clone, PartialEq)]
pub struct DataUrl {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Parse a base64 data URL back into its bytes
pub fn decode_data_url(url: &str) -> Result<DataUrl, ShareError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| ShareError::InvalidPayload("not a data url".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ShareError::InvalidPayload("missing payload".to_string()))?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| ShareError::InvalidPayload("payload is not base64".to_string()))?;
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| ShareError::InvalidPayload(e.to_string()))?;

    Ok(DataUrl {
        mime_type: if mime_type.is_empty() {
            "text/plain".to_string()
        } else {
            mime_type.to_string()
        },
        bytes,
    })
}
