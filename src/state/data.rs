/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the capture flow, the photo store and the gallery.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A position attached to a photo
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
    /// Radius of the 95% confidence circle, in meters
    #[serde(rename = "accuracy", default)]
    pub accuracy_meters: f64,
}

impl Coordinates {
    /// "40.41000, -3.70000"
    pub fn display_short(&self) -> String {
        format!("{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

/// One captured photo. Never modified after creation.
///
/// Serialized as `{"data": ..., "ts": <epoch ms>, "coords": {...} | null}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    /// Inline `data:image/jpeg;base64,...` payload
    #[serde(rename = "data")]
    pub image: String,
    /// Set once, when the frame is encoded
    #[serde(rename = "ts", with = "chrono::serde::ts_milliseconds")]
    pub captured_at: DateTime<Utc>,
    /// Absent when geolocation failed or was denied
    #[serde(rename = "coords", default)]
    pub coordinates: Option<Coordinates>,
}

impl PhotoRecord {
    pub fn new(image: String, captured_at: DateTime<Utc>, coordinates: Option<Coordinates>) -> Self {
        Self {
            image,
            captured_at,
            coordinates,
        }
    }

    /// Same photo with coordinates attached
    pub fn tagged(self, coordinates: Option<Coordinates>) -> Self {
        Self {
            coordinates,
            ..self
        }
    }
}

/// Current time at the millisecond precision the store keeps
pub fn timestamp_now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}
