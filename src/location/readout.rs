use chrono::Local;

use super::tracker::{PermissionDisplay, TrackerEvent};
use crate::error::GeoError;

/// External map service link for a position
pub fn map_link(latitude: f64, longitude: f64) -> String {
    format!("https://www.google.com/maps?q={},{}", latitude, longitude)
}

/// Text the location panel shows. Every fix overwrites the whole position.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerReadout {
    pub permission: String,
    pub latitude: String,
    pub longitude: String,
    pub accuracy: String,
    pub timestamp: String,
    pub message: String,
    pub map_link: Option<String>,
    pub tracking: bool,
}

impl Default for TrackerReadout {
    fn default() -> Self {
        Self {
            permission: "checking...".to_string(),
            latitude: "-".to_string(),
            longitude: "-".to_string(),
            accuracy: "-".to_string(),
            timestamp: "-".to_string(),
            message: String::new(),
            map_link: None,
            tracking: false,
        }
    }
}

impl TrackerReadout {
    pub fn apply(&mut self, event: &TrackerEvent) {
        match event {
            TrackerEvent::Requesting => {
                self.message = "Getting location...".to_string();
            }
            TrackerEvent::Fix(sample) => {
                self.latitude = format!("{:.6}", sample.latitude);
                self.longitude = format!("{:.6}", sample.longitude);
                self.accuracy = format!("{:.2}", sample.accuracy_meters);
                self.timestamp = sample
                    .timestamp
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string();
                self.map_link = Some(map_link(sample.latitude, sample.longitude));
                self.message = "Location updated.".to_string();
            }
            TrackerEvent::Error(error) => {
                self.message = error.user_message().to_string();
            }
            TrackerEvent::Started => {
                self.tracking = true;
                self.message = "Location tracking started.".to_string();
            }
            TrackerEvent::Stopped => {
                self.tracking = false;
                self.message = "Location tracking stopped.".to_string();
            }
            TrackerEvent::Unsupported => {
                self.message = GeoError::Unsupported.user_message().to_string();
            }
            TrackerEvent::Permission(display) => {
                self.permission = match display {
                    PermissionDisplay::State(state) => state.as_str().to_string(),
                    PermissionDisplay::Unavailable => {
                        "unavailable (permission query failed)".to_string()
                    }
                    PermissionDisplay::Unknown => "unknown (no permission introspection)".to_string(),
                };
            }
        }
    }
}
