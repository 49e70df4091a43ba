use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use crate::error::GeoError;
use crate::state::data::Coordinates;

/// A single location reading. Transient, never persisted on its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: f64,
    pub timestamp: DateTime<Utc>,
}

impl LocationSample {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
            accuracy_meters: self.accuracy_meters,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached position accepted; zero means always a fresh fix
    pub maximum_age: Duration,
}

impl PositionOptions {
    /// High accuracy, no cached fallback
    pub fn fresh(timeout: Duration) -> Self {
        Self {
            enable_high_accuracy: true,
            timeout,
            maximum_age: Duration::ZERO,
        }
    }
}

/// Continuous position updates. Dropping the stream cancels the watch.
pub type PositionStream = BoxStream<'static, Result<LocationSample, GeoError>>;

#[async_trait]
pub trait Geolocation: Send + Sync {
    async fn current_position(&self, options: &PositionOptions)
        -> Result<LocationSample, GeoError>;

    fn watch_position(&self, options: &PositionOptions) -> Result<PositionStream, GeoError>;
}

/// One-shot fix bounded by `options.timeout`, even if the provider ignores it
pub async fn fix_within_timeout(
    geolocation: &dyn Geolocation,
    options: &PositionOptions,
) -> Result<LocationSample, GeoError> {
    match tokio::time::timeout(options.timeout, geolocation.current_position(options)).await {
        Ok(result) => result,
        Err(_) => Err(GeoError::Timeout),
    }
}
