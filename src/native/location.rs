/// Configured desktop position provider
///
/// Reports the latitude/longitude from the config file with a fresh
/// timestamp on every request. The permission state is held in a watch
/// channel so changes are seen by both the provider and anyone that queried
/// the permission.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::stream;
use tokio::sync::watch;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::config::LocationConfig;
use crate::error::{GeoError, PermissionError};
use crate::platform::geolocation::{Geolocation, LocationSample, PositionOptions, PositionStream};
use crate::platform::permissions::{PermissionName, PermissionState, Permissions};

#[derive(Clone)]
pub struct DesktopLocation {
    position: Option<(f64, f64)>,
    accuracy_meters: f64,
    update_interval: Duration,
    permission: Arc<watch::Sender<PermissionState>>,
}

impl DesktopLocation {
    pub fn new(config: &LocationConfig) -> Self {
        let initial = PermissionState::parse(&config.permission).unwrap_or_else(|| {
            warn!(
                "⚠️  Unknown location permission '{}', using prompt",
                config.permission
            );
            PermissionState::Prompt
        });
        let (sender, _) = watch::channel(initial);

        Self {
            position: config.latitude.zip(config.longitude),
            accuracy_meters: config.accuracy_meters,
            update_interval: Duration::from_millis(config.update_interval_ms.max(1)),
            permission: Arc::new(sender),
        }
    }

    /// Change the permission out of band; every watcher is told
    pub fn set_permission(&self, state: PermissionState) {
        self.permission.send_replace(state);
    }

    fn fix(&self) -> Result<LocationSample, GeoError> {
        let state = *self.permission.borrow();
        match state {
            PermissionState::Denied => return Err(GeoError::PermissionDenied),
            PermissionState::Granted => {}
            // Nobody to ask on the desktop: the first request grants
            PermissionState::Prompt => {
                self.permission.send_replace(PermissionState::Granted);
            }
        }

        let (latitude, longitude) = self.position.ok_or(GeoError::PositionUnavailable)?;
        Ok(LocationSample {
            latitude,
            longitude,
            accuracy_meters: self.accuracy_meters,
            timestamp: Utc::now(),
        })
    }
}

#[async_trait]
impl Geolocation for DesktopLocation {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<LocationSample, GeoError> {
        self.fix()
    }

    fn watch_position(&self, _options: &PositionOptions) -> Result<PositionStream, GeoError> {
        let provider = self.clone();
        let period = self.update_interval;

        // The ticker is created on first poll, inside whichever runtime
        // drives the stream
        let updates = stream::unfold(
            (provider, None::<Interval>),
            move |(provider, ticker)| async move {
                let mut ticker = ticker.unwrap_or_else(|| {
                    let mut ticker = interval(period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    ticker
                });
                ticker.tick().await;
                let fix = provider.fix();
                debug!("📍 Watch update: {:?}", fix);
                Some((fix, (provider, Some(ticker))))
            },
        );

        Ok(Box::pin(updates))
    }
}

#[async_trait]
impl Permissions for DesktopLocation {
    async fn query(
        &self,
        name: PermissionName,
    ) -> Result<watch::Receiver<PermissionState>, PermissionError> {
        match name {
            PermissionName::Geolocation => Ok(self.permission.subscribe()),
            PermissionName::Camera => Err(PermissionError::Unsupported(name.as_str())),
        }
    }
}

impl std::fmt::Debug for DesktopLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesktopLocation")
            .field("position", &self.position)
            .field("permission", &*self.permission.borrow())
            .finish()
    }
}
