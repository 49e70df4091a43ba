use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::GeoError;
use crate::platform::geolocation::{fix_within_timeout, Geolocation, LocationSample, PositionOptions};
use crate::platform::permissions::{PermissionName, PermissionState, Permissions};

/// What the permission line should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionDisplay {
    State(PermissionState),
    /// Introspection exists but the query failed
    Unavailable,
    /// No introspection on this platform
    Unknown,
}

/// Updates delivered to whoever renders the tracker
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    Requesting,
    Fix(LocationSample),
    Error(GeoError),
    Started,
    Stopped,
    Unsupported,
    Permission(PermissionDisplay),
}

/// Standalone location readout with continuous tracking.
///
/// Owns at most one continuous subscription: a spawned task forwarding
/// the platform's position stream. Stopping aborts that task, which drops
/// the stream and cancels the platform watch.
pub struct LocationTracker {
    /// `None` when the platform has no geolocation
    geolocation: Option<Arc<dyn Geolocation>>,
    /// `None` when permission states cannot be introspected
    permissions: Option<Arc<dyn Permissions>>,
    options: PositionOptions,
    runtime: Handle,
    events: mpsc::UnboundedSender<TrackerEvent>,
    subscription: Option<JoinHandle<()>>,
    permission_task: Option<JoinHandle<()>>,
}

impl LocationTracker {
    pub fn new(
        geolocation: Option<Arc<dyn Geolocation>>,
        permissions: Option<Arc<dyn Permissions>>,
        timeout: Duration,
        runtime: Handle,
    ) -> (Self, mpsc::UnboundedReceiver<TrackerEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let tracker = Self {
            geolocation,
            permissions,
            options: PositionOptions::fresh(timeout),
            runtime,
            events,
            subscription: None,
            permission_task: None,
        };
        (tracker, receiver)
    }

    pub fn is_tracking(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Report the geolocation permission state and follow later changes
    pub fn watch_permission(&mut self) {
        if self.permission_task.is_some() {
            return;
        }

        let Some(permissions) = self.permissions.clone() else {
            self.emit(TrackerEvent::Permission(PermissionDisplay::Unknown));
            return;
        };

        let events = self.events.clone();
        self.permission_task = Some(self.runtime.spawn(async move {
            let mut states = match permissions.query(PermissionName::Geolocation).await {
                Ok(states) => states,
                Err(e) => {
                    warn!("⚠️  Permission query failed: {}", e);
                    let _ = events.send(TrackerEvent::Permission(PermissionDisplay::Unavailable));
                    return;
                }
            };

            loop {
                let state = *states.borrow_and_update();
                debug!("🔐 Geolocation permission: {}", state.as_str());
                if events
                    .send(TrackerEvent::Permission(PermissionDisplay::State(state)))
                    .is_err()
                {
                    return;
                }
                if states.changed().await.is_err() {
                    return;
                }
            }
        }));
    }

    /// Request one immediate fix and, unless already tracking, start the
    /// continuous subscription. Returns whether a subscription was started.
    pub fn start_tracking(&mut self) -> bool {
        let Some(geolocation) = self.geolocation.clone() else {
            self.emit(TrackerEvent::Unsupported);
            return false;
        };

        self.emit(TrackerEvent::Requesting);

        let events = self.events.clone();
        let options = self.options;
        let one_shot = geolocation.clone();
        self.runtime.spawn(async move {
            let event = match fix_within_timeout(one_shot.as_ref(), &options).await {
                Ok(sample) => TrackerEvent::Fix(sample),
                Err(e) => TrackerEvent::Error(e),
            };
            let _ = events.send(event);
        });

        if self.is_tracking() {
            return false;
        }

        let mut positions = match geolocation.watch_position(&self.options) {
            Ok(positions) => positions,
            Err(e) => {
                warn!("⚠️  Could not start location tracking: {}", e);
                self.emit(TrackerEvent::Error(e));
                return false;
            }
        };

        let events = self.events.clone();
        self.subscription = Some(self.runtime.spawn(async move {
            while let Some(update) = positions.next().await {
                let event = match update {
                    Ok(sample) => TrackerEvent::Fix(sample),
                    Err(e) => TrackerEvent::Error(e),
                };
                if events.send(event).is_err() {
                    break;
                }
            }
        }));

        info!("📍 Location tracking started");
        self.emit(TrackerEvent::Started);
        true
    }

    /// Cancel the subscription without draining pending fixes.
    /// Returns false when nothing was active.
    pub fn stop_tracking(&mut self) -> bool {
        match self.subscription.take() {
            Some(task) => {
                task.abort();
                info!("📍 Location tracking stopped");
                self.emit(TrackerEvent::Stopped);
                true
            }
            None => false,
        }
    }

    fn emit(&self, event: TrackerEvent) {
        // The receiver going away only means nobody renders updates anymore
        let _ = self.events.send(event);
    }
}

impl Drop for LocationTracker {
    fn drop(&mut self) {
        if let Some(task) = self.subscription.take() {
            task.abort();
        }
        if let Some(task) = self.permission_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample, FakeGeolocation, FakePermissions};
    use std::sync::atomic::Ordering;

    fn tracker(
        geo: Option<FakeGeolocation>,
        permissions: Option<FakePermissions>,
    ) -> (LocationTracker, mpsc::UnboundedReceiver<TrackerEvent>) {
        LocationTracker::new(
            geo.map(|g| Arc::new(g) as Arc<dyn Geolocation>),
            permissions.map(|p| Arc::new(p) as Arc<dyn Permissions>),
            Duration::from_secs(10),
            Handle::current(),
        )
    }

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<TrackerEvent>) -> Vec<TrackerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_start_twice_keeps_one_subscription() {
        let geo = FakeGeolocation::fixed(40.41, -3.70, 5.0);
        let watches = geo.watches();
        let one_shots = geo.one_shots();
        let (mut tracker, _rx) = tracker(Some(geo), None);

        assert!(tracker.start_tracking());
        assert!(!tracker.start_tracking());
        settle().await;

        assert!(tracker.is_tracking());
        assert_eq!(watches.current(), 1);
        assert_eq!(watches.peak(), 1);
        // Each start still asks for an immediate fix
        assert_eq!(one_shots.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stop_cancels_subscription() {
        let geo = FakeGeolocation::fixed(1.0, 2.0, 3.0);
        let watches = geo.watches();
        let pusher = geo.pusher();
        let (mut tracker, mut rx) = tracker(Some(geo), None);

        tracker.start_tracking();
        settle().await;
        assert!(tracker.stop_tracking());
        settle().await;

        assert!(!tracker.is_tracking());
        assert_eq!(watches.current(), 0);

        drain(&mut rx);
        pusher.push(Ok(sample(9.0, 9.0, 9.0)));
        settle().await;
        assert!(drain(&mut rx).is_empty());

        // Stopping again is a no-op
        assert!(!tracker.stop_tracking());

        // And tracking can be restarted
        assert!(tracker.start_tracking());
    }

    #[tokio::test]
    async fn test_updates_are_forwarded() {
        let geo = FakeGeolocation::fixed(1.0, 2.0, 3.0);
        let pusher = geo.pusher();
        let (mut tracker, mut rx) = tracker(Some(geo), None);

        tracker.start_tracking();
        settle().await;
        pusher.push(Ok(sample(5.0, 6.0, 7.0)));
        pusher.push(Err(GeoError::PositionUnavailable));
        settle().await;

        let events = drain(&mut rx);
        assert_eq!(events[0], TrackerEvent::Requesting);
        assert!(events.contains(&TrackerEvent::Started));
        let fixes: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                TrackerEvent::Fix(s) => Some(s.latitude),
                _ => None,
            })
            .collect();
        // one-shot, initial watch delivery, pushed update
        assert_eq!(fixes.len(), 3);
        assert!(fixes.contains(&5.0));
        assert_eq!(
            events.last(),
            Some(&TrackerEvent::Error(GeoError::PositionUnavailable))
        );
    }

    #[tokio::test]
    async fn test_unsupported_geolocation() {
        let (mut tracker, mut rx) = tracker(None, None);
        assert!(!tracker.start_tracking());
        assert_eq!(drain(&mut rx), vec![TrackerEvent::Unsupported]);
    }

    #[tokio::test]
    async fn test_permission_changes_are_followed() {
        let permissions = FakePermissions::new(PermissionState::Prompt);
        let states = permissions.sender_handle();
        let (mut tracker, mut rx) = tracker(None, Some(permissions));

        tracker.watch_permission();
        settle().await;
        states.send_replace(PermissionState::Granted);
        settle().await;

        assert_eq!(
            drain(&mut rx),
            vec![
                TrackerEvent::Permission(PermissionDisplay::State(PermissionState::Prompt)),
                TrackerEvent::Permission(PermissionDisplay::State(PermissionState::Granted)),
            ]
        );
    }

    #[tokio::test]
    async fn test_permission_without_introspection() {
        let (mut tracker, mut rx) = tracker(None, None);
        tracker.watch_permission();
        assert_eq!(
            drain(&mut rx),
            vec![TrackerEvent::Permission(PermissionDisplay::Unknown)]
        );

        let (mut tracker, mut rx) = self::tracker(None, Some(FakePermissions::failing()));
        tracker.watch_permission();
        settle().await;
        assert_eq!(
            drain(&mut rx),
            vec![TrackerEvent::Permission(PermissionDisplay::Unavailable)]
        );
    }
}
