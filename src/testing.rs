//! In-memory platform fakes shared by the unit tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use image::{Rgba, RgbaImage};
use tokio::sync::{mpsc, watch};

use crate::error::{CacheError, CameraError, GeoError, PermissionError, ShareError};
use crate::platform::camera::{
    DeviceKind, MediaDeviceInfo, MediaDevices, MediaStream, VideoConstraints,
};
use crate::platform::geolocation::{Geolocation, LocationSample, PositionOptions, PositionStream};
use crate::platform::network::{Network, Request, Response};
use crate::platform::permissions::{PermissionName, PermissionState, Permissions};
use crate::platform::share::{ShareData, ShareFile, ShareTarget};

/// Tracks how many handles are alive and the most ever alive at once
#[derive(Debug, Clone, Default)]
pub struct LiveCounter {
    current: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl LiveCounter {
    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn acquire(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn release(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

// ========== Camera ==========

pub struct FakeCamera {
    devices: usize,
    deny: bool,
    frame_size: Option<(u32, u32)>,
    live: LiveCounter,
    requests: Arc<Mutex<Vec<VideoConstraints>>>,
}

impl FakeCamera {
    pub fn with_devices(devices: usize) -> Self {
        Self {
            devices,
            deny: false,
            frame_size: Some((64, 48)),
            live: LiveCounter::default(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn deny(mut self) -> Self {
        self.deny = true;
        self
    }

    pub fn frame_size(mut self, size: Option<(u32, u32)>) -> Self {
        self.frame_size = size;
        self
    }

    pub fn live_streams(&self) -> LiveCounter {
        self.live.clone()
    }

    pub fn requests(&self) -> Arc<Mutex<Vec<VideoConstraints>>> {
        self.requests.clone()
    }
}

#[async_trait]
impl MediaDevices for FakeCamera {
    async fn enumerate_devices(&self) -> Result<Vec<MediaDeviceInfo>, CameraError> {
        let mut devices: Vec<_> = (0..self.devices)
            .map(|i| MediaDeviceInfo {
                device_id: format!("cam-{i}"),
                kind: DeviceKind::VideoInput,
                label: format!("Camera {i}"),
                facing: None,
            })
            .collect();
        devices.push(MediaDeviceInfo {
            device_id: "mic".into(),
            kind: DeviceKind::AudioInput,
            label: "Microphone".into(),
            facing: None,
        });
        Ok(devices)
    }

    async fn get_user_media(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError> {
        self.requests.lock().unwrap().push(*constraints);
        if self.deny {
            return Err(CameraError::PermissionDenied);
        }
        if self.devices == 0 {
            return Err(CameraError::NoDevice);
        }
        self.live.acquire();
        Ok(Box::new(FakeStream {
            size: self.frame_size,
            live: self.live.clone(),
            stopped: false,
        }))
    }
}

struct FakeStream {
    size: Option<(u32, u32)>,
    live: LiveCounter,
    stopped: bool,
}

impl MediaStream for FakeStream {
    fn video_dimensions(&self) -> Option<(u32, u32)> {
        self.size
    }

    fn current_frame(&mut self) -> Result<RgbaImage, CameraError> {
        if self.stopped {
            return Err(CameraError::StreamEnded);
        }
        let (w, h) = self.size.unwrap_or((64, 48));
        Ok(RgbaImage::from_pixel(w, h, Rgba([90, 120, 200, 255])))
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.live.release();
        }
    }

    fn is_live(&self) -> bool {
        !self.stopped
    }
}

// ========== Geolocation ==========

#[derive(Clone)]
enum GeoBehavior {
    Fixed(LocationSample),
    Fail(GeoError),
    Stalled,
}

pub struct FakeGeolocation {
    behavior: GeoBehavior,
    watches: LiveCounter,
    one_shots: Arc<AtomicUsize>,
    senders: Arc<Mutex<Vec<mpsc::UnboundedSender<Result<LocationSample, GeoError>>>>>,
}

impl FakeGeolocation {
    fn new(behavior: GeoBehavior) -> Self {
        Self {
            behavior,
            watches: LiveCounter::default(),
            one_shots: Arc::new(AtomicUsize::new(0)),
            senders: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn fixed(latitude: f64, longitude: f64, accuracy_meters: f64) -> Self {
        Self::new(GeoBehavior::Fixed(sample(latitude, longitude, accuracy_meters)))
    }

    pub fn failing(error: GeoError) -> Self {
        Self::new(GeoBehavior::Fail(error))
    }

    pub fn stalled() -> Self {
        Self::new(GeoBehavior::Stalled)
    }

    pub fn watches(&self) -> LiveCounter {
        self.watches.clone()
    }

    pub fn one_shots(&self) -> Arc<AtomicUsize> {
        self.one_shots.clone()
    }

    /// Handle for delivering updates to every open watch
    pub fn pusher(&self) -> GeoPusher {
        GeoPusher {
            senders: self.senders.clone(),
        }
    }
}

#[derive(Clone)]
pub struct GeoPusher {
    senders: Arc<Mutex<Vec<mpsc::UnboundedSender<Result<LocationSample, GeoError>>>>>,
}

impl GeoPusher {
    pub fn push(&self, update: Result<LocationSample, GeoError>) {
        for sender in self.senders.lock().unwrap().iter() {
            let _ = sender.send(update.clone());
        }
    }
}

pub fn sample(latitude: f64, longitude: f64, accuracy_meters: f64) -> LocationSample {
    LocationSample {
        latitude,
        longitude,
        accuracy_meters,
        timestamp: Utc::now(),
    }
}

/// Releases a watch slot when the stream is dropped
struct WatchGuard(LiveCounter);

impl Drop for WatchGuard {
    fn drop(&mut self) {
        self.0.release();
    }
}

#[async_trait]
impl Geolocation for FakeGeolocation {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<LocationSample, GeoError> {
        self.one_shots.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            GeoBehavior::Fixed(sample) => Ok(*sample),
            GeoBehavior::Fail(error) => Err(error.clone()),
            GeoBehavior::Stalled => futures::future::pending().await,
        }
    }

    fn watch_position(&self, _options: &PositionOptions) -> Result<PositionStream, GeoError> {
        let (tx, rx) = mpsc::unbounded_channel();
        match &self.behavior {
            GeoBehavior::Fixed(sample) => {
                let _ = tx.send(Ok(*sample));
            }
            GeoBehavior::Fail(error) => {
                let _ = tx.send(Err(error.clone()));
            }
            GeoBehavior::Stalled => {}
        }
        self.senders.lock().unwrap().push(tx);

        self.watches.acquire();
        let guard = WatchGuard(self.watches.clone());
        Ok(Box::pin(futures::stream::unfold(
            (rx, guard),
            |(mut rx, guard)| async move { rx.recv().await.map(|item| (item, (rx, guard))) },
        )))
    }
}

// ========== Permissions ==========

pub struct FakePermissions {
    sender: Arc<watch::Sender<PermissionState>>,
    fail: bool,
}

impl FakePermissions {
    pub fn new(state: PermissionState) -> Self {
        let (sender, _) = watch::channel(state);
        Self {
            sender: Arc::new(sender),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(PermissionState::Prompt)
        }
    }

    /// Changes the state out of band, after the fake was handed over
    pub fn sender_handle(&self) -> Arc<watch::Sender<PermissionState>> {
        self.sender.clone()
    }
}

#[async_trait]
impl Permissions for FakePermissions {
    async fn query(
        &self,
        _name: PermissionName,
    ) -> Result<watch::Receiver<PermissionState>, PermissionError> {
        if self.fail {
            return Err(PermissionError::QueryFailed("query rejected".to_string()));
        }
        Ok(self.sender.subscribe())
    }
}

// ========== Share ==========

#[derive(Debug, Clone, PartialEq)]
pub enum ShareCall {
    Share(ShareData),
    SaveAs(String),
    Open(String),
}

#[derive(Default)]
pub struct FakeShare {
    pub accept_files: bool,
    pub fail_share: bool,
    pub fail_save: bool,
    pub calls: Mutex<Vec<ShareCall>>,
}

impl FakeShare {
    pub fn calls(&self) -> Vec<ShareCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ShareTarget for FakeShare {
    fn can_share(&self, data: &ShareData) -> bool {
        data.files.is_empty() || self.accept_files
    }

    async fn share(&self, data: ShareData) -> Result<(), ShareError> {
        self.calls.lock().unwrap().push(ShareCall::Share(data));
        if self.fail_share {
            Err(ShareError::Cancelled)
        } else {
            Ok(())
        }
    }

    async fn save_as(&self, file: ShareFile) -> Result<Option<PathBuf>, ShareError> {
        self.calls.lock().unwrap().push(ShareCall::SaveAs(file.name.clone()));
        if self.fail_save {
            Err(ShareError::Failed("disk full".into()))
        } else {
            Ok(Some(PathBuf::from(file.name)))
        }
    }

    fn open_in_viewer(&self, image_url: &str) -> Result<(), ShareError> {
        self.calls
            .lock()
            .unwrap()
            .push(ShareCall::Open(image_url.to_string()));
        Ok(())
    }
}

// ========== Network ==========

#[derive(Default)]
pub struct FakeNetwork {
    responses: HashMap<String, Response>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeNetwork {
    pub fn serving(paths: &[(&str, &str)]) -> Self {
        let responses = paths
            .iter()
            .map(|(url, body)| {
                (
                    url.to_string(),
                    Response {
                        status: 200,
                        headers: vec![("content-type".into(), "text/plain".into())],
                        body: body.as_bytes().to_vec(),
                    },
                )
            })
            .collect();
        Self {
            responses,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Network for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, CacheError> {
        let url = request.url.to_string();
        self.calls.lock().unwrap().push(url.clone());
        match self.responses.get(&url) {
            Some(response) => Ok(response.clone()),
            None => Ok(Response {
                status: 404,
                headers: Vec::new(),
                body: Vec::new(),
            }),
        }
    }
}
