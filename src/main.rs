use iced::widget::{column, container, horizontal_rule, image, row, scrollable, text, Column};
use iced::{Alignment, Element, Length, Subscription, Task, Theme};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Handle, Runtime};
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

mod ui;

use geocam::capture::{CaptureController, CaptureSettings, CapturedPhoto};
use geocam::config::AppConfig;
use geocam::error::{CacheError, CameraError, StorageError};
use geocam::export::{share_or_download, ShareOutcome, ShareSettings};
use geocam::location::{LocationTracker, TrackerEvent, TrackerReadout};
use geocam::native::camera::desktop_camera;
use geocam::native::location::DesktopLocation;
use geocam::native::share::DesktopShare;
use geocam::native::desktop_capabilities;
use geocam::offline::{CacheManifest, OfflineCacheWorker, SqliteCacheStorage};
use geocam::platform::camera::FacingMode;
use geocam::platform::geolocation::Geolocation;
use geocam::platform::network::HttpNetwork;
use geocam::platform::permissions::Permissions;
use geocam::platform::share::ShareTarget;
use geocam::platform::storage::{KeyValueStore, SqliteStore};
use geocam::platform::Capabilities;
use geocam::state::gallery::Gallery;
use geocam::state::photo_store::PhotoStore;
use ui::camera::CameraView;
use ui::gallery::Thumbnails;

/// Live preview refresh rate while the camera is open
const PREVIEW_INTERVAL: Duration = Duration::from_millis(100);

/// Camera session facts reported back after an open or switch
#[derive(Debug, Clone)]
struct CameraInfo {
    switch_available: bool,
    facing: FacingMode,
}

/// What the offline worker reports once its lifecycle has run
#[derive(Debug, Clone)]
struct OfflineShell {
    summary: String,
    /// Header icon, served through the worker's cache
    icon: Option<Vec<u8>>,
}

/// Main application state
struct GeoCam {
    capabilities: Capabilities,
    /// Shared with the async open/switch/close tasks
    camera: Arc<Mutex<CaptureController>>,
    camera_view: CameraView,
    gallery: Gallery,
    thumbnails: Thumbnails,
    tracker: LocationTracker,
    readout: TrackerReadout,
    share_target: Arc<dyn ShareTarget>,
    share_settings: ShareSettings,
    /// Status message to display to the user
    status: String,
    offline_status: String,
    shell_icon: Option<image::Handle>,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    OpenCamera,
    CameraOpened(Result<CameraInfo, CameraError>),
    SwitchCamera,
    CloseCamera,
    CameraClosed,
    PreviewTick,
    Capture,
    /// Tagging and persistence finished for a capture
    PhotoReady(CapturedPhoto),
    /// Share/download the gallery entry with this id
    Share(u64),
    Shared(ShareOutcome),
    /// Show the gallery entry with this id full size
    OpenFull(u64),
    StartTracking,
    StopTracking,
    Tracker(TrackerEvent),
    OfflineReady(Result<OfflineShell, Arc<CacheError>>),
}

impl GeoCam {
    fn new(config: AppConfig, kv: Arc<dyn KeyValueStore>, runtime: Handle) -> (Self, Task<Message>) {
        let capabilities = desktop_capabilities(&config);
        let store = PhotoStore::new(kv, config.storage.photos_key.clone());

        // Replay what was stored in earlier sessions
        let mut gallery = Gallery::new();
        gallery.hydrate(store.load_all());
        let mut thumbnails = Thumbnails::default();
        thumbnails.sync(&gallery);
        info!("🖼️  GeoCam initialized with {} photos", gallery.len());

        let location = Arc::new(DesktopLocation::new(&config.location));
        let geolocation: Arc<dyn Geolocation> = location.clone();

        let camera = CaptureController::new(
            desktop_camera(&config.camera),
            geolocation.clone(),
            store,
            CaptureSettings::from(&config),
        );

        let permissions = capabilities
            .permission_introspection
            .then(|| location.clone() as Arc<dyn Permissions>);
        let (mut tracker, events) = LocationTracker::new(
            capabilities.geolocation.then_some(geolocation),
            permissions,
            Duration::from_millis(config.location.track_timeout_ms),
            runtime,
        );
        tracker.watch_permission();

        let mut tasks = vec![Task::run(tracker_events(events), Message::Tracker)];
        let offline_status = match offline_worker(&config) {
            Some(Ok(worker)) => {
                let icon = config.offline.icon.clone();
                tasks.push(Task::perform(
                    async move { run_offline(worker, icon).await.map_err(Arc::new) },
                    Message::OfflineReady,
                ));
                "Offline cache: installing...".to_string()
            }
            Some(Err(e)) => {
                warn!("⚠️  Offline cache disabled: {}", e);
                format!("Offline cache disabled: {}", e)
            }
            None => String::new(),
        };

        let status = if gallery.placeholder_visible() {
            "Ready. Open the camera to take a photo.".to_string()
        } else {
            format!("Ready. {} photos in the gallery.", gallery.len())
        };

        (
            GeoCam {
                capabilities,
                camera: Arc::new(Mutex::new(camera)),
                camera_view: CameraView::default(),
                gallery,
                thumbnails,
                tracker,
                readout: TrackerReadout::default(),
                share_target: Arc::new(DesktopShare::new(&config)),
                share_settings: ShareSettings::from(&config),
                status,
                offline_status,
                shell_icon: None,
            },
            Task::batch(tasks),
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::OpenCamera => {
                self.camera_view.busy = true;
                self.status = "Opening camera...".to_string();
                let camera = self.camera.clone();
                Task::perform(
                    async move {
                        let mut camera = camera.lock().await;
                        camera.open().await?;
                        Ok::<_, CameraError>(CameraInfo {
                            switch_available: camera.switch_available(),
                            facing: camera.facing_mode(),
                        })
                    },
                    Message::CameraOpened,
                )
            }
            Message::SwitchCamera => {
                self.camera_view.busy = true;
                self.camera_view.preview = None;
                let camera = self.camera.clone();
                Task::perform(
                    async move {
                        let mut camera = camera.lock().await;
                        camera.switch_camera().await?;
                        Ok::<_, CameraError>(CameraInfo {
                            switch_available: camera.switch_available(),
                            facing: camera.facing_mode(),
                        })
                    },
                    Message::CameraOpened,
                )
            }
            Message::CameraOpened(result) => {
                self.camera_view.busy = false;
                match result {
                    Ok(info) => {
                        self.camera_view.open = true;
                        self.camera_view.switch_available = info.switch_available;
                        self.camera_view.facing = info.facing;
                        self.status = "Camera ready.".to_string();
                    }
                    Err(e) => {
                        self.camera_view.open = false;
                        self.camera_view.preview = None;
                        self.status = e.user_message().to_string();
                    }
                }
                Task::none()
            }
            Message::CloseCamera => {
                self.camera_view.open = false;
                self.camera_view.preview = None;
                let camera = self.camera.clone();
                Task::perform(
                    async move { camera.lock().await.close() },
                    |_| Message::CameraClosed,
                )
            }
            Message::CameraClosed => {
                self.status = "Camera closed.".to_string();
                Task::none()
            }
            Message::PreviewTick => {
                // Skip the frame while an open or switch holds the session
                if let Ok(mut camera) = self.camera.try_lock() {
                    if let Some(frame) = camera.preview_frame() {
                        let (width, height) = frame.dimensions();
                        self.camera_view.preview = Some(iced::widget::image::Handle::from_rgba(
                            width,
                            height,
                            frame.into_raw(),
                        ));
                    }
                }
                Task::none()
            }
            Message::Capture => {
                let Ok(mut camera) = self.camera.try_lock() else {
                    self.status = "Camera is busy, try again.".to_string();
                    return Task::none();
                };
                match camera.capture() {
                    Ok(pending) => {
                        self.status = "Photo taken, getting location...".to_string();
                        Task::perform(pending.finish(), Message::PhotoReady)
                    }
                    Err(e) => {
                        self.status = e.user_message().to_string();
                        Task::none()
                    }
                }
            }
            Message::PhotoReady(photo) => {
                self.status = match (&photo.location_error, photo.persisted) {
                    (_, false) => "Photo taken, but it could not be saved.".to_string(),
                    (None, true) => "Photo saved with location.".to_string(),
                    (Some(e), true) => format!("Photo saved without location. {}", e.user_message()),
                };
                self.gallery.prepend(photo.record);
                self.thumbnails.sync(&self.gallery);
                Task::none()
            }
            Message::Share(id) => {
                let Some(entry) = self.gallery.find(id) else {
                    return Task::none();
                };
                let image = entry.image().to_string();
                let capabilities = self.capabilities;
                let target = self.share_target.clone();
                let settings = self.share_settings.clone();
                Task::perform(
                    async move {
                        share_or_download(&image, &capabilities, target.as_ref(), &settings).await
                    },
                    Message::Shared,
                )
            }
            Message::Shared(outcome) => {
                info!("📤 Export finished: {:?}", outcome);
                self.status = outcome.status_message();
                Task::none()
            }
            Message::OpenFull(id) => {
                if let Some(entry) = self.gallery.find(id) {
                    if let Err(e) = self.share_target.open_in_viewer(entry.image()) {
                        warn!("⚠️  Could not open photo: {}", e);
                        self.status = format!("Could not open the photo: {}", e);
                    }
                }
                Task::none()
            }
            Message::StartTracking => {
                self.tracker.start_tracking();
                Task::none()
            }
            Message::StopTracking => {
                self.tracker.stop_tracking();
                Task::none()
            }
            Message::Tracker(event) => {
                self.readout.apply(&event);
                Task::none()
            }
            Message::OfflineReady(result) => {
                match result {
                    Ok(shell) => {
                        self.offline_status = shell.summary;
                        self.shell_icon = shell.icon.map(image::Handle::from_bytes);
                    }
                    Err(e) => {
                        warn!("⚠️  Offline cache failed: {}", e);
                        self.offline_status = format!("Offline cache failed: {}", e);
                    }
                }
                Task::none()
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let top = row![
            ui::camera::camera_panel(&self.camera_view),
            ui::tracker::tracker_panel(&self.readout),
        ]
        .spacing(40);

        let mut title = row![].spacing(12).align_y(Alignment::Center);
        if let Some(icon) = &self.shell_icon {
            title = title.push(
                image(icon.clone())
                    .width(Length::Fixed(40.0))
                    .height(Length::Fixed(40.0)),
            );
        }
        title = title.push(text("GeoCam").size(40));

        let mut content: Column<Message> = column![
            title,
            top,
            text(&self.status).size(16),
        ]
        .spacing(20)
        .padding(30)
        .align_x(Alignment::Start);

        if !self.offline_status.is_empty() {
            content = content.push(ui::caption(&self.offline_status));
        }

        content = content
            .push(horizontal_rule(1))
            .push(text("Gallery").size(24))
            .push(ui::gallery::gallery_view(&self.gallery, &self.thumbnails));

        container(scrollable(content))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        if self.camera_view.open {
            iced::time::every(PREVIEW_INTERVAL).map(|_| Message::PreviewTick)
        } else {
            Subscription::none()
        }
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("geocam=info")),
        )
        .init();

    let config = AppConfig::load();

    // Tracker tasks run here, independent of the UI executor
    let runtime = Runtime::new()?;
    let handle = runtime.handle().clone();

    let kv = open_store(&config)?;

    iced::application("GeoCam", GeoCam::update, GeoCam::view)
        .subscription(GeoCam::subscription)
        .theme(GeoCam::theme)
        .centered()
        .run_with(move || GeoCam::new(config, kv, handle))?;

    Ok(())
}

/// The configured database, or an in-memory one when it cannot be opened
fn open_store(config: &AppConfig) -> Result<Arc<dyn KeyValueStore>, StorageError> {
    let path = config.db_path();
    match SqliteStore::open(&path, config.storage.quota_bytes) {
        Ok(store) => {
            info!("💾 Photo store at {}", path.display());
            Ok(Arc::new(store))
        }
        Err(e) => {
            warn!("⚠️  Storage unavailable ({}), photos will not survive a restart", e);
            Ok(Arc::new(SqliteStore::in_memory(config.storage.quota_bytes)?))
        }
    }
}

/// Forward tracker events into the UI as a stream
fn tracker_events(
    events: mpsc::UnboundedReceiver<TrackerEvent>,
) -> impl futures::Stream<Item = TrackerEvent> {
    futures::stream::unfold(events, |mut events| async move {
        events.recv().await.map(|event| (event, events))
    })
}

/// Build the cache worker when an origin is configured
fn offline_worker(config: &AppConfig) -> Option<Result<OfflineCacheWorker, CacheError>> {
    let origin = config.offline.origin.as_ref()?;
    Some(build_offline_worker(config, origin))
}

fn build_offline_worker(config: &AppConfig, origin: &str) -> Result<OfflineCacheWorker, CacheError> {
    let origin = Url::parse(origin).map_err(|_| CacheError::InvalidUrl(origin.to_string()))?;
    let storage = SqliteCacheStorage::open_path(&config.db_path())?;
    Ok(OfflineCacheWorker::new(
        CacheManifest::from(&config.offline),
        origin,
        Arc::new(storage),
        Arc::new(HttpNetwork::new()),
    ))
}

/// Install and activate the shell cache, then load the header icon through
/// the worker so it comes from the cache when available
async fn run_offline(
    mut worker: OfflineCacheWorker,
    icon: Option<String>,
) -> Result<OfflineShell, CacheError> {
    let (installed, activated) = worker.run_lifecycle().await?;
    if !installed.is_complete() {
        warn!("⚠️  {} shell assets not cached", installed.failed.len());
    }
    let mut summary = format!(
        "Offline cache {}: {}/{} assets",
        installed.cache_name,
        installed.cached.len(),
        installed.cached.len() + installed.failed.len()
    );
    if let Some(activated) = activated {
        if !activated.deleted.is_empty() {
            summary.push_str(&format!(", removed {}", activated.deleted.join(", ")));
        }
    }

    let icon = match icon {
        Some(asset) => match worker.load_asset(&asset).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("⚠️  No shell icon: {}", e);
                None
            }
        },
        None => None,
    };

    Ok(OfflineShell { summary, icon })
}
