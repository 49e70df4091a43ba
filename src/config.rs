/// Application configuration
///
/// Loaded from `$GEOCAM_CONFIG` or `<config dir>/geocam/config.toml`.
/// Every field has a default, so a missing or partial file is fine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::ConfigError;

/// Environment variable pointing at an explicit config file
pub const CONFIG_ENV: &str = "GEOCAM_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub camera: CameraConfig,
    pub location: LocationConfig,
    pub share: ShareConfig,
    pub offline: OfflineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file; defaults to `<data dir>/geocam/geocam.db`
    pub db_path: Option<PathBuf>,
    /// Fixed key holding the photo list
    pub photos_key: String,
    /// Upper bound on the stored photo list. Unbounded by default since
    /// every photo lives in that one value.
    pub quota_bytes: Option<usize>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            photos_key: "geocam-photos-v1".to_string(),
            quota_bytes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub preferred_width: u32,
    pub preferred_height: u32,
    /// JPEG quality, 1-100
    pub jpeg_quality: u8,
    /// Folder with `environment/` and `user/` subfolders of still images.
    /// When unset a synthetic test-pattern camera is used.
    pub source_dir: Option<PathBuf>,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            preferred_width: 1280,
            preferred_height: 720,
            jpeg_quality: 92,
            source_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub tag_timeout_ms: u64,
    pub track_timeout_ms: u64,
    /// Fixed position reported by the desktop geolocation provider
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy_meters: f64,
    /// "granted", "denied" or "prompt"
    pub permission: String,
    /// Whether the permission state can be introspected at all
    pub permission_introspection: bool,
    pub update_interval_ms: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            tag_timeout_ms: 5_000,
            track_timeout_ms: 10_000,
            latitude: None,
            longitude: None,
            accuracy_meters: 25.0,
            permission: "granted".to_string(),
            permission_introspection: true,
            update_interval_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    pub title: String,
    pub text: String,
    /// Where downloads go when no save dialog can be shown
    pub download_dir: Option<PathBuf>,
    /// Ask for a location with a native dialog before saving
    pub use_save_dialog: bool,
    /// Program that opens a photo full size; the platform opener when unset
    pub viewer_command: Option<PathBuf>,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            title: "Photo".to_string(),
            text: "Photo taken with GeoCam".to_string(),
            download_dir: None,
            use_save_dialog: true,
            viewer_command: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
    /// Origin serving the application shell; the worker stays idle when unset
    pub origin: Option<String>,
    pub cache_prefix: String,
    pub version: String,
    pub assets: Vec<String>,
    /// Shell asset shown as the window header icon once cached
    pub icon: Option<String>,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            origin: None,
            cache_prefix: "geocam-cache".to_string(),
            version: "v1".to_string(),
            assets: [
                "./",
                "./index.html",
                "./app.js",
                "./manifest.json",
                "./image/icons/192.png",
                "./image/icons/512.png",
                "./sw.js",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            icon: Some("./image/icons/192.png".to_string()),
        }
    }
}

impl AppConfig {
    /// Parse a TOML document
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read a config file from disk
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Load the config for this run. Never fails: a missing file means
    /// defaults, an unreadable or invalid one is reported and ignored.
    pub fn load() -> Self {
        let path = match std::env::var_os(CONFIG_ENV) {
            Some(p) => PathBuf::from(p),
            None => match dirs::config_dir() {
                Some(dir) => dir.join("geocam").join("config.toml"),
                None => return Self::default(),
            },
        };

        if !path.exists() {
            info!("⚙️  No config at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::from_file(&path) {
            Ok(config) => {
                info!("⚙️  Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("⚠️  Ignoring config: {}", e);
                Self::default()
            }
        }
    }

    /// Where the SQLite database lives
    pub fn db_path(&self) -> PathBuf {
        if let Some(path) = &self.storage.db_path {
            return path.clone();
        }
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        path.push("geocam");
        path.push("geocam.db");
        path
    }

    /// Directory for files opened in an external viewer
    pub fn viewer_dir(&self) -> PathBuf {
        let mut path = dirs_next::cache_dir()
            .or_else(dirs_next::home_dir)
            .unwrap_or_else(std::env::temp_dir);
        path.push("geocam");
        path.push("viewer");
        path
    }

    /// Directory downloads land in when no dialog is used
    pub fn download_dir(&self) -> PathBuf {
        self.share
            .download_dir
            .clone()
            .or_else(dirs::download_dir)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
