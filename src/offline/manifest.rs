use url::Url;

use crate::config::OfflineConfig;
use crate::error::CacheError;

/// Versioned list of shell assets to pre-cache
#[derive(Debug, Clone, PartialEq)]
pub struct CacheManifest {
    pub prefix: String,
    pub version: String,
    /// Paths relative to the origin, in pre-cache order
    pub assets: Vec<String>,
}

impl CacheManifest {
    /// Name of the one cache store this version owns
    pub fn cache_name(&self) -> String {
        format!("{}-{}", self.prefix, self.version)
    }

    /// Absolute URL of one asset under `origin`
    pub fn resolve_asset(origin: &Url, asset: &str) -> Result<Url, CacheError> {
        origin
            .join(asset)
            .map_err(|_| CacheError::InvalidUrl(asset.to_string()))
    }

    /// Absolute asset URLs under `origin`
    pub fn resolve(&self, origin: &Url) -> Result<Vec<Url>, CacheError> {
        self.assets
            .iter()
            .map(|asset| Self::resolve_asset(origin, asset))
            .collect()
    }
}

impl From<&OfflineConfig> for CacheManifest {
    fn from(config: &OfflineConfig) -> Self {
        Self {
            prefix: config.cache_prefix.clone(),
            version: config.version.clone(),
            assets: config.assets.clone(),
        }
    }
}
