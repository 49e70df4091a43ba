use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use super::cache_store::CacheStorage;
use super::manifest::CacheManifest;
use crate::error::CacheError;
use crate::platform::network::{Network, Request, Response};

/// Lifecycle of the cache worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Installing,
    /// Installed, waiting for older versions to let go
    Waiting,
    Activating,
    /// Intercepting requests
    Active,
}

/// Result of pre-caching the manifest
#[derive(Debug, Clone, PartialEq)]
pub struct InstallReport {
    pub cache_name: String,
    pub cached: Vec<String>,
    /// (url, reason) for every asset that could not be cached
    pub failed: Vec<(String, String)>,
}

impl InstallReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivateReport {
    pub kept: String,
    pub deleted: Vec<String>,
}

/// Cache-first interception of shell requests for one manifest version
pub struct OfflineCacheWorker {
    manifest: CacheManifest,
    origin: Url,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    state: WorkerState,
    skip_waiting: bool,
}

impl OfflineCacheWorker {
    pub fn new(
        manifest: CacheManifest,
        origin: Url,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
    ) -> Self {
        Self {
            manifest,
            origin,
            storage,
            network,
            state: WorkerState::Installing,
            skip_waiting: false,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn cache_name(&self) -> String {
        self.manifest.cache_name()
    }

    /// Open the versioned store and pre-cache every asset. Each asset is
    /// cached on its own, so one failure never aborts the install.
    pub async fn install(&mut self) -> Result<InstallReport, CacheError> {
        self.state = WorkerState::Installing;
        let cache_name = self.manifest.cache_name();
        info!("📦 Installing offline cache {}", cache_name);

        self.storage.open(&cache_name)?;

        let mut report = InstallReport {
            cache_name: cache_name.clone(),
            cached: Vec::new(),
            failed: Vec::new(),
        };

        for asset in &self.manifest.assets {
            let url = match CacheManifest::resolve_asset(&self.origin, asset) {
                Ok(url) => url,
                Err(e) => {
                    warn!("⚠️  Skipping asset {}: {}", asset, e);
                    report.failed.push((asset.clone(), e.to_string()));
                    continue;
                }
            };
            match self.precache(&cache_name, &url).await {
                Ok(()) => report.cached.push(url.to_string()),
                Err(e) => {
                    warn!("⚠️  Could not cache {}: {}", url, e);
                    report.failed.push((url.to_string(), e.to_string()));
                }
            }
        }

        // Take over right away instead of waiting for old sessions to close
        self.skip_waiting = true;
        self.state = WorkerState::Waiting;
        info!(
            "✅ Offline cache installed: {}/{} assets",
            report.cached.len(),
            report.cached.len() + report.failed.len()
        );
        Ok(report)
    }

    async fn precache(&self, cache_name: &str, url: &Url) -> Result<(), CacheError> {
        let response = self.network.fetch(&Request::get(url.clone())).await?;
        if !response.is_ok() {
            return Err(CacheError::BadStatus {
                url: url.to_string(),
                status: response.status,
            });
        }
        self.storage.put(cache_name, url.as_str(), &response)
    }

    /// Purge every store but the current version's
    pub fn activate(&mut self) -> Result<ActivateReport, CacheError> {
        self.state = WorkerState::Activating;
        let current = self.manifest.cache_name();

        let mut deleted = Vec::new();
        for name in self.storage.keys()? {
            if name != current && self.storage.delete(&name)? {
                info!("🗑️  Deleted stale cache {}", name);
                deleted.push(name);
            }
        }
        self.storage.open(&current)?;

        self.state = WorkerState::Active;
        Ok(ActivateReport {
            kept: current,
            deleted,
        })
    }

    /// Install, then activate straight away when skip-waiting was signalled
    pub async fn run_lifecycle(&mut self) -> Result<(InstallReport, Option<ActivateReport>), CacheError> {
        let installed = self.install().await?;
        let activated = if self.skip_waiting {
            Some(self.activate()?)
        } else {
            None
        };
        Ok((installed, activated))
    }

    /// Serve from the active cache, else pass the request to the network
    /// unchanged. Network responses are not cached.
    pub async fn fetch(&self, request: &Request) -> Result<Response, CacheError> {
        if self.state != WorkerState::Active || !self.intercepts(&request.url) {
            return self.network.fetch(request).await;
        }

        match self
            .storage
            .match_url(&self.manifest.cache_name(), request.url.as_str())
        {
            Ok(Some(response)) => {
                debug!("📦 Cache hit {}", request.url);
                return Ok(response);
            }
            Ok(None) => debug!("🌐 Cache miss {}", request.url),
            Err(e) => warn!("⚠️  Cache lookup failed for {}: {}", request.url, e),
        }

        self.network.fetch(request).await
    }

    /// Body of a shell asset, requested through `fetch` like any page load
    pub async fn load_asset(&self, asset: &str) -> Result<Vec<u8>, CacheError> {
        let url = CacheManifest::resolve_asset(&self.origin, asset)?;
        let response = self.fetch(&Request::get(url.clone())).await?;
        if !response.is_ok() {
            return Err(CacheError::BadStatus {
                url: url.to_string(),
                status: response.status,
            });
        }
        Ok(response.body)
    }

    /// Only same-origin requests are intercepted
    fn intercepts(&self, url: &Url) -> bool {
        url.origin() == self.origin.origin()
    }
}

impl std::fmt::Debug for OfflineCacheWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineCacheWorker")
            .field("cache_name", &self.manifest.cache_name())
            .field("origin", &self.origin.as_str())
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offline::cache_store::SqliteCacheStorage;
    use crate::testing::FakeNetwork;
    use pretty_assertions::assert_eq;

    const ORIGIN: &str = "http://localhost:8080/";

    fn manifest(version: &str) -> CacheManifest {
        CacheManifest {
            prefix: "geocam-cache".into(),
            version: version.into(),
            assets: vec!["./".into(), "./index.html".into(), "./app.js".into()],
        }
    }

    fn full_site() -> FakeNetwork {
        FakeNetwork::serving(&[
            ("http://localhost:8080/", "root"),
            ("http://localhost:8080/index.html", "index"),
            ("http://localhost:8080/app.js", "app"),
        ])
    }

    fn worker(
        version: &str,
        storage: Arc<SqliteCacheStorage>,
        network: Arc<FakeNetwork>,
    ) -> OfflineCacheWorker {
        OfflineCacheWorker::new(
            manifest(version),
            Url::parse(ORIGIN).unwrap(),
            storage,
            network,
        )
    }

    fn get(path: &str) -> Request {
        Request::get(Url::parse(ORIGIN).unwrap().join(path).unwrap())
    }

    #[tokio::test]
    async fn test_install_precaches_manifest() {
        let storage = Arc::new(SqliteCacheStorage::in_memory().unwrap());
        let network = Arc::new(full_site());
        let mut worker = worker("v1", storage.clone(), network.clone());

        let report = worker.install().await.unwrap();
        assert!(report.is_complete());
        assert_eq!(report.cached.len(), 3);
        assert_eq!(worker.state(), WorkerState::Waiting);

        let cached = storage
            .match_url("geocam-cache-v1", "http://localhost:8080/app.js")
            .unwrap()
            .unwrap();
        assert_eq!(cached.body, b"app".to_vec());
    }

    #[tokio::test]
    async fn test_install_survives_missing_asset() {
        let storage = Arc::new(SqliteCacheStorage::in_memory().unwrap());
        let network = Arc::new(FakeNetwork::serving(&[
            ("http://localhost:8080/", "root"),
            ("http://localhost:8080/app.js", "app"),
        ]));
        let mut worker = worker("v1", storage.clone(), network);

        let report = worker.install().await.unwrap();
        assert!(!report.is_complete());
        assert_eq!(report.cached.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "http://localhost:8080/index.html");

        // Install still went through and activation proceeds
        assert_eq!(worker.activate().unwrap().kept, "geocam-cache-v1");
        assert_eq!(worker.state(), WorkerState::Active);
    }

    #[tokio::test]
    async fn test_install_survives_unresolvable_asset() {
        let storage = Arc::new(SqliteCacheStorage::in_memory().unwrap());
        let network = Arc::new(FakeNetwork::serving(&[("http://localhost:8080/app.js", "app")]));
        let mut worker = OfflineCacheWorker::new(
            CacheManifest {
                prefix: "geocam-cache".into(),
                version: "v1".into(),
                assets: vec!["./app.js".into(), "//bad host/x".into()],
            },
            Url::parse(ORIGIN).unwrap(),
            storage.clone(),
            network.clone(),
        );

        let (installed, activated) = worker.run_lifecycle().await.unwrap();
        assert_eq!(installed.cached, vec!["http://localhost:8080/app.js".to_string()]);
        assert_eq!(installed.failed.len(), 1);
        assert_eq!(installed.failed[0].0, "//bad host/x");
        assert_eq!(network.call_count(), 1);
        assert!(activated.is_some());
        assert_eq!(worker.state(), WorkerState::Active);
        assert!(storage
            .match_url("geocam-cache-v1", "http://localhost:8080/app.js")
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_activate_leaves_only_current_cache() {
        let storage = Arc::new(SqliteCacheStorage::in_memory().unwrap());
        storage.open("geocam-cache-v0").unwrap();
        storage.open("someone-elses-cache").unwrap();

        let mut worker = worker("v1", storage.clone(), Arc::new(full_site()));
        let (_, activated) = worker.run_lifecycle().await.unwrap();
        let activated = activated.unwrap();

        assert_eq!(activated.kept, "geocam-cache-v1");
        assert_eq!(activated.deleted.len(), 2);
        assert_eq!(storage.keys().unwrap(), vec!["geocam-cache-v1".to_string()]);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let storage = Arc::new(SqliteCacheStorage::in_memory().unwrap());
        let network = Arc::new(full_site());
        let mut worker = worker("v1", storage, network.clone());
        worker.run_lifecycle().await.unwrap();
        let calls_after_install = network.call_count();

        let response = worker.fetch(&get("index.html")).await.unwrap();
        assert_eq!(response.body, b"index".to_vec());
        assert_eq!(network.call_count(), calls_after_install);
    }

    #[tokio::test]
    async fn test_cache_miss_calls_network_once_without_caching() {
        let storage = Arc::new(SqliteCacheStorage::in_memory().unwrap());
        let network = Arc::new(full_site());
        let mut worker = worker("v1", storage.clone(), network.clone());
        worker.run_lifecycle().await.unwrap();
        let before = network.call_count();

        let response = worker.fetch(&get("photo-feed.json")).await.unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(network.call_count(), before + 1);
        assert_eq!(
            storage
                .match_url("geocam-cache-v1", "http://localhost:8080/photo-feed.json")
                .unwrap(),
            None
        );

        // Second miss goes to the network again
        worker.fetch(&get("photo-feed.json")).await.unwrap();
        assert_eq!(network.call_count(), before + 2);
    }

    #[tokio::test]
    async fn test_cross_origin_is_not_intercepted() {
        let storage = Arc::new(SqliteCacheStorage::in_memory().unwrap());
        storage
            .put(
                "geocam-cache-v1",
                "https://tiles.example.com/a.png",
                &Response {
                    status: 200,
                    headers: Vec::new(),
                    body: b"stale".to_vec(),
                },
            )
            .unwrap();
        let network = Arc::new(full_site());
        let mut worker = worker("v1", storage, network.clone());
        worker.run_lifecycle().await.unwrap();
        let before = network.call_count();

        let request = Request::get(Url::parse("https://tiles.example.com/a.png").unwrap());
        worker.fetch(&request).await.unwrap();
        assert_eq!(network.call_count(), before + 1);
    }

    #[tokio::test]
    async fn test_load_asset_comes_from_cache_once_active() {
        let storage = Arc::new(SqliteCacheStorage::in_memory().unwrap());
        let network = Arc::new(full_site());
        let mut worker = worker("v1", storage, network.clone());
        worker.run_lifecycle().await.unwrap();
        let before = network.call_count();

        assert_eq!(worker.load_asset("./app.js").await.unwrap(), b"app".to_vec());
        assert_eq!(network.call_count(), before);

        let missing = worker.load_asset("./image/icons/192.png").await;
        assert!(matches!(missing, Err(CacheError::BadStatus { status: 404, .. })));
        assert_eq!(network.call_count(), before + 1);
    }

    #[tokio::test]
    async fn test_not_active_passes_through() {
        let storage = Arc::new(SqliteCacheStorage::in_memory().unwrap());
        let network = Arc::new(full_site());
        let mut worker = worker("v1", storage, network.clone());
        worker.install().await.unwrap();
        let before = network.call_count();

        worker.fetch(&get("index.html")).await.unwrap();
        assert_eq!(network.call_count(), before + 1);
    }
}
