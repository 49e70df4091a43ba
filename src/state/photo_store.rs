use std::sync::Arc;
use tracing::{info, warn};

use super::data::{timestamp_now, Coordinates, PhotoRecord};
use crate::error::StorageError;
use crate::platform::storage::KeyValueStore;

/// Attempts before a contended write gives up
const MAX_WRITE_ATTEMPTS: usize = 5;

/// Append-only list of captured photos kept under one key.
///
/// Persistence never blocks the capture flow: write failures are logged
/// and swallowed, unreadable data loads as an empty list.
#[derive(Clone)]
pub struct PhotoStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl PhotoStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    /// All records in insertion (capture) order
    pub fn load_all(&self) -> Vec<PhotoRecord> {
        match self.kv.get(&self.key) {
            Ok(Some(text)) => parse_list(&text).unwrap_or_else(|e| {
                warn!("⚠️  Stored photo list is unreadable, ignoring it: {}", e);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("⚠️  Could not load photos: {}", e);
                Vec::new()
            }
        }
    }

    /// Store a new photo taken now. Timestamps never go backwards
    /// relative to what is already stored.
    pub fn append(&self, image: String, coordinates: Option<Coordinates>) -> Option<PhotoRecord> {
        let result = self.write_with(|existing| {
            let now = timestamp_now();
            let captured_at = match existing.last() {
                Some(last) if last.captured_at > now => last.captured_at,
                _ => now,
            };
            PhotoRecord::new(image.clone(), captured_at, coordinates)
        });
        self.swallow(result)
    }

    /// Store a record whose capture time was fixed elsewhere
    pub fn append_record(&self, record: PhotoRecord) -> Option<PhotoRecord> {
        let result = self.write_with(|_| record.clone());
        self.swallow(result)
    }

    /// Drop every stored photo
    pub fn clear(&self) -> Result<(), StorageError> {
        self.kv.remove(&self.key)?;
        info!("🗑️  Photo list cleared");
        Ok(())
    }

    /// Read-modify-write guarded by compare-and-swap, retried when another
    /// writer changed the list in between
    fn write_with<F>(&self, make: F) -> Result<PhotoRecord, StorageError>
    where
        F: Fn(&[PhotoRecord]) -> PhotoRecord,
    {
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let current = self.kv.get(&self.key)?;
            let mut list = match current.as_deref() {
                Some(text) => parse_list(text).unwrap_or_else(|e| {
                    warn!("⚠️  Replacing unreadable photo list: {}", e);
                    Vec::new()
                }),
                None => Vec::new(),
            };

            let record = make(&list);
            list.push(record.clone());
            let updated = serde_json::to_string(&list)?;

            if self
                .kv
                .compare_and_swap(&self.key, current.as_deref(), &updated)?
            {
                return Ok(record);
            }
        }
        Err(StorageError::Conflict(self.key.clone()))
    }

    fn swallow(&self, result: Result<PhotoRecord, StorageError>) -> Option<PhotoRecord> {
        match result {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("⚠️  Could not save photo: {}", e);
                None
            }
        }
    }
}

impl std::fmt::Debug for PhotoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoStore").field("key", &self.key).finish()
    }
}

fn parse_list(text: &str) -> Result<Vec<PhotoRecord>, serde_json::Error> {
    // A JSON null is what an empty slot looked like in older versions
    let list: Option<Vec<PhotoRecord>> = serde_json::from_str(text)?;
    Ok(list.unwrap_or_default())
}
