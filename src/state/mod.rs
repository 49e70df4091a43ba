/// State management module
///
/// - Persisted photo records and their wire format (data.rs)
/// - The append-only photo list in the key-value store (photo_store.rs)
/// - The newest-first gallery built from those records (gallery.rs)

pub mod data;
pub mod gallery;
pub mod photo_store;
