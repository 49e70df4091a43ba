use chrono::Local;

use super::data::PhotoRecord;
use crate::capture::encoding::decode_data_url;

/// Text shown when a photo has no location
pub const NO_LOCATION: &str = "—";

/// One visual gallery item, bound to its own image payload
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryEntry {
    pub record: PhotoRecord,
    /// "40.41000, -3.70000" or a dash
    pub coordinate_text: String,
    /// Local capture time
    pub time_text: String,
    /// Decoded JPEG for display; `None` if the payload is unreadable
    pub jpeg: Option<Vec<u8>>,
    /// Insertion sequence, breaks capture-time ties
    seq: u64,
}

impl GalleryEntry {
    /// Payload the share/download action operates on
    pub fn image(&self) -> &str {
        &self.record.image
    }

    /// Stable identity for the lifetime of the gallery
    pub fn id(&self) -> u64 {
        self.seq
    }
}

/// Photos shown newest first by capture time
#[derive(Debug, Default)]
pub struct Gallery {
    entries: Vec<GalleryEntry>,
    next_seq: u64,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// The "no photos yet" placeholder shows until the first insertion
    pub fn placeholder_visible(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    /// Entry by its `id()`, wherever later inserts have moved it
    pub fn find(&self, id: u64) -> Option<&GalleryEntry> {
        self.entries.iter().find(|e| e.seq == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Add a photo. A fresh capture is the newest, so it lands on top;
    /// an older record lands where its capture time puts it.
    pub fn prepend(&mut self, record: PhotoRecord) {
        let entry = self.build_entry(record);
        let key = (entry.record.captured_at, entry.seq);
        let position = self
            .entries
            .partition_point(|e| (e.record.captured_at, e.seq) > key);
        self.entries.insert(position, entry);
    }

    /// Replay stored records at startup (given in store order)
    pub fn hydrate(&mut self, records: impl IntoIterator<Item = PhotoRecord>) {
        for record in records {
            let entry = self.build_entry(record);
            self.entries.push(entry);
        }
        self.entries
            .sort_by(|a, b| (b.record.captured_at, b.seq).cmp(&(a.record.captured_at, a.seq)));
    }

    fn build_entry(&mut self, record: PhotoRecord) -> GalleryEntry {
        let seq = self.next_seq;
        self.next_seq += 1;

        let coordinate_text = record
            .coordinates
            .map(|c| c.display_short())
            .unwrap_or_else(|| NO_LOCATION.to_string());
        let time_text = record
            .captured_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        let jpeg = decode_data_url(&record.image).ok().map(|d| d.bytes);

        GalleryEntry {
            record,
            coordinate_text,
            time_text,
            jpeg,
            seq,
        }
    }
}
