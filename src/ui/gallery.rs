use std::collections::HashMap;

use iced::widget::{button, column, container, image, text};
use iced::{Element, Length};
use iced_aw::Wrap;

use geocam::state::gallery::{Gallery, GalleryEntry};
use crate::Message;

const THUMB_WIDTH: f32 = 200.0;
const THUMB_HEIGHT: f32 = 150.0;

/// Decoded image handles per gallery entry.
/// Handles are built once so the renderer can keep its texture cache.
#[derive(Debug, Default)]
pub struct Thumbnails {
    handles: HashMap<u64, image::Handle>,
}

impl Thumbnails {
    /// Create handles for entries that do not have one yet
    pub fn sync(&mut self, gallery: &Gallery) {
        for entry in gallery.entries() {
            if let Some(jpeg) = &entry.jpeg {
                self.handles
                    .entry(entry.id())
                    .or_insert_with(|| image::Handle::from_bytes(jpeg.clone()));
            }
        }
    }

    fn get(&self, entry: &GalleryEntry) -> Option<&image::Handle> {
        self.handles.get(&entry.id())
    }
}

pub fn gallery_view<'a>(gallery: &'a Gallery, thumbnails: &'a Thumbnails) -> Element<'a, Message> {
    if gallery.placeholder_visible() {
        return container(text("No photos yet.").size(16))
            .padding(20)
            .into();
    }

    let cards: Vec<Element<Message>> = gallery
        .entries()
        .iter()
        .map(|entry| card(entry, thumbnails.get(entry)))
        .collect();

    Wrap::with_elements(cards)
        .spacing(12.0)
        .line_spacing(12.0)
        .into()
}

fn card<'a>(
    entry: &'a GalleryEntry,
    handle: Option<&image::Handle>,
) -> Element<'a, Message> {
    let picture: Element<Message> = match handle {
        Some(handle) => button(
            image(handle.clone())
                .width(Length::Fixed(THUMB_WIDTH))
                .height(Length::Fixed(THUMB_HEIGHT)),
        )
        .on_press(Message::OpenFull(entry.id()))
        .padding(0)
        .into(),
        None => container(text("Unreadable image"))
            .width(Length::Fixed(THUMB_WIDTH))
            .height(Length::Fixed(THUMB_HEIGHT))
            .into(),
    };

    container(
        column![
            picture,
            text(&entry.coordinate_text).size(13),
            text(&entry.time_text).size(13),
            button("Share / Download")
                .on_press(Message::Share(entry.id()))
                .padding(6),
        ]
        .spacing(6)
        .width(Length::Fixed(THUMB_WIDTH)),
    )
    .padding(8)
    .style(container::rounded_box)
    .into()
}
