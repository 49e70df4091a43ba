/// View builders for the main window
///
/// - Camera preview and controls (camera.rs)
/// - Photo gallery (gallery.rs)
/// - Live location panel (tracker.rs)

pub mod camera;
pub mod gallery;
pub mod tracker;

use iced::widget::text;
use iced::Element;

use crate::Message;

/// Small dimmed caption used under panels
pub(crate) fn caption<'a>(content: impl text::IntoFragment<'a>) -> Element<'a, Message> {
    text(content).size(13).into()
}
