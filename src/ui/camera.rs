use iced::widget::{button, column, container, image, row, text};
use iced::{Alignment, Element, Length};

use geocam::platform::camera::FacingMode;
use crate::Message;

/// What the camera panel needs to know about the session
#[derive(Debug, Clone, Default)]
pub struct CameraView {
    pub open: bool,
    /// An open or switch request is in flight
    pub busy: bool,
    pub switch_available: bool,
    pub facing: FacingMode,
    pub preview: Option<image::Handle>,
}

pub fn camera_panel(view: &CameraView) -> Element<'_, Message> {
    let preview: Element<Message> = match (&view.preview, view.open) {
        (Some(handle), true) => image(handle.clone())
            .width(Length::Fixed(480.0))
            .height(Length::Fixed(270.0))
            .into(),
        (_, true) => text("Waiting for frames...").into(),
        (_, false) => text("Camera closed").into(),
    };

    let open_button = button("Open camera")
        .on_press_maybe((!view.open && !view.busy).then_some(Message::OpenCamera))
        .padding(10);

    let switch_button = button("Switch camera")
        .on_press_maybe(
            (view.open && view.switch_available && !view.busy).then_some(Message::SwitchCamera),
        )
        .padding(10);

    let capture_button = button("Take photo")
        .on_press_maybe((view.open && !view.busy).then_some(Message::Capture))
        .padding(10);

    let close_button = button("Close camera")
        .on_press_maybe(view.open.then_some(Message::CloseCamera))
        .padding(10);

    let mut controls = row![open_button].spacing(10);
    // Hidden unless a second camera was found
    if view.switch_available {
        controls = controls.push(switch_button);
    }
    controls = controls.push(capture_button).push(close_button);

    let facing = if view.open {
        format!("Facing: {}", view.facing.as_str())
    } else {
        String::new()
    };

    container(
        column![
            container(preview)
                .width(Length::Fixed(480.0))
                .height(Length::Fixed(270.0))
                .center_x(Length::Fixed(480.0))
                .center_y(Length::Fixed(270.0)),
            controls,
            super::caption(facing),
        ]
        .spacing(10)
        .align_x(Alignment::Center),
    )
    .into()
}
