use iced::widget::{button, column, row, text, Row};
use iced::{Element, Length};

use geocam::location::TrackerReadout;
use crate::Message;

/// Live location readout with start/stop controls
pub fn tracker_panel(readout: &TrackerReadout) -> Element<'_, Message> {
    let field = |label: &'static str, value: &str| -> Row<'static, Message> {
        row![
            text(label).size(14).width(Length::Fixed(110.0)),
            text(value.to_string()).size(14),
        ]
        .spacing(8)
    };

    let controls = row![
        button("Start tracking")
            .on_press(Message::StartTracking)
            .padding(8),
        button("Stop tracking")
            .on_press_maybe(readout.tracking.then_some(Message::StopTracking))
            .padding(8),
    ]
    .spacing(10);

    let map: Element<Message> = match &readout.map_link {
        Some(link) => super::caption(format!("Map: {}", link)),
        None => super::caption(""),
    };

    column![
        text("Live location").size(20),
        field("Permission", &readout.permission),
        field("Latitude", &readout.latitude),
        field("Longitude", &readout.longitude),
        field("Accuracy (m)", &readout.accuracy),
        field("Updated", &readout.timestamp),
        controls,
        text(&readout.message).size(14),
        map,
    ]
    .spacing(6)
    .into()
}
