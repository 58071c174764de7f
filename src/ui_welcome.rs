use crate::app::PdfCropApp;
use crate::message::Message;
use crate::ui_document::status_line;
use iced::widget::{button, column, row, text, Space};
use iced::{Alignment, Element, Length};

pub fn welcome_view(app: &PdfCropApp) -> Element<'_, Message> {
    let recent_section = if app.recent_files.is_empty() {
        column![]
    } else {
        let mut files = column![].spacing(4);
        for file in &app.recent_files {
            files = files.push(
                button(text(file.name.clone()))
                    .on_press(Message::OpenRecentFile(file.clone()))
                    .width(Length::Fill),
            );
        }
        column![
            text("Recent Files").size(20),
            Space::new().height(Length::Fixed(10.0)),
            files,
            Space::new().height(Length::Fixed(10.0)),
            button("Clear Recent").on_press(Message::ClearRecentFiles),
        ]
        .width(Length::Fixed(400.0))
        .padding(20)
    };

    column![
        row![
            text("PDF Crop").size(32).width(Length::Fill),
            button("Settings").on_press(Message::OpenSettings),
        ]
        .padding(20),
        column![
            text("Crop PDF pages and fit them to A4, A5 or Letter").size(20),
            Space::new().height(Length::Fixed(20.0)),
            button(if app.busy { "Opening..." } else { "Open PDF" })
                .on_press_maybe((!app.busy).then_some(Message::OpenDocument))
                .padding(10),
            Space::new().height(Length::Fixed(20.0)),
            recent_section,
        ]
        .align_x(Alignment::Center)
        .width(Length::Fill)
        .height(Length::Fill),
        status_line(app),
    ]
    .into()
}
