use crate::app::PdfCropApp;
use crate::message::Message;
use crate::ui_document::document_view;
use crate::ui_settings::settings_view;
use crate::ui_welcome::welcome_view;
use iced::Element;

pub fn view(app: &PdfCropApp) -> Element<'_, Message> {
    if app.show_settings {
        return settings_view(app);
    }

    match &app.document {
        Some(doc) => document_view(app, doc),
        None => welcome_view(app),
    }
}
