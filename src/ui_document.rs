use crate::app::{Document, PdfCropApp, StatusLevel};
use crate::message::Message;
use crate::page_canvas::PageCanvas;
use iced::widget::{button, canvas, column, container, pick_list, row, slider, text, text_input, Space};
use iced::{Color, Element, Length, Size, Vector};
use pdfcrop::session::{MAX_ZOOM, MIN_ZOOM};
use pdfcrop::{Gesture, PageSize};

fn render_toolbar<'a>(app: &'a PdfCropApp, doc: &'a Document) -> Element<'a, Message> {
    let idle = !app.busy;
    let has_selection = doc.session.crop_rect().is_some();

    row![
        button("Open PDF").on_press_maybe(idle.then_some(Message::OpenDocument)),
        button("Save PDF").on_press_maybe(idle.then_some(Message::SavePdf)),
        button("Save Crop Boxes").on_press_maybe(
            (idle && !doc.session.cropboxes().is_empty()).then_some(Message::SaveVectorCrop)
        ),
        Space::new().width(Length::Fixed(10.0)),
        button("Apply to All").on_press(Message::ApplyToAll),
        text_input("1,3-5", &app.apply_pages_input)
            .on_input(Message::ApplyPagesInput)
            .on_submit(Message::ApplyToSelected)
            .width(Length::Fixed(90.0)),
        button("Apply to Pages").on_press(Message::ApplyToSelected),
        Space::new().width(Length::Fixed(10.0)),
        text_input("1,3-5", &app.export_pages_input)
            .on_input(Message::ExportPagesInput)
            .on_submit(Message::ExportPages)
            .width(Length::Fixed(90.0)),
        button("Export Pages").on_press_maybe(idle.then_some(Message::ExportPages)),
        Space::new().width(Length::Fixed(10.0)),
        button("Undo Crop").on_press(Message::ResetCropboxes),
        button("Clear Selection").on_press_maybe(has_selection.then_some(Message::ClearSelection)),
        Space::new().width(Length::Fill),
        button("Close").on_press(Message::CloseDocument),
        button("⚙").on_press(Message::OpenSettings),
    ]
    .spacing(5)
    .padding(10)
    .align_y(iced::Alignment::Center)
    .into()
}

fn render_settings_row<'a>(app: &'a PdfCropApp, doc: &'a Document) -> Element<'a, Message> {
    let zoom = doc.session.current_state().scale_factor;

    row![
        text("Target size:"),
        pick_list(PageSize::ALL, Some(app.page_size), Message::SetPageSize),
        Space::new().width(Length::Fixed(10.0)),
        text(zoom_label(zoom)).width(Length::Fixed(90.0)),
        slider(MIN_ZOOM..=MAX_ZOOM, zoom, Message::SetZoom)
            .step(0.01)
            .width(Length::Fixed(200.0)),
        button("Reset Zoom").on_press(Message::ResetZoom),
        Space::new().width(Length::Fixed(10.0)),
        button("Save Settings").on_press(Message::SaveCropSettings),
        button("Load Settings").on_press(Message::LoadCropSettings),
        Space::new().width(Length::Fixed(10.0)),
        button("Rotate 90°").on_press(Message::Rotate),
    ]
    .spacing(5)
    .padding([0, 10])
    .align_y(iced::Alignment::Center)
    .into()
}

/// `Zoom: N%` with N truncated, as shown next to the slider.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn zoom_label(zoom: f32) -> String {
    format!("Zoom: {}%", (zoom * 100.0) as u32)
}

#[allow(clippy::cast_precision_loss)]
fn render_page<'a>(doc: &'a Document) -> Element<'a, Message> {
    let session = &doc.session;
    let state = session.current_state();
    let (base_w, base_h) = session
        .display_mapping()
        .map_or((0, 0), |m| m.base_size());

    let program = PageCanvas {
        image: doc.current_image(),
        offset: Vector::new(state.x_offset, state.y_offset),
        size: Size::new(
            base_w as f32 * state.scale_factor,
            base_h as f32 * state.scale_factor,
        ),
        selection: session.selection_on_canvas(),
        dragging: matches!(session.gesture(), Gesture::Selecting { .. }),
        cropbox: session.cropbox_on_canvas(),
    };

    canvas(program)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

fn render_page_nav<'a>(doc: &'a Document) -> Element<'a, Message> {
    let session = &doc.session;

    row![
        button("◄ Previous").on_press(Message::PrevPage),
        text(session.page_label()),
        button("Next ►").on_press(Message::NextPage),
        Space::new().width(Length::Fixed(20.0)),
        text(session.crop_size_label()),
        Space::new().width(Length::Fill),
        text(format!("{} crop boxes applied", session.cropboxes().len())).size(12),
    ]
    .spacing(10)
    .padding(5)
    .align_y(iced::Alignment::Center)
    .into()
}

pub fn status_line(app: &PdfCropApp) -> Element<'_, Message> {
    let Some(status) = &app.status else {
        return row![].into();
    };
    let color = match status.level {
        StatusLevel::Info => Color::from_rgb(0.1, 0.5, 0.1),
        StatusLevel::Warning => Color::from_rgb(0.7, 0.45, 0.0),
        StatusLevel::Error => Color::from_rgb(0.8, 0.1, 0.1),
    };

    row![
        text(&status.text).size(13).color(color),
        Space::new().width(Length::Fill),
        button("×").on_press(Message::ClearStatus).padding(2),
    ]
    .padding(5)
    .align_y(iced::Alignment::Center)
    .into()
}

pub fn document_view<'a>(app: &'a PdfCropApp, doc: &'a Document) -> Element<'a, Message> {
    column![
        render_toolbar(app, doc),
        render_settings_row(app, doc),
        container(render_page(doc))
            .width(Length::Fill)
            .height(Length::Fill)
            .clip(true),
        render_page_nav(doc),
        status_line(app),
    ]
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_label_truncates() {
        assert_eq!(zoom_label(1.0), "Zoom: 100%");
        assert_eq!(zoom_label(1.219), "Zoom: 121%");
        assert_eq!(zoom_label(0.1), "Zoom: 10%");
    }
}
