use crate::app::PdfCropApp;
use crate::message::Message;
use iced::widget::{button, column, pick_list, row, text, Space};
use iced::{Alignment, Element, Length};
use pdfcrop::PageSize;

const DISPLAY_SCALES: [f32; 4] = [0.5, 0.75, 1.0, 1.25];
const EXPORT_DPIS: [u32; 4] = [150, 300, 400, 600];

fn choice<'a, T: Copy + PartialEq + 'a>(
    app: &'a PdfCropApp,
    label: String,
    value: T,
    current: T,
    apply: impl Fn(&mut pdfcrop::AppSettings, T),
) -> Element<'a, Message> {
    let mut s = app.settings.clone();
    apply(&mut s, value);
    let label = if value == current { format!("{label} ✓") } else { label };
    button(text(label)).on_press(Message::SaveSettings(s)).into()
}

pub fn settings_view(app: &PdfCropApp) -> Element<'_, Message> {
    let settings = &app.settings;

    let scale_buttons = DISPLAY_SCALES.iter().fold(row![].spacing(10), |r, &scale| {
        r.push(choice(
            app,
            format!("{}%", (scale * 100.0) as u32),
            scale,
            settings.display_scale,
            |s, v| s.display_scale = v,
        ))
    });

    let dpi_buttons = EXPORT_DPIS.iter().fold(row![].spacing(10), |r, &dpi| {
        r.push(choice(
            app,
            format!("{dpi} DPI"),
            dpi,
            settings.export_dpi,
            |s, v| s.export_dpi = v,
        ))
    });

    let page_size = pick_list(PageSize::ALL, Some(settings.default_page_size), {
        let base = settings.clone();
        move |size| {
            let mut s = base.clone();
            s.default_page_size = size;
            Message::SaveSettings(s)
        }
    });

    let remember = button(if settings.remember_recent {
        "Remember Recent Files ✓"
    } else {
        "Remember Recent Files"
    })
    .on_press({
        let mut s = settings.clone();
        s.remember_recent = !s.remember_recent;
        Message::SaveSettings(s)
    });

    column![
        row![
            text("Settings").size(24),
            Space::new().width(Length::Fill),
            button("Close").on_press(Message::CloseSettings),
        ]
        .padding(20),
        column![
            text("Display scale").size(18),
            text("Applies to documents opened afterwards").size(12),
            scale_buttons.padding(10),
            Space::new().height(Length::Fixed(20.0)),
            text("Export resolution").size(18),
            dpi_buttons.padding(10),
            Space::new().height(Length::Fixed(20.0)),
            text("Default target size").size(18),
            row![page_size].padding(10),
            Space::new().height(Length::Fixed(20.0)),
            text("Behavior").size(18),
            row![remember].padding(10),
        ]
        .padding(20)
        .width(Length::Fixed(480.0))
    ]
    .align_x(Alignment::Center)
    .into()
}
