use crate::commands::PdfCommand;
use crate::engine::{spawn_engine_thread, EngineState};
use crate::message::Message;
use crate::shortcuts;
use crate::ui;
use crate::update::handle_message;
use iced::widget::image as iced_image;
use iced::{Element, Subscription, Task};
use pdfcrop::{storage, AppSettings, CropSession, PageSize, RecentFile, Rotation};
use std::path::{Path, PathBuf};

/// Scale the display raster is rendered at. The canvas scales it to
/// `base * zoom`, so this only affects sharpness.
pub const DISPLAY_RENDER_SCALE: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct Status {
    pub level: StatusLevel,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct PageImage {
    pub page: usize,
    pub rotation: Rotation,
    pub handle: iced_image::Handle,
}

pub struct Document {
    pub path: PathBuf,
    pub session: CropSession,
    pub page_image: Option<PageImage>,
}

impl Document {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// The raster for the page and rotation currently shown, if it has
    /// arrived.
    pub fn current_image(&self) -> Option<&iced_image::Handle> {
        let img = self.page_image.as_ref()?;
        let showing = self.session.current_page() == img.page
            && self.session.current_state().rotation == img.rotation;
        showing.then_some(&img.handle)
    }

    pub fn needs_render(&self) -> bool {
        self.session.page_count() > 0 && self.current_image().is_none()
    }
}

pub struct PdfCropApp {
    pub document: Option<Document>,
    pub settings: AppSettings,
    pub recent_files: Vec<RecentFile>,
    pub page_size: PageSize,
    pub apply_pages_input: String,
    pub export_pages_input: String,
    pub show_settings: bool,
    pub status: Option<Status>,
    pub busy: bool,
    pub engine: EngineState,
}

impl PdfCropApp {
    pub fn new() -> (Self, Task<Message>) {
        let settings = storage::load_settings();
        let recent_files = if settings.remember_recent {
            storage::load_recent_files()
        } else {
            Vec::new()
        };

        let app = Self {
            document: None,
            page_size: settings.default_page_size,
            settings,
            recent_files,
            apply_pages_input: String::new(),
            export_pages_input: String::new(),
            show_settings: false,
            status: None,
            busy: false,
            engine: spawn_engine_thread(),
        };

        // Open a PDF passed on the command line.
        let task = std::env::args_os()
            .nth(1)
            .map(PathBuf::from)
            .filter(|p| p.exists())
            .map_or_else(Task::none, |p| Task::done(Message::OpenFile(p)));

        (app, task)
    }

    pub fn title(&self) -> String {
        match &self.document {
            Some(doc) => format!("PDF Crop - {}", doc.file_name()),
            None => "PDF Crop".to_string(),
        }
    }

    pub fn set_status(&mut self, level: StatusLevel, text: impl Into<String>) {
        let text = text.into();
        match level {
            StatusLevel::Info => tracing::info!(status = %text),
            StatusLevel::Warning => tracing::warn!(status = %text),
            StatusLevel::Error => tracing::error!(status = %text),
        }
        self.status = Some(Status { level, text });
    }

    pub fn session(&self) -> Option<&CropSession> {
        self.document.as_ref().map(|d| &d.session)
    }

    pub fn session_mut(&mut self) -> Option<&mut CropSession> {
        self.document.as_mut().map(|d| &mut d.session)
    }

    pub fn add_recent_file(&mut self, path: &Path) {
        if self.settings.remember_recent {
            storage::add_recent_file(&mut self.recent_files, path);
        }
    }

    /// Asks the worker for the current page unless it is already shown.
    pub fn render_current_page(&self) -> Task<Message> {
        let Some(doc) = &self.document else {
            return Task::none();
        };
        if !doc.needs_render() {
            return Task::none();
        }

        let page = doc.session.current_page();
        let rotation = doc.session.current_state().rotation;
        let engine = self.engine.clone();
        Task::perform(
            async move {
                engine
                    .request(|tx| PdfCommand::Render(page, rotation, DISPLAY_RENDER_SCALE, tx))
                    .await
            },
            Message::PageRendered,
        )
    }

    pub fn close_document(&mut self) {
        if self.document.take().is_some() {
            let _ = self.engine.cmd_tx.try_send(PdfCommand::Close);
        }
        self.apply_pages_input.clear();
        self.export_pages_input.clear();
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        handle_message(self, message)
    }

    pub fn subscription(&self) -> Subscription<Message> {
        if self.document.is_some() && !self.show_settings {
            shortcuts::subscription()
        } else {
            Subscription::none()
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        ui::view(self)
    }
}
