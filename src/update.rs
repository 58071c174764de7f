use crate::app::{Document, PageImage, PdfCropApp, StatusLevel};
use crate::commands::PdfCommand;
use crate::engine::EngineState;
use crate::message::Message;
use iced::widget::image as iced_image;
use iced::Task;
use pdfcrop::export::ExportOptions;
use pdfcrop::selection::parse_page_selection;
use pdfcrop::{storage, CropError, CropSession, CropSettings, PageClip, Rect};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

fn default_output_name(path: &Path, suffix: &str, ext: &str) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    format!("{stem}{suffix}.{ext}")
}

async fn pick_save_path(name: String, filter: &'static str, ext: &'static str) -> Option<PathBuf> {
    rfd::AsyncFileDialog::new()
        .add_filter(filter, &[ext])
        .set_file_name(name)
        .save_file()
        .await
        .map(|f| f.path().to_path_buf())
}

async fn pick_open_path(filter: &'static str, ext: &'static str) -> Option<PathBuf> {
    rfd::AsyncFileDialog::new()
        .add_filter(filter, &[ext])
        .pick_file()
        .await
        .map(|f| f.path().to_path_buf())
}

pub fn handle_message(app: &mut PdfCropApp, message: Message) -> Task<Message> {
    match message {
        Message::OpenDocument => Task::perform(pick_open_path("PDF", "pdf"), Message::FilePicked),
        Message::FilePicked(Some(path)) => handle_message(app, Message::OpenFile(path)),
        Message::FilePicked(None) => Task::none(),
        Message::OpenFile(path) => {
            app.busy = true;
            let engine = app.engine.clone();
            let open_path = path.clone();
            Task::perform(
                async move { engine.request(|tx| PdfCommand::Open(open_path, tx)).await },
                move |result| Message::DocumentOpened(path, result),
            )
        }
        Message::OpenRecentFile(file) => {
            let path = PathBuf::from(&file.path);
            if path.exists() {
                return handle_message(app, Message::OpenFile(path));
            }
            app.recent_files.retain(|f| f.path != file.path);
            if let Err(e) = storage::save_recent_files_to(&storage::get_config_dir(), &app.recent_files) {
                tracing::warn!(error = %e, "failed to save recent files");
            }
            app.set_status(StatusLevel::Warning, format!("File not found: {}", file.path));
            Task::none()
        }
        Message::ClearRecentFiles => {
            storage::clear_recent_files(&mut app.recent_files);
            Task::none()
        }
        Message::DocumentOpened(path, result) => {
            app.busy = false;
            match result {
                Ok(pages) => {
                    // The worker already dropped the previous document.
                    app.apply_pages_input.clear();
                    app.export_pages_input.clear();
                    let count = pages.len();
                    app.document = Some(Document {
                        path: path.clone(),
                        session: CropSession::new(pages, app.settings.display_scale),
                        page_image: None,
                    });
                    app.add_recent_file(&path);
                    app.set_status(
                        StatusLevel::Info,
                        format!("Opened {} ({count} pages)", path.display()),
                    );
                    app.render_current_page()
                }
                Err(e) => {
                    app.close_document();
                    app.set_status(StatusLevel::Error, format!("Could not open PDF: {e}"));
                    Task::none()
                }
            }
        }
        Message::CloseDocument => {
            app.close_document();
            Task::none()
        }
        Message::PageRendered(result) => {
            match result {
                Ok(rendered) => {
                    if let Some(doc) = &mut app.document {
                        // Drop renders for a page or rotation no longer shown.
                        if rendered.page == doc.session.current_page()
                            && rendered.rotation == doc.session.current_state().rotation
                        {
                            doc.page_image = Some(PageImage {
                                page: rendered.page,
                                rotation: rendered.rotation,
                                handle: iced_image::Handle::from_rgba(
                                    rendered.width,
                                    rendered.height,
                                    rendered.rgba.as_ref().clone(),
                                ),
                            });
                        }
                    }
                }
                Err(e) => app.set_status(StatusLevel::Error, format!("Render failed: {e}")),
            }
            Task::none()
        }

        Message::NextPage => {
            if app.session_mut().is_some_and(CropSession::next_page) {
                return app.render_current_page();
            }
            Task::none()
        }
        Message::PrevPage => {
            if app.session_mut().is_some_and(CropSession::prev_page) {
                return app.render_current_page();
            }
            Task::none()
        }
        Message::ZoomIn => {
            let step = app.settings.zoom_step;
            handle_message(app, Message::ZoomBy(step))
        }
        Message::ZoomOut => {
            // 1.1 in, 0.9 out with the default step.
            let step = 2.0 - app.settings.zoom_step;
            handle_message(app, Message::ZoomBy(step))
        }
        Message::ZoomBy(factor) => {
            if let Some(session) = app.session_mut() {
                session.adjust_zoom(factor);
            }
            Task::none()
        }
        Message::SetZoom(zoom) => {
            if let Some(session) = app.session_mut() {
                session.set_zoom(zoom);
            }
            Task::none()
        }
        Message::ResetZoom => {
            if let Some(session) = app.session_mut() {
                session.reset_zoom();
            }
            Task::none()
        }
        Message::Rotate => {
            if let Some(session) = app.session_mut() {
                session.rotate();
                return app.render_current_page();
            }
            Task::none()
        }

        Message::CanvasPressed(point, pan) => {
            if let Some(session) = app.session_mut() {
                session.press(point, pan);
            }
            Task::none()
        }
        Message::CanvasDragged(point) => {
            if let Some(session) = app.session_mut() {
                session.drag(point);
            }
            Task::none()
        }
        Message::CanvasReleased(point) => {
            if let Some(session) = app.session_mut() {
                session.release(point);
            }
            Task::none()
        }

        Message::ClearSelection => {
            if let Some(session) = app.session_mut() {
                session.clear_crop();
            }
            Task::none()
        }
        Message::ApplyToAll => {
            let result = app
                .session_mut()
                .ok_or(CropError::NoDocument)
                .and_then(CropSession::apply_to_all);
            report_apply(app, result);
            Task::none()
        }
        Message::ApplyPagesInput(input) => {
            app.apply_pages_input = input;
            Task::none()
        }
        Message::ApplyToSelected => {
            let input = app.apply_pages_input.clone();
            let result = app.session_mut().ok_or(CropError::NoDocument).and_then(|session| {
                if session.crop_rect().is_none() {
                    return Err(CropError::NoCropRegion);
                }
                let pages = parse_page_selection(&input)?;
                session.apply_to_pages(&pages)
            });
            report_apply(app, result);
            Task::none()
        }
        Message::ResetCropboxes => {
            if let Some(session) = app.session_mut() {
                session.reset_cropboxes();
                app.set_status(StatusLevel::Info, "Crop undone on all pages");
                // Rotations are reset too, so the shown raster may be stale.
                return app.render_current_page();
            }
            Task::none()
        }
        Message::SetPageSize(size) => {
            app.page_size = size;
            Task::none()
        }

        Message::SavePdf => {
            let pages = app
                .session()
                .map(|s| (0..s.page_count()).collect::<Vec<_>>());
            start_export(app, pages.ok_or(CropError::NoDocument), "_cropped")
        }
        Message::ExportPagesInput(input) => {
            app.export_pages_input = input;
            Task::none()
        }
        Message::ExportPages => {
            let pages = match app.session() {
                Some(session) => parse_page_selection(&app.export_pages_input).map(|pages| {
                    pages
                        .into_iter()
                        .filter(|&p| p < session.page_count())
                        .collect::<Vec<_>>()
                }),
                None => Err(CropError::NoDocument),
            };
            start_export(app, pages, "_exported")
        }
        Message::Exported(result) => {
            app.busy = false;
            match result {
                Ok(Some((path, pages))) => app.set_status(
                    StatusLevel::Info,
                    format!("Exported {pages} pages to {}", path.display()),
                ),
                Ok(None) => {}
                Err(e) => app.set_status(StatusLevel::Error, format!("Export failed: {e}")),
            }
            Task::none()
        }
        Message::SaveVectorCrop => {
            let Some(doc) = &app.document else {
                app.set_status(StatusLevel::Warning, CropError::NoDocument.to_string());
                return Task::none();
            };
            if doc.session.cropboxes().is_empty() {
                app.set_status(
                    StatusLevel::Warning,
                    "No crop applied yet. Use Apply to all or Apply to pages first",
                );
                return Task::none();
            }

            let src = doc.path.clone();
            let cropboxes = doc.session.cropboxes().clone();
            let name = default_output_name(&src, "_cropbox", "pdf");
            let engine = app.engine.clone();
            app.busy = true;
            Task::perform(save_vector_crop(engine, src, cropboxes, name), Message::VectorCropSaved)
        }
        Message::VectorCropSaved(result) => {
            app.busy = false;
            match result {
                Ok(Some((path, pages))) => app.set_status(
                    StatusLevel::Info,
                    format!("Crop boxes of {pages} pages saved to {}", path.display()),
                ),
                Ok(None) => {}
                Err(e) => app.set_status(StatusLevel::Error, format!("Save failed: {e}")),
            }
            Task::none()
        }

        Message::SaveCropSettings => {
            let Some(doc) = &app.document else {
                app.set_status(StatusLevel::Warning, CropError::NoDocument.to_string());
                return Task::none();
            };
            let settings = CropSettings {
                page_size: Some(app.page_size),
                ..doc.session.to_settings()
            };
            let name = default_output_name(&doc.path, "_crop", "json");
            Task::perform(save_crop_settings(settings, name), Message::CropSettingsSaved)
        }
        Message::CropSettingsSaved(result) => {
            match result {
                Ok(Some(path)) => app.set_status(
                    StatusLevel::Info,
                    format!("Crop settings saved to {}", path.display()),
                ),
                Ok(None) => {}
                Err(e) => app.set_status(StatusLevel::Error, format!("Could not save settings: {e}")),
            }
            Task::none()
        }
        Message::LoadCropSettings => {
            if app.document.is_none() {
                app.set_status(StatusLevel::Warning, CropError::NoDocument.to_string());
                return Task::none();
            }
            Task::perform(load_crop_settings(), Message::CropSettingsLoaded)
        }
        Message::CropSettingsLoaded(result) => match result {
            Ok(Some((path, settings))) => {
                if let Some(page_size) = settings.page_size {
                    app.page_size = page_size;
                }
                if let Some(session) = app.session_mut() {
                    session.load_settings(&settings);
                    app.set_status(
                        StatusLevel::Info,
                        format!("Crop settings loaded from {}", path.display()),
                    );
                }
                app.render_current_page()
            }
            Ok(None) => Task::none(),
            Err(e) => {
                app.set_status(StatusLevel::Error, format!("Could not load settings: {e}"));
                Task::none()
            }
        },

        Message::OpenSettings => {
            app.show_settings = true;
            Task::none()
        }
        Message::CloseSettings => {
            app.show_settings = false;
            Task::none()
        }
        Message::SaveSettings(settings) => {
            if !settings.remember_recent {
                storage::clear_recent_files(&mut app.recent_files);
            }
            app.settings = settings;
            storage::save_settings(&app.settings);
            Task::none()
        }
        Message::ClearStatus => {
            app.status = None;
            Task::none()
        }
    }
}

fn report_apply(app: &mut PdfCropApp, result: pdfcrop::Result<usize>) {
    match result {
        Ok(pages) => app.set_status(StatusLevel::Info, format!("Crop applied to {pages} pages")),
        Err(e) => app.set_status(StatusLevel::Warning, e.to_string()),
    }
}

fn start_export(
    app: &mut PdfCropApp,
    pages: pdfcrop::Result<Vec<usize>>,
    suffix: &str,
) -> Task<Message> {
    let pages = match pages {
        Ok(pages) if pages.is_empty() => Err(CropError::NoPagesSelected),
        other => other,
    };
    let (clips, name) = match (pages, &app.document) {
        (Ok(pages), Some(doc)) => (
            doc.session.export_clips(&pages),
            default_output_name(&doc.path, suffix, "pdf"),
        ),
        (Err(e), _) => {
            app.set_status(StatusLevel::Warning, e.to_string());
            return Task::none();
        }
        (Ok(_), None) => {
            app.set_status(StatusLevel::Warning, CropError::NoDocument.to_string());
            return Task::none();
        }
    };

    let options = ExportOptions {
        target: app.page_size,
        dpi: app.settings.export_dpi,
    };
    let engine = app.engine.clone();
    app.busy = true;
    Task::perform(export_to(engine, clips, options, name), Message::Exported)
}

async fn export_to(
    engine: EngineState,
    clips: Vec<PageClip>,
    options: ExportOptions,
    name: String,
) -> Result<Option<(PathBuf, usize)>, String> {
    let Some(path) = pick_save_path(name, "PDF", "pdf").await else {
        return Ok(None);
    };
    let pages = engine
        .request(|tx| PdfCommand::Export(clips, options, path.clone(), tx))
        .await?;
    Ok(Some((path, pages)))
}

async fn save_vector_crop(
    engine: EngineState,
    src: PathBuf,
    cropboxes: BTreeMap<usize, Rect>,
    name: String,
) -> Result<Option<(PathBuf, usize)>, String> {
    let Some(dst) = pick_save_path(name, "PDF", "pdf").await else {
        return Ok(None);
    };
    let pages = engine
        .request(|tx| PdfCommand::SaveCropped(src, dst.clone(), cropboxes, tx))
        .await?;
    Ok(Some((dst, pages)))
}

async fn save_crop_settings(settings: CropSettings, name: String) -> Result<Option<PathBuf>, String> {
    let Some(path) = pick_save_path(name, "JSON", "json").await else {
        return Ok(None);
    };
    settings.save(&path).map_err(|e| e.to_string())?;
    Ok(Some(path))
}

async fn load_crop_settings() -> Result<Option<(PathBuf, CropSettings)>, String> {
    let Some(path) = pick_open_path("JSON", "json").await else {
        return Ok(None);
    };
    let settings = CropSettings::load(&path).map_err(|e| e.to_string())?;
    Ok(Some((path, settings)))
}
