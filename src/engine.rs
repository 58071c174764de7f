use crate::commands::PdfCommand;
use pdfcrop::cropbox;
use pdfcrop::pdf_engine::PdfEngine;
use std::fs;
use tokio::sync::mpsc;
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct EngineState {
    pub cmd_tx: mpsc::Sender<PdfCommand>,
}

impl EngineState {
    /// Sends `make(reply_tx)` to the worker and waits for the answer.
    pub async fn request<T>(
        &self,
        make: impl FnOnce(mpsc::Sender<Result<T, String>>) -> PdfCommand,
    ) -> Result<T, String> {
        let (resp_tx, mut resp_rx) = mpsc::channel(1);
        self.cmd_tx
            .send(make(resp_tx))
            .await
            .map_err(|_| "Engine died".to_string())?;
        resp_rx
            .recv()
            .await
            .unwrap_or_else(|| Err("Engine died".to_string()))
    }
}

/// Starts the thread that owns pdfium. It lives until every sender is
/// dropped; if pdfium cannot be loaded it exits at once and requests fail
/// with "Engine died".
pub fn spawn_engine_thread() -> EngineState {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<PdfCommand>(32);

    std::thread::spawn(move || {
        let pdfium = match PdfEngine::init_pdfium() {
            Ok(p) => p,
            Err(e) => {
                error!(error = %e, "engine init failed");
                return;
            }
        };
        let mut engine = PdfEngine::new(&pdfium);
        info!("pdf engine ready");

        while let Some(cmd) = cmd_rx.blocking_recv() {
            match cmd {
                PdfCommand::Open(path, resp) => {
                    let res = engine.open_document(&path).map_err(|e| e.to_string());
                    let _ = resp.blocking_send(res);
                }
                PdfCommand::Render(page, rotation, scale, resp) => {
                    let res = engine
                        .render_page(page, rotation, scale)
                        .map_err(|e| e.to_string());
                    let _ = resp.blocking_send(res);
                }
                PdfCommand::Export(clips, options, path, resp) => {
                    let res = engine
                        .export_pdf(&clips, &options)
                        .and_then(|bytes| Ok(fs::write(&path, bytes)?))
                        .map(|()| clips.len())
                        .map_err(|e| e.to_string());
                    if res.is_ok() {
                        info!(path = %path.display(), pages = clips.len(), "export written");
                    }
                    let _ = resp.blocking_send(res);
                }
                PdfCommand::SaveCropped(src, dst, cropboxes, resp) => {
                    let res = cropbox::save_with_cropboxes(&src, &dst, &cropboxes)
                        .map_err(|e| e.to_string());
                    let _ = resp.blocking_send(res);
                }
                PdfCommand::Close => engine.close_document(),
            }
        }
    });

    EngineState { cmd_tx }
}
