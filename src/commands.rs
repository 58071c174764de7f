use pdfcrop::export::ExportOptions;
use pdfcrop::{PageClip, Rect, RenderedPage, Rotation, Size};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Requests served by the pdfium worker thread. Each carries the sender
/// its reply goes to.
#[derive(Debug, Clone)]
pub enum PdfCommand {
    Open(PathBuf, mpsc::Sender<Result<Vec<Size>, String>>),
    Render(
        usize,
        Rotation,
        f32,
        mpsc::Sender<Result<RenderedPage, String>>,
    ),
    Export(
        Vec<PageClip>,
        ExportOptions,
        PathBuf,
        mpsc::Sender<Result<usize, String>>,
    ),
    SaveCropped(
        PathBuf,
        PathBuf,
        BTreeMap<usize, Rect>,
        mpsc::Sender<Result<usize, String>>,
    ),
    Close,
}
