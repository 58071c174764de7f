use thiserror::Error;

#[derive(Error, Debug)]
pub enum CropError {
    #[error("Pdfium error: {0}")]
    Pdfium(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF structure error: {0}")]
    Lopdf(#[from] lopdf::Error),

    #[error("Invalid page selection '{0}'. Use the format '1,3-5'")]
    InvalidPageSelection(String),

    #[error("No PDF loaded")]
    NoDocument,

    #[error("No crop region selected")]
    NoCropRegion,

    #[error("No pages selected")]
    NoPagesSelected,

    #[error("Page {page} is out of bounds (document has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },

    #[error("Invalid rotation {0}, expected 0, 90, 180 or 270")]
    InvalidRotation(i32),

    #[error("Export failed: {0}")]
    Export(String),
}

impl From<pdfium_render::prelude::PdfiumError> for CropError {
    fn from(e: pdfium_render::prelude::PdfiumError) -> Self {
        Self::Pdfium(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CropError>;
