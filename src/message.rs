use pdfcrop::{AppSettings, CropSettings, PageSize, Point, RecentFile, RenderedPage, Size};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum Message {
    // document
    OpenDocument,
    FilePicked(Option<PathBuf>),
    OpenFile(PathBuf),
    OpenRecentFile(RecentFile),
    ClearRecentFiles,
    DocumentOpened(PathBuf, Result<Vec<Size>, String>),
    CloseDocument,
    PageRendered(Result<RenderedPage, String>),

    // navigation and view
    NextPage,
    PrevPage,
    ZoomIn,
    ZoomOut,
    ZoomBy(f32),
    SetZoom(f32),
    ResetZoom,
    Rotate,

    // canvas gestures, in canvas coordinates
    CanvasPressed(Point, bool),
    CanvasDragged(Point),
    CanvasReleased(Point),

    // cropping
    ClearSelection,
    ApplyToAll,
    ApplyPagesInput(String),
    ApplyToSelected,
    ResetCropboxes,
    SetPageSize(PageSize),

    // output
    SavePdf,
    ExportPagesInput(String),
    ExportPages,
    Exported(Result<Option<(PathBuf, usize)>, String>),
    SaveVectorCrop,
    VectorCropSaved(Result<Option<(PathBuf, usize)>, String>),

    // crop settings files
    SaveCropSettings,
    CropSettingsSaved(Result<Option<PathBuf>, String>),
    LoadCropSettings,
    CropSettingsLoaded(Result<Option<(PathBuf, CropSettings)>, String>),

    // app settings
    OpenSettings,
    CloseSettings,
    SaveSettings(AppSettings),
    ClearStatus,
}
