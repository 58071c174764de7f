//! Core of the PDF crop tool: page geometry, the per-document crop session,
//! crop settings files and the two ways of writing a cropped PDF.

pub mod cropbox;
pub mod error;
pub mod export;
pub mod geometry;
pub mod models;
pub mod pdf_engine;
pub mod selection;
pub mod session;
pub mod settings;
pub mod storage;

pub use error::{CropError, Result};
pub use geometry::{DisplayMapping, Point, Rect, Rotation, Size, ViewTransform};
pub use models::{AppSettings, PageSize, PageState, RecentFile, RenderedPage};
pub use session::{CropSession, Gesture, PageClip};
pub use settings::CropSettings;
