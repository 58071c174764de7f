use crate::geometry::{Rotation, Size, POINTS_PER_INCH};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_DISPLAY_SCALE: f32 = 0.75;
pub const DEFAULT_EXPORT_DPI: u32 = 400;
pub const DEFAULT_ZOOM_STEP: f32 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    A5,
    Letter,
}

impl PageSize {
    pub const ALL: [Self; 3] = [Self::A4, Self::A5, Self::Letter];

    /// Paper size in PDF points.
    #[must_use]
    pub const fn points(self) -> Size {
        match self {
            Self::A4 => Size::new(595.0, 842.0),
            Self::A5 => Size::new(420.0, 595.0),
            Self::Letter => Size::new(612.0, 792.0),
        }
    }

    /// Pixel dimensions of a full page rendered at `dpi`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn pixel_size(self, dpi: u32) -> (u32, u32) {
        let size = self.points();
        let dpi = dpi as f32;
        (
            (size.width * dpi / POINTS_PER_INCH) as u32,
            (size.height * dpi / POINTS_PER_INCH) as u32,
        )
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::A4 => "A4",
            Self::A5 => "A5",
            Self::Letter => "Letter",
        };
        f.write_str(name)
    }
}

/// Transient view state of one page: zoom, pan and rotation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageState {
    pub scale_factor: f32,
    pub x_offset: f32,
    pub y_offset: f32,
    #[serde(default)]
    pub rotation: Rotation,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            scale_factor: 1.0,
            x_offset: 0.0,
            y_offset: 0.0,
            rotation: Rotation::None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub display_scale: f32,
    pub export_dpi: u32,
    pub default_page_size: PageSize,
    pub zoom_step: f32,
    pub remember_recent: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            display_scale: DEFAULT_DISPLAY_SCALE,
            export_dpi: DEFAULT_EXPORT_DPI,
            default_page_size: PageSize::A4,
            zoom_step: DEFAULT_ZOOM_STEP,
            remember_recent: true,
        }
    }
}

impl AppSettings {
    pub const DISPLAY_SCALE_RANGE: (f32, f32) = (0.25, 4.0);
    pub const EXPORT_DPI_RANGE: (u32, u32) = (72, 1200);
    // Zoom out multiplies by `2 - step`, which must stay positive.
    pub const ZOOM_STEP_RANGE: (f32, f32) = (1.01, 1.9);

    /// Pulls hand-edited values back into usable ranges.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let clamp = |value: f32, (lo, hi): (f32, f32), default: f32| {
            if value.is_finite() { value.clamp(lo, hi) } else { default }
        };
        self.display_scale = clamp(self.display_scale, Self::DISPLAY_SCALE_RANGE, DEFAULT_DISPLAY_SCALE);
        self.zoom_step = clamp(self.zoom_step, Self::ZOOM_STEP_RANGE, DEFAULT_ZOOM_STEP);
        self.export_dpi = self.export_dpi.clamp(Self::EXPORT_DPI_RANGE.0, Self::EXPORT_DPI_RANGE.1);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecentFile {
    pub path: String,
    pub name: String,
    pub last_opened: u64,
}

/// RGBA raster of a page as produced by the render thread.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub page: usize,
    pub rotation: Rotation,
    pub scale: f32,
    pub width: u32,
    pub height: u32,
    pub rgba: Arc<Vec<u8>>,
}
