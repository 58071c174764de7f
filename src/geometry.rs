//! Geometry primitives and the coordinate mappings between the page canvas,
//! the unzoomed view, and PDF page space.
//!
//! Every rectangle here is top-left based (`y` grows downwards) except the
//! output of [`Rect::to_pdf_box`], which is PDF user space.

use crate::error::CropError;
use serde::{Deserialize, Serialize};

/// PDF user-space units per inch.
pub const POINTS_PER_INCH: f32 = 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    #[inline]
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle. Serialised as `[x0, y0, x1, y1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl From<[f32; 4]> for Rect {
    fn from([x0, y0, x1, y1]: [f32; 4]) -> Self {
        Self::new(x0, y0, x1, y1)
    }
}

impl From<Rect> for [f32; 4] {
    fn from(r: Rect) -> Self {
        [r.x0, r.y0, r.x1, r.y1]
    }
}

impl Rect {
    #[inline]
    #[must_use]
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Rectangle spanned by two arbitrary corners, e.g. the two ends of a drag.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x0: a.x.min(b.x),
            y0: a.y.min(b.y),
            x1: a.x.max(b.x),
            y1: a.y.max(b.y),
        }
    }

    #[inline]
    #[must_use]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    #[inline]
    #[must_use]
    pub fn scale(&self, sx: f32, sy: f32) -> Self {
        Self::new(self.x0 * sx, self.y0 * sy, self.x1 * sx, self.y1 * sy)
    }

    #[inline]
    #[must_use]
    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x0 + dx, self.y0 + dy, self.x1 + dx, self.y1 + dy)
    }

    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        }
    }

    /// Smallest integer rectangle covering this one.
    #[must_use]
    pub fn round_out(&self) -> Self {
        Self::new(
            self.x0.floor(),
            self.y0.floor(),
            self.x1.ceil(),
            self.y1.ceil(),
        )
    }

    /// Converts a top-down rectangle relative to `page_box` into PDF user
    /// space, where `page_box` itself is given in user space
    /// (`x0, y0` = lower-left corner). The result is clamped to `page_box`.
    #[must_use]
    pub fn to_pdf_box(&self, page_box: &Self) -> Self {
        let height = page_box.height();
        Self {
            x0: page_box.x0 + self.x0,
            y0: page_box.y0 + (height - self.y1),
            x1: page_box.x0 + self.x1,
            y1: page_box.y0 + (height - self.y0),
        }
        .intersect(page_box)
    }
}

/// Clockwise page rotation in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl TryFrom<i32> for Rotation {
    type Error = CropError;

    fn try_from(degrees: i32) -> Result<Self, Self::Error> {
        match degrees.rem_euclid(360) {
            0 => Ok(Self::None),
            90 => Ok(Self::Cw90),
            180 => Ok(Self::Cw180),
            270 => Ok(Self::Cw270),
            _ => Err(CropError::InvalidRotation(degrees)),
        }
    }
}

impl From<Rotation> for i32 {
    fn from(r: Rotation) -> Self {
        r.degrees()
    }
}

impl Rotation {
    #[must_use]
    pub const fn degrees(self) -> i32 {
        match self {
            Self::None => 0,
            Self::Cw90 => 90,
            Self::Cw180 => 180,
            Self::Cw270 => 270,
        }
    }

    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::None => Self::Cw90,
            Self::Cw90 => Self::Cw180,
            Self::Cw180 => Self::Cw270,
            Self::Cw270 => Self::None,
        }
    }

    #[must_use]
    pub const fn is_quarter(self) -> bool {
        matches!(self, Self::Cw90 | Self::Cw270)
    }

    /// Size of a page of `size` once rotated.
    #[must_use]
    pub const fn apply(self, size: Size) -> Size {
        if self.is_quarter() {
            Size::new(size.height, size.width)
        } else {
            size
        }
    }

    /// Maps a point of the unrotated page (`size`) onto the rotated page.
    #[must_use]
    pub fn rotate_point(self, p: Point, size: Size) -> Point {
        match self {
            Self::None => p,
            Self::Cw90 => Point::new(size.height - p.y, p.x),
            Self::Cw180 => Point::new(size.width - p.x, size.height - p.y),
            Self::Cw270 => Point::new(p.y, size.width - p.x),
        }
    }

    /// Inverse of [`Rotation::rotate_point`]; `size` is still the unrotated size.
    #[must_use]
    pub fn unrotate_point(self, p: Point, size: Size) -> Point {
        match self {
            Self::None => p,
            Self::Cw90 => Point::new(p.y, size.height - p.x),
            Self::Cw180 => Point::new(size.width - p.x, size.height - p.y),
            Self::Cw270 => Point::new(size.width - p.y, p.x),
        }
    }

    #[must_use]
    pub fn rotate_rect(self, r: &Rect, size: Size) -> Rect {
        Rect::from_corners(
            self.rotate_point(Point::new(r.x0, r.y0), size),
            self.rotate_point(Point::new(r.x1, r.y1), size),
        )
    }

    #[must_use]
    pub fn unrotate_rect(self, r: &Rect, size: Size) -> Rect {
        Rect::from_corners(
            self.unrotate_point(Point::new(r.x0, r.y0), size),
            self.unrotate_point(Point::new(r.x1, r.y1), size),
        )
    }
}

/// Zoom and pan of one page on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub zoom: f32,
    pub offset: Point,
}

impl ViewTransform {
    #[must_use]
    pub fn canvas_to_view(&self, p: Point) -> Point {
        Point::new((p.x - self.offset.x) / self.zoom, (p.y - self.offset.y) / self.zoom)
    }

    #[must_use]
    pub fn view_to_canvas(&self, r: &Rect) -> Rect {
        r.scale(self.zoom, self.zoom)
            .translate(self.offset.x, self.offset.y)
    }
}

/// Relation between a (rotated) page in points and its unzoomed on-screen
/// rendition.
///
/// The page is rasterised at 72 DPI, giving `pixels`, and shown at
/// `display_scale` of that. The view→page factors are derived from those
/// integer sizes, so rounding of the raster is accounted for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMapping {
    pub page: Size,
    pub pixels: (u32, u32),
    pub display_scale: f32,
}

impl DisplayMapping {
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(page: Size, display_scale: f32) -> Self {
        let pixels = (
            (page.width.round() as u32).max(1),
            (page.height.round() as u32).max(1),
        );
        Self {
            page,
            pixels,
            display_scale,
        }
    }

    /// Canvas size at zoom 1.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn base_size(&self) -> (u32, u32) {
        (
            (self.pixels.0 as f32 * self.display_scale) as u32,
            (self.pixels.1 as f32 * self.display_scale) as u32,
        )
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn scale_factors(&self) -> (f32, f32) {
        (
            self.page.width / (self.pixels.0 as f32 * self.display_scale),
            self.page.height / (self.pixels.1 as f32 * self.display_scale),
        )
    }

    #[must_use]
    pub fn view_to_page(&self, r: &Rect) -> Rect {
        let (sx, sy) = self.scale_factors();
        r.scale(sx, sy)
    }

    #[must_use]
    pub fn page_to_view(&self, r: &Rect) -> Rect {
        let (sx, sy) = self.scale_factors();
        r.scale(1.0 / sx, 1.0 / sy)
    }
}

/// Pixel scale for rendering at `dpi`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn dpi_scale(dpi: u32) -> f32 {
    dpi as f32 / POINTS_PER_INCH
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    fn assert_rect_eq(a: &Rect, b: &Rect) {
        assert!(
            (a.x0 - b.x0).abs() < EPS
                && (a.y0 - b.y0).abs() < EPS
                && (a.x1 - b.x1).abs() < EPS
                && (a.y1 - b.y1).abs() < EPS,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn test_from_corners_normalises() {
        let r = Rect::from_corners(Point::new(50.0, 10.0), Point::new(5.0, 40.0));
        assert_eq!(r, Rect::new(5.0, 10.0, 50.0, 40.0));
        assert_eq!(r.width(), 45.0);
        assert_eq!(r.height(), 30.0);
    }

    #[test]
    fn test_rect_is_empty() {
        assert!(Rect::new(1.0, 1.0, 1.0, 5.0).is_empty());
        assert!(Rect::new(10.0, 10.0, 5.0, 5.0).is_empty());
        assert!(!Rect::new(0.0, 0.0, 1.0, 1.0).is_empty());
    }

    #[test]
    fn test_round_out() {
        let r = Rect::new(0.4, 1.6, 9.1, 9.9).round_out();
        assert_eq!(r, Rect::new(0.0, 1.0, 10.0, 10.0));
    }

    #[test]
    fn test_rect_serializes_as_array() {
        let json = serde_json::to_string(&Rect::new(1.0, 2.0, 3.0, 4.5)).unwrap();
        assert_eq!(json, "[1.0,2.0,3.0,4.5]");
        let back: Rect = serde_json::from_str("[10, 20, 30, 40]").unwrap();
        assert_eq!(back, Rect::new(10.0, 20.0, 30.0, 40.0));
    }

    #[test]
    fn test_rotation_from_degrees() {
        assert_eq!(Rotation::try_from(0).unwrap(), Rotation::None);
        assert_eq!(Rotation::try_from(450).unwrap(), Rotation::Cw90);
        assert_eq!(Rotation::try_from(-90).unwrap(), Rotation::Cw270);
        assert!(matches!(
            Rotation::try_from(45),
            Err(CropError::InvalidRotation(45))
        ));
    }

    #[test]
    fn test_rotation_cycles() {
        let mut r = Rotation::None;
        for expected in [90, 180, 270, 0] {
            r = r.next();
            assert_eq!(r.degrees(), expected);
        }
    }

    #[test]
    fn test_rotate_rect_cw90() {
        // Portrait 100x200 page, top-left strip.
        let size = Size::new(100.0, 200.0);
        let strip = Rect::new(0.0, 0.0, 100.0, 20.0);
        let rotated = Rotation::Cw90.rotate_rect(&strip, size);
        // After a clockwise quarter turn the top edge becomes the right edge.
        assert_rect_eq(&rotated, &Rect::new(180.0, 0.0, 200.0, 100.0));
        assert_eq!(Rotation::Cw90.apply(size), Size::new(200.0, 100.0));
    }

    #[test]
    fn test_unrotate_inverts_rotate() {
        let size = Size::new(595.0, 842.0);
        let r = Rect::new(10.0, 20.0, 300.0, 500.0);
        for rot in [Rotation::None, Rotation::Cw90, Rotation::Cw180, Rotation::Cw270] {
            let back = rot.unrotate_rect(&rot.rotate_rect(&r, size), size);
            assert_rect_eq(&back, &r);
        }
    }

    #[test]
    fn test_view_transform_inverse() {
        let t = ViewTransform {
            zoom: 2.0,
            offset: Point::new(30.0, -10.0),
        };
        let p = t.canvas_to_view(Point::new(130.0, 90.0));
        assert_eq!(p, Point::new(50.0, 50.0));
        let r = t.view_to_canvas(&Rect::new(50.0, 50.0, 60.0, 60.0));
        assert_eq!(r, Rect::new(130.0, 90.0, 150.0, 110.0));
    }

    #[test]
    fn test_display_mapping_a4() {
        let m = DisplayMapping::new(Size::new(595.0, 842.0), 0.75);
        assert_eq!(m.pixels, (595, 842));
        assert_eq!(m.base_size(), (446, 631));
        let page = m.view_to_page(&Rect::new(0.0, 0.0, 446.25, 631.5));
        assert_rect_eq(&page, &Rect::new(0.0, 0.0, 595.0, 842.0));
    }

    #[test]
    fn test_display_mapping_fractional_page() {
        // 612.4pt rasterises to 612px; the factor compensates.
        let m = DisplayMapping::new(Size::new(612.4, 791.6), 1.0);
        assert_eq!(m.pixels, (612, 792));
        let page = m.view_to_page(&Rect::new(0.0, 0.0, 612.0, 792.0));
        assert_rect_eq(&page, &Rect::new(0.0, 0.0, 612.4, 791.6));
    }

    #[test]
    fn test_to_pdf_box_flips_y() {
        let media = Rect::new(0.0, 0.0, 612.0, 792.0);
        let top_band = Rect::new(0.0, 0.0, 612.0, 100.0);
        assert_eq!(top_band.to_pdf_box(&media), Rect::new(0.0, 692.0, 612.0, 792.0));
    }

    #[test]
    fn test_to_pdf_box_offset_origin_and_clamp() {
        let crop = Rect::new(10.0, 20.0, 110.0, 220.0);
        let r = Rect::new(-5.0, 50.0, 50.0, 250.0).to_pdf_box(&crop);
        assert_eq!(r, Rect::new(10.0, 20.0, 60.0, 170.0));
    }

    #[test]
    fn test_dpi_scale() {
        assert!((dpi_scale(400) - 5.555_555).abs() < 1e-4);
        assert_eq!(dpi_scale(72), 1.0);
    }
}
