//! Rasterised export: cropped page images resized to the target paper size
//! and assembled into a new PDF, one full-bleed image per page.

use crate::error::{CropError, Result};
use crate::geometry::{dpi_scale, Rect};
use crate::models::{PageSize, DEFAULT_EXPORT_DPI};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::imageops::{self, FilterType};
use image::{RgbImage, RgbaImage};
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Ref};
use rayon::prelude::*;
use std::io::Write;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub target: PageSize,
    pub dpi: u32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            target: PageSize::A4,
            dpi: DEFAULT_EXPORT_DPI,
        }
    }
}

impl ExportOptions {
    #[must_use]
    pub fn render_scale(&self) -> f32 {
        dpi_scale(self.dpi)
    }

    #[must_use]
    pub fn target_pixels(&self) -> (u32, u32) {
        self.target.pixel_size(self.dpi)
    }
}

/// Pixel rectangle of `clip` (rotated page space, points) inside a bitmap of
/// `bitmap` pixels that shows a page of `page` points. Rounded outwards and
/// clamped to the bitmap; `None` when nothing is left.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn clip_to_pixels(clip: &Rect, page: (f32, f32), bitmap: (u32, u32)) -> Option<(u32, u32, u32, u32)> {
    let sx = bitmap.0 as f32 / page.0;
    let sy = bitmap.1 as f32 / page.1;
    let bounds = Rect::new(0.0, 0.0, bitmap.0 as f32, bitmap.1 as f32);
    let px = clip.scale(sx, sy).round_out().intersect(&bounds);
    if px.is_empty() {
        return None;
    }
    Some((
        px.x0 as u32,
        px.y0 as u32,
        px.width() as u32,
        px.height() as u32,
    ))
}

/// Cuts `clip` out of a rendered page and drops the alpha channel.
pub fn crop_rendered(bitmap: &RgbaImage, clip: &Rect, page: (f32, f32)) -> Result<RgbImage> {
    let (x, y, w, h) = clip_to_pixels(clip, page, bitmap.dimensions())
        .ok_or_else(|| CropError::Export(format!("crop region {clip:?} is outside the page")))?;
    let cropped = imageops::crop_imm(bitmap, x, y, w, h).to_image();
    Ok(image::DynamicImage::ImageRgba8(cropped).to_rgb8())
}

/// Resizes to exactly `target` pixels with a Lanczos filter. The aspect
/// ratio is not preserved: the crop is stretched to fill the paper.
#[must_use]
pub fn fit_to_target(image: &RgbImage, target: (u32, u32)) -> RgbImage {
    if image.dimensions() == target {
        return image.clone();
    }
    imageops::resize(image, target.0, target.1, FilterType::Lanczos3)
}

/// A page image ready to be embedded: its pixel size and the zlib-compressed
/// RGB samples. Only these compressed bytes stay alive until the PDF is done.
#[derive(Debug, Clone)]
pub struct EncodedPage {
    pub width: u32,
    pub height: u32,
    data: Vec<u8>,
}

impl EncodedPage {
    /// Compresses `image` as is.
    pub fn from_image(image: &RgbImage) -> Result<Self> {
        Ok(Self {
            width: image.width(),
            height: image.height(),
            data: deflate(image.as_raw())?,
        })
    }

    /// Resizes `image` to the target paper of `options`, then compresses it.
    pub fn fitted(image: &RgbImage, options: &ExportOptions) -> Result<Self> {
        let target = options.target_pixels();
        if target.0 == 0 || target.1 == 0 {
            return Err(CropError::Export(format!("{} DPI gives an empty page", options.dpi)));
        }
        Self::from_image(&fit_to_target(image, target))
    }
}

/// Resizes and compresses a batch of pages in parallel, keeping their order.
pub fn encode_batch(images: Vec<RgbImage>, options: &ExportOptions) -> Result<Vec<EncodedPage>> {
    images
        .into_par_iter()
        .map(|img| EncodedPage::fitted(&img, options))
        .collect()
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Builds a PDF with one page of the target size per pushed image, each
/// image stretched over the whole page. Pages are written as they arrive.
pub struct ImagePdfWriter {
    pdf: Pdf,
    alloc: Ref,
    page_tree_id: Ref,
    target: PageSize,
    page_ids: Vec<Ref>,
}

impl ImagePdfWriter {
    #[must_use]
    pub fn new(target: PageSize) -> Self {
        let mut alloc = Ref::new(1);
        let catalog_id = alloc.bump();
        let page_tree_id = alloc.bump();
        let mut pdf = Pdf::new();
        pdf.catalog(catalog_id).pages(page_tree_id);
        Self {
            pdf,
            alloc,
            page_tree_id,
            target,
            page_ids: Vec::new(),
        }
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    pub fn push(&mut self, page: &EncodedPage) {
        let size = self.target.points();
        let image_name = Name(b"Im0");
        let page_id = self.alloc.bump();
        let image_id = self.alloc.bump();
        let content_id = self.alloc.bump();
        self.page_ids.push(page_id);

        let mut pdf_page = self.pdf.page(page_id);
        pdf_page.media_box(pdf_writer::Rect::new(0.0, 0.0, size.width, size.height));
        pdf_page.parent(self.page_tree_id);
        pdf_page.contents(content_id);
        pdf_page.resources().x_objects().pair(image_name, image_id);
        pdf_page.finish();

        let mut xobject = self.pdf.image_xobject(image_id, &page.data);
        xobject.filter(Filter::FlateDecode);
        xobject.width(page.width as i32);
        xobject.height(page.height as i32);
        xobject.color_space().device_rgb();
        xobject.bits_per_component(8);
        xobject.finish();

        let mut content = Content::new();
        content.save_state();
        content.transform([size.width, 0.0, 0.0, size.height, 0.0, 0.0]);
        content.x_object(image_name);
        content.restore_state();
        self.pdf.stream(content_id, &content.finish());

        debug!(page = self.page_ids.len(), width = page.width, height = page.height, "page image written");
    }

    /// Writes the page tree and returns the file bytes.
    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if self.page_ids.is_empty() {
            return Err(CropError::NoPagesSelected);
        }
        let count = self.page_ids.len();
        self.pdf
            .pages(self.page_tree_id)
            .kids(self.page_ids.iter().copied())
            .count(count as i32);

        let bytes = self.pdf.finish();
        info!(pages = count, bytes = bytes.len(), target = %self.target, "export PDF assembled");
        Ok(bytes)
    }
}

/// Writes a PDF from images that already have their final pixel size.
pub fn write_image_pdf(images: &[RgbImage], target: PageSize) -> Result<Vec<u8>> {
    let mut writer = ImagePdfWriter::new(target);
    for img in images {
        writer.push(&EncodedPage::from_image(img)?);
    }
    writer.finish()
}
