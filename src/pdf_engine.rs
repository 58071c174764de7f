use crate::error::{CropError, Result};
use crate::export::{crop_rendered, encode_batch, ExportOptions, ImagePdfWriter};
use crate::geometry::{dpi_scale, Rotation, Size};
use crate::models::RenderedPage;
use crate::session::PageClip;
use image::{RgbImage, RgbaImage};
use pdfium_render::prelude::*;
use quick_cache::sync::Cache;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Rendered pages kept around for quick page flipping.
const PAGE_CACHE_CAPACITY: usize = 24;

// (page, rotation in degrees, scale * 10000)
type CacheKey = (usize, i32, u32);

pub struct PdfEngine<'a> {
    pdfium: &'a Pdfium,
    active_doc: Option<PdfDocument<'a>>,
    page_sizes: Vec<Size>,
    page_cache: Cache<CacheKey, RenderedPage>,
}

const fn render_rotation(rotation: Rotation) -> PdfPageRenderRotation {
    match rotation {
        Rotation::None => PdfPageRenderRotation::None,
        Rotation::Cw90 => PdfPageRenderRotation::Degrees90,
        Rotation::Cw180 => PdfPageRenderRotation::Degrees180,
        Rotation::Cw270 => PdfPageRenderRotation::Degrees270,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn cache_key(page: usize, rotation: Rotation, scale: f32) -> CacheKey {
    (page, rotation.degrees(), (scale * 10000.0).round() as u32)
}

impl<'a> PdfEngine<'a> {
    pub fn init_pdfium() -> Result<Pdfium> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name()))
            .map_err(|e| CropError::Pdfium(format!("Failed to bind to Pdfium library: {e}")))?;

        Ok(Pdfium::new(bindings))
    }

    #[must_use]
    pub fn new(pdfium: &'a Pdfium) -> Self {
        Self {
            pdfium,
            active_doc: None,
            page_sizes: Vec::new(),
            page_cache: Cache::new(PAGE_CACHE_CAPACITY),
        }
    }

    pub fn close_document(&mut self) {
        self.active_doc = None;
        self.page_sizes.clear();
        self.page_cache.clear();
    }

    /// Opens `path`, replacing any open document. Returns the page sizes in
    /// points, as pdfium lays the pages out (the page's own `/Rotate`
    /// already applied).
    pub fn open_document(&mut self, path: &Path) -> Result<Vec<Size>> {
        self.close_document();

        let doc = self.pdfium.load_pdf_from_file(path, None)?;
        let sizes: Vec<Size> = doc
            .pages()
            .iter()
            .map(|page| Size::new(page.width().value, page.height().value))
            .collect();

        info!(path = %path.display(), pages = sizes.len(), "document opened");
        self.page_sizes.clone_from(&sizes);
        self.active_doc = Some(doc);
        Ok(sizes)
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.page_sizes.len()
    }

    fn page(&self, index: usize) -> Result<PdfPage<'_>> {
        let doc = self.active_doc.as_ref().ok_or(CropError::NoDocument)?;
        let out_of_range = || CropError::PageOutOfRange {
            page: index,
            count: self.page_count(),
        };
        if index >= self.page_count() {
            return Err(out_of_range());
        }
        let index = u16::try_from(index).map_err(|_| out_of_range())?;
        Ok(doc.pages().get(index)?)
    }

    /// Renders a page at `scale` pixels per point with `rotation` applied.
    pub fn render_page(&self, index: usize, rotation: Rotation, scale: f32) -> Result<RenderedPage> {
        let key = cache_key(index, rotation, scale);
        if let Some(cached) = self.page_cache.get(&key) {
            return Ok(cached);
        }

        let bitmap = self.render(index, rotation, scale)?;
        let rendered = RenderedPage {
            page: index,
            rotation,
            scale,
            width: bitmap.width(),
            height: bitmap.height(),
            rgba: Arc::new(bitmap.into_raw()),
        };
        debug!(page = index, width = rendered.width, height = rendered.height, "page rendered");

        self.page_cache.insert(key, rendered.clone());
        Ok(rendered)
    }

    /// Renders the page behind `clip` at `dpi` and cuts the clip out of it.
    /// The page's rotation is applied before cutting.
    pub fn render_clip(&self, clip: &PageClip, dpi: u32) -> Result<RgbImage> {
        let size = *self
            .page_sizes
            .get(clip.page)
            .ok_or(CropError::PageOutOfRange {
                page: clip.page,
                count: self.page_count(),
            })?;
        // Export renders are large and used once; they bypass the page cache.
        let rendered = self.render(clip.page, clip.rotation, dpi_scale(dpi))?;
        let rotated = clip.rotation.apply(size);
        let region = clip.rotation.rotate_rect(&clip.clip, size);
        crop_rendered(&rendered, &region, (rotated.width, rotated.height))
    }

    #[allow(clippy::cast_sign_loss)]
    fn render(&self, index: usize, rotation: Rotation, scale: f32) -> Result<RgbaImage> {
        let page = self.page(index)?;
        let size = Size::new(page.width().value, page.height().value);
        // Quarter turns swap the bitmap's sides; pdfium only does that when
        // asked to rotate the constraints too.
        let render_config = PdfRenderConfig::new()
            .scale_page_by_factor(scale)
            .rotate(render_rotation(rotation), rotation.is_quarter());
        let bitmap = page.render_with_config(&render_config)?;
        let (w, h) = (bitmap.width().max(0) as u32, bitmap.height().max(0) as u32);
        check_bitmap_size(index, rotation.apply(size), scale, (w, h))?;
        RgbaImage::from_raw(w, h, bitmap.as_rgba_bytes())
            .ok_or_else(|| CropError::Export(format!("bitmap of page {} has unexpected size", index + 1)))
    }

    /// Rasterises every clip, resizes the results to the target paper and
    /// returns the bytes of the new PDF.
    pub fn export_pdf(&self, clips: &[PageClip], options: &ExportOptions) -> Result<Vec<u8>> {
        if self.active_doc.is_none() {
            return Err(CropError::NoDocument);
        }
        if clips.is_empty() {
            return Err(CropError::NoPagesSelected);
        }

        // Pdfium is single threaded: pages are rendered one by one and only
        // a batch of rasters is alive at a time while it is resized.
        let batch = rayon::current_num_threads().max(1);
        let mut writer = ImagePdfWriter::new(options.target);
        for chunk in clips.chunks(batch) {
            let images = chunk
                .iter()
                .map(|clip| self.render_clip(clip, options.dpi))
                .collect::<Result<Vec<_>>>()?;
            for page in encode_batch(images, options)? {
                writer.push(&page);
            }
            debug!(done = writer.page_count(), total = clips.len(), "export progress");
        }
        writer.finish()
    }
}

/// Pixel size of a page of `size` points (already rotated) at `scale`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn expected_pixels(size: Size, scale: f32) -> (u32, u32) {
    (
        (size.width * scale).round().max(0.0) as u32,
        (size.height * scale).round().max(0.0) as u32,
    )
}

/// Rejects a bitmap whose sides are off by more than a pixel from the
/// rotated page at `scale`.
fn check_bitmap_size(index: usize, rotated: Size, scale: f32, actual: (u32, u32)) -> Result<()> {
    let expected = expected_pixels(rotated, scale);
    if actual.0.abs_diff(expected.0) > 1 || actual.1.abs_diff(expected.1) > 1 {
        return Err(CropError::Export(format!(
            "page {} rendered as {}x{} pixels, expected {}x{}",
            index + 1,
            actual.0,
            actual.1,
            expected.0,
            expected.1
        )));
    }
    Ok(())
}
