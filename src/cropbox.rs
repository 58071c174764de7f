//! Lossless crop: writes the applied crop boxes into a copy of the source
//! PDF as `/CropBox` entries. Page content is left untouched.

use crate::error::{CropError, Result};
use crate::geometry::{Rect, Rotation, Size};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// US Letter, used when a page carries no usable box at all.
const FALLBACK_BOX: Rect = Rect::new(0.0, 0.0, 612.0, 792.0);

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Looks `key` up on the page dictionary, then up the `/Parent` chain.
fn inherited<'a>(doc: &'a Document, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut dict = page;
    // Bounded walk; page trees are shallow and cycles must not hang us.
    for _ in 0..32 {
        if let Ok(obj) = dict.get(key) {
            return resolve(doc, obj);
        }
        let parent = dict.get(b"Parent").ok().and_then(|p| resolve(doc, p))?;
        dict = parent.as_dict().ok()?;
    }
    None
}

fn box_values(doc: &Document, obj: &Object) -> Option<Rect> {
    let arr = obj.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let mut v = [0.0_f32; 4];
    for (slot, item) in v.iter_mut().zip(arr) {
        *slot = resolve(doc, item)?.as_float().ok()?;
    }
    // Boxes may list any two opposite corners.
    Some(Rect::new(
        v[0].min(v[2]),
        v[1].min(v[3]),
        v[0].max(v[2]),
        v[1].max(v[3]),
    ))
}

/// Visible box of a page in PDF user space: `/CropBox`, else `/MediaBox`,
/// both possibly inherited.
#[must_use]
pub fn page_box(doc: &Document, page: &Dictionary) -> Rect {
    let media = inherited(doc, page, b"MediaBox").and_then(|o| box_values(doc, o));
    let crop = inherited(doc, page, b"CropBox").and_then(|o| box_values(doc, o));
    match (crop, media) {
        (Some(c), Some(m)) => {
            let clipped = c.intersect(&m);
            if clipped.is_empty() { m } else { clipped }
        }
        (Some(b), None) | (None, Some(b)) => b,
        (None, None) => {
            warn!("page without MediaBox, assuming Letter");
            FALLBACK_BOX
        }
    }
}

/// The page's own `/Rotate`, possibly inherited.
#[must_use]
pub fn page_rotation(doc: &Document, page: &Dictionary) -> Rotation {
    inherited(doc, page, b"Rotate")
        .and_then(|o| o.as_i64().ok())
        .and_then(|d| i32::try_from(d).ok())
        .and_then(|d| Rotation::try_from(d).ok())
        .unwrap_or_default()
}

/// Converts a crop rectangle given on the page as displayed (top-left
/// origin, points, the page's own `/Rotate` applied) into a `/CropBox`
/// in PDF user space.
#[must_use]
pub fn cropbox_for(rect: &Rect, page_box: &Rect, rotation: Rotation) -> Rect {
    let size = Size::new(page_box.width(), page_box.height());
    let unrotated = rotation.unrotate_rect(rect, size);
    unrotated.to_pdf_box(page_box)
}

fn box_object(r: &Rect) -> Object {
    Object::Array(vec![
        Object::Real(r.x0),
        Object::Real(r.y0),
        Object::Real(r.x1),
        Object::Real(r.y1),
    ])
}

/// Sets `/CropBox` on every page in `cropboxes` (zero-based index to
/// rectangle). Pages outside the document are skipped. Returns how many
/// pages were changed.
pub fn apply_cropboxes(doc: &mut Document, cropboxes: &BTreeMap<usize, Rect>) -> Result<usize> {
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
    let mut changed = 0;

    for (&index, rect) in cropboxes {
        let Some(&page_id) = pages.get(index) else {
            warn!(page = index + 1, count = pages.len(), "crop box for missing page skipped");
            continue;
        };

        let page = doc.get_dictionary(page_id)?;
        let pdf_box = cropbox_for(rect, &page_box(doc, page), page_rotation(doc, page));
        if pdf_box.is_empty() {
            warn!(page = index + 1, ?rect, "crop box outside the page skipped");
            continue;
        }

        doc.get_dictionary_mut(page_id)?
            .set("CropBox", box_object(&pdf_box));
        debug!(page = index + 1, ?pdf_box, "CropBox set");
        changed += 1;
    }

    Ok(changed)
}

/// Loads `src`, applies `cropboxes` and writes the result to `dst`.
pub fn save_with_cropboxes(src: &Path, dst: &Path, cropboxes: &BTreeMap<usize, Rect>) -> Result<usize> {
    if cropboxes.is_empty() {
        return Err(CropError::NoCropRegion);
    }
    let mut doc = Document::load(src)?;
    let changed = apply_cropboxes(&mut doc, cropboxes)?;
    doc.save(dst)?;
    info!(src = %src.display(), dst = %dst.display(), pages = changed, "cropped PDF saved");
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn doc_with_pages(media: [i64; 4], rotate: Option<i64>, n: usize) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();
        for _ in 0..n {
            let mut page = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
            };
            if let Some(r) = rotate {
                page.set("Rotate", r);
            }
            kids.push(Object::Reference(doc.add_object(page)));
        }
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => i64::try_from(n).unwrap(),
            "MediaBox" => media.iter().map(|&v| Object::Integer(v)).collect::<Vec<_>>(),
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    fn first_page(doc: &Document) -> &Dictionary {
        let id = *doc.get_pages().values().next().unwrap();
        doc.get_dictionary(id).unwrap()
    }

    #[test]
    fn test_page_box_is_inherited_from_parent() {
        let doc = doc_with_pages([0, 0, 595, 842], None, 1);
        assert_eq!(page_box(&doc, first_page(&doc)), Rect::new(0.0, 0.0, 595.0, 842.0));
    }

    #[test]
    fn test_crop_box_wins_over_media_box() {
        let mut doc = doc_with_pages([0, 0, 595, 842], None, 1);
        let id = *doc.get_pages().values().next().unwrap();
        doc.get_dictionary_mut(id)
            .unwrap()
            .set("CropBox", box_object(&Rect::new(10.0, 20.0, 300.0, 400.0)));
        assert_eq!(page_box(&doc, first_page(&doc)), Rect::new(10.0, 20.0, 300.0, 400.0));
    }

    #[test]
    fn test_cropbox_for_flips_y() {
        let page = Rect::new(0.0, 0.0, 595.0, 842.0);
        let pdf = cropbox_for(&Rect::new(0.0, 0.0, 100.0, 200.0), &page, Rotation::None);
        assert_eq!(pdf, Rect::new(0.0, 642.0, 100.0, 842.0));
    }

    #[test]
    fn test_cropbox_for_offset_page_box() {
        let page = Rect::new(50.0, 100.0, 350.0, 500.0);
        let pdf = cropbox_for(&Rect::new(10.0, 10.0, 20.0, 30.0), &page, Rotation::None);
        assert_eq!(pdf, Rect::new(60.0, 470.0, 70.0, 490.0));
    }

    #[test]
    fn test_cropbox_for_undoes_page_rotate() {
        // Portrait page shown landscape: the right strip on screen is the
        // top strip of the unrotated page.
        let page = Rect::new(0.0, 0.0, 595.0, 842.0);
        let pdf = cropbox_for(&Rect::new(742.0, 0.0, 842.0, 595.0), &page, Rotation::Cw90);
        assert_eq!(pdf, Rect::new(0.0, 742.0, 595.0, 842.0));
    }

    #[test]
    fn test_apply_cropboxes_skips_missing_pages() {
        let mut doc = doc_with_pages([0, 0, 200, 200], None, 2);
        let mut boxes = BTreeMap::new();
        boxes.insert(1, Rect::new(0.0, 0.0, 50.0, 50.0));
        boxes.insert(5, Rect::new(0.0, 0.0, 50.0, 50.0));
        assert_eq!(apply_cropboxes(&mut doc, &boxes).unwrap(), 1);

        let ids: Vec<_> = doc.get_pages().into_values().collect();
        assert!(doc.get_dictionary(ids[0]).unwrap().get(b"CropBox").is_err());
        let set = doc.get_dictionary(ids[1]).unwrap().get(b"CropBox").unwrap();
        assert_eq!(box_values(&doc, set), Some(Rect::new(0.0, 150.0, 50.0, 200.0)));
    }

    #[test]
    fn test_page_rotation_is_read() {
        let doc = doc_with_pages([0, 0, 100, 100], Some(270), 1);
        assert_eq!(page_rotation(&doc, first_page(&doc)), Rotation::Cw270);
        let doc = doc_with_pages([0, 0, 100, 100], Some(45), 1);
        assert_eq!(page_rotation(&doc, first_page(&doc)), Rotation::None);
    }
}
