//! Per-document editing state: the current page, per-page zoom/pan/rotation,
//! the crop selection being drawn, and the crop boxes applied to pages.
//!
//! The selection is kept in view space (canvas pixels at zoom 1, no pan) so
//! it stays put while the user zooms or pans. It is only pushed through the
//! page mapping when it is applied or exported. Applied crop boxes are stored
//! in canonical page space (unrotated, top-left origin, points), which makes
//! them independent of later rotation or zoom.

use crate::error::{CropError, Result};
use crate::geometry::{DisplayMapping, Point, Rect, Rotation, Size, ViewTransform};
use crate::models::PageState;
use crate::settings::CropSettings;
use std::collections::BTreeMap;
use tracing::debug;

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Idle,
    Selecting { origin: Point, current: Point },
    Panning { last: Point },
}

/// Region of one page to rasterise on export, in canonical page space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageClip {
    pub page: usize,
    pub clip: Rect,
    pub rotation: Rotation,
}

#[derive(Debug, Clone)]
pub struct CropSession {
    pages: Vec<Size>,
    states: Vec<PageState>,
    current_page: usize,
    crop_rect: Option<Rect>,
    last_crop_rect: Option<Rect>,
    gesture: Gesture,
    cropboxes: BTreeMap<usize, Rect>,
    display_scale: f32,
}

impl CropSession {
    /// `pages` are the unrotated page sizes in points.
    #[must_use]
    pub fn new(pages: Vec<Size>, display_scale: f32) -> Self {
        let states = vec![PageState::default(); pages.len()];
        Self {
            pages,
            states,
            current_page: 0,
            crop_rect: None,
            last_crop_rect: None,
            gesture: Gesture::Idle,
            cropboxes: BTreeMap::new(),
            display_scale,
        }
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub const fn current_page(&self) -> usize {
        self.current_page
    }

    #[must_use]
    pub fn page_label(&self) -> String {
        format!("Page {} of {}", self.current_page + 1, self.page_count().max(1))
    }

    #[must_use]
    pub fn current_state(&self) -> PageState {
        self.states
            .get(self.current_page)
            .copied()
            .unwrap_or_default()
    }

    fn current_state_mut(&mut self) -> Option<&mut PageState> {
        self.states.get_mut(self.current_page)
    }

    #[must_use]
    pub fn page_state(&self, page: usize) -> Option<&PageState> {
        self.states.get(page)
    }

    #[must_use]
    pub const fn crop_rect(&self) -> Option<Rect> {
        self.crop_rect
    }

    #[must_use]
    pub const fn last_crop_rect(&self) -> Option<Rect> {
        self.last_crop_rect
    }

    #[must_use]
    pub const fn gesture(&self) -> Gesture {
        self.gesture
    }

    #[must_use]
    pub fn cropbox(&self, page: usize) -> Option<Rect> {
        self.cropboxes.get(&page).copied()
    }

    #[must_use]
    pub const fn cropboxes(&self) -> &BTreeMap<usize, Rect> {
        &self.cropboxes
    }

    #[must_use]
    pub const fn display_scale(&self) -> f32 {
        self.display_scale
    }

    // --- navigation ---

    pub fn next_page(&mut self) -> bool {
        if self.current_page + 1 < self.page_count() {
            self.current_page += 1;
            self.gesture = Gesture::Idle;
            true
        } else {
            false
        }
    }

    pub fn prev_page(&mut self) -> bool {
        if self.current_page > 0 {
            self.current_page -= 1;
            self.gesture = Gesture::Idle;
            true
        } else {
            false
        }
    }

    pub fn go_to(&mut self, page: usize) -> Result<()> {
        if page >= self.page_count() {
            return Err(CropError::PageOutOfRange {
                page,
                count: self.page_count(),
            });
        }
        self.current_page = page;
        self.gesture = Gesture::Idle;
        Ok(())
    }

    // --- view state ---

    /// Multiplies the current page's zoom by `factor`, clamped to
    /// [`MIN_ZOOM`, `MAX_ZOOM`]. Returns the new zoom.
    pub fn adjust_zoom(&mut self, factor: f32) -> f32 {
        let zoom = self.current_state().scale_factor * factor;
        self.set_zoom(zoom)
    }

    pub fn set_zoom(&mut self, zoom: f32) -> f32 {
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        if let Some(state) = self.current_state_mut() {
            state.scale_factor = zoom;
        }
        zoom
    }

    pub fn reset_zoom(&mut self) {
        self.set_zoom(1.0);
    }

    pub fn rotate(&mut self) -> Rotation {
        match self.current_state_mut() {
            Some(state) => {
                state.rotation = state.rotation.next();
                state.rotation
            }
            None => Rotation::None,
        }
    }

    #[must_use]
    pub fn view_transform(&self) -> ViewTransform {
        let state = self.current_state();
        ViewTransform {
            zoom: state.scale_factor,
            offset: Point::new(state.x_offset, state.y_offset),
        }
    }

    /// Mapping between the current page (as displayed, i.e. rotated) and
    /// the unzoomed view.
    #[must_use]
    pub fn display_mapping(&self) -> Option<DisplayMapping> {
        self.mapping_for(self.current_page)
    }

    fn mapping_for(&self, page: usize) -> Option<DisplayMapping> {
        let size = *self.pages.get(page)?;
        let rotation = self.states.get(page).map(|s| s.rotation).unwrap_or_default();
        Some(DisplayMapping::new(rotation.apply(size), self.display_scale))
    }

    // --- pointer gestures ---

    /// Mouse button pressed at canvas point `p`. With `pan` set the drag
    /// moves the page, otherwise it starts a new selection.
    pub fn press(&mut self, p: Point, pan: bool) {
        self.gesture = if pan {
            Gesture::Panning { last: p }
        } else {
            Gesture::Selecting {
                origin: p,
                current: p,
            }
        };
    }

    pub fn drag(&mut self, p: Point) {
        match self.gesture {
            Gesture::Panning { last } => {
                let (dx, dy) = (p.x - last.x, p.y - last.y);
                if let Some(state) = self.current_state_mut() {
                    state.x_offset += dx;
                    state.y_offset += dy;
                }
                self.gesture = Gesture::Panning { last: p };
            }
            Gesture::Selecting { origin, .. } => {
                self.gesture = Gesture::Selecting { origin, current: p };
            }
            Gesture::Idle => {}
        }
    }

    /// Mouse button released at canvas point `p`. Finishing a selection
    /// stores it in view space; a selection without area clears it.
    pub fn release(&mut self, p: Point) {
        if let Gesture::Selecting { origin, .. } = self.gesture {
            let view = self.view_transform();
            let rect = Rect::from_corners(view.canvas_to_view(origin), view.canvas_to_view(p));
            self.crop_rect = (!rect.is_empty()).then_some(rect);
            debug!(crop_rect = ?self.crop_rect, "selection finished");
        }
        self.gesture = Gesture::Idle;
    }

    /// Live selection in canvas coordinates while dragging.
    #[must_use]
    pub fn selection_preview(&self) -> Option<Rect> {
        match self.gesture {
            Gesture::Selecting { origin, current } => Some(Rect::from_corners(origin, current)),
            _ => None,
        }
    }

    /// Selection to draw on the canvas: the live drag, or the committed
    /// selection under the current zoom and pan.
    #[must_use]
    pub fn selection_on_canvas(&self) -> Option<Rect> {
        match self.gesture {
            Gesture::Selecting { .. } => self.selection_preview(),
            _ => self
                .crop_rect
                .map(|r| self.view_transform().view_to_canvas(&r)),
        }
    }

    /// Applied crop box of the current page in canvas coordinates.
    #[must_use]
    pub fn cropbox_on_canvas(&self) -> Option<Rect> {
        let cropbox = self.cropbox(self.current_page)?;
        let size = *self.pages.get(self.current_page)?;
        let mapping = self.display_mapping()?;
        let rotated = self.current_state().rotation.rotate_rect(&cropbox, size);
        Some(
            self.view_transform()
                .view_to_canvas(&mapping.page_to_view(&rotated)),
        )
    }

    /// Size of the selection in screen pixels, for the status label.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn crop_size(&self) -> Option<(u32, u32)> {
        self.selection_on_canvas()
            .map(|r| (r.width() as u32, r.height() as u32))
    }

    #[must_use]
    pub fn crop_size_label(&self) -> String {
        match self.crop_size() {
            Some((w, h)) => format!("Crop size: {w}x{h} px"),
            None => "Crop size: N/A".to_string(),
        }
    }

    pub fn clear_crop(&mut self) {
        self.crop_rect = None;
        if matches!(self.gesture, Gesture::Selecting { .. }) {
            self.gesture = Gesture::Idle;
        }
    }

    // --- crop geometry ---

    /// The selection mapped through the current page into canonical page space.
    #[must_use]
    pub fn crop_in_page_space(&self) -> Option<Rect> {
        let rect = self.crop_rect?;
        let size = *self.pages.get(self.current_page)?;
        let mapping = self.display_mapping()?;
        let rotated = mapping.view_to_page(&rect);
        Some(self.current_state().rotation.unrotate_rect(&rotated, size))
    }

    /// Applies the selection as crop box to every page.
    pub fn apply_to_all(&mut self) -> Result<usize> {
        let pages: Vec<usize> = (0..self.page_count()).collect();
        self.apply_crop(&pages)
    }

    /// Applies the selection as crop box to `pages`; indices outside the
    /// document are skipped.
    pub fn apply_to_pages(&mut self, pages: &[usize]) -> Result<usize> {
        if self.crop_rect.is_none() {
            return Err(CropError::NoCropRegion);
        }
        if pages.is_empty() {
            return Err(CropError::NoPagesSelected);
        }
        self.apply_crop(pages)
    }

    fn apply_crop(&mut self, pages: &[usize]) -> Result<usize> {
        let cropbox = self.crop_in_page_space().ok_or(CropError::NoCropRegion)?;
        let count = self.page_count();
        let mut applied = 0;
        for &page in pages.iter().filter(|&&p| p < count) {
            self.cropboxes.insert(page, cropbox);
            applied += 1;
        }
        self.last_crop_rect = self.crop_rect;
        debug!(?cropbox, applied, "crop box applied");
        Ok(applied)
    }

    /// Drops every applied crop box and resets all page view state.
    pub fn reset_cropboxes(&mut self) {
        self.cropboxes.clear();
        self.states.fill(PageState::default());
        self.crop_rect = None;
        self.last_crop_rect = None;
        self.gesture = Gesture::Idle;
    }

    /// Regions to rasterise for `pages`: the current selection if there is
    /// one, otherwise each page's applied crop box, otherwise the full page.
    #[must_use]
    pub fn export_clips(&self, pages: &[usize]) -> Vec<PageClip> {
        let selection = self.crop_in_page_space();
        pages
            .iter()
            .filter_map(|&page| {
                let size = *self.pages.get(page)?;
                let full = Rect::from_size(size);
                let clip = selection
                    .or_else(|| self.cropbox(page))
                    .map_or(full, |r| r.intersect(&full));
                let rotation = self.states.get(page).map(|s| s.rotation).unwrap_or_default();
                (!clip.is_empty()).then_some(PageClip {
                    page,
                    clip,
                    rotation,
                })
            })
            .collect()
    }

    // --- persistence ---

    #[must_use]
    pub fn to_settings(&self) -> CropSettings {
        CropSettings {
            crop_rect: self.crop_rect,
            page_states: self.states.iter().copied().enumerate().collect(),
            cropboxes: self.cropboxes.clone(),
            page_size: None,
        }
    }

    /// Restores a saved selection, page states and crop boxes. Entries for
    /// pages this document does not have are ignored; pages without a saved
    /// state keep their current one.
    pub fn load_settings(&mut self, settings: &CropSettings) {
        let count = self.page_count();
        self.crop_rect = settings.crop_rect.filter(|r| !r.is_empty());
        for (&page, state) in settings.page_states.range(..count) {
            self.states[page] = PageState {
                scale_factor: state.scale_factor.clamp(MIN_ZOOM, MAX_ZOOM),
                ..*state
            };
        }
        self.cropboxes = settings
            .cropboxes
            .range(..count)
            .map(|(&page, &rect)| (page, rect))
            .collect();
        self.gesture = Gesture::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A4: Size = Size::new(595.0, 842.0);

    fn session(pages: usize) -> CropSession {
        CropSession::new(vec![A4; pages], 1.0)
    }

    fn drag(s: &mut CropSession, from: (f32, f32), to: (f32, f32)) {
        s.press(Point::new(from.0, from.1), false);
        s.drag(Point::new((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0));
        s.drag(Point::new(to.0, to.1));
        s.release(Point::new(to.0, to.1));
    }

    fn approx(a: &Rect, b: &Rect) -> bool {
        (a.x0 - b.x0).abs() < 1e-3
            && (a.y0 - b.y0).abs() < 1e-3
            && (a.x1 - b.x1).abs() < 1e-3
            && (a.y1 - b.y1).abs() < 1e-3
    }

    #[test]
    fn test_navigation_stops_at_ends() {
        let mut s = session(3);
        assert!(!s.prev_page());
        assert!(s.next_page());
        assert!(s.next_page());
        assert!(!s.next_page());
        assert_eq!(s.current_page(), 2);
        assert_eq!(s.page_label(), "Page 3 of 3");
        assert!(s.go_to(3).is_err());
        s.go_to(0).unwrap();
        assert_eq!(s.current_page(), 0);
    }

    #[test]
    fn test_empty_document_label() {
        let s = CropSession::new(Vec::new(), 0.75);
        assert_eq!(s.page_label(), "Page 1 of 1");
    }

    #[test]
    fn test_zoom_is_clamped_and_per_page() {
        let mut s = session(2);
        for _ in 0..40 {
            s.adjust_zoom(1.1);
        }
        assert_eq!(s.current_state().scale_factor, MAX_ZOOM);
        for _ in 0..80 {
            s.adjust_zoom(0.9);
        }
        assert_eq!(s.current_state().scale_factor, MIN_ZOOM);

        s.next_page();
        assert_eq!(s.current_state().scale_factor, 1.0);
        s.prev_page();
        assert_eq!(s.current_state().scale_factor, MIN_ZOOM);
        s.reset_zoom();
        assert_eq!(s.current_state().scale_factor, 1.0);
    }

    #[test]
    fn test_rotation_cycles_per_page() {
        let mut s = session(2);
        assert_eq!(s.rotate(), Rotation::Cw90);
        assert_eq!(s.rotate(), Rotation::Cw180);
        s.next_page();
        assert_eq!(s.current_state().rotation, Rotation::None);
    }

    #[test]
    fn test_selection_at_identity_view() {
        let mut s = session(1);
        drag(&mut s, (200.0, 300.0), (100.0, 50.0));
        assert_eq!(s.crop_rect(), Some(Rect::new(100.0, 50.0, 200.0, 300.0)));
        assert_eq!(s.gesture(), Gesture::Idle);
        assert_eq!(s.crop_size_label(), "Crop size: 100x250 px");
    }

    #[test]
    fn test_selection_is_unzoomed_and_unpanned() {
        let mut s = session(1);
        s.set_zoom(2.0);
        s.press(Point::new(0.0, 0.0), true);
        s.drag(Point::new(40.0, 10.0));
        s.release(Point::new(40.0, 10.0));
        assert_eq!(s.current_state().x_offset, 40.0);
        assert_eq!(s.current_state().y_offset, 10.0);

        drag(&mut s, (140.0, 110.0), (240.0, 210.0));
        assert_eq!(s.crop_rect(), Some(Rect::new(50.0, 50.0, 100.0, 100.0)));
        // Shown back on the canvas where it was drawn.
        assert_eq!(
            s.selection_on_canvas(),
            Some(Rect::new(140.0, 110.0, 240.0, 210.0))
        );
    }

    #[test]
    fn test_pan_accumulates_deltas() {
        let mut s = session(1);
        s.press(Point::new(10.0, 10.0), true);
        s.drag(Point::new(15.0, 12.0));
        s.drag(Point::new(25.0, 2.0));
        s.release(Point::new(25.0, 2.0));
        let state = s.current_state();
        assert_eq!((state.x_offset, state.y_offset), (15.0, -8.0));
        assert!(s.crop_rect().is_none());
    }

    #[test]
    fn test_click_without_drag_clears_selection() {
        let mut s = session(1);
        drag(&mut s, (0.0, 0.0), (50.0, 50.0));
        assert!(s.crop_rect().is_some());
        drag(&mut s, (10.0, 10.0), (10.0, 10.0));
        assert!(s.crop_rect().is_none());
        assert_eq!(s.crop_size_label(), "Crop size: N/A");
    }

    #[test]
    fn test_live_size_while_dragging() {
        let mut s = session(1);
        s.press(Point::new(10.0, 10.0), false);
        s.drag(Point::new(60.0, 30.0));
        assert_eq!(s.crop_size(), Some((50, 20)));
        assert_eq!(s.selection_preview(), Some(Rect::new(10.0, 10.0, 60.0, 30.0)));
    }

    #[test]
    fn test_crop_in_page_space_uses_display_scale() {
        let mut s = CropSession::new(vec![A4], 0.75);
        drag(&mut s, (0.0, 0.0), (75.0, 150.0));
        let page = s.crop_in_page_space().unwrap();
        assert!(approx(&page, &Rect::new(0.0, 0.0, 100.0, 200.0)), "{page:?}");
    }

    #[test]
    fn test_crop_in_page_space_undoes_rotation() {
        let mut s = session(1);
        s.rotate();
        // Rotated page is 842 wide; the right-most strip of the rotated
        // page is the top strip of the unrotated page.
        drag(&mut s, (742.0, 0.0), (842.0, 595.0));
        let page = s.crop_in_page_space().unwrap();
        assert!(approx(&page, &Rect::new(0.0, 0.0, 595.0, 100.0)), "{page:?}");
    }

    #[test]
    fn test_apply_requires_selection() {
        let mut s = session(2);
        assert!(matches!(s.apply_to_all(), Err(CropError::NoCropRegion)));
        assert!(matches!(s.apply_to_pages(&[0]), Err(CropError::NoCropRegion)));
        drag(&mut s, (0.0, 0.0), (10.0, 10.0));
        assert!(matches!(s.apply_to_pages(&[]), Err(CropError::NoPagesSelected)));
    }

    #[test]
    fn test_apply_to_all_and_selected() {
        let mut s = session(4);
        drag(&mut s, (10.0, 20.0), (110.0, 220.0));
        assert_eq!(s.apply_to_pages(&[1, 3, 9]).unwrap(), 2);
        assert!(s.cropbox(0).is_none());
        assert_eq!(s.cropbox(1), Some(Rect::new(10.0, 20.0, 110.0, 220.0)));
        assert_eq!(s.cropbox(3), s.cropbox(1));
        assert_eq!(s.last_crop_rect(), s.crop_rect());

        assert_eq!(s.apply_to_all().unwrap(), 4);
        assert_eq!(s.cropboxes().len(), 4);
    }

    #[test]
    fn test_cropbox_follows_rotation_on_canvas() {
        let mut s = session(1);
        drag(&mut s, (0.0, 0.0), (595.0, 100.0));
        s.apply_to_all().unwrap();
        s.rotate();
        let shown = s.cropbox_on_canvas().unwrap();
        assert!(approx(&shown, &Rect::new(742.0, 0.0, 842.0, 595.0)), "{shown:?}");
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut s = session(2);
        s.set_zoom(3.0);
        s.rotate();
        drag(&mut s, (0.0, 0.0), (10.0, 10.0));
        s.apply_to_all().unwrap();
        s.reset_cropboxes();
        assert!(s.cropboxes().is_empty());
        assert!(s.crop_rect().is_none());
        assert!(s.last_crop_rect().is_none());
        assert_eq!(s.current_state(), PageState::default());
    }

    #[test]
    fn test_export_clips_priority() {
        let mut s = session(3);
        drag(&mut s, (0.0, 0.0), (100.0, 100.0));
        s.apply_to_pages(&[1]).unwrap();
        s.clear_crop();

        let clips = s.export_clips(&[0, 1, 7]);
        assert_eq!(clips.len(), 2);
        assert_eq!(clips[0].clip, Rect::from_size(A4));
        assert_eq!(clips[1].clip, Rect::new(0.0, 0.0, 100.0, 100.0));

        drag(&mut s, (50.0, 50.0), (60.0, 70.0));
        let clips = s.export_clips(&[0, 1]);
        assert!(clips.iter().all(|c| c.clip == Rect::new(50.0, 50.0, 60.0, 70.0)));
    }

    #[test]
    fn test_export_clip_is_clamped_to_page() {
        let mut s = session(1);
        drag(&mut s, (-50.0, -50.0), (100.0, 2000.0));
        let clips = s.export_clips(&[0]);
        assert_eq!(clips[0].clip, Rect::new(0.0, 0.0, 100.0, 842.0));
    }

    #[test]
    fn test_export_clip_carries_page_rotation() {
        let mut s = session(2);
        s.next_page();
        s.rotate();
        let clips = s.export_clips(&[0, 1]);
        assert_eq!(clips[0].rotation, Rotation::None);
        assert_eq!(clips[1].rotation, Rotation::Cw90);
    }

    #[test]
    fn test_settings_round_trip_through_session() {
        let mut s = session(3);
        s.set_zoom(2.5);
        s.rotate();
        drag(&mut s, (10.0, 10.0), (30.0, 40.0));
        s.apply_to_pages(&[2]).unwrap();
        let saved = s.to_settings();

        let mut other = session(3);
        other.load_settings(&saved);
        assert_eq!(other.crop_rect(), s.crop_rect());
        assert_eq!(other.current_state(), s.current_state());
        assert_eq!(other.cropboxes(), s.cropboxes());
    }

    #[test]
    fn test_load_settings_ignores_pages_beyond_document() {
        let mut big = session(5);
        big.go_to(4).unwrap();
        big.set_zoom(4.0);
        drag(&mut big, (0.0, 0.0), (10.0, 10.0));
        big.apply_to_all().unwrap();
        let saved = big.to_settings();

        let mut small = session(2);
        small.load_settings(&saved);
        assert_eq!(small.cropboxes().len(), 2);
        assert_eq!(small.page_state(1).unwrap().scale_factor, 1.0);
    }
}
