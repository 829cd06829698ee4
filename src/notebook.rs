// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The open-ended notebook surface.
//!
//! The notebook grows one page-unit at a time as the user scrolls near its
//! bottom (and, when enabled, right) edge. Page-boundary guides live on their
//! own layer, so erasing ink never erases them; they are rebuilt after every
//! content mutation. Media objects (images, document pages) float above the
//! ink and can be dragged and resized with a locked aspect ratio.

use crate::models::{
    Color, MediaObject, MediaPayload, Point, RasterSurface, SessionSettings, SurfacePair,
    SurfaceRole,
};
use crate::render::raster::{fill_column, fill_row};
use crate::util::geometry::surface_to_screen;
use image::{imageops, RgbaImage};

const GUIDE_HEAVY: Color = Color::rgba(120, 120, 120, 255);
const GUIDE_LIGHT: Color = Color::rgba(190, 190, 190, 160);
const GUIDE_HEAVY_THICKNESS: i64 = 3;
const DASH_ON: i64 = 8;
const DASH_OFF: i64 = 6;

/// Share of the page width a freshly placed media object may take.
const PLACEMENT_WIDTH_SHARE: f32 = 0.8;

/// Page-unit sizing taken from the session settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotebookLayout {
    pub width_percent: f32,
    pub height_percent: f32,
    pub horizontal_growth: bool,
}

impl From<&SessionSettings> for NotebookLayout {
    fn from(settings: &SessionSettings) -> Self {
        Self {
            width_percent: settings.notebook_width_percent,
            height_percent: settings.notebook_height_percent,
            horizontal_growth: settings.horizontal_growth_enabled,
        }
    }
}

impl NotebookLayout {
    /// Page-unit size for the given viewport; never zero.
    pub fn page_unit(&self, viewport_width: u32, viewport_height: u32) -> (u32, u32) {
        let w = viewport_width as f32 * self.width_percent / 100.0;
        let h = viewport_height as f32 * self.height_percent / 100.0;
        (w.round().max(1.0) as u32, h.round().max(1.0) as u32)
    }
}

/// Growth and media thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotebookConfig {
    pub expand_threshold: u32,
    pub unit_resize_threshold: u32,
    pub min_media_width: f32,
}

impl Default for NotebookConfig {
    fn default() -> Self {
        Self {
            expand_threshold: 100,
            unit_resize_threshold: 10,
            min_media_width: 50.0,
        }
    }
}

/// What a call to [`NotebookSurfaceManager::check_and_expand`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpandOutcome {
    pub grew_down: bool,
    pub grew_right: bool,
}

impl ExpandOutcome {
    pub fn grew(self) -> bool {
        self.grew_down || self.grew_right
    }
}

#[derive(Debug, Clone, Copy)]
struct ResizeGesture {
    id: u64,
    base_width: f32,
}

pub struct NotebookSurfaceManager {
    surfaces: SurfacePair,
    guides: RgbaImage,
    unit: (u32, u32),
    viewport: (u32, u32),
    layout: NotebookLayout,
    config: NotebookConfig,
    media: Vec<MediaObject>,
    next_media_id: u64,
    selected: Option<u64>,
    handles: Option<[Point; 4]>,
    scroll: (f32, f32),
    resize: Option<ResizeGesture>,
    guide_redraws: u64,
}

impl NotebookSurfaceManager {
    pub fn new(layout: NotebookLayout, config: NotebookConfig) -> Self {
        Self {
            surfaces: SurfacePair::new(SurfaceRole::Notebook, SurfaceRole::NotebookOverlay, 0, 0),
            guides: RgbaImage::new(0, 0),
            unit: (0, 0),
            viewport: (0, 0),
            layout,
            config,
            media: Vec::new(),
            next_media_id: 1,
            selected: None,
            handles: None,
            scroll: (0.0, 0.0),
            resize: None,
            guide_redraws: 0,
        }
    }

    /// Size the notebook for a viewport. A fresh notebook gets one page.
    pub fn init(&mut self, viewport_width: u32, viewport_height: u32) {
        if self.surfaces.width() == 0 || self.surfaces.height() == 0 {
            self.viewport = (viewport_width, viewport_height);
            self.unit = self.compute_unit();
            self.surfaces.resize(self.unit.0, self.unit.1);
            log::info!(
                "Notebook initialized at {}x{} (page unit {}x{})",
                self.unit.0,
                self.unit.1,
                self.unit.0,
                self.unit.1
            );
            self.redraw_guides();
        } else {
            self.on_viewport_resize(viewport_width, viewport_height);
        }
    }

    fn compute_unit(&self) -> (u32, u32) {
        self.layout.page_unit(self.viewport.0, self.viewport.1)
    }

    /// Recompute the page unit; resizes the surface when it moved noticeably.
    ///
    /// Returns whether the surface was resized. The page count is kept and
    /// the surface never gets smaller.
    pub fn on_viewport_resize(&mut self, viewport_width: u32, viewport_height: u32) -> bool {
        self.viewport = (viewport_width, viewport_height);
        let next = self.compute_unit();
        let threshold = self.config.unit_resize_threshold;
        let changed = next.0.abs_diff(self.unit.0) > threshold
            || next.1.abs_diff(self.unit.1) > threshold;
        if !changed {
            return false;
        }

        let (width, height) = self.dimensions();
        let pages_x = pages(width, self.unit.0);
        let pages_y = pages(height, self.unit.1);
        self.unit = next;
        let new_width = width.max(pages_x * next.0);
        let new_height = height.max(pages_y * next.1);
        self.surfaces.resize(new_width, new_height);
        log::info!(
            "Notebook page unit now {}x{}, surface {}x{}",
            next.0,
            next.1,
            new_width,
            new_height
        );
        self.redraw_guides();
        true
    }

    /// Apply new page-unit percentages or the horizontal-growth toggle.
    pub fn set_layout(&mut self, layout: NotebookLayout) {
        self.layout = layout;
        if self.viewport != (0, 0) {
            self.on_viewport_resize(self.viewport.0, self.viewport.1);
        }
    }

    pub fn layout(&self) -> NotebookLayout {
        self.layout
    }

    /// Grow by one page-unit when the viewport nears the bottom (or right) edge.
    pub fn check_and_expand(
        &mut self,
        scroll_left: f32,
        scroll_top: f32,
        viewport_width: u32,
        viewport_height: u32,
    ) -> ExpandOutcome {
        self.scroll = (scroll_left, scroll_top);
        let (width, height) = self.dimensions();
        let threshold = self.config.expand_threshold as f32;
        let mut outcome = ExpandOutcome::default();

        if height > 0 && scroll_top + viewport_height as f32 >= height as f32 - threshold {
            outcome.grew_down = true;
        }
        if self.layout.horizontal_growth
            && width > 0
            && scroll_left + viewport_width as f32 >= width as f32 - threshold
        {
            outcome.grew_right = true;
        }

        if outcome.grew() {
            let new_width = if outcome.grew_right { width + self.unit.0 } else { width };
            let new_height = if outcome.grew_down { height + self.unit.1 } else { height };
            self.surfaces.resize(new_width, new_height);
            log::info!("Notebook expanded to {}x{}", new_width, new_height);
            self.redraw_guides();
        }
        self.refresh_handles();
        outcome
    }

    /// Rebuild guides after ink was committed or erased.
    pub fn after_content_mutation(&mut self) {
        self.redraw_guides();
    }

    /// Erase all ink; media, size and guides stay.
    pub fn clear(&mut self) {
        self.surfaces.persistent.clear();
        self.surfaces.overlay.clear();
        self.redraw_guides();
    }

    /// Full-session clear: ink, media and growth are all discarded.
    pub fn reset(&mut self) {
        self.media.clear();
        self.selected = None;
        self.handles = None;
        self.resize = None;
        self.surfaces.persistent.resize_cleared(self.unit.0, self.unit.1);
        self.surfaces.overlay.resize_cleared(self.unit.0, self.unit.1);
        log::info!("Notebook reset to one page");
        self.redraw_guides();
    }

    fn redraw_guides(&mut self) {
        let (width, height) = self.dimensions();
        let mut guides = RgbaImage::new(width, height);
        let (unit_w, unit_h) = (self.unit.0 as i64, self.unit.1 as i64);

        if unit_h > 0 {
            let mut y = unit_h;
            while y < height as i64 {
                for dy in 0..GUIDE_HEAVY_THICKNESS {
                    fill_row(&mut guides, 0, width as i64 - 1, y - GUIDE_HEAVY_THICKNESS / 2 + dy, GUIDE_HEAVY);
                }
                y += unit_h;
            }
        }
        if unit_w > 0 {
            let mut x = unit_w;
            while x < width as i64 {
                let mut y0 = 0;
                while y0 < height as i64 {
                    fill_column(&mut guides, x, y0, y0 + DASH_ON - 1, GUIDE_LIGHT);
                    y0 += DASH_ON + DASH_OFF;
                }
                x += unit_w;
            }
        }
        self.guides = guides;
        self.guide_redraws += 1;
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.surfaces.width(), self.surfaces.height())
    }

    pub fn page_unit(&self) -> (u32, u32) {
        self.unit
    }

    pub fn surfaces(&self) -> &SurfacePair {
        &self.surfaces
    }

    pub(crate) fn surfaces_mut(&mut self) -> &mut SurfacePair {
        &mut self.surfaces
    }

    pub fn content(&self) -> &RasterSurface {
        &self.surfaces.persistent
    }

    pub fn guides(&self) -> &RgbaImage {
        &self.guides
    }

    /// How many times the guide layer has been rebuilt.
    pub fn guide_revision(&self) -> u64 {
        self.guide_redraws
    }

    // ----- media objects -----

    /// Place an upload at `at` (surface coordinates); returns its id.
    pub fn place_media(&mut self, payload: MediaPayload, at: Point) -> u64 {
        let (natural_w, _) = payload.natural_size();
        let max_w = self.unit.0 as f32 * PLACEMENT_WIDTH_SHARE;
        let width = (natural_w as f32)
            .min(if max_w > 0.0 { max_w } else { natural_w as f32 })
            .max(self.config.min_media_width);
        let id = self.next_media_id;
        self.next_media_id += 1;
        let obj = MediaObject::from_payload(id, payload, at.x, at.y, width);
        log::info!(
            "Placed {:?} media {} at ({:.0}, {:.0}) size {:.0}x{:.0}",
            obj.kind,
            id,
            obj.x,
            obj.y,
            obj.width,
            obj.height
        );
        self.media.push(obj);
        id
    }

    pub fn move_media(&mut self, id: u64, dx: f32, dy: f32) -> bool {
        let Some(obj) = self.media.iter_mut().find(|m| m.id == id) else {
            return false;
        };
        obj.x += dx;
        obj.y += dy;
        self.refresh_handles();
        true
    }

    /// Set a width (clamped to the minimum); height follows the aspect ratio.
    pub fn resize_media(&mut self, id: u64, new_width: f32) -> bool {
        let min = self.config.min_media_width;
        let Some(obj) = self.media.iter_mut().find(|m| m.id == id) else {
            return false;
        };
        obj.set_width(new_width.max(min));
        self.refresh_handles();
        true
    }

    /// Remember the pre-resize width for a handle drag or pinch.
    pub fn begin_resize(&mut self, id: u64) -> bool {
        let Some(obj) = self.media.iter().find(|m| m.id == id) else {
            return false;
        };
        self.resize = Some(ResizeGesture {
            id,
            base_width: obj.width,
        });
        true
    }

    /// Handle drag: `scale = 1 + (dx + dy) / 200` of the pre-resize width.
    ///
    /// `dx`/`dy` are the total pointer travel since [`begin_resize`](Self::begin_resize).
    pub fn resize_by_drag(&mut self, id: u64, dx: f32, dy: f32) -> bool {
        self.apply_resize_scale(id, 1.0 + (dx + dy) / 200.0)
    }

    /// Two-finger pinch: ratio of current to starting finger distance.
    pub fn resize_by_pinch(&mut self, id: u64, start_distance: f32, current_distance: f32) -> bool {
        if start_distance <= f32::EPSILON {
            return false;
        }
        self.apply_resize_scale(id, current_distance / start_distance)
    }

    fn apply_resize_scale(&mut self, id: u64, scale: f32) -> bool {
        match self.resize {
            Some(gesture) if gesture.id == id => {
                self.resize_media(id, gesture.base_width * scale)
            }
            _ => false,
        }
    }

    pub fn end_resize(&mut self) {
        self.resize = None;
    }

    pub fn remove_media(&mut self, id: u64) -> bool {
        let before = self.media.len();
        self.media.retain(|m| m.id != id);
        let removed = self.media.len() != before;
        if removed {
            if self.selected == Some(id) {
                self.deselect();
            }
            if self.resize.is_some_and(|g| g.id == id) {
                self.resize = None;
            }
            log::info!("Removed media {}", id);
        }
        removed
    }

    /// Select one object, deselecting any other.
    pub fn select(&mut self, id: u64) -> bool {
        if !self.media.iter().any(|m| m.id == id) {
            return false;
        }
        self.selected = Some(id);
        self.refresh_handles();
        true
    }

    pub fn deselect(&mut self) {
        self.selected = None;
        self.handles = None;
    }

    pub fn selected(&self) -> Option<&MediaObject> {
        self.selected
            .and_then(|id| self.media.iter().find(|m| m.id == id))
    }

    /// Screen-space corners of the selected object's resize handles.
    pub fn handles(&self) -> Option<[Point; 4]> {
        self.handles
    }

    fn refresh_handles(&mut self) {
        let (left, top) = self.scroll;
        self.handles = self.selected().map(|obj| {
            obj.corners()
                .map(|(x, y)| surface_to_screen(Point::new(x, y), left, top))
        });
    }

    pub fn media(&self) -> &[MediaObject] {
        &self.media
    }

    pub fn media_object(&self, id: u64) -> Option<&MediaObject> {
        self.media.iter().find(|m| m.id == id)
    }

    /// Apply a loaded session: size first, then ink and media when present.
    pub(crate) fn restore(
        &mut self,
        width: u32,
        height: u32,
        content: Option<&RgbaImage>,
        media: Option<Vec<MediaObject>>,
    ) {
        self.surfaces.resize(width, height);
        if let Some(content) = content {
            self.surfaces.persistent.replace_with(content);
        }
        if let Some(media) = media {
            self.next_media_id = media.iter().map(|m| m.id).max().unwrap_or(0) + 1;
            self.media = media;
            self.selected = None;
            self.handles = None;
            self.resize = None;
        }
        self.redraw_guides();
    }

    /// Ink, guides, media and overlay flattened into one image.
    pub fn compose(&self) -> RgbaImage {
        let mut out = self.surfaces.persistent.image().clone();
        imageops::overlay(&mut out, &self.guides, 0, 0);
        for obj in &self.media {
            let w = obj.width.round().max(1.0) as u32;
            let h = obj.height.round().max(1.0) as u32;
            let scaled = if obj.bitmap.dimensions() == (w, h) {
                (*obj.bitmap).clone()
            } else {
                imageops::resize(&*obj.bitmap, w, h, imageops::FilterType::Triangle)
            };
            imageops::overlay(&mut out, &scaled, obj.x.round() as i64, obj.y.round() as i64);
        }
        imageops::overlay(&mut out, self.surfaces.overlay.image(), 0, 0);
        out
    }
}

fn pages(extent: u32, unit: u32) -> u32 {
    if unit == 0 {
        return 1;
    }
    ((extent as f32 / unit as f32).round() as u32).max(1)
}
