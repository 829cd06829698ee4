// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Routes pointer input to the right surface with the right style.
//!
//! The compositor owns the video surface pair and the notebook. Which of the
//! two receives ink is decided only by the notebook-mode flag, and a stroke
//! keeps the target it started on. Freehand tools paint straight onto the
//! persistent layer; shapes preview on the overlay and commit on release;
//! laser strokes stay on the overlay and are handed back to the caller for
//! fading.

use crate::config::EngineConfig;
use crate::fade::FadeAnimator;
use crate::models::{
    Color, Point, RasterSurface, SessionSettings, Snapshot, Stroke, Style, StyleRules,
    SurfacePair, SurfaceRole, SurfaceTag, Tool,
};
use crate::notebook::NotebookSurfaceManager;
use crate::render::tools;
use image::{imageops, RgbaImage};

/// What a finished pointer gesture produced.
#[derive(Debug, Clone, PartialEq)]
pub enum StrokeOutcome {
    /// Ink was written to the persistent layer of this surface.
    Committed(SurfaceTag),
    /// A laser stroke to be faded out.
    Transient { stroke: Stroke, started_at: u64 },
    Nothing,
}

#[derive(Debug, Clone)]
struct ActiveStroke {
    stroke: Stroke,
    started_at: u64,
}

pub struct SurfaceCompositor {
    video: SurfacePair,
    notebook: NotebookSurfaceManager,
    notebook_mode: bool,
    tool: Tool,
    color: Color,
    base_width: f32,
    style: Style,
    rules: StyleRules,
    preview_alpha: f32,
    arrow_head: f32,
    active: Option<ActiveStroke>,
}

impl SurfaceCompositor {
    pub fn new(
        width: u32,
        height: u32,
        notebook: NotebookSurfaceManager,
        config: &EngineConfig,
        settings: &SessionSettings,
    ) -> Self {
        let rules = config.style_rules();
        let tool = Tool::Pencil;
        Self {
            video: SurfacePair::new(SurfaceRole::Persistent, SurfaceRole::Overlay, width, height),
            notebook,
            notebook_mode: false,
            tool,
            color: settings.active_color,
            base_width: settings.brush_width,
            style: Style::derive(tool, settings.active_color, settings.brush_width, &rules),
            rules,
            preview_alpha: config.preview_alpha,
            arrow_head: config.arrow_head_px,
            active: None,
        }
    }

    // ----- target and style -----

    pub fn set_notebook_mode(&mut self, enabled: bool) {
        if self.notebook_mode != enabled {
            log::info!("Drawing target: {}", if enabled { "notebook" } else { "video" });
        }
        self.notebook_mode = enabled;
    }

    pub fn notebook_mode(&self) -> bool {
        self.notebook_mode
    }

    /// Surface that new strokes go to.
    pub fn target(&self) -> SurfaceTag {
        if self.notebook_mode {
            SurfaceTag::Notebook
        } else {
            SurfaceTag::Video
        }
    }

    /// Change tool, color and base width. Painted pixels are unaffected.
    pub fn apply_style(&mut self, tool: Tool, color: Color, width: f32) {
        self.tool = tool;
        self.color = color;
        self.base_width = width;
        self.style = Style::derive(tool, color, width, &self.rules);
    }

    pub fn active_style(&self) -> Style {
        self.style
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn active_surface(&self) -> &RasterSurface {
        &self.pair(self.target()).persistent
    }

    pub fn pair(&self, tag: SurfaceTag) -> &SurfacePair {
        match tag {
            SurfaceTag::Video => &self.video,
            SurfaceTag::Notebook => self.notebook.surfaces(),
        }
    }

    fn pair_mut(&mut self, tag: SurfaceTag) -> &mut SurfacePair {
        match tag {
            SurfaceTag::Video => &mut self.video,
            SurfaceTag::Notebook => self.notebook.surfaces_mut(),
        }
    }

    pub fn video(&self) -> &SurfacePair {
        &self.video
    }

    pub(crate) fn video_persistent_mut(&mut self) -> &mut RasterSurface {
        &mut self.video.persistent
    }

    pub fn notebook(&self) -> &NotebookSurfaceManager {
        &self.notebook
    }

    pub fn notebook_mut(&mut self) -> &mut NotebookSurfaceManager {
        &mut self.notebook
    }

    /// Erase the persistent and overlay layers of the active surface.
    pub fn clear_active(&mut self) {
        let target = self.target();
        if self.active.as_ref().is_some_and(|a| a.stroke.target == target) {
            self.active = None;
        }
        match target {
            SurfaceTag::Video => {
                self.video.persistent.clear();
                self.video.overlay.clear();
            }
            SurfaceTag::Notebook => self.notebook.clear(),
        }
        log::info!("Cleared {:?} surface", target);
    }

    /// Erase both surfaces, notebook media included.
    pub fn clear_all(&mut self) {
        self.active = None;
        self.video.persistent.clear();
        self.video.overlay.clear();
        self.notebook.reset();
        log::info!("Cleared all surfaces");
    }

    /// Resize the video surfaces; persistent ink is kept, the overlay is emptied.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.video.resize(width, height);
        log::debug!("Video surfaces resized to {}x{}", width, height);
    }

    // ----- pointer lifecycle -----

    /// Start a stroke on the current target. Text placement uses
    /// [`stamp_text`](Self::stamp_text) instead.
    pub fn pointer_down(&mut self, point: Point, now: u64) {
        if self.tool == Tool::Text {
            return;
        }
        let target = self.target();
        let stroke = Stroke::begin(target, self.style, point);
        if matches!(self.tool, Tool::Pencil | Tool::Eraser) {
            let pair = self.pair_mut(target);
            tools::draw_freehand_segment(&mut pair.persistent, point, point, &stroke.style);
        }
        self.active = Some(ActiveStroke {
            stroke,
            started_at: now,
        });
    }

    /// Extend the active stroke. Returns the surface whose pixels changed.
    pub fn pointer_move(&mut self, point: Point, fade: &FadeAnimator, now: u64) -> Option<SurfaceTag> {
        let active = self.active.as_mut()?;
        active.stroke.push(point);
        let target = active.stroke.target;
        let style = active.stroke.style;
        let from = active.stroke.previous();

        match style.tool {
            Tool::Pencil | Tool::Eraser => {
                let from = from.unwrap_or(point);
                let pair = self.pair_mut(target);
                tools::draw_freehand_segment(&mut pair.persistent, from, point, &style);
            }
            Tool::Line | Tool::Rectangle | Tool::Circle | Tool::Arrow | Tool::Laser => {
                self.refresh_overlay(target, fade, now);
            }
            Tool::Text => return None,
        }
        Some(target)
    }

    /// Finish the active stroke.
    pub fn pointer_up(&mut self, point: Point, fade: &FadeAnimator, now: u64) -> StrokeOutcome {
        let Some(ActiveStroke {
            mut stroke,
            started_at,
        }) = self.active.take()
        else {
            return StrokeOutcome::Nothing;
        };
        let extended = stroke.last() != Some(point);
        if extended {
            stroke.push(point);
        }
        let target = stroke.target;

        match stroke.style.tool {
            Tool::Pencil | Tool::Eraser => {
                // Segments up to the last move are already on the surface.
                if let (true, Some(from)) = (extended, stroke.previous()) {
                    let pair = self.pair_mut(target);
                    tools::draw_freehand_segment(&mut pair.persistent, from, point, &stroke.style);
                }
                self.after_commit(target);
                StrokeOutcome::Committed(target)
            }
            Tool::Line | Tool::Rectangle | Tool::Circle | Tool::Arrow => {
                let start = stroke.first().unwrap_or(point);
                let head = self.arrow_head;
                let pair = self.pair_mut(target);
                pair.overlay.clear();
                tools::draw_shape(&mut pair.persistent, start, point, &stroke.style, 1.0, head);
                self.after_commit(target);
                // Lasers still fading on this surface share the overlay.
                self.refresh_overlay(target, fade, now);
                StrokeOutcome::Committed(target)
            }
            Tool::Laser => StrokeOutcome::Transient { stroke, started_at },
            Tool::Text => StrokeOutcome::Nothing,
        }
    }

    /// Whether a stroke is in progress.
    pub fn is_drawing(&self) -> bool {
        self.active.is_some()
    }

    /// Drop the stroke in progress without committing it.
    pub fn cancel_stroke(&mut self, fade: &FadeAnimator, now: u64) {
        if let Some(active) = self.active.take() {
            self.refresh_overlay(active.stroke.target, fade, now);
        }
    }

    /// Stamp one line of text at `at` on the active surface.
    pub fn stamp_text(&mut self, at: Point, text: &str, font_size: u32) -> Option<SurfaceTag> {
        if text.trim().is_empty() {
            return None;
        }
        let target = self.target();
        let style = Style::derive(Tool::Text, self.color, self.base_width, &self.rules);
        let pair = self.pair_mut(target);
        tools::stamp_text(&mut pair.persistent, at, text, &style, font_size);
        self.after_commit(target);
        Some(target)
    }

    fn after_commit(&mut self, target: SurfaceTag) {
        if target == SurfaceTag::Notebook {
            self.notebook.after_content_mutation();
        }
    }

    /// Repaint the overlay of `tag` from scratch.
    ///
    /// Draws the shape preview over a copy of the persistent layer, every
    /// visible fading stroke at its current opacity, and the laser stroke in
    /// progress. Used by pointer moves and fade ticks alike.
    pub fn refresh_overlay(&mut self, tag: SurfaceTag, fade: &FadeAnimator, now: u64) {
        let preview_alpha = self.preview_alpha;
        let head = self.arrow_head;
        let active = self.active.as_ref().filter(|a| a.stroke.target == tag);
        let SurfacePair {
            persistent,
            overlay,
        } = match tag {
            SurfaceTag::Video => &mut self.video,
            SurfaceTag::Notebook => self.notebook.surfaces_mut(),
        };

        overlay.clear();
        if let Some(active) = active {
            let tool = active.stroke.style.tool;
            if tool.is_shape() {
                if let (Some(start), Some(end)) = (active.stroke.first(), active.stroke.last()) {
                    overlay.replace_with(persistent.image());
                    tools::draw_shape(overlay, start, end, &active.stroke.style, preview_alpha, head);
                }
            }
        }
        for (transient, opacity) in fade.visible(tag, now) {
            tools::draw_polyline(overlay, &transient.points, &transient.style, opacity);
        }
        if let Some(active) = active {
            if active.stroke.style.tool == Tool::Laser {
                tools::draw_polyline(overlay, &active.stroke.points, &active.stroke.style, 1.0);
            }
        }
    }

    /// Current persistent video ink.
    pub fn video_snapshot(&self) -> Snapshot {
        self.video.persistent.snapshot()
    }

    /// Everything visible on a surface, flattened.
    pub fn frame(&self, tag: SurfaceTag) -> RgbaImage {
        match tag {
            SurfaceTag::Video => {
                let mut out = self.video.persistent.image().clone();
                imageops::overlay(&mut out, self.video.overlay.image(), 0, 0);
                out
            }
            SurfaceTag::Notebook => self.notebook.compose(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fade::FadeTiming;
    use crate::notebook::{NotebookConfig, NotebookLayout};

    fn compositor() -> SurfaceCompositor {
        let settings = SessionSettings::default();
        let mut notebook =
            NotebookSurfaceManager::new(NotebookLayout::from(&settings), NotebookConfig::default());
        notebook.init(200, 150);
        SurfaceCompositor::new(100, 100, notebook, &EngineConfig::default(), &settings)
    }

    fn fade() -> FadeAnimator {
        FadeAnimator::new(FadeTiming::default())
    }

    #[test]
    fn test_rectangle_commits_and_leaves_overlay_empty() {
        let mut c = compositor();
        let f = fade();
        c.apply_style(Tool::Rectangle, Color::RED, 2.0);
        c.pointer_down(Point::new(10.0, 10.0), 0);
        c.pointer_move(Point::new(30.0, 20.0), &f, 5);
        c.pointer_move(Point::new(50.0, 30.0), &f, 10);
        assert!(!c.video().overlay.is_blank());
        assert!(c.video().persistent.is_blank());

        let outcome = c.pointer_up(Point::new(50.0, 30.0), &f, 15);
        assert_eq!(outcome, StrokeOutcome::Committed(SurfaceTag::Video));
        assert!(c.video().overlay.is_blank());
        for (x, y) in [(10, 10), (50, 10), (50, 30), (10, 30)] {
            let px = c.video().persistent.pixel(x, y).unwrap();
            assert_eq!((px.r, px.g, px.b), (255, 0, 0));
            assert_eq!(px.a, 255);
        }
        assert!(!c.video().persistent.is_painted(30, 20));
    }

    #[test]
    fn test_shape_preview_is_semi_transparent_over_ink() {
        let mut c = compositor();
        let f = fade();
        c.apply_style(Tool::Line, Color::BLACK, 3.0);
        c.pointer_down(Point::new(0.0, 50.0), 0);
        c.pointer_move(Point::new(99.0, 50.0), &f, 1);
        c.pointer_up(Point::new(99.0, 50.0), &f, 2);

        c.apply_style(Tool::Line, Color::RED, 3.0);
        c.pointer_down(Point::new(50.0, 0.0), 3);
        c.pointer_move(Point::new(50.0, 30.0), &f, 4);
        let overlay = &c.video().overlay;
        // Existing ink copied through, preview at half alpha.
        assert_eq!(overlay.pixel(10, 50).unwrap().a, 255);
        assert_eq!(overlay.pixel(50, 15).unwrap().a, 128);
    }

    #[test]
    fn test_pencil_paints_persistent_incrementally() {
        let mut c = compositor();
        let f = fade();
        c.pointer_down(Point::new(5.0, 5.0), 0);
        c.pointer_move(Point::new(40.0, 5.0), &f, 1);
        assert!(c.video().persistent.is_painted(20, 5));
        assert!(c.video().overlay.is_blank());
        assert_eq!(
            c.pointer_up(Point::new(40.0, 5.0), &f, 2),
            StrokeOutcome::Committed(SurfaceTag::Video)
        );
    }

    #[test]
    fn test_translucent_pencil_paints_each_segment_once() {
        let mut c = compositor();
        let f = fade();
        c.apply_style(Tool::Pencil, Color::rgba(255, 0, 0, 128), 3.0);
        c.pointer_down(Point::new(0.0, 10.0), 0);
        c.pointer_move(Point::new(40.0, 10.0), &f, 1);
        let after_move = c.video().persistent.pixel(20, 10).unwrap().a;
        assert_eq!(after_move, 128);

        c.pointer_up(Point::new(40.0, 10.0), &f, 2);
        assert_eq!(c.video().persistent.pixel(20, 10).unwrap().a, after_move);
    }

    #[test]
    fn test_laser_stays_on_overlay() {
        let mut c = compositor();
        let f = fade();
        c.apply_style(Tool::Laser, Color::RED, 4.0);
        c.pointer_down(Point::new(10.0, 10.0), 100);
        c.pointer_move(Point::new(60.0, 10.0), &f, 120);
        assert!(c.video().overlay.is_painted(30, 10));
        assert!(c.video().persistent.is_blank());

        match c.pointer_up(Point::new(60.0, 10.0), &f, 140) {
            StrokeOutcome::Transient { stroke, started_at } => {
                assert_eq!(started_at, 100);
                assert_eq!(stroke.target, SurfaceTag::Video);
                assert_eq!(stroke.style.alpha, 0.5);
            }
            other => panic!("expected transient stroke, got {other:?}"),
        }
        assert!(c.video().persistent.is_blank());
    }

    #[test]
    fn test_stroke_keeps_target_when_mode_changes() {
        let mut c = compositor();
        let f = fade();
        c.pointer_down(Point::new(5.0, 5.0), 0);
        c.set_notebook_mode(true);
        c.pointer_move(Point::new(20.0, 5.0), &f, 1);
        assert_eq!(
            c.pointer_up(Point::new(20.0, 5.0), &f, 2),
            StrokeOutcome::Committed(SurfaceTag::Video)
        );
        assert!(c.notebook().content().is_blank());
        assert_eq!(c.active_surface().role(), SurfaceRole::Notebook);
    }

    #[test]
    fn test_style_change_does_not_repaint_existing_ink() {
        let mut c = compositor();
        let f = fade();
        c.pointer_down(Point::new(5.0, 5.0), 0);
        c.pointer_up(Point::new(30.0, 5.0), &f, 1);
        c.apply_style(Tool::Pencil, Color::rgb(0, 0, 255), 9.0);
        assert_eq!(c.video().persistent.pixel(15, 5), Some(Color::RED));
        assert_eq!(c.active_style().width, 9.0);
    }

    #[test]
    fn test_eraser_on_notebook_keeps_guides() {
        let mut c = compositor();
        let f = fade();
        c.set_notebook_mode(true);
        c.notebook_mut().check_and_expand(0.0, 0.0, 200, 150);
        let guides_before = c.notebook().guides().clone();

        c.pointer_down(Point::new(0.0, 150.0), 0);
        c.pointer_up(Point::new(199.0, 150.0), &f, 1);
        assert!(c.notebook().content().is_painted(100, 150));

        c.apply_style(Tool::Eraser, Color::RED, 6.0);
        c.pointer_down(Point::new(0.0, 150.0), 2);
        c.pointer_up(Point::new(199.0, 150.0), &f, 3);
        assert!(!c.notebook().content().is_painted(100, 150));
        assert_eq!(c.notebook().guides(), &guides_before);
    }

    #[test]
    fn test_text_stamp_and_clear() {
        let mut c = compositor();
        c.apply_style(Tool::Text, Color::BLACK, 1.0);
        assert_eq!(
            c.stamp_text(Point::new(2.0, 2.0), "OK", 16),
            Some(SurfaceTag::Video)
        );
        assert!(!c.active_surface().is_blank());
        assert_eq!(c.stamp_text(Point::new(2.0, 2.0), "  ", 16), None);

        c.clear_active();
        assert!(c.active_surface().is_blank());
    }

    #[test]
    fn test_resize_keeps_ink() {
        let mut c = compositor();
        let f = fade();
        c.pointer_down(Point::new(5.0, 5.0), 0);
        c.pointer_up(Point::new(10.0, 5.0), &f, 1);
        c.resize(300, 200);
        assert_eq!(c.video().width(), 300);
        assert!(c.video().persistent.is_painted(7, 5));
    }
}
