// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The session: every piece of annotation state behind one owner.
//!
//! The host forwards input, player events and due tasks here. Failures are
//! caught at this boundary, logged and queued as [`Notification`]s; a failed
//! operation leaves the session as it was.

use crate::compositor::{StrokeOutcome, SurfaceCompositor};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::fade::{FadeAnimator, FadeTiming};
use crate::io::persistence::{PersistedDrawing, PersistedMedia};
use crate::io::{codec, DecodedSession, KeyValueStore, PersistedSession};
use crate::models::{Color, MediaPayload, Point, SessionSettings, SurfaceTag, Tool};
use crate::notebook::{NotebookConfig, NotebookLayout, NotebookSurfaceManager};
use crate::playback::PlaybackSync;
use crate::player::{PlayerState, VideoPlayer};
use crate::schedule::{Scheduler, TaskHandle};
use crate::timestamps::TimestampStore;
use crate::util::format_time;
use chrono::{DateTime, Utc};
use image::RgbaImage;
use log::Level;

/// A message for the user, already logged at the same level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

pub struct Session<S: Scheduler> {
    config: EngineConfig,
    settings: SessionSettings,
    compositor: SurfaceCompositor,
    timestamps: TimestampStore,
    fade: FadeAnimator,
    playback: PlaybackSync,
    scheduler: S,
    video_url: Option<String>,
    last_saved: Option<DateTime<Utc>>,
    notifications: Vec<Notification>,
}

impl<S: Scheduler> Session<S> {
    /// A blank session for a video surface and notebook viewport.
    pub fn new(
        config: EngineConfig,
        settings: SessionSettings,
        video_size: (u32, u32),
        viewport: (u32, u32),
        scheduler: S,
    ) -> Self {
        let mut notebook = NotebookSurfaceManager::new(
            NotebookLayout::from(&settings),
            NotebookConfig {
                expand_threshold: config.expand_threshold_px,
                unit_resize_threshold: config.unit_resize_threshold_px,
                min_media_width: config.min_media_width,
            },
        );
        notebook.init(viewport.0, viewport.1);
        let compositor =
            SurfaceCompositor::new(video_size.0, video_size.1, notebook, &config, &settings);
        let fade = FadeAnimator::new(FadeTiming {
            hold_ms: config.hold_ms,
            fade_ms: config.fade_ms,
            frame_ms: config.fade_frame_ms,
        });
        Self {
            timestamps: TimestampStore::new(config.coalesce_window_secs),
            playback: PlaybackSync::new(config.poll_interval_ms),
            compositor,
            fade,
            scheduler,
            settings,
            config,
            video_url: None,
            last_saved: None,
            notifications: Vec::new(),
        }
    }

    // ----- notifications -----

    fn notify(&mut self, level: Level, message: impl Into<String>) {
        let message = message.into();
        log::log!(level, "{}", message);
        self.notifications.push(Notification { level, message });
    }

    fn report(&mut self, action: &str, err: Error) {
        let level = match err {
            Error::Input(_) => Level::Warn,
            Error::Parse(_) | Error::StorageFull(_) | Error::MediaLoad(_) => Level::Error,
        };
        self.notify(level, format!("{action} failed: {err}"));
    }

    /// Drain the queued notifications.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    // ----- accessors -----

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn compositor(&self) -> &SurfaceCompositor {
        &self.compositor
    }

    pub fn notebook(&self) -> &NotebookSurfaceManager {
        self.compositor.notebook()
    }

    pub fn notebook_mut(&mut self) -> &mut NotebookSurfaceManager {
        self.compositor.notebook_mut()
    }

    pub fn timestamps(&self) -> &TimestampStore {
        &self.timestamps
    }

    pub fn fade(&self) -> &FadeAnimator {
        &self.fade
    }

    pub fn playback(&self) -> &PlaybackSync {
        &self.playback
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn video_url(&self) -> Option<&str> {
        self.video_url.as_deref()
    }

    pub fn set_video_url(&mut self, url: impl Into<String>) {
        let url = url.into();
        log::info!("Loaded video {}", url);
        self.video_url = Some(url);
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    /// Flattened view of one surface.
    pub fn frame(&self, tag: SurfaceTag) -> RgbaImage {
        self.compositor.frame(tag)
    }

    // ----- toolbar -----

    pub fn set_tool(&mut self, tool: Tool) {
        self.compositor
            .apply_style(tool, self.settings.active_color, self.settings.brush_width);
    }

    pub fn set_color(&mut self, color: Color) {
        self.settings.active_color = color;
        self.restyle();
    }

    pub fn set_brush_width(&mut self, width: f32) {
        self.settings.brush_width = width.max(1.0);
        self.restyle();
    }

    pub fn set_font(&mut self, size: u32, family: impl Into<String>) {
        self.settings.font_size = size.max(1);
        self.settings.font_family = family.into();
    }

    pub fn set_notebook_layout(&mut self, width_percent: f32, height_percent: f32, horizontal: bool) {
        self.settings.notebook_width_percent = width_percent;
        self.settings.notebook_height_percent = height_percent;
        self.settings.horizontal_growth_enabled = horizontal;
        let layout = NotebookLayout::from(&self.settings);
        self.compositor.notebook_mut().set_layout(layout);
    }

    pub fn set_notebook_mode(&mut self, enabled: bool) {
        self.compositor.set_notebook_mode(enabled);
    }

    fn restyle(&mut self) {
        let tool = self.compositor.tool();
        self.compositor
            .apply_style(tool, self.settings.active_color, self.settings.brush_width);
    }

    // ----- drawing -----

    pub fn pointer_down(&mut self, point: Point, now: u64) {
        self.compositor.pointer_down(point, now);
    }

    pub fn pointer_move(&mut self, point: Point, now: u64) {
        self.compositor.pointer_move(point, &self.fade, now);
    }

    pub fn pointer_up(&mut self, point: Point, now: u64) -> StrokeOutcome {
        let outcome = self.compositor.pointer_up(point, &self.fade, now);
        if let StrokeOutcome::Transient { stroke, started_at } = &outcome {
            let target = stroke.target;
            self.fade
                .add(stroke.clone(), *started_at, now, &mut self.scheduler);
            self.compositor.refresh_overlay(target, &self.fade, now);
        }
        outcome
    }

    /// Abandon the stroke in progress (pointer cancelled or left the surface).
    pub fn cancel_stroke(&mut self, now: u64) {
        if self.compositor.is_drawing() {
            self.compositor.cancel_stroke(&self.fade, now);
        }
    }

    /// Stamp text with the session font on the active surface.
    pub fn place_text(&mut self, at: Point, text: &str) -> bool {
        self.compositor
            .stamp_text(at, text, self.settings.font_size)
            .is_some()
    }

    pub fn clear_active(&mut self) {
        self.compositor.clear_active();
    }

    /// Drop every drawing, timestamp, fading stroke and media object.
    pub fn clear_all(&mut self) {
        self.timestamps.clear();
        self.fade.clear(&mut self.scheduler);
        self.compositor.clear_all();
        self.playback.mark_displayed(None);
        self.notify(Level::Info, "Cleared all drawings");
    }

    pub fn resize_video(&mut self, width: u32, height: u32) {
        self.compositor.resize(width, height);
    }

    pub fn resize_viewport(&mut self, width: u32, height: u32) {
        self.compositor.notebook_mut().on_viewport_resize(width, height);
    }

    /// Forward a notebook scroll; grows the notebook near its edges.
    pub fn scroll_notebook(&mut self, scroll_left: f32, scroll_top: f32, viewport_width: u32, viewport_height: u32) {
        self.compositor.notebook_mut().check_and_expand(
            scroll_left,
            scroll_top,
            viewport_width,
            viewport_height,
        );
    }

    // ----- timestamps -----

    /// Save the video drawing at the player's current time.
    pub fn save_timestamp(&mut self, player: Option<&dyn VideoPlayer>) -> Option<u64> {
        let Some(player) = player else {
            self.report(
                "Saving drawing",
                Error::Input("no video player is active".into()),
            );
            return None;
        };
        let time = player.current_time();
        let snapshot = self.compositor.video_snapshot();
        match self.timestamps.save(time, snapshot) {
            Ok(id) => {
                self.playback.mark_displayed(Some(id));
                self.notify(Level::Info, format!("Drawing saved at {}", format_time(time)));
                Some(id)
            }
            Err(e) => {
                self.report("Saving drawing", e);
                None
            }
        }
    }

    /// Remove an entry. If its drawing is on screen, the video surface is
    /// cleared with it.
    pub fn delete_timestamp(&mut self, id: u64) -> bool {
        let removed = self.timestamps.delete(id);
        if removed && self.playback.displayed() == Some(id) {
            self.compositor.video_persistent_mut().clear();
            self.playback.mark_displayed(None);
        }
        removed
    }

    /// Seek to an entry and show its drawing right away.
    pub fn jump_to_timestamp(&mut self, id: u64, player: &mut dyn VideoPlayer) -> bool {
        let Some(entry) = self.timestamps.get(id) else {
            self.report("Jumping to drawing", Error::Input(format!("no drawing with id {id}")));
            return false;
        };
        player.seek_to(entry.time);
        self.compositor
            .video_persistent_mut()
            .replace_with(entry.snapshot.image());
        log::info!("Jumped to drawing {} at {}", id, format_time(entry.time));
        self.playback.mark_displayed(Some(id));
        true
    }

    // ----- player and timers -----

    pub fn on_player_state(&mut self, state: PlayerState, now: u64) {
        self.playback.on_player_state(state, now, &mut self.scheduler);
    }

    /// Run a due task. Returns whether any surface was repainted.
    pub fn on_task(&mut self, handle: TaskHandle, now: u64, player: Option<&dyn VideoPlayer>) -> bool {
        if self.fade.task() == Some(handle) {
            let touched = self.fade.tick(now, &mut self.scheduler);
            for tag in &touched {
                self.compositor.refresh_overlay(*tag, &self.fade, now);
            }
            return !touched.is_empty();
        }
        if self.playback.poll_task() == Some(handle) {
            let Some(player) = player else {
                return false;
            };
            return self.playback.on_time_tick(
                player.current_time(),
                &self.timestamps,
                self.compositor.video_persistent_mut(),
            );
        }
        log::debug!("Ignoring stale task {:?}", handle);
        false
    }

    // ----- media -----

    /// Decode an uploaded image and place it on the notebook.
    pub fn place_media_bytes(&mut self, bytes: &[u8], at: Point) -> Option<u64> {
        match MediaPayload::decode(bytes) {
            Ok(payload) => Some(self.compositor.notebook_mut().place_media(payload, at)),
            Err(e) => {
                self.report("Placing media", e);
                None
            }
        }
    }

    /// Place one rendered document page on the notebook.
    pub fn place_document_page(
        &mut self,
        width: u32,
        height: u32,
        rgba: Vec<u8>,
        page_number: u32,
        at: Point,
    ) -> Option<u64> {
        match MediaPayload::document_page(width, height, rgba, page_number) {
            Ok(payload) => Some(self.compositor.notebook_mut().place_media(payload, at)),
            Err(e) => {
                self.report("Placing document page", e);
                None
            }
        }
    }

    // ----- persistence -----

    /// Capture the whole session as a blob.
    pub fn to_persisted(&self, now: DateTime<Utc>) -> Result<PersistedSession> {
        let drawings = self
            .timestamps
            .entries()
            .iter()
            .map(PersistedDrawing::from_entry)
            .collect::<Result<Vec<_>>>()?;
        let notebook = self.compositor.notebook();
        let media = notebook
            .media()
            .iter()
            .map(PersistedMedia::from_object)
            .collect::<Result<Vec<_>>>()?;
        let (nb_width, nb_height) = notebook.dimensions();

        let mut blob = PersistedSession {
            video_url: self.video_url.clone(),
            timestamped_drawings: Some(drawings),
            main_canvas_data: Some(codec::encode_data_url(self.compositor.video().persistent.image())?),
            infinite_canvas_data: Some(codec::encode_data_url(notebook.content().image())?),
            infinite_canvas_width: Some(nb_width),
            infinite_canvas_height: Some(nb_height),
            last_saved: Some(now),
            media_objects: (!media.is_empty()).then_some(media),
            ..Default::default()
        };
        blob.store_settings(&self.settings);
        Ok(blob)
    }

    /// Write the session under the configured key. Failures are reported,
    /// not retried.
    pub fn save_to(&mut self, store: &mut dyn KeyValueStore) -> bool {
        let now = Utc::now();
        let result = self
            .to_persisted(now)
            .and_then(|blob| blob.serialize())
            .and_then(|text| store.set(&self.config.storage_key, &text).map(|()| text.len()));
        match result {
            Ok(bytes) => {
                self.last_saved = Some(now);
                log::info!(
                    "Saved session ({} drawings, {} bytes)",
                    self.timestamps.len(),
                    bytes
                );
                true
            }
            Err(e) => {
                self.report("Saving session", e);
                false
            }
        }
    }

    /// Load the session stored under the configured key.
    ///
    /// Returns `false` when nothing is stored or the blob is unreadable; in
    /// both cases the session is unchanged.
    pub fn load_from(&mut self, store: &dyn KeyValueStore) -> bool {
        let loaded = store.get(&self.config.storage_key).and_then(|blob| {
            blob.map(|text| -> Result<_> {
                let persisted = PersistedSession::deserialize(&text)?;
                let decoded = persisted.decode(&self.config.decode_limits())?;
                Ok((persisted, decoded))
            })
            .transpose()
        });
        match loaded {
            Ok(Some((persisted, decoded))) => {
                self.restore(&persisted, decoded);
                self.notify(
                    Level::Info,
                    format!("Loaded session with {} drawings", self.timestamps.len()),
                );
                true
            }
            Ok(None) => {
                log::info!("No saved session under '{}'", self.config.storage_key);
                false
            }
            Err(e) => {
                self.report("Loading session", e);
                false
            }
        }
    }

    /// Apply a decoded blob. Fields the blob lacks keep their current value.
    pub fn restore(&mut self, persisted: &PersistedSession, decoded: DecodedSession) {
        persisted.apply_settings(&mut self.settings);
        self.restyle();
        let layout = NotebookLayout::from(&self.settings);

        let notebook = self.compositor.notebook_mut();
        notebook.set_layout(layout);
        let (current_w, current_h) = notebook.dimensions();
        notebook.restore(
            decoded.notebook_width.unwrap_or(current_w),
            decoded.notebook_height.unwrap_or(current_h),
            decoded.notebook_surface.as_ref(),
            decoded.media,
        );

        if let Some(image) = &decoded.video_surface {
            self.compositor.video_persistent_mut().replace_with(image);
        }
        if let Some(entries) = decoded.entries {
            self.timestamps.restore(entries);
            self.playback.mark_displayed(None);
        }
        if decoded.video_url.is_some() {
            self.video_url = decoded.video_url;
        }
        if decoded.last_saved.is_some() {
            self.last_saved = decoded.last_saved;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryStore;
    use crate::player::ScriptedPlayer;
    use crate::schedule::ManualScheduler;

    fn session() -> Session<ManualScheduler> {
        Session::new(
            EngineConfig::default(),
            SessionSettings::default(),
            (64, 48),
            (200, 150),
            ManualScheduler::new(),
        )
    }

    fn scribble(s: &mut Session<ManualScheduler>, y: f32, now: u64) {
        s.pointer_down(Point::new(2.0, y), now);
        s.pointer_move(Point::new(30.0, y), now + 1);
        s.pointer_up(Point::new(30.0, y), now + 2);
    }

    #[test]
    fn test_save_without_player_notifies() {
        let mut s = session();
        assert_eq!(s.save_timestamp(None), None);
        let notes = s.take_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, Level::Warn);
        assert!(s.timestamps().is_empty());
    }

    #[test]
    fn test_jump_repaints_and_seeks() {
        let mut s = session();
        let mut player = ScriptedPlayer::at(4.0);
        scribble(&mut s, 10.0, 0);
        let id = s.save_timestamp(Some(&player)).unwrap();
        s.clear_active();
        assert!(s.compositor().video().persistent.is_blank());

        player.seek_to(50.0);
        assert!(s.jump_to_timestamp(id, &mut player));
        assert_eq!(player.current_time(), 4.0);
        assert!(s.compositor().video().persistent.is_painted(10, 10));
        assert!(!s.jump_to_timestamp(999, &mut player));
    }

    #[test]
    fn test_storage_full_is_notified_and_state_kept() {
        let mut s = session();
        scribble(&mut s, 10.0, 0);
        let mut store = MemoryStore::with_quota(16);
        assert!(!s.save_to(&mut store));
        assert!(s.last_saved().is_none());
        let notes = s.take_notifications();
        assert_eq!(notes[0].level, Level::Error);
        assert!(notes[0].message.contains("storage full"));
    }

    #[test]
    fn test_malformed_blob_leaves_session_untouched() {
        let mut s = session();
        let player = ScriptedPlayer::at(2.0);
        scribble(&mut s, 10.0, 0);
        s.save_timestamp(Some(&player));

        let mut store = MemoryStore::new();
        store.set("vidink-session", "{\"timestampedDrawings\": 3").unwrap();
        assert!(!s.load_from(&store));
        assert_eq!(s.timestamps().len(), 1);
        assert!(!s.compositor().video().persistent.is_blank());
    }

    #[test]
    fn test_deleting_displayed_entry_clears_video() {
        let mut s = session();
        let mut player = ScriptedPlayer::at(6.0);
        scribble(&mut s, 10.0, 0);
        let shown = s.save_timestamp(Some(&player)).unwrap();
        s.clear_active();
        scribble(&mut s, 30.0, 10);
        player.seek_to(40.0);
        let other = s.save_timestamp(Some(&player)).unwrap();

        assert!(s.jump_to_timestamp(shown, &mut player));
        assert!(s.compositor().video().persistent.is_painted(10, 10));
        assert!(s.delete_timestamp(shown));
        assert!(s.compositor().video().persistent.is_blank());
        assert_eq!(s.playback().displayed(), None);

        // Deleting an entry that is not on screen leaves the surface alone.
        scribble(&mut s, 20.0, 20);
        assert!(s.delete_timestamp(other));
        assert!(s.compositor().video().persistent.is_painted(10, 20));
    }

    #[test]
    fn test_oversized_notebook_in_blob_is_rejected() {
        let mut s = session();
        let before = s.notebook().dimensions();
        let mut store = MemoryStore::new();
        store
            .set(
                "vidink-session",
                r#"{"infiniteCanvasWidth": 4294967295, "infiniteCanvasHeight": 4294967295}"#,
            )
            .unwrap();
        assert!(!s.load_from(&store));
        assert_eq!(s.notebook().dimensions(), before);
        assert_eq!(s.take_notifications()[0].level, Level::Error);
    }

    #[test]
    fn test_load_with_nothing_stored() {
        let mut s = session();
        assert!(!s.load_from(&MemoryStore::new()));
        assert!(s.take_notifications().is_empty());
    }

    #[test]
    fn test_bad_upload_creates_nothing() {
        let mut s = session();
        assert_eq!(s.place_media_bytes(b"nope", Point::new(0.0, 0.0)), None);
        assert!(s.notebook().media().is_empty());
        assert_eq!(s.take_notifications()[0].level, Level::Error);

        assert!(s
            .place_document_page(2, 2, vec![0; 16], 1, Point::new(0.0, 0.0))
            .is_some());
    }

    #[test]
    fn test_color_change_restyles_current_tool() {
        let mut s = session();
        s.set_tool(Tool::Laser);
        s.set_color(Color::rgb(0, 255, 0));
        let style = s.compositor().active_style();
        assert_eq!(style.tool, Tool::Laser);
        assert_eq!(style.color, Color::rgb(0, 255, 0));
        assert_eq!(style.alpha, 0.5);
    }
}
