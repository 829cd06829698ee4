// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Time-decayed transient strokes (laser pointer).
//!
//! A finished laser stroke stays fully opaque for `hold_ms`, then fades
//! linearly to transparent over `fade_ms` and is dropped. One shared tick
//! task drives every tracked stroke; it starts with the first stroke and is
//! cancelled as soon as none remain.
//!
//! The animator never touches pixels. [`FadeAnimator::tick`] reports which
//! surfaces need their transient layer repainted and the compositor redraws
//! them from [`FadeAnimator::visible`].

use crate::models::{Point, Stroke, Style, SurfaceTag};
use crate::schedule::{Scheduler, TaskHandle};

/// Timing of the hold/fade cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeTiming {
    pub hold_ms: u64,
    pub fade_ms: u64,
    pub frame_ms: u64,
}

impl Default for FadeTiming {
    fn default() -> Self {
        Self {
            hold_ms: 500,
            fade_ms: 2000,
            frame_ms: 16,
        }
    }
}

/// Lifecycle stage of a transient stroke at a given instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FadePhase {
    Active,
    Fading(f32),
    Expired,
}

/// A finished stroke that fades instead of being committed.
#[derive(Debug, Clone, PartialEq)]
pub struct TransientStroke {
    pub surface: SurfaceTag,
    pub style: Style,
    pub points: Vec<Point>,
    pub created_at: u64,
    pub fade_start: u64,
}

impl TransientStroke {
    pub fn new(stroke: Stroke, created_at: u64, ended_at: u64, hold_ms: u64) -> Self {
        Self {
            surface: stroke.target,
            style: stroke.style,
            points: stroke.points,
            created_at,
            fade_start: ended_at + hold_ms,
        }
    }

    pub fn phase(&self, now: u64, fade_ms: u64) -> FadePhase {
        if now < self.fade_start {
            return FadePhase::Active;
        }
        let elapsed = (now - self.fade_start) as f32;
        let opacity = if fade_ms == 0 {
            0.0
        } else {
            (1.0 - elapsed / fade_ms as f32).max(0.0)
        };
        if opacity <= 0.0 {
            FadePhase::Expired
        } else {
            FadePhase::Fading(opacity)
        }
    }

    pub fn opacity(&self, now: u64, fade_ms: u64) -> f32 {
        match self.phase(now, fade_ms) {
            FadePhase::Active => 1.0,
            FadePhase::Fading(o) => o,
            FadePhase::Expired => 0.0,
        }
    }
}

/// Tracks transient strokes across all surfaces.
#[derive(Debug)]
pub struct FadeAnimator {
    timing: FadeTiming,
    strokes: Vec<TransientStroke>,
    task: Option<TaskHandle>,
}

impl FadeAnimator {
    pub fn new(timing: FadeTiming) -> Self {
        Self {
            timing,
            strokes: Vec::new(),
            task: None,
        }
    }

    /// Track a finished stroke; starts the tick task if it is not running.
    pub fn add(
        &mut self,
        stroke: Stroke,
        started_at: u64,
        ended_at: u64,
        scheduler: &mut dyn Scheduler,
    ) {
        let transient = TransientStroke::new(stroke, started_at, ended_at, self.timing.hold_ms);
        log::debug!(
            "Tracking transient stroke on {:?}, fades at {}ms",
            transient.surface,
            transient.fade_start
        );
        self.strokes.push(transient);
        if self.task.is_none() {
            self.task = Some(scheduler.start_repeating(
                "fade",
                self.timing.frame_ms,
                ended_at,
            ));
        }
    }

    /// Age every stroke; returns the surfaces whose transient layer changed.
    ///
    /// Surfaces whose last stroke just expired are included so their overlay
    /// gets cleared.
    pub fn tick(&mut self, now: u64, scheduler: &mut dyn Scheduler) -> Vec<SurfaceTag> {
        let mut touched: Vec<SurfaceTag> = self.strokes.iter().map(|s| s.surface).collect();
        touched.sort();
        touched.dedup();

        let fade_ms = self.timing.fade_ms;
        let before = self.strokes.len();
        self.strokes
            .retain(|s| s.phase(now, fade_ms) != FadePhase::Expired);
        if self.strokes.len() != before {
            log::debug!("Expired {} transient stroke(s)", before - self.strokes.len());
        }

        if self.strokes.is_empty() {
            self.stop(scheduler);
        }
        touched
    }

    /// Visible strokes on one surface with their current opacity.
    pub fn visible(&self, surface: SurfaceTag, now: u64) -> Vec<(&TransientStroke, f32)> {
        self.strokes
            .iter()
            .filter(|s| s.surface == surface)
            .map(|s| (s, s.opacity(now, self.timing.fade_ms)))
            .filter(|(_, opacity)| *opacity > 0.0)
            .collect()
    }

    pub fn task(&self) -> Option<TaskHandle> {
        self.task
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Drop every stroke and stop ticking; returns the affected surfaces.
    pub fn clear(&mut self, scheduler: &mut dyn Scheduler) -> Vec<SurfaceTag> {
        let mut touched: Vec<SurfaceTag> = self.strokes.drain(..).map(|s| s.surface).collect();
        touched.sort();
        touched.dedup();
        self.stop(scheduler);
        touched
    }

    fn stop(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(handle) = self.task.take() {
            scheduler.cancel(handle);
        }
    }
}
