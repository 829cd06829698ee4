// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Engine tuning constants.
//!
//! Every field has a default, so configuration files only need to list the
//! values they change. See [`crate::io::serialization`] for loading.

use crate::io::DecodeLimits;
use crate::models::StyleRules;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Time a finished laser stroke stays fully opaque.
    pub hold_ms: u64,
    /// Time from first fade to fully transparent.
    pub fade_ms: u64,
    /// Period of the fade tick.
    pub fade_frame_ms: u64,
    /// Saves closer than this to an existing entry update it instead.
    pub coalesce_window_secs: f64,
    /// Period of the video-time poll while playing.
    pub poll_interval_ms: u64,
    /// Distance from the notebook edge that triggers growth.
    pub expand_threshold_px: u32,
    /// Minimum page-unit change that resizes the notebook.
    pub unit_resize_threshold_px: u32,
    pub min_media_width: f32,
    pub arrow_head_px: f32,
    pub laser_width_factor: f32,
    pub laser_alpha: f32,
    pub laser_glow_px: f32,
    pub eraser_width_factor: f32,
    /// Alpha of shape previews on the overlay.
    pub preview_alpha: f32,
    /// Key under which the session blob is stored.
    pub storage_key: String,
    /// Largest notebook buffer, in bytes, a loaded session may ask for.
    pub max_notebook_bytes: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hold_ms: 500,
            fade_ms: 2000,
            fade_frame_ms: 16,
            coalesce_window_secs: 1.0,
            poll_interval_ms: 250,
            expand_threshold_px: 100,
            unit_resize_threshold_px: 10,
            min_media_width: 50.0,
            arrow_head_px: 15.0,
            laser_width_factor: 1.5,
            laser_alpha: 0.5,
            laser_glow_px: 10.0,
            eraser_width_factor: 2.0,
            preview_alpha: 0.5,
            storage_key: "vidink-session".to_string(),
            max_notebook_bytes: 512 * 1024 * 1024,
        }
    }
}

impl EngineConfig {
    pub fn style_rules(&self) -> StyleRules {
        StyleRules {
            eraser_width_factor: self.eraser_width_factor,
            laser_width_factor: self.laser_width_factor,
            laser_alpha: self.laser_alpha,
            laser_glow: self.laser_glow_px,
        }
    }

    pub fn decode_limits(&self) -> DecodeLimits {
        DecodeLimits {
            max_surface_bytes: self.max_notebook_bytes,
            min_media_width: self.min_media_width,
        }
    }
}
