// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Session settings mutated by toolbar actions.

use super::style::Color;
use serde::{Deserialize, Serialize};

/// Process-wide drawing settings, persisted verbatim with the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub active_color: Color,
    pub brush_width: f32,
    pub font_size: u32,
    pub font_family: String,
    /// Page-unit width as a percentage of the viewport width.
    pub notebook_width_percent: f32,
    /// Page-unit height as a percentage of the viewport height.
    pub notebook_height_percent: f32,
    pub horizontal_growth_enabled: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            active_color: Color::RED,
            brush_width: 3.0,
            font_size: 16,
            font_family: "Arial".to_string(),
            notebook_width_percent: 100.0,
            notebook_height_percent: 100.0,
            horizontal_growth_enabled: false,
        }
    }
}
