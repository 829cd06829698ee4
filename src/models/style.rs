// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing tools, colors and derived stroke styles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Drawing tool selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Pencil,
    Line,
    Rectangle,
    Circle,
    Arrow,
    Text,
    Eraser,
    Laser,
}

impl Tool {
    /// Shape tools show a live preview on the overlay and commit on release.
    pub fn is_shape(self) -> bool {
        matches!(
            self,
            Tool::Line | Tool::Rectangle | Tool::Circle | Tool::Arrow
        )
    }
}

/// Straight-alpha RGBA color, persisted as a `#rrggbb` hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const RED: Self = Self::rgb(255, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#')?;
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            3 => {
                let mut out = [0u8; 3];
                for (slot, ch) in out.iter_mut().zip(hex.chars()) {
                    let v = ch.to_digit(16)? as u8;
                    *slot = v * 17;
                }
                Some(Self::rgb(out[0], out[1], out[2]))
            }
            6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::RED
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::from_hex(&value).ok_or_else(|| format!("invalid color: {value}"))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// How painted coverage combines with the destination pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Source-over compositing.
    Paint,
    /// Destination alpha is reduced by the coverage (eraser).
    Erase,
}

/// Effective style for the next paint call.
///
/// Derived from the tool and the base color/width; never applied
/// retroactively to pixels already on a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    pub tool: Tool,
    pub color: Color,
    pub width: f32,
    /// Multiplier on the color alpha (laser strokes are half transparent).
    pub alpha: f32,
    /// Soft halo drawn around the stroke core, in pixels.
    pub glow: f32,
    pub blend: BlendMode,
}

/// Factors used to derive a [`Style`] from a tool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleRules {
    pub eraser_width_factor: f32,
    pub laser_width_factor: f32,
    pub laser_alpha: f32,
    pub laser_glow: f32,
}

impl Default for StyleRules {
    fn default() -> Self {
        Self {
            eraser_width_factor: 2.0,
            laser_width_factor: 1.5,
            laser_alpha: 0.5,
            laser_glow: 10.0,
        }
    }
}

impl Style {
    pub fn derive(tool: Tool, color: Color, base_width: f32, rules: &StyleRules) -> Self {
        let base_width = base_width.max(1.0);
        match tool {
            Tool::Eraser => Self {
                tool,
                color,
                width: base_width * rules.eraser_width_factor,
                alpha: 1.0,
                glow: 0.0,
                blend: BlendMode::Erase,
            },
            Tool::Laser => Self {
                tool,
                color,
                width: base_width * rules.laser_width_factor,
                alpha: rules.laser_alpha,
                glow: rules.laser_glow,
                blend: BlendMode::Paint,
            },
            Tool::Pencil
            | Tool::Line
            | Tool::Rectangle
            | Tool::Circle
            | Tool::Arrow
            | Tool::Text => Self {
                tool,
                color,
                width: base_width,
                alpha: 1.0,
                glow: 0.0,
                blend: BlendMode::Paint,
            },
        }
    }
}
