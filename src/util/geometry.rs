// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides coordinate transformations between surface pixels
//! and the scrolled screen viewport, plus the small bits of vector math the
//! tool renderer needs.

use crate::models::Point;

/// Project a surface position into viewport (screen) coordinates.
pub fn surface_to_screen(point: Point, scroll_left: f32, scroll_top: f32) -> Point {
    Point::new(point.x - scroll_left, point.y - scroll_top)
}

/// End points of the two arrow-head segments.
///
/// Both start at `end` and point backward along the shaft at ±30°.
pub fn arrow_head(start: Point, end: Point, head_length: f32) -> [Point; 2] {
    let angle = (end.y - start.y).atan2(end.x - start.x);
    let spread = std::f32::consts::PI / 6.0;
    let wing = |a: f32| Point::new(end.x - head_length * a.cos(), end.y - head_length * a.sin());
    [wing(angle - spread), wing(angle + spread)]
}

/// Squared distance from `p` to the segment `a`–`b`.
pub fn point_segment_distance_sq(p: Point, a: Point, b: Point) -> f32 {
    let (vx, vy) = (b.x - a.x, b.y - a.y);
    let (wx, wy) = (p.x - a.x, p.y - a.y);
    let len_sq = vx * vx + vy * vy;
    let t = if len_sq <= f32::EPSILON {
        0.0
    } else {
        ((wx * vx + wy * vy) / len_sq).clamp(0.0, 1.0)
    };
    let (dx, dy) = (a.x + vx * t - p.x, a.y + vy * t - p.y);
    dx * dx + dy * dy
}

/// Normalized rectangle corners: (min_x, min_y, max_x, max_y).
pub fn span(start: Point, end: Point) -> (f32, f32, f32, f32) {
    (
        start.x.min(end.x),
        start.y.min(end.y),
        start.x.max(end.x),
        start.y.max(end.y),
    )
}
