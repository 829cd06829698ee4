// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Tool geometry.
//!
//! Stateless functions that paint one shape onto a surface. Every function
//! takes an `alpha` multiplier so the same geometry serves both the
//! semi-transparent preview and the final commit.

use super::raster::MaskBuilder;
use super::text;
use crate::models::{Point, RasterSurface, Style, Tool};
use crate::util::geometry::{arrow_head, span};

fn paint(surface: &mut RasterSurface, builder: &MaskBuilder, style: &Style, alpha: f32) {
    let Some(mask) = builder.build(surface.width(), surface.height()) else {
        return;
    };
    mask.apply(
        surface.image_mut(),
        style.color,
        style.alpha * alpha,
        style.blend,
    );
}

fn builder_for(style: &Style) -> MaskBuilder {
    MaskBuilder::new(style.width, style.glow)
}

pub fn draw_line(surface: &mut RasterSurface, start: Point, end: Point, style: &Style, alpha: f32) {
    let mut builder = builder_for(style);
    builder.segment(start, end);
    paint(surface, &builder, style, alpha);
}

/// Axis-aligned box spanning both corners, whichever way the drag went.
pub fn draw_rectangle(
    surface: &mut RasterSurface,
    start: Point,
    end: Point,
    style: &Style,
    alpha: f32,
) {
    let (x0, y0, x1, y1) = span(start, end);
    let mut builder = builder_for(style);
    builder.polyline(&[
        Point::new(x0, y0),
        Point::new(x1, y0),
        Point::new(x1, y1),
        Point::new(x0, y1),
        Point::new(x0, y0),
    ]);
    paint(surface, &builder, style, alpha);
}

/// Circle centered on `start` passing through `end`.
pub fn draw_circle(surface: &mut RasterSurface, start: Point, end: Point, style: &Style, alpha: f32) {
    let radius = start.distance(end);
    let mut builder = builder_for(style);
    if radius < 0.5 {
        builder.dot(start);
    } else {
        let steps = ((std::f32::consts::TAU * radius / 2.0).ceil() as usize).max(24);
        let points: Vec<Point> = (0..=steps)
            .map(|i| {
                let t = i as f32 / steps as f32 * std::f32::consts::TAU;
                Point::new(start.x + radius * t.cos(), start.y + radius * t.sin())
            })
            .collect();
        builder.polyline(&points);
    }
    paint(surface, &builder, style, alpha);
}

/// Shaft plus a two-segment head at `end`.
pub fn draw_arrow(
    surface: &mut RasterSurface,
    start: Point,
    end: Point,
    style: &Style,
    alpha: f32,
    head_length: f32,
) {
    let [left, right] = arrow_head(start, end, head_length);
    let mut builder = builder_for(style);
    builder
        .segment(start, end)
        .segment(end, left)
        .segment(end, right);
    paint(surface, &builder, style, alpha);
}

/// Paint only the newest freehand segment.
pub fn draw_freehand_segment(surface: &mut RasterSurface, from: Point, to: Point, style: &Style) {
    let mut builder = builder_for(style);
    builder.segment(from, to);
    paint(surface, &builder, style, 1.0);
}

/// Paint a whole recorded path in one pass (transient strokes).
pub fn draw_polyline(surface: &mut RasterSurface, points: &[Point], style: &Style, alpha: f32) {
    let mut builder = builder_for(style);
    builder.polyline(points);
    paint(surface, &builder, style, alpha);
}

/// Single-line text, top-left anchored at `at`.
pub fn stamp_text(surface: &mut RasterSurface, at: Point, text: &str, style: &Style, font_size: u32) {
    let mut builder = builder_for(style);
    text::layout_text(&mut builder, at, text, font_size);
    paint(surface, &builder, style, 1.0);
}

/// Draw the shape for a two-point tool. Path and text tools draw nothing here.
pub fn draw_shape(
    surface: &mut RasterSurface,
    start: Point,
    end: Point,
    style: &Style,
    alpha: f32,
    head_length: f32,
) {
    match style.tool {
        Tool::Line => draw_line(surface, start, end, style, alpha),
        Tool::Rectangle => draw_rectangle(surface, start, end, style, alpha),
        Tool::Circle => draw_circle(surface, start, end, style, alpha),
        Tool::Arrow => draw_arrow(surface, start, end, style, alpha, head_length),
        Tool::Pencil | Tool::Eraser | Tool::Laser | Tool::Text => {}
    }
}
