// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Points, strokes and drawing targets.

use super::style::Style;
use serde::{Deserialize, Serialize};

/// A position in surface pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn offset(self, dx: f32, dy: f32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }
}

/// Which drawing context a stroke belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SurfaceTag {
    Video,
    Notebook,
}

/// An ordered run of points painted with one style.
///
/// Persistent strokes only live while the pointer is down; once released
/// they exist solely as pixels on a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub target: SurfaceTag,
    pub style: Style,
    pub points: Vec<Point>,
}

impl Stroke {
    pub fn begin(target: SurfaceTag, style: Style, start: Point) -> Self {
        Self {
            target,
            style,
            points: vec![start],
        }
    }

    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn first(&self) -> Option<Point> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// Point before the most recent one, used for incremental painting.
    pub fn previous(&self) -> Option<Point> {
        self.points.len().checked_sub(2).map(|i| self.points[i])
    }
}
