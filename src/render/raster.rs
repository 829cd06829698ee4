// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Coverage masks and pixel blending.
//!
//! A shape is first rasterized into a [`CoverageMask`] covering only its
//! bounding box, then blended onto the surface in a single pass. Overlapping
//! primitives inside one mask take the maximum coverage, so a semi-transparent
//! stroke never darkens where its own segments overlap.

use crate::models::{BlendMode, Color, Point};
use crate::util::geometry::point_segment_distance_sq;
use image::{Rgba, RgbaImage};

/// Thin strokes still cover the pixels their centerline passes through.
const MIN_RADIUS: f32 = 0.75;

/// Peak coverage of the glow halo relative to the stroke core.
const GLOW_PEAK: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Primitive {
    Segment(Point, Point),
    Block { x: i32, y: i32, w: u32, h: u32 },
}

/// Collects primitives sharing one stroke radius and glow.
#[derive(Debug, Clone)]
pub struct MaskBuilder {
    radius: f32,
    glow: f32,
    primitives: Vec<Primitive>,
}

impl MaskBuilder {
    pub fn new(stroke_width: f32, glow: f32) -> Self {
        Self {
            radius: (stroke_width * 0.5).max(MIN_RADIUS),
            glow: glow.max(0.0),
            primitives: Vec::new(),
        }
    }

    pub fn segment(&mut self, a: Point, b: Point) -> &mut Self {
        self.primitives.push(Primitive::Segment(a, b));
        self
    }

    pub fn dot(&mut self, p: Point) -> &mut Self {
        self.segment(p, p)
    }

    /// Consecutive segments through `points`; a single point becomes a dot.
    pub fn polyline(&mut self, points: &[Point]) -> &mut Self {
        match points {
            [] => {}
            [only] => {
                self.dot(*only);
            }
            _ => {
                for pair in points.windows(2) {
                    self.segment(pair[0], pair[1]);
                }
            }
        }
        self
    }

    /// A solid axis-aligned block, unaffected by the stroke radius.
    pub fn block(&mut self, x: i32, y: i32, w: u32, h: u32) -> &mut Self {
        self.primitives.push(Primitive::Block { x, y, w, h });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    fn bounds(&self, primitive: &Primitive) -> Bounds {
        match *primitive {
            Primitive::Segment(a, b) => {
                let pad = self.radius + self.glow;
                Bounds {
                    x0: (a.x.min(b.x) - pad).floor() as i64,
                    y0: (a.y.min(b.y) - pad).floor() as i64,
                    x1: (a.x.max(b.x) + pad).ceil() as i64,
                    y1: (a.y.max(b.y) + pad).ceil() as i64,
                }
            }
            Primitive::Block { x, y, w, h } => Bounds {
                x0: x as i64,
                y0: y as i64,
                x1: x as i64 + w as i64 - 1,
                y1: y as i64 + h as i64 - 1,
            },
        }
    }

    /// Rasterize against a surface of the given size.
    ///
    /// Returns `None` when nothing lands inside the surface.
    pub fn build(&self, width: u32, height: u32) -> Option<CoverageMask> {
        let mut total: Option<Bounds> = None;
        for primitive in &self.primitives {
            let Some(b) = self.bounds(primitive).clamp(width, height) else {
                continue;
            };
            total = Some(match total {
                Some(t) => t.union(b),
                None => b,
            });
        }
        let total = total?;
        let mut mask = CoverageMask {
            x0: total.x0 as u32,
            y0: total.y0 as u32,
            width: (total.x1 - total.x0 + 1) as u32,
            height: (total.y1 - total.y0 + 1) as u32,
            values: Vec::new(),
        };
        mask.values = vec![0.0; (mask.width * mask.height) as usize];

        let radius_sq = self.radius * self.radius;
        let outer = self.radius + self.glow;
        let outer_sq = outer * outer;
        for primitive in &self.primitives {
            let Some(b) = self.bounds(primitive).clamp(width, height) else {
                continue;
            };
            for y in b.y0..=b.y1 {
                for x in b.x0..=b.x1 {
                    let coverage = match *primitive {
                        Primitive::Block { .. } => 1.0,
                        Primitive::Segment(a, c) => {
                            let d_sq =
                                point_segment_distance_sq(Point::new(x as f32, y as f32), a, c);
                            if d_sq <= radius_sq {
                                1.0
                            } else if self.glow > 0.0 && d_sq <= outer_sq {
                                GLOW_PEAK * (1.0 - (d_sq.sqrt() - self.radius) / self.glow)
                            } else {
                                0.0
                            }
                        }
                    };
                    if coverage > 0.0 {
                        mask.raise(x as u32, y as u32, coverage);
                    }
                }
            }
        }
        Some(mask)
    }
}

/// Inclusive pixel bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bounds {
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
}

impl Bounds {
    fn clamp(self, width: u32, height: u32) -> Option<Bounds> {
        if width == 0 || height == 0 {
            return None;
        }
        let x0 = self.x0.max(0);
        let y0 = self.y0.max(0);
        let x1 = self.x1.min(width as i64 - 1);
        let y1 = self.y1.min(height as i64 - 1);
        (x0 <= x1 && y0 <= y1).then_some(Bounds { x0, y0, x1, y1 })
    }

    fn union(self, other: Bounds) -> Bounds {
        Bounds {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

/// Per-pixel coverage in [0, 1] over a sub-rectangle of a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageMask {
    x0: u32,
    y0: u32,
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl CoverageMask {
    fn raise(&mut self, x: u32, y: u32, coverage: f32) {
        let idx = ((y - self.y0) * self.width + (x - self.x0)) as usize;
        if self.values[idx] < coverage {
            self.values[idx] = coverage.min(1.0);
        }
    }

    /// Coverage at surface coordinates (0 outside the mask).
    pub fn coverage(&self, x: u32, y: u32) -> f32 {
        if x < self.x0 || y < self.y0 || x >= self.x0 + self.width || y >= self.y0 + self.height {
            return 0.0;
        }
        self.values[((y - self.y0) * self.width + (x - self.x0)) as usize]
    }

    /// Blend `color` through the mask onto `image`.
    pub fn apply(&self, image: &mut RgbaImage, color: Color, alpha: f32, blend: BlendMode) {
        let strength = alpha.clamp(0.0, 1.0);
        if strength <= 0.0 {
            return;
        }
        for row in 0..self.height {
            for col in 0..self.width {
                let c = self.values[(row * self.width + col) as usize];
                if c <= 0.0 {
                    continue;
                }
                let (x, y) = (self.x0 + col, self.y0 + row);
                let Some(px) = image.get_pixel_mut_checked(x, y) else {
                    continue;
                };
                match blend {
                    BlendMode::Paint => {
                        let sa = color.a as f32 / 255.0 * strength * c;
                        *px = blend_pixel(*px, color, sa);
                    }
                    BlendMode::Erase => {
                        let keep = 1.0 - strength * c;
                        let a = (px.0[3] as f32 * keep).round() as u8;
                        *px = if a == 0 {
                            Rgba([0, 0, 0, 0])
                        } else {
                            Rgba([px.0[0], px.0[1], px.0[2], a])
                        };
                    }
                }
            }
        }
    }
}

/// Source-over blend of `top` at alpha `sa` onto a straight-alpha pixel.
fn blend_pixel(bottom: Rgba<u8>, top: Color, sa: f32) -> Rgba<u8> {
    let [br, bg, bb, ba] = bottom.0;
    let da = ba as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= f32::EPSILON {
        return Rgba([0, 0, 0, 0]);
    }
    let mix = |s: u8, d: u8| -> u8 {
        ((s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    Rgba([
        mix(top.r, br),
        mix(top.g, bg),
        mix(top.b, bb),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// Fill the horizontal run `x0..=x1` on row `y`, clipped to the image.
pub fn fill_row(image: &mut RgbaImage, x0: i64, x1: i64, y: i64, color: Color) {
    if y < 0 || y >= image.height() as i64 {
        return;
    }
    let lo = x0.max(0);
    let hi = x1.min(image.width() as i64 - 1);
    for x in lo..=hi {
        let px = image.get_pixel_mut(x as u32, y as u32);
        *px = blend_pixel(*px, color, color.a as f32 / 255.0);
    }
}

/// Fill the vertical run `y0..=y1` on column `x`, clipped to the image.
pub fn fill_column(image: &mut RgbaImage, x: i64, y0: i64, y1: i64, color: Color) {
    if x < 0 || x >= image.width() as i64 {
        return;
    }
    let lo = y0.max(0);
    let hi = y1.min(image.height() as i64 - 1);
    for y in lo..=hi {
        let px = image.get_pixel_mut(x as u32, y as u32);
        *px = blend_pixel(*px, color, color.a as f32 / 255.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_half_red_over_grey() {
        let out = blend_pixel(Rgba([100, 100, 100, 255]), Color::rgb(200, 0, 0), 128.0 / 255.0);
        assert_eq!(out, Rgba([150, 50, 50, 255]));
    }

    #[test]
    fn test_blend_onto_transparent_keeps_source_color() {
        let out = blend_pixel(Rgba([0, 0, 0, 0]), Color::rgb(10, 20, 30), 0.5);
        assert_eq!(out, Rgba([10, 20, 30, 128]));
    }

    #[test]
    fn test_horizontal_segment_coverage() {
        let mut builder = MaskBuilder::new(1.0, 0.0);
        builder.segment(Point::new(2.0, 5.0), Point::new(8.0, 5.0));
        let mask = builder.build(20, 20).unwrap();
        for x in 2..=8 {
            assert_eq!(mask.coverage(x, 5), 1.0);
        }
        assert_eq!(mask.coverage(5, 6), 0.0);
        assert_eq!(mask.coverage(10, 5), 0.0);
    }

    #[test]
    fn test_glow_falls_off_outside_core() {
        let mut builder = MaskBuilder::new(2.0, 10.0);
        builder.dot(Point::new(20.0, 20.0));
        let mask = builder.build(50, 50).unwrap();
        assert_eq!(mask.coverage(20, 20), 1.0);
        let near = mask.coverage(23, 20);
        let far = mask.coverage(28, 20);
        assert!(near > far && far > 0.0);
        assert!(near < 1.0);
        assert_eq!(mask.coverage(40, 20), 0.0);
    }

    #[test]
    fn test_mask_outside_surface_is_none() {
        let mut builder = MaskBuilder::new(2.0, 0.0);
        builder.segment(Point::new(-50.0, -50.0), Point::new(-40.0, -45.0));
        assert!(builder.build(10, 10).is_none());
        assert!(MaskBuilder::new(2.0, 0.0).build(10, 10).is_none());
    }

    #[test]
    fn test_overlapping_segments_blend_once() {
        let mut image = RgbaImage::new(10, 10);
        let mut builder = MaskBuilder::new(3.0, 0.0);
        builder.polyline(&[
            Point::new(1.0, 5.0),
            Point::new(8.0, 5.0),
            Point::new(1.0, 5.0),
        ]);
        builder
            .build(10, 10)
            .unwrap()
            .apply(&mut image, Color::RED, 0.5, BlendMode::Paint);
        assert_eq!(image.get_pixel(4, 5).0[3], 128);
    }

    #[test]
    fn test_erase_clears_alpha() {
        let mut image = RgbaImage::from_pixel(6, 6, Rgba([9, 9, 9, 255]));
        let mut builder = MaskBuilder::new(2.0, 0.0);
        builder.dot(Point::new(3.0, 3.0));
        builder
            .build(6, 6)
            .unwrap()
            .apply(&mut image, Color::BLACK, 1.0, BlendMode::Erase);
        assert_eq!(image.get_pixel(3, 3).0, [0, 0, 0, 0]);
        assert_eq!(image.get_pixel(0, 0).0[3], 255);
    }

    #[test]
    fn test_fill_row_clips() {
        let mut image = RgbaImage::new(4, 4);
        fill_row(&mut image, -3, 10, 1, Color::BLACK);
        fill_row(&mut image, 0, 3, 9, Color::BLACK);
        assert!((0..4).all(|x| image.get_pixel(x, 1).0[3] == 255));
        assert!((0..4).all(|x| image.get_pixel(x, 0).0[3] == 0));
    }
}
