// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Raster surfaces and immutable snapshots.
//!
//! A surface is a fixed-size RGBA grid owned by exactly one manager. Resizing
//! copies the overlapping region into the new buffer so previously painted
//! pixels keep their coordinates.

use super::style::Color;
use image::{imageops, Rgba, RgbaImage};
use std::sync::Arc;

/// Logical role of a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceRole {
    Persistent,
    Overlay,
    Notebook,
    NotebookOverlay,
}

/// A mutable RGBA pixel grid.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    role: SurfaceRole,
    image: RgbaImage,
}

impl RasterSurface {
    /// Create a fully transparent surface.
    pub fn new(role: SurfaceRole, width: u32, height: u32) -> Self {
        Self {
            role,
            image: RgbaImage::new(width, height),
        }
    }

    pub fn role(&self) -> SurfaceRole {
        self.role
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub(crate) fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    /// Pixel at (x, y), or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.image.get_pixel_checked(x, y).map(|p| {
            let [r, g, b, a] = p.0;
            Color::rgba(r, g, b, a)
        })
    }

    /// True when the pixel exists and is not fully transparent.
    pub fn is_painted(&self, x: u32, y: u32) -> bool {
        self.pixel(x, y).is_some_and(|c| c.a > 0)
    }

    pub fn painted_pixel_count(&self) -> usize {
        self.image.pixels().filter(|p| p.0[3] > 0).count()
    }

    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|p| p.0[3] == 0)
    }

    pub fn clear(&mut self) {
        for px in self.image.pixels_mut() {
            *px = Rgba([0, 0, 0, 0]);
        }
    }

    /// Resize keeping every pixel that still fits at the same coordinates.
    pub fn resize_preserving(&mut self, width: u32, height: u32) {
        if width == self.width() && height == self.height() {
            return;
        }
        let mut next = RgbaImage::new(width, height);
        imageops::replace(&mut next, &self.image, 0, 0);
        self.image = next;
    }

    /// Resize discarding all content.
    pub fn resize_cleared(&mut self, width: u32, height: u32) {
        self.image = RgbaImage::new(width, height);
    }

    /// Fully replace the content with `source`, anchored at the origin.
    ///
    /// Pixels of `source` beyond the surface bounds are dropped; surface
    /// pixels not covered by `source` end up transparent.
    pub fn replace_with(&mut self, source: &RgbaImage) {
        if source.dimensions() == self.image.dimensions() {
            self.image.copy_from_slice(source.as_raw());
            return;
        }
        self.clear();
        imageops::replace(&mut self.image, source, 0, 0);
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_image(self.image.clone())
    }
}

/// An immutable, cheaply clonable copy of a surface's pixels.
#[derive(Debug, Clone)]
pub struct Snapshot(Arc<RgbaImage>);

impl Snapshot {
    pub fn from_image(image: RgbaImage) -> Self {
        Self(Arc::new(image))
    }

    pub fn image(&self) -> &RgbaImage {
        &self.0
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.dimensions() == other.0.dimensions()
                && self.0.as_raw() == other.0.as_raw())
    }
}

/// A persistent surface with its transient overlay stacked on top.
#[derive(Debug, Clone)]
pub struct SurfacePair {
    pub persistent: RasterSurface,
    pub overlay: RasterSurface,
}

impl SurfacePair {
    pub fn new(
        persistent_role: SurfaceRole,
        overlay_role: SurfaceRole,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            persistent: RasterSurface::new(persistent_role, width, height),
            overlay: RasterSurface::new(overlay_role, width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.persistent.width()
    }

    pub fn height(&self) -> u32 {
        self.persistent.height()
    }

    /// Persistent content is carried over, the overlay starts empty.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.persistent.resize_preserving(width, height);
        self.overlay.resize_cleared(width, height);
    }
}
