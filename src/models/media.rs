// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media objects placed on the notebook surface.
//!
//! Uploads arrive either as encoded image files or as already rendered
//! document pages with declared pixel dimensions.

use crate::error::{Error, Result};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kind of placed media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaKind {
    Image,
    DocumentPage,
}

/// A decoded upload, ready to be placed.
#[derive(Debug, Clone)]
pub struct MediaPayload {
    pub kind: MediaKind,
    pub bitmap: Arc<RgbaImage>,
    pub page_number: Option<u32>,
}

impl MediaPayload {
    /// Decode an uploaded image file (PNG, JPEG, ... as supported by `image`).
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| Error::MediaLoad(format!("cannot decode upload: {e}")))?;
        let bitmap = decoded.to_rgba8();
        if bitmap.width() == 0 || bitmap.height() == 0 {
            return Err(Error::MediaLoad("upload has no pixels".into()));
        }
        Ok(Self {
            kind: MediaKind::Image,
            bitmap: Arc::new(bitmap),
            page_number: None,
        })
    }

    /// Wrap a rendered document page given as raw RGBA bytes.
    pub fn document_page(width: u32, height: u32, rgba: Vec<u8>, page_number: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::MediaLoad(format!(
                "page {page_number} has empty dimensions {width}x{height}"
            )));
        }
        let bitmap = RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
            Error::MediaLoad(format!(
                "page {page_number} pixel data does not match {width}x{height}"
            ))
        })?;
        Ok(Self {
            kind: MediaKind::DocumentPage,
            bitmap: Arc::new(bitmap),
            page_number: Some(page_number),
        })
    }

    pub fn natural_size(&self) -> (u32, u32) {
        self.bitmap.dimensions()
    }
}

/// A media object positioned on the notebook in surface coordinates.
#[derive(Debug, Clone)]
pub struct MediaObject {
    pub id: u64,
    pub kind: MediaKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Width divided by height; locked for the object's lifetime.
    pub aspect_ratio: f32,
    pub page_number: Option<u32>,
    pub bitmap: Arc<RgbaImage>,
}

impl MediaObject {
    pub fn from_payload(id: u64, payload: MediaPayload, x: f32, y: f32, width: f32) -> Self {
        let (w, h) = payload.natural_size();
        let aspect_ratio = w as f32 / h as f32;
        Self {
            id,
            kind: payload.kind,
            x,
            y,
            width,
            height: width / aspect_ratio,
            aspect_ratio,
            page_number: payload.page_number,
            bitmap: payload.bitmap,
        }
    }

    /// Set the width, deriving the height from the locked aspect ratio.
    pub fn set_width(&mut self, width: f32) {
        self.width = width;
        self.height = width / self.aspect_ratio;
    }

    /// Corners in surface space: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [(f32, f32); 4] {
        let (x0, y0) = (self.x, self.y);
        let (x1, y1) = (self.x + self.width, self.y + self.height);
        [(x0, y0), (x1, y0), (x1, y1), (x0, y1)]
    }
}
