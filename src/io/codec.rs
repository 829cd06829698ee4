// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! PNG data-URL encoding of raster images.

use crate::error::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;

const PNG_PREFIX: &str = "data:image/png;base64,";

/// Encode an image as `data:image/png;base64,...`.
///
/// A zero-sized image has no PNG form and encodes to an empty string.
pub fn encode_data_url(image: &RgbaImage) -> Result<String> {
    if image.width() == 0 || image.height() == 0 {
        return Ok(String::new());
    }
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(encode_failure)?;
    Ok(format!("{PNG_PREFIX}{}", STANDARD.encode(png)))
}

/// Encoding only happens on save, so a failure means the save did not land.
fn encode_failure(e: image::ImageError) -> Error {
    Error::StorageFull(format!("cannot encode PNG: {e}"))
}

/// Decode a data URL (any raster format the `image` crate knows).
///
/// An empty string decodes to `None`.
pub fn decode_data_url(url: &str) -> Result<Option<RgbaImage>> {
    if url.is_empty() {
        return Ok(None);
    }
    let payload = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, data)| data)
        .ok_or_else(|| Error::Parse("image is not a base64 data URL".into()))?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::Parse(format!("bad base64 image data: {e}")))?;
    let image = image::load_from_memory(&bytes)
        .map_err(|e| Error::Parse(format!("cannot decode image: {e}")))?;
    Ok(Some(image.to_rgba8()))
}
