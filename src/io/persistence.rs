// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The persisted session blob.
//!
//! One JSON document (camelCase keys) holds the timestamp list, both
//! persistent surfaces as PNG data URLs, the session settings, the notebook
//! size and any placed media. Every field is optional on load: a missing
//! field leaves the current value in place.
//!
//! Loading happens in two steps. [`PersistedSession::deserialize`] checks the
//! JSON, then [`PersistedSession::decode`] decodes every embedded image up
//! front, so a corrupt image fails the load before any state is touched.

use super::codec::{decode_data_url, encode_data_url};
use crate::error::{Error, Result};
use crate::models::{Color, MediaKind, MediaObject, SessionSettings, Snapshot};
use crate::timestamps::TimestampEntry;
use crate::util::format_time;
use chrono::{DateTime, Utc};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedDrawing {
    pub id: u64,
    pub time: f64,
    #[serde(default)]
    pub time_formatted: String,
    pub drawing_data: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub video_timestamp: Option<f64>,
}

impl PersistedDrawing {
    pub fn from_entry(entry: &TimestampEntry) -> Result<Self> {
        Ok(Self {
            id: entry.id,
            time: entry.time,
            time_formatted: format_time(entry.time),
            drawing_data: encode_data_url(entry.snapshot.image())?,
            created: Some(entry.created_at),
            video_timestamp: Some(entry.time),
        })
    }

    fn decode(&self) -> Result<TimestampEntry> {
        if !self.time.is_finite() || self.time < 0.0 {
            return Err(Error::Parse(format!(
                "drawing {} has invalid time {}",
                self.id, self.time
            )));
        }
        let image = decode_data_url(&self.drawing_data)
            .map_err(|e| Error::Parse(format!("drawing {}: {e}", self.id)))?
            .unwrap_or_else(|| RgbaImage::new(0, 0));
        Ok(TimestampEntry {
            id: self.id,
            time: self.time,
            snapshot: Snapshot::from_image(image),
            created_at: self.created.unwrap_or_else(Utc::now),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedMedia {
    pub id: u64,
    pub kind: MediaKind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub aspect_ratio: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    pub data: String,
}

impl PersistedMedia {
    pub fn from_object(obj: &MediaObject) -> Result<Self> {
        Ok(Self {
            id: obj.id,
            kind: obj.kind,
            x: obj.x,
            y: obj.y,
            width: obj.width,
            height: obj.height,
            aspect_ratio: obj.aspect_ratio,
            page_number: obj.page_number,
            data: encode_data_url(&obj.bitmap)?,
        })
    }

    /// Rebuild the object. The stored height is ignored: it always follows
    /// the aspect ratio, and the width is clamped to the placement minimum.
    fn decode(&self, limits: &DecodeLimits) -> Result<MediaObject> {
        if ![self.x, self.y, self.width].iter().all(|v| v.is_finite()) {
            return Err(Error::Parse(format!(
                "media {} has invalid geometry ({}, {}) width {}",
                self.id, self.x, self.y, self.width
            )));
        }
        let bitmap = decode_data_url(&self.data)
            .map_err(|e| Error::Parse(format!("media {}: {e}", self.id)))?
            .ok_or_else(|| Error::Parse(format!("media {} has no image data", self.id)))?;
        let aspect_ratio = if self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0 {
            self.aspect_ratio
        } else {
            bitmap.width() as f32 / bitmap.height() as f32
        };
        let mut obj = MediaObject {
            id: self.id,
            kind: self.kind,
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            aspect_ratio,
            page_number: self.page_number,
            bitmap: Arc::new(bitmap),
        };
        obj.set_width(self.width.max(limits.min_media_width));
        Ok(obj)
    }
}

/// Bounds a loaded blob must respect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodeLimits {
    /// Largest notebook buffer (width x height x 4) accepted from a blob.
    pub max_surface_bytes: u64,
    pub min_media_width: f32,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_surface_bytes: 512 * 1024 * 1024,
            min_media_width: 50.0,
        }
    }
}

impl DecodeLimits {
    fn check_surface(&self, width: u32, height: u32) -> Result<()> {
        let bytes = u64::from(width) * u64::from(height) * 4;
        if width == 0 || height == 0 || bytes > self.max_surface_bytes {
            return Err(Error::Parse(format!(
                "notebook size {width}x{height} is out of range"
            )));
        }
        Ok(())
    }
}

/// The session as stored under the storage key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedSession {
    pub video_url: Option<String>,
    pub timestamped_drawings: Option<Vec<PersistedDrawing>>,
    pub main_canvas_data: Option<String>,
    pub infinite_canvas_data: Option<String>,
    pub current_color: Option<Color>,
    pub brush_size: Option<f32>,
    pub font_size: Option<u32>,
    pub font_family: Option<String>,
    pub infinite_canvas_width: Option<u32>,
    pub infinite_canvas_height: Option<u32>,
    pub infinite_horizontal: Option<bool>,
    pub a4_width_percent: Option<f32>,
    pub a4_height_percent: Option<f32>,
    pub last_saved: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_objects: Option<Vec<PersistedMedia>>,
}

/// A loaded blob with every image already decoded.
#[derive(Debug, Clone, Default)]
pub struct DecodedSession {
    pub video_url: Option<String>,
    pub entries: Option<Vec<TimestampEntry>>,
    pub video_surface: Option<RgbaImage>,
    pub notebook_surface: Option<RgbaImage>,
    pub notebook_width: Option<u32>,
    pub notebook_height: Option<u32>,
    pub media: Option<Vec<MediaObject>>,
    pub last_saved: Option<DateTime<Utc>>,
}

impl PersistedSession {
    pub fn serialize(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| Error::StorageFull(format!("cannot encode session: {e}")))
    }

    pub fn deserialize(blob: &str) -> Result<Self> {
        serde_json::from_str(blob).map_err(|e| Error::Parse(format!("session blob: {e}")))
    }

    /// Record the settings fields.
    pub fn store_settings(&mut self, settings: &SessionSettings) {
        self.current_color = Some(settings.active_color);
        self.brush_size = Some(settings.brush_width);
        self.font_size = Some(settings.font_size);
        self.font_family = Some(settings.font_family.clone());
        self.infinite_horizontal = Some(settings.horizontal_growth_enabled);
        self.a4_width_percent = Some(settings.notebook_width_percent);
        self.a4_height_percent = Some(settings.notebook_height_percent);
    }

    /// Apply the stored settings fields onto `settings`; absent fields are left alone.
    pub fn apply_settings(&self, settings: &mut SessionSettings) {
        if let Some(color) = self.current_color {
            settings.active_color = color;
        }
        if let Some(width) = self.brush_size {
            settings.brush_width = width;
        }
        if let Some(size) = self.font_size {
            settings.font_size = size;
        }
        if let Some(family) = &self.font_family {
            settings.font_family = family.clone();
        }
        if let Some(horizontal) = self.infinite_horizontal {
            settings.horizontal_growth_enabled = horizontal;
        }
        if let Some(percent) = self.a4_width_percent {
            settings.notebook_width_percent = percent;
        }
        if let Some(percent) = self.a4_height_percent {
            settings.notebook_height_percent = percent;
        }
    }

    /// Decode every embedded image and check the notebook size against
    /// `limits`. Fails on the first corrupt value.
    pub fn decode(&self, limits: &DecodeLimits) -> Result<DecodedSession> {
        if self.infinite_canvas_width.is_some() || self.infinite_canvas_height.is_some() {
            limits.check_surface(
                self.infinite_canvas_width.unwrap_or(1),
                self.infinite_canvas_height.unwrap_or(1),
            )?;
        }
        let entries = self
            .timestamped_drawings
            .as_ref()
            .map(|drawings| drawings.iter().map(PersistedDrawing::decode).collect::<Result<Vec<_>>>())
            .transpose()?;
        let media = self
            .media_objects
            .as_ref()
            .map(|objects| {
                objects
                    .iter()
                    .map(|obj| obj.decode(limits))
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?;
        let video_surface = match &self.main_canvas_data {
            Some(url) => decode_data_url(url)
                .map_err(|e| Error::Parse(format!("video surface: {e}")))?,
            None => None,
        };
        let notebook_surface = match &self.infinite_canvas_data {
            Some(url) => decode_data_url(url)
                .map_err(|e| Error::Parse(format!("notebook surface: {e}")))?,
            None => None,
        };
        Ok(DecodedSession {
            video_url: self.video_url.clone(),
            entries,
            video_surface,
            notebook_surface,
            notebook_width: self.infinite_canvas_width,
            notebook_height: self.infinite_canvas_height,
            media,
            last_saved: self.last_saved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn entry(id: u64, time: f64) -> TimestampEntry {
        let mut img = RgbaImage::new(4, 4);
        img.put_pixel(1, 2, Rgba([9, 8, 7, 255]));
        TimestampEntry {
            id,
            time,
            snapshot: Snapshot::from_image(img),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_blob_uses_camel_case_keys() {
        let mut blob = PersistedSession {
            video_url: Some("https://example.com/v".into()),
            timestamped_drawings: Some(vec![PersistedDrawing::from_entry(&entry(1, 75.0)).unwrap()]),
            infinite_canvas_width: Some(800),
            ..Default::default()
        };
        blob.store_settings(&SessionSettings::default());
        let json: serde_json::Value = serde_json::from_str(&blob.serialize().unwrap()).unwrap();

        assert_eq!(json["videoUrl"], "https://example.com/v");
        assert_eq!(json["infiniteCanvasWidth"], 800);
        assert_eq!(json["a4WidthPercent"], 100.0);
        assert_eq!(json["currentColor"], "#ff0000");
        let drawing = &json["timestampedDrawings"][0];
        assert_eq!(drawing["timeFormatted"], "1:15");
        assert_eq!(drawing["videoTimestamp"], 75.0);
        assert!(drawing["drawingData"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,"));
        assert!(json.get("mediaObjects").is_none());
    }

    #[test]
    fn test_decode_restores_pixels_and_ids() {
        let original = entry(42, 3.5);
        let blob = PersistedSession {
            timestamped_drawings: Some(vec![PersistedDrawing::from_entry(&original).unwrap()]),
            ..Default::default()
        };
        let text = blob.serialize().unwrap();
        let decoded = PersistedSession::deserialize(&text)
            .unwrap()
            .decode(&DecodeLimits::default())
            .unwrap();
        let entries = decoded.entries.unwrap();
        assert_eq!(entries[0].id, 42);
        assert_eq!(entries[0].time, 3.5);
        assert_eq!(entries[0].snapshot, original.snapshot);
        assert_eq!(entries[0].created_at, original.created_at);
    }

    #[test]
    fn test_missing_fields_leave_settings_alone() {
        let blob = PersistedSession::deserialize(r#"{"brushSize": 9}"#).unwrap();
        let mut settings = SessionSettings {
            font_size: 30,
            ..Default::default()
        };
        blob.apply_settings(&mut settings);
        assert_eq!(settings.brush_width, 9.0);
        assert_eq!(settings.font_size, 30);
        assert!(blob.decode(&DecodeLimits::default()).unwrap().entries.is_none());
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            PersistedSession::deserialize("{\"videoUrl\": "),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_corrupt_image_fails_decode() {
        let blob = PersistedSession {
            timestamped_drawings: Some(vec![PersistedDrawing {
                id: 1,
                time: 1.0,
                time_formatted: "0:01".into(),
                drawing_data: "data:image/png;base64,AAAA".into(),
                created: None,
                video_timestamp: None,
            }]),
            ..Default::default()
        };
        assert!(matches!(blob.decode(&DecodeLimits::default()), Err(Error::Parse(_))));
    }

    fn page_media(width: f32, height: f32) -> PersistedMedia {
        PersistedMedia {
            id: 3,
            kind: MediaKind::DocumentPage,
            x: 10.0,
            y: 20.0,
            width,
            height,
            aspect_ratio: 2.0,
            page_number: Some(1),
            data: encode_data_url(&RgbaImage::new(40, 20)).unwrap(),
        }
    }

    #[test]
    fn test_oversized_notebook_is_parse_error() {
        let blob = PersistedSession::deserialize(
            r#"{"infiniteCanvasWidth": 4294967295, "infiniteCanvasHeight": 4294967295}"#,
        )
        .unwrap();
        assert!(matches!(
            blob.decode(&DecodeLimits::default()),
            Err(Error::Parse(_))
        ));

        let zero = PersistedSession::deserialize(r#"{"infiniteCanvasWidth": 0}"#).unwrap();
        assert!(matches!(
            zero.decode(&DecodeLimits::default()),
            Err(Error::Parse(_))
        ));

        let fine = PersistedSession::deserialize(
            r#"{"infiniteCanvasWidth": 800, "infiniteCanvasHeight": 1200}"#,
        )
        .unwrap();
        let decoded = fine.decode(&DecodeLimits::default()).unwrap();
        assert_eq!((decoded.notebook_width, decoded.notebook_height), (Some(800), Some(1200)));
    }

    #[test]
    fn test_media_height_follows_aspect_ratio() {
        let blob = PersistedSession {
            media_objects: Some(vec![page_media(120.0, 900.0)]),
            ..Default::default()
        };
        let media = blob.decode(&DecodeLimits::default()).unwrap().media.unwrap();
        assert_eq!(media[0].width, 120.0);
        assert_eq!(media[0].height, 60.0);
        assert_eq!((media[0].x, media[0].y), (10.0, 20.0));
    }

    #[test]
    fn test_media_width_clamped_to_minimum() {
        let blob = PersistedSession {
            media_objects: Some(vec![page_media(5.0, 900.0)]),
            ..Default::default()
        };
        let media = blob.decode(&DecodeLimits::default()).unwrap().media.unwrap();
        assert_eq!(media[0].width, 50.0);
        assert_eq!(media[0].height, 25.0);
    }

    #[test]
    fn test_non_finite_media_geometry_is_parse_error() {
        let mut media = page_media(100.0, 50.0);
        media.x = f32::NAN;
        let blob = PersistedSession {
            media_objects: Some(vec![media]),
            ..Default::default()
        };
        assert!(matches!(
            blob.decode(&DecodeLimits::default()),
            Err(Error::Parse(_))
        ));
    }
}
