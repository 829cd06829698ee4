// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Core data model: surfaces, strokes, styles, settings and media.

pub mod media;
pub mod settings;
pub mod stroke;
pub mod style;
pub mod surface;

pub use media::{MediaKind, MediaObject, MediaPayload};
pub use settings::SessionSettings;
pub use stroke::{Point, Stroke, SurfaceTag};
pub use style::{BlendMode, Color, Style, StyleRules, Tool};
pub use surface::{RasterSurface, Snapshot, SurfacePair, SurfaceRole};
