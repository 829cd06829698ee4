// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Software rasterization of tools onto surfaces.

pub mod raster;
pub mod text;
pub mod tools;

pub use raster::{CoverageMask, MaskBuilder};
