// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Small shared helpers.

pub mod geometry;
pub mod time_format;

pub use time_format::format_time;
