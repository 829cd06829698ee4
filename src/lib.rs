// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! VIDINK - drawing annotations over video and an open-ended notebook
//!
//! A headless annotation state engine. Strokes are rasterized onto a video
//! surface and a growing notebook surface; video drawings are saved as
//! snapshots keyed by playback time and shown again while the video plays.
//! Laser strokes fade out on their own, and the whole session persists to a
//! key-value store as one JSON blob.

pub mod compositor;
pub mod config;
pub mod error;
pub mod fade;
pub mod io;
pub mod models;
pub mod notebook;
pub mod playback;
pub mod player;
pub mod render;
pub mod schedule;
pub mod session;
pub mod timestamps;
pub mod util;

pub use compositor::{StrokeOutcome, SurfaceCompositor};
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use fade::{FadeAnimator, FadeTiming};
pub use notebook::{ExpandOutcome, NotebookSurfaceManager};
pub use player::{PlayerState, ScriptedPlayer, VideoPlayer};
pub use schedule::{ManualScheduler, Scheduler, TaskHandle};
pub use session::{Notification, Session};
pub use timestamps::{TimestampEntry, TimestampStore};
