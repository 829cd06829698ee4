// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! VIDINK - saved session inspector
//!
//! Lists the timestamped drawings of a saved session and exports every
//! snapshot, plus the composed notebook, as PNG files.
//!
//! ```text
//! vidink <session-dir> [export-dir] [--config engine.yaml]
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use vidink::io::serialization::load_config;
use vidink::io::{FileStore, KeyValueStore, PersistedSession};
use vidink::models::{SessionSettings, SurfaceTag};
use vidink::util::format_time;
use vidink::{EngineConfig, ManualScheduler, Session};

/// Inspect a saved annotation session and export its drawings
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding the session store
    session_dir: PathBuf,
    /// Write every snapshot and the notebook here as PNG files
    export_dir: Option<PathBuf>,
    /// Engine configuration (YAML or JSON)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn export_png(image: &image::RgbaImage, path: &Path) -> Result<()> {
    image
        .save(path)
        .with_context(|| format!("writing {}", path.display()))
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };

    let store = FileStore::new(&args.session_dir);
    let Some(blob) = store
        .get(&config.storage_key)
        .with_context(|| format!("reading session from {}", args.session_dir.display()))?
    else {
        bail!(
            "no session '{}' in {}",
            config.storage_key,
            args.session_dir.display()
        );
    };
    let persisted = PersistedSession::deserialize(&blob)?;
    let decoded = persisted.decode(&config.decode_limits())?;

    // The stored video surface decides the size; the notebook keeps its own.
    let video_size = decoded
        .video_surface
        .as_ref()
        .map(|img| img.dimensions())
        .unwrap_or((1280, 720));
    let mut session = Session::new(
        config,
        SessionSettings::default(),
        video_size,
        video_size,
        ManualScheduler::new(),
    );
    session.restore(&persisted, decoded);

    if let Some(url) = session.video_url() {
        println!("Video: {url}");
    }
    if let Some(saved) = session.last_saved() {
        println!("Last saved: {}", saved.to_rfc3339());
    }
    let (nb_w, nb_h) = session.notebook().dimensions();
    println!(
        "Notebook: {}x{} px, {} media object(s)",
        nb_w,
        nb_h,
        session.notebook().media().len()
    );
    println!("Drawings: {}", session.timestamps().len());
    for entry in session.timestamps().entries() {
        println!(
            "  #{:<4} {:>8}  ({}x{})",
            entry.id,
            format_time(entry.time),
            entry.snapshot.width(),
            entry.snapshot.height()
        );
    }

    if let Some(dir) = &args.export_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        let mut written = 0;
        for entry in session.timestamps().entries() {
            if entry.snapshot.width() == 0 || entry.snapshot.height() == 0 {
                log::warn!("Drawing {} has no pixels, skipping", entry.id);
                continue;
            }
            let name = format!("drawing-{:04}-{:.1}s.png", entry.id, entry.time);
            export_png(entry.snapshot.image(), &dir.join(name))?;
            written += 1;
        }
        let notebook = session.frame(SurfaceTag::Notebook);
        if notebook.width() > 0 && notebook.height() > 0 {
            export_png(&notebook, &dir.join("notebook.png"))?;
            written += 1;
        }
        println!("Exported {} image(s) to {}", written, dir.display());
    }

    Ok(())
}
