// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Configuration and settings files.
//!
//! Engine configuration and session settings can be exported and imported
//! in YAML or JSON format. [`load_config`] and [`export_settings`] pick the
//! format from the file extension.

use crate::config::EngineConfig;
use crate::models::SessionSettings;
use anyhow::{bail, Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Json,
}

fn format_of(path: &Path) -> Result<Format> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("yaml") | Some("yml") => Ok(Format::Yaml),
        Some("json") => Ok(Format::Json),
        _ => bail!("unsupported file type: {}", path.display()),
    }
}

/// Export a value to YAML format.
pub fn export_yaml<T: Serialize>(data: &T, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(data)?;
    std::fs::write(path, yaml).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Export a value to JSON format.
pub fn export_json<T: Serialize>(data: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Import a value from YAML format.
pub fn import_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let yaml = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let data = serde_yaml::from_str(&yaml).with_context(|| format!("parsing {}", path.display()))?;
    Ok(data)
}

/// Import a value from JSON format.
pub fn import_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let data = serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))?;
    Ok(data)
}

/// Load engine configuration from a `.yaml`, `.yml` or `.json` file.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    let config = match format_of(path)? {
        Format::Yaml => import_yaml(path)?,
        Format::Json => import_json(path)?,
    };
    log::info!("Loaded engine config from {}", path.display());
    Ok(config)
}

/// Write session settings, choosing the format from the extension.
pub fn export_settings(settings: &SessionSettings, path: &Path) -> Result<()> {
    match format_of(path)? {
        Format::Yaml => export_yaml(settings, path),
        Format::Json => export_json(settings, path),
    }
}

/// Read session settings written by [`export_settings`].
pub fn import_settings(path: &Path) -> Result<SessionSettings> {
    match format_of(path)? {
        Format::Yaml => import_yaml(path),
        Format::Json => import_json(path),
    }
}
