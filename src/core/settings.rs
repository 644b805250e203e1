use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::paths::get_hexradar_dir;
use super::types::default_dimension_names;

// ── Settings (~/.hexradar/settings.json) ─────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppSettings {
    /// Store key the profile collection is saved under.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    /// Edge length of the square chart canvas, in pixels.
    #[serde(default = "default_chart_size")]
    pub chart_size: f64,
    /// Dimension names given to newly created profiles.
    #[serde(default = "default_dimension_names")]
    pub default_dimensions: Vec<String>,
    /// How many deleted profiles can be restored.
    #[serde(default = "default_undo_capacity")]
    pub undo_capacity: usize,
    /// Populate an empty collection with sample profiles on first launch.
    #[serde(default = "default_seed_samples")]
    pub seed_samples: bool,
}

fn default_storage_key() -> String {
    "radar-profiles".to_string()
}

fn default_chart_size() -> f64 {
    500.0
}

fn default_undo_capacity() -> usize {
    100
}

fn default_seed_samples() -> bool {
    true
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            chart_size: default_chart_size(),
            default_dimensions: default_dimension_names(),
            undo_capacity: default_undo_capacity(),
            seed_samples: default_seed_samples(),
        }
    }
}

pub fn read_settings() -> Result<AppSettings, String> {
    read_settings_from(&get_hexradar_dir()?.join("settings.json"))
}

pub fn write_settings(settings: &AppSettings) -> Result<(), String> {
    write_settings_to(&get_hexradar_dir()?.join("settings.json"), settings)
}

/// Missing or unreadable settings fall back to defaults.
pub fn read_settings_from(path: &Path) -> Result<AppSettings, String> {
    if !path.exists() {
        return Ok(AppSettings::default());
    }
    let raw = fs::read_to_string(path).map_err(|e| e.to_string())?;
    match serde_json::from_str(&raw) {
        Ok(settings) => Ok(settings),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed settings");
            Ok(AppSettings::default())
        }
    }
}

pub fn write_settings_to(path: &Path, settings: &AppSettings) -> Result<(), String> {
    if settings.default_dimensions.iter().all(|d| d.trim().is_empty()) {
        return Err("At least one default dimension name is required".into());
    }
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
    }
    let raw = serde_json::to_string_pretty(settings).map_err(|e| e.to_string())?;
    fs::write(path, raw).map_err(|e| e.to_string())
}
