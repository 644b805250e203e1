use crate::core;

// ── Settings ─────────────────────────────────────────────────────────────────

#[tauri::command]
pub fn read_settings() -> Result<core::AppSettings, String> {
    core::read_settings()
}

/// Takes effect on next launch.
#[tauri::command]
pub fn write_settings(settings: core::AppSettings) -> Result<(), String> {
    core::write_settings(&settings)
}
