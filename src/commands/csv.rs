use std::path::PathBuf;
use tauri::State;

use super::SessionState;
use crate::core::csv::DEFAULT_EXPORT_FILENAME;

// ── CSV ──────────────────────────────────────────────────────────────────────

#[tauri::command]
pub fn import_csv(state: State<'_, SessionState>, content: &str) -> Result<usize, String> {
    state.with(|s| s.import_csv(content))
}

/// Read a file picked in the frontend's open dialog and import it.
#[tauri::command]
pub async fn import_csv_file(state: State<'_, SessionState>, path: String) -> Result<usize, String> {
    let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
        tracing::error!(path = %path, error = %e, "failed to read CSV file");
        format!("Failed to read file: {}", e)
    })?;
    state.with(|s| s.import_csv(&content))
}

#[tauri::command]
pub fn export_csv(state: State<'_, SessionState>) -> Result<String, String> {
    state.with(|s| s.export_csv())
}

/// Write the export to a path picked in the frontend's save dialog.
#[tauri::command]
pub fn export_csv_file(state: State<'_, SessionState>, path: PathBuf) -> Result<usize, String> {
    state.with(|s| s.export_csv_file(&path))
}

#[tauri::command]
pub fn default_export_filename() -> &'static str {
    DEFAULT_EXPORT_FILENAME
}
