use tauri::State;

use super::SessionState;
use crate::core::RadarChart;

// ── Chart ────────────────────────────────────────────────────────────────────

/// Geometry of the selected profile; `size` defaults to the size configured at launch.
#[tauri::command]
pub fn get_chart(state: State<'_, SessionState>, size: Option<f64>) -> Result<RadarChart, String> {
    let size = size.unwrap_or(state.chart_size);
    state.with(|s| s.chart(size))
}

/// SVG rendering of the selected profile, handed to the image exporter.
#[tauri::command]
pub fn get_chart_svg(state: State<'_, SessionState>, size: Option<f64>) -> Result<String, String> {
    let size = size.unwrap_or(state.chart_size);
    state.with(|s| s.chart(size).map(|c| c.to_svg()))
}
