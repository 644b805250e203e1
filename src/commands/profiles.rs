use tauri::State;

use super::SessionState;
use crate::core::{DeleteOutcome, Dimension, ProfileSummary, RadarProfile};

// ── Profiles ─────────────────────────────────────────────────────────────────

#[tauri::command]
pub fn list_profiles(state: State<'_, SessionState>) -> Result<Vec<RadarProfile>, String> {
    state.with(|s| Ok(s.profiles().to_vec()))
}

#[tauri::command]
pub fn list_profile_summaries(state: State<'_, SessionState>) -> Result<Vec<ProfileSummary>, String> {
    state.with(|s| Ok(s.summaries()))
}

#[tauri::command]
pub fn get_selected_profile(state: State<'_, SessionState>) -> Result<Option<RadarProfile>, String> {
    state.with(|s| Ok(s.selected_profile().cloned()))
}

#[tauri::command]
pub fn select_profile(state: State<'_, SessionState>, id: &str) -> Result<(), String> {
    state.with(|s| s.select(id))
}

#[tauri::command]
pub fn create_profile(state: State<'_, SessionState>, name: &str) -> Result<RadarProfile, String> {
    state.with(|s| s.create(name))
}

#[tauri::command]
pub fn update_dimensions(
    state: State<'_, SessionState>,
    id: &str,
    dimensions: Vec<Dimension>,
) -> Result<bool, String> {
    state.with(|s| s.update_dimensions(id, dimensions))
}

#[tauri::command]
pub fn set_dimension_value(
    state: State<'_, SessionState>,
    id: &str,
    index: usize,
    value: u8,
) -> Result<bool, String> {
    state.with(|s| s.set_dimension_value(id, index, value))
}

#[tauri::command]
pub fn rename_dimension(
    state: State<'_, SessionState>,
    id: &str,
    index: usize,
    name: &str,
) -> Result<bool, String> {
    state.with(|s| s.rename_dimension(id, index, name))
}

#[tauri::command]
pub fn move_dimension(
    state: State<'_, SessionState>,
    id: &str,
    from: usize,
    to: usize,
) -> Result<bool, String> {
    state.with(|s| s.move_dimension(id, from, to))
}

#[tauri::command]
pub fn rename_profile(state: State<'_, SessionState>, id: &str, name: &str) -> Result<bool, String> {
    state.with(|s| s.rename(id, name))
}

#[tauri::command]
pub fn delete_profile(state: State<'_, SessionState>, id: &str) -> Result<DeleteOutcome, String> {
    state.with(|s| s.delete(id))
}

#[tauri::command]
pub fn undo_delete(state: State<'_, SessionState>, id: Option<&str>) -> Result<RadarProfile, String> {
    state.with(|s| s.undo_delete(id))
}

#[tauri::command]
pub fn list_deleted_profiles(state: State<'_, SessionState>) -> Result<Vec<RadarProfile>, String> {
    state.with(|s| Ok(s.history().iter().cloned().collect()))
}

#[tauri::command]
pub fn duplicate_profile(state: State<'_, SessionState>, id: &str) -> Result<RadarProfile, String> {
    state.with(|s| s.duplicate(id))
}

/// Destructive: the frontend must ask the user first and pass `confirm`.
#[tauri::command]
pub fn reset_profiles(state: State<'_, SessionState>, confirm: bool) -> Result<(), String> {
    state.with(|s| s.reset(confirm))
}
