use std::path::PathBuf;

// ── Path Helpers ─────────────────────────────────────────────────────────────

/// Application data directory (`~/.hexradar`).
pub fn get_hexradar_dir() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Could not find home directory")?;
    Ok(home.join(".hexradar"))
}

/// Where the file-backed profile store keeps its `<key>.json` files.
pub fn get_store_dir() -> Result<PathBuf, String> {
    Ok(get_hexradar_dir()?.join("store"))
}

pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && !name.contains('\\') && name != "." && name != ".."
}
