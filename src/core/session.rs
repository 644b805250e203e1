use rand::Rng;
use serde::Serialize;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::mpsc::{self, Receiver};

use super::csv;
use super::error::{CoreError, CoreResult};
use super::radar::{build_chart, RadarChart};
use super::settings::AppSettings;
use super::store::{KeyValueStore, StoreChange};
use super::types::{
    default_dimension_names, normalize_dimension_name, normalize_profile_name, now_millis,
    sample_profiles, validate_dimensions, validate_profile, Dimension, IdGenerator,
    ProfileSummary, RadarProfile, DEFAULT_VALUE, SENTINEL_PROFILE_NAME,
};

// ── Profile Session ──────────────────────────────────────────────────────────
//
// Owns the profile collection, the current selection and the undo history.
// Every mutation builds the next collection, writes it to the store, and only
// then swaps it in, so a failed write leaves the previous state untouched.
// Undo only covers deletes: any other successful edit clears the history.

/// What a successful delete did to the collection.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DeleteOutcome {
    Removed,
    /// The collection would have been empty, so a placeholder was created.
    Replaced { replacement: RadarProfile },
}

pub struct ProfileSession<S: KeyValueStore> {
    store: S,
    key: String,
    template: Vec<String>,
    undo_capacity: usize,
    profiles: Vec<RadarProfile>,
    selected: Option<String>,
    history: VecDeque<RadarProfile>,
    ids: IdGenerator,
    changes: Receiver<StoreChange>,
    /// Set when the stored collection could not be read; nothing is written
    /// until a readable value arrives from the store.
    read_only: bool,
    /// Key the unreadable stored value was copied to, if any.
    backup: Option<String>,
}

/// Profiles decoded from a stored value, minus the ones that fail validation.
struct Decoded {
    profiles: Vec<RadarProfile>,
    skipped: usize,
}

fn decode_profiles(raw: &str) -> CoreResult<Decoded> {
    let records: Vec<serde_json::Value> = serde_json::from_str(raw)?;
    let mut decoded = Decoded {
        profiles: Vec::with_capacity(records.len()),
        skipped: 0,
    };
    for (idx, record) in records.into_iter().enumerate() {
        let checked = serde_json::from_value::<RadarProfile>(record)
            .map_err(CoreError::from)
            .and_then(|p| validate_profile(&p).map(|_| p));
        match checked {
            Ok(profile) => decoded.profiles.push(profile),
            Err(e) => {
                tracing::warn!(index = idx, error = %e, "skipping invalid stored profile");
                decoded.skipped += 1;
            }
        }
    }
    Ok(decoded)
}

/// Dimension names from the settings that a profile can actually carry.
fn dimension_template(settings: &AppSettings) -> Vec<String> {
    let template: Vec<String> = settings
        .default_dimensions
        .iter()
        .filter(|d| !d.trim().is_empty())
        .filter_map(|d| match normalize_dimension_name(d) {
            Ok(name) => Some(name),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring default dimension");
                None
            }
        })
        .collect();
    if template.is_empty() {
        default_dimension_names()
    } else {
        template
    }
}

impl<S: KeyValueStore> ProfileSession<S> {
    /// Load the collection from `store`.
    ///
    /// Samples are seeded only when the key is absent or holds an empty
    /// array. A value that does not decode is copied to a backup key first;
    /// a store that cannot be read at all leaves the session read-only.
    pub fn open(mut store: S, settings: &AppSettings) -> Self {
        let (tx, rx) = mpsc::channel();
        store.on_external_change(Box::new(move |change| {
            let _ = tx.send(change.clone());
        }));

        let mut session = Self {
            store,
            key: settings.storage_key.clone(),
            template: dimension_template(settings),
            undo_capacity: settings.undo_capacity,
            profiles: Vec::new(),
            selected: None,
            history: VecDeque::new(),
            ids: IdGenerator::new(),
            changes: rx,
            read_only: false,
            backup: None,
        };

        let fresh = match session.store.get(&session.key) {
            Ok(None) => true,
            Ok(Some(raw)) => match decode_profiles(&raw) {
                Ok(decoded) => {
                    let fresh = decoded.profiles.is_empty() && decoded.skipped == 0;
                    if decoded.skipped > 0 {
                        session.preserve(&raw);
                    }
                    session.profiles = decoded.profiles;
                    fresh
                }
                Err(e) => {
                    tracing::warn!(key = %session.key, error = %e, "stored profiles are unreadable");
                    session.preserve(&raw);
                    false
                }
            },
            Err(e) => {
                tracing::error!(
                    key = %session.key,
                    error = %e,
                    "could not read profile store, changes will not be saved"
                );
                session.read_only = true;
                false
            }
        };

        if fresh && settings.seed_samples {
            let samples = sample_profiles(&mut session.ids, now_millis());
            if let Err(e) = session.commit(samples) {
                tracing::warn!(error = %e, "could not save sample profiles");
            }
        }
        session.selected = session.profiles.first().map(|p| p.id.clone());
        tracing::info!(count = session.profiles.len(), key = %session.key, "profile session opened");
        session
    }

    /// Copy a stored value that is about to be replaced to a backup key.
    /// When even that fails the session stops writing.
    fn preserve(&mut self, raw: &str) {
        let backup = format!("{}-backup-{}", self.key, now_millis());
        match self.store.set(&backup, raw) {
            Ok(()) => {
                tracing::warn!(key = %self.key, backup = %backup, "stored profiles backed up");
                self.backup = Some(backup);
            }
            Err(e) => {
                tracing::error!(
                    key = %self.key,
                    error = %e,
                    "could not back up stored profiles, changes will not be saved"
                );
                self.read_only = true;
            }
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn backup_key(&self) -> Option<&str> {
        self.backup.as_deref()
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn profiles(&self) -> &[RadarProfile] {
        &self.profiles
    }

    pub fn profile(&self, id: &str) -> Option<&RadarProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_profile(&self) -> Option<&RadarProfile> {
        self.selected.as_deref().and_then(|id| self.profile(id))
    }

    /// Deleted profiles, most recent first.
    pub fn history(&self) -> &VecDeque<RadarProfile> {
        &self.history
    }

    pub fn summaries(&self) -> Vec<ProfileSummary> {
        self.profiles.iter().map(RadarProfile::summary).collect()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.profiles.iter().position(|p| p.id == id)
    }

    fn not_found(id: &str) -> CoreError {
        CoreError::validation(format!("Profile '{}' not found", id))
    }

    // ── Persistence ─────────────────────────────────────────────────────

    fn check_writable(&self) -> CoreResult<()> {
        if self.read_only {
            return Err(CoreError::Io(format!(
                "Profile store '{}' could not be read; refusing to overwrite it",
                self.key
            )));
        }
        Ok(())
    }

    fn commit(&mut self, next: Vec<RadarProfile>) -> CoreResult<()> {
        self.check_writable()?;
        let raw = serde_json::to_string(&next)?;
        if let Err(e) = self.store.set(&self.key, &raw) {
            tracing::error!(key = %self.key, error = %e, "failed to save profiles");
            return Err(e);
        }
        self.profiles = next;
        Ok(())
    }

    fn push_history(&mut self, profile: RadarProfile) {
        self.history.push_front(profile);
        self.history.truncate(self.undo_capacity);
    }

    /// Apply `edit` to a copy of the profile and persist it.
    /// Returns `Ok(false)` when `id` is unknown.
    fn edit_profile<F>(&mut self, id: &str, edit: F) -> CoreResult<bool>
    where
        F: FnOnce(&mut RadarProfile) -> CoreResult<()>,
    {
        let Some(pos) = self.position(id) else {
            return Ok(false);
        };
        let mut next = self.profiles.clone();
        let profile = &mut next[pos];
        edit(profile)?;
        profile.updated_at = now_millis().max(profile.created_at);
        self.commit(next)?;
        self.history.clear();
        Ok(true)
    }

    // ── Operations ──────────────────────────────────────────────────────

    pub fn create(&mut self, name: &str) -> CoreResult<RadarProfile> {
        let name = normalize_profile_name(name)?;
        let now = now_millis();
        let profile = RadarProfile {
            id: self.ids.next_id_at(now),
            name,
            dimensions: self
                .template
                .iter()
                .map(|n| Dimension::new(n.clone(), DEFAULT_VALUE))
                .collect(),
            created_at: now,
            updated_at: now,
        };

        let mut next = self.profiles.clone();
        next.push(profile.clone());
        self.commit(next)?;
        self.history.clear();
        self.selected = Some(profile.id.clone());
        tracing::info!(id = %profile.id, name = %profile.name, "profile created");
        Ok(profile)
    }

    pub fn update_dimensions(&mut self, id: &str, dimensions: Vec<Dimension>) -> CoreResult<bool> {
        validate_dimensions(&dimensions)?;
        let dimensions: Vec<Dimension> = dimensions
            .into_iter()
            .map(|d| Dimension::new(d.name.trim(), d.value))
            .collect();
        self.edit_profile(id, |p| {
            p.dimensions = dimensions;
            Ok(())
        })
    }

    pub fn set_dimension_value(&mut self, id: &str, index: usize, value: u8) -> CoreResult<bool> {
        let Some(mut dims) = self.profile(id).map(|p| p.dimensions.clone()) else {
            return Ok(false);
        };
        let dim = dims
            .get_mut(index)
            .ok_or_else(|| CoreError::validation(format!("No dimension at position {}", index)))?;
        dim.value = value;
        self.update_dimensions(id, dims)
    }

    pub fn rename_dimension(&mut self, id: &str, index: usize, name: &str) -> CoreResult<bool> {
        let name = normalize_dimension_name(name)?;
        let Some(mut dims) = self.profile(id).map(|p| p.dimensions.clone()) else {
            return Ok(false);
        };
        let dim = dims
            .get_mut(index)
            .ok_or_else(|| CoreError::validation(format!("No dimension at position {}", index)))?;
        dim.name = name;
        self.update_dimensions(id, dims)
    }

    /// Move the dimension at `from` so it ends up at `to`.
    pub fn move_dimension(&mut self, id: &str, from: usize, to: usize) -> CoreResult<bool> {
        let Some(mut dims) = self.profile(id).map(|p| p.dimensions.clone()) else {
            return Ok(false);
        };
        if from >= dims.len() || to >= dims.len() {
            return Err(CoreError::validation(format!(
                "Cannot move dimension {} to {} in a profile with {}",
                from,
                to,
                dims.len()
            )));
        }
        let dim = dims.remove(from);
        dims.insert(to, dim);
        self.update_dimensions(id, dims)
    }

    pub fn rename(&mut self, id: &str, name: &str) -> CoreResult<bool> {
        let name = normalize_profile_name(name)?;
        self.edit_profile(id, |p| {
            p.name = name;
            Ok(())
        })
    }

    pub fn delete(&mut self, id: &str) -> CoreResult<DeleteOutcome> {
        let pos = self.position(id).ok_or_else(|| Self::not_found(id))?;
        // Fragile by nature: renaming the placeholder lifts the guard.
        if self.profiles.len() == 1 && self.profiles[0].name == SENTINEL_PROFILE_NAME {
            return Err(CoreError::validation(
                "The last placeholder profile cannot be deleted",
            ));
        }

        let mut next = self.profiles.clone();
        let removed = next.remove(pos);
        let replacement = if next.is_empty() {
            let placeholder = self.placeholder_profile();
            next.push(placeholder.clone());
            Some(placeholder)
        } else {
            None
        };
        self.commit(next)?;
        tracing::info!(id = %removed.id, name = %removed.name, "profile deleted");
        self.push_history(removed);

        match replacement {
            Some(replacement) => {
                self.selected = Some(replacement.id.clone());
                Ok(DeleteOutcome::Replaced { replacement })
            }
            None => {
                if self.selected.as_deref() == Some(id) {
                    self.selected = self.profiles.first().map(|p| p.id.clone());
                }
                Ok(DeleteOutcome::Removed)
            }
        }
    }

    /// Placeholder with random mid-range scores over the default template.
    fn placeholder_profile(&mut self) -> RadarProfile {
        let now = now_millis();
        let mut rng = rand::rng();
        RadarProfile {
            id: self.ids.next_id_at(now),
            name: SENTINEL_PROFILE_NAME.to_string(),
            dimensions: self
                .template
                .iter()
                .map(|n| Dimension::new(n.clone(), rng.random_range(2..=4)))
                .collect(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Restore a deleted profile: the one with `id`, or the most recent.
    pub fn undo_delete(&mut self, id: Option<&str>) -> CoreResult<RadarProfile> {
        if self.history.is_empty() {
            return Err(CoreError::validation("Nothing to undo"));
        }
        let idx = match id {
            Some(id) => self
                .history
                .iter()
                .position(|p| p.id == id)
                .ok_or_else(|| CoreError::validation(format!("No deleted profile '{}'", id)))?,
            None => 0,
        };
        let restored = self.history[idx].clone();
        if self.position(&restored.id).is_some() {
            return Err(CoreError::validation(format!(
                "A profile with id '{}' already exists",
                restored.id
            )));
        }

        let mut next = self.profiles.clone();
        next.push(restored.clone());
        self.commit(next)?;
        self.history.remove(idx);
        self.selected = Some(restored.id.clone());
        tracing::info!(id = %restored.id, "profile restored");
        Ok(restored)
    }

    pub fn duplicate(&mut self, id: &str) -> CoreResult<RadarProfile> {
        let source = self.profile(id).cloned().ok_or_else(|| Self::not_found(id))?;
        let now = now_millis();
        let copy = RadarProfile {
            id: self.ids.next_id_at(now),
            name: format!("{} (copy)", source.name),
            dimensions: source.dimensions,
            created_at: now,
            updated_at: now,
        };

        let mut next = self.profiles.clone();
        next.push(copy.clone());
        self.commit(next)?;
        self.history.clear();
        self.selected = Some(copy.id.clone());
        tracing::info!(source = %id, id = %copy.id, "profile duplicated");
        Ok(copy)
    }

    /// Drop every profile and the undo history.
    pub fn reset(&mut self, confirm: bool) -> CoreResult<()> {
        if !confirm {
            return Err(CoreError::validation(
                "Reset not confirmed. Set 'confirm' to true to proceed.",
            ));
        }
        self.check_writable()?;
        self.store.delete(&self.key)?;
        let dropped = self.profiles.len();
        self.profiles.clear();
        self.history.clear();
        self.selected = None;
        tracing::warn!(dropped, "all profiles reset");
        Ok(())
    }

    pub fn select(&mut self, id: &str) -> CoreResult<()> {
        if self.position(id).is_none() {
            return Err(Self::not_found(id));
        }
        self.selected = Some(id.to_string());
        Ok(())
    }

    // ── CSV ─────────────────────────────────────────────────────────────

    /// Append the profiles in `content`; returns how many were added.
    pub fn import_csv(&mut self, content: &str) -> CoreResult<usize> {
        let imported = csv::import_from_csv(content, &mut self.ids)?;
        let count = imported.len();
        let first_id = imported.first().map(|p| p.id.clone());

        let mut next = self.profiles.clone();
        next.extend(imported);
        self.commit(next)?;
        if self.selected.is_none() {
            self.selected = first_id;
        }
        tracing::info!(count, "profiles imported from CSV");
        Ok(count)
    }

    pub fn export_csv(&self) -> CoreResult<String> {
        if self.profiles.is_empty() {
            return Err(CoreError::validation("No profiles to export"));
        }
        Ok(csv::export_to_csv(&self.profiles))
    }

    pub fn export_csv_file(&self, path: &Path) -> CoreResult<usize> {
        csv::write_csv_file(path, &self.profiles)?;
        tracing::info!(path = %path.display(), count = self.profiles.len(), "profiles exported");
        Ok(self.profiles.len())
    }

    // ── Chart ───────────────────────────────────────────────────────────

    pub fn chart(&self, size: f64) -> CoreResult<RadarChart> {
        let profile = self
            .selected_profile()
            .ok_or_else(|| CoreError::validation("No profile selected"))?;
        build_chart(&profile.dimensions, size)
    }

    // ── External changes ────────────────────────────────────────────────

    /// Pull in writes made by other windows or processes.  The newest value
    /// replaces the collection wholesale; returns whether anything changed.
    pub fn sync_external(&mut self) -> bool {
        if let Err(e) = self.store.poll_external() {
            tracing::warn!(error = %e, "polling the profile store failed");
        }

        let mut replaced = false;
        while let Ok(change) = self.changes.try_recv() {
            if change.key != self.key {
                continue;
            }
            let Some(raw) = change.new_value else {
                tracing::debug!(key = %change.key, "ignoring external removal");
                continue;
            };
            match decode_profiles(&raw) {
                Ok(decoded) => {
                    tracing::debug!(
                        count = decoded.profiles.len(),
                        skipped = decoded.skipped,
                        "profiles replaced by external change"
                    );
                    if self.read_only {
                        tracing::info!(key = %self.key, "profile store readable again");
                        self.read_only = false;
                    }
                    self.profiles = decoded.profiles;
                    replaced = true;
                }
                Err(e) => tracing::warn!(error = %e, "ignoring unreadable external change"),
            }
        }

        if replaced && self.selected_profile().is_none() {
            self.selected = self.profiles.first().map(|p| p.id.clone());
        }
        replaced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::MemoryStore;
    use tempfile::tempdir;

    fn settings() -> AppSettings {
        AppSettings {
            seed_samples: false,
            ..Default::default()
        }
    }

    fn empty_session() -> ProfileSession<MemoryStore> {
        ProfileSession::open(MemoryStore::new(), &settings())
    }

    fn stored(session: &ProfileSession<MemoryStore>) -> Vec<RadarProfile> {
        let raw = session.store().get("radar-profiles").unwrap().unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn test_open_seeds_samples() {
        let session = ProfileSession::open(MemoryStore::new(), &AppSettings::default());
        assert_eq!(session.profiles().len(), 3);
        assert_eq!(session.selected_id(), Some(session.profiles()[0].id.as_str()));
        assert_eq!(stored(&session).len(), 3);
    }

    #[test]
    fn test_open_without_seeding_is_empty() {
        let session = empty_session();
        assert!(session.profiles().is_empty());
        assert_eq!(session.selected_id(), None);
    }

    fn backup(session: &ProfileSession<MemoryStore>) -> Option<String> {
        let key = session.backup_key()?;
        session.store().get(key).unwrap()
    }

    #[test]
    fn test_open_tolerates_corrupt_data() {
        let mut store = MemoryStore::new();
        store.set("radar-profiles", "{not json").unwrap();
        let session = ProfileSession::open(store, &settings());
        assert!(session.profiles().is_empty());
    }

    #[test]
    fn test_corrupt_data_is_not_replaced_by_samples() {
        let raw = r#"[{"id":"1","name":"mine","dimensions":[{"name":"A","value":2}],"createdAt":1,"updatedAt":1,}]"#;
        let mut store = MemoryStore::new();
        store.set("radar-profiles", raw).unwrap();

        let mut session = ProfileSession::open(store, &AppSettings::default());
        assert!(session.profiles().is_empty());
        assert_eq!(
            session.store().get("radar-profiles").unwrap().as_deref(),
            Some(raw)
        );
        assert_eq!(backup(&session).as_deref(), Some(raw));

        // Once backed up, new edits are saved normally.
        session.create("fresh").unwrap();
        assert_eq!(stored(&session).len(), 1);
        assert_eq!(backup(&session).as_deref(), Some(raw));
    }

    #[test]
    fn test_unreadable_store_is_never_written() {
        let mut store = MemoryStore::new();
        store.set("radar-profiles", "[]").unwrap();
        store.set_fail_reads(true);

        let mut session = ProfileSession::open(store, &AppSettings::default());
        assert!(session.is_read_only());
        assert!(session.profiles().is_empty());
        assert!(matches!(session.create("x"), Err(CoreError::Io(_))));
        assert!(matches!(session.reset(true), Err(CoreError::Io(_))));
        assert!(session.profiles().is_empty());

        session.store_mut().set_fail_reads(false);
        assert_eq!(session.store().get("radar-profiles").unwrap().as_deref(), Some("[]"));

        // A readable value from the store lifts the guard.
        session.store_mut().external_write("radar-profiles", Some("[]"));
        assert!(session.sync_external());
        assert!(!session.is_read_only());
        session.create("x").unwrap();
        assert_eq!(stored(&session).len(), 1);
    }

    #[test]
    fn test_empty_array_is_seeded() {
        let mut store = MemoryStore::new();
        store.set("radar-profiles", "[]").unwrap();
        let session = ProfileSession::open(store, &AppSettings::default());
        assert_eq!(session.profiles().len(), 3);
    }

    #[test]
    fn test_open_skips_invalid_stored_profiles() {
        let raw = r#"[
            {"id":"1","name":"ok","dimensions":[{"name":"A","value":2}],"createdAt":1,"updatedAt":1},
            {"id":"2","name":"bad","dimensions":[{"name":"A","value":7}],"createdAt":1,"updatedAt":1},
            {"id":"3","name":"none","dimensions":[],"createdAt":1,"updatedAt":1}
        ]"#;
        let mut store = MemoryStore::new();
        store.set("radar-profiles", raw).unwrap();

        let session = ProfileSession::open(store, &AppSettings::default());
        let ids: Vec<&str> = session.profiles().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1"]);
        assert_eq!(backup(&session).as_deref(), Some(raw));
    }

    #[test]
    fn test_all_invalid_stored_profiles_are_not_reseeded() {
        let raw = r#"[{"id":"1","name":"x","dimensions":[{"name":"A","value":7}],"createdAt":1,"updatedAt":1}]"#;
        let mut store = MemoryStore::new();
        store.set("radar-profiles", raw).unwrap();
        let session = ProfileSession::open(store, &AppSettings::default());
        assert!(session.profiles().is_empty());
        assert_eq!(session.store().get("radar-profiles").unwrap().as_deref(), Some(raw));
    }

    #[test]
    fn test_failed_backup_leaves_session_read_only() {
        let mut store = MemoryStore::new();
        store.set("radar-profiles", "{not json").unwrap();
        store.set_fail_writes(true);
        let mut session = ProfileSession::open(store, &AppSettings::default());
        assert!(session.is_read_only());
        session.store_mut().set_fail_writes(false);
        assert!(matches!(session.create("x"), Err(CoreError::Io(_))));
        assert_eq!(
            session.store().get("radar-profiles").unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[test]
    fn test_open_reloads_persisted_profiles() {
        let mut session = empty_session();
        let created = session.create("Dana").unwrap();
        let session = ProfileSession::open(session.into_store(), &settings());
        assert_eq!(session.profiles(), &[created]);
    }

    #[test]
    fn test_create() {
        let mut session = empty_session();
        assert!(session.create("   ").unwrap_err().is_validation());
        assert!(session.profiles().is_empty());

        let profile = session.create("  Dana ").unwrap();
        assert_eq!(profile.name, "Dana");
        assert_eq!(profile.dimensions.len(), 6);
        assert!(profile.dimensions.iter().all(|d| d.value == DEFAULT_VALUE));
        assert_eq!(session.selected_id(), Some(profile.id.as_str()));
        assert_eq!(stored(&session), vec![profile]);
    }

    #[test]
    fn test_create_uses_settings_template() {
        let settings = AppSettings {
            seed_samples: false,
            default_dimensions: vec!["Speed".into(), " ".into(), "Power".into()],
            ..Default::default()
        };
        let mut session = ProfileSession::open(MemoryStore::new(), &settings);
        let profile = session.create("x").unwrap();
        let names: Vec<&str> = profile.dimensions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Speed", "Power"]);
    }

    #[test]
    fn test_settings_template_drops_unusable_names() {
        let settings = AppSettings {
            seed_samples: false,
            default_dimensions: vec!["Speed, Agility".into(), "Power".into()],
            ..Default::default()
        };
        let mut session = ProfileSession::open(MemoryStore::new(), &settings);
        let profile = session.create("x").unwrap();
        assert_eq!(profile.dimensions, vec![Dimension::new("Power", DEFAULT_VALUE)]);
    }

    #[test]
    fn test_names_that_break_csv_are_rejected() {
        let mut session = empty_session();
        assert!(session.create("a\nb").unwrap_err().is_validation());
        let id = session.create("Say \"hi\", Bob").unwrap().id;

        assert!(session.rename(&id, "a\r\nb").unwrap_err().is_validation());
        assert!(session
            .rename_dimension(&id, 0, "Speed, Agility")
            .unwrap_err()
            .is_validation());
        assert!(session.rename_dimension(&id, 0, "\"Edge\"").is_err());
        assert!(session
            .update_dimensions(&id, vec![Dimension::new("a\nb", 3)])
            .is_err());
        assert!(session.history().is_empty());

        // Whatever the session accepted survives an export/import cycle.
        let before = session.profiles().to_vec();
        let csv = session.export_csv().unwrap();
        assert_eq!(session.import_csv(&csv).unwrap(), 1);
        let copy = &session.profiles()[1];
        assert_eq!(copy.name, before[0].name);
        assert_eq!(copy.dimensions, before[0].dimensions);
    }

    #[test]
    fn test_update_dimensions() {
        let mut session = empty_session();
        let profile = session.create("x").unwrap();

        assert!(!session.update_dimensions("missing", vec![Dimension::new("A", 1)]).unwrap());
        assert!(session.update_dimensions(&profile.id, vec![]).is_err());
        assert!(session
            .update_dimensions(&profile.id, vec![Dimension::new("A", 9)])
            .is_err());

        let dims = vec![Dimension::new(" A ", 1), Dimension::new("B", 5)];
        assert!(session.update_dimensions(&profile.id, dims).unwrap());
        let updated = session.profile(&profile.id).unwrap();
        assert_eq!(updated.dimensions, vec![Dimension::new("A", 1), Dimension::new("B", 5)]);
        assert!(updated.updated_at >= updated.created_at);
        assert_eq!(stored(&session)[0].dimensions.len(), 2);
    }

    #[test]
    fn test_dimension_helpers() {
        let mut session = empty_session();
        let id = session.create("x").unwrap().id;

        assert!(session.set_dimension_value(&id, 0, 5).unwrap());
        assert!(session.set_dimension_value(&id, 0, 0).is_err());
        assert!(session.set_dimension_value(&id, 42, 3).is_err());
        assert!(session.rename_dimension(&id, 1, " Craft ").unwrap());
        assert!(session.rename_dimension(&id, 1, "").is_err());
        assert!(session.move_dimension(&id, 0, 5).unwrap());
        assert!(session.move_dimension(&id, 0, 6).is_err());

        let dims = &session.profile(&id).unwrap().dimensions;
        assert_eq!(dims[0], Dimension::new("Craft", 3));
        assert_eq!(dims[5], Dimension::new("Business Analysis", 5));
        assert!(!session.set_dimension_value("missing", 0, 3).unwrap());
    }

    #[test]
    fn test_rename() {
        let mut session = empty_session();
        let id = session.create("x").unwrap().id;
        assert!(session.rename(&id, "").is_err());
        assert!(!session.rename("missing", "y").unwrap());
        assert!(session.rename(&id, " y ").unwrap());
        assert_eq!(session.profile(&id).unwrap().name, "y");
    }

    #[test]
    fn test_delete_last_profile_synthesizes_placeholder() {
        let mut session = empty_session();
        let id = session.create("only").unwrap().id;

        let outcome = session.delete(&id).unwrap();
        let DeleteOutcome::Replaced { replacement } = outcome else {
            panic!("expected a replacement");
        };
        assert_eq!(session.profiles().len(), 1);
        assert_eq!(replacement.name, SENTINEL_PROFILE_NAME);
        assert!(replacement.dimensions.iter().all(|d| (2..=4).contains(&d.value)));
        assert_eq!(session.selected_id(), Some(replacement.id.as_str()));
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_delete_lone_placeholder_is_rejected() {
        let mut session = empty_session();
        let id = session.create("only").unwrap().id;
        session.delete(&id).unwrap();
        let placeholder = session.profiles()[0].clone();

        let err = session.delete(&placeholder.id).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(session.profiles(), &[placeholder.clone()]);

        // The guard keys on the name only.
        session.rename(&placeholder.id, "renamed").unwrap();
        assert!(matches!(
            session.delete(&placeholder.id).unwrap(),
            DeleteOutcome::Replaced { .. }
        ));
    }

    #[test]
    fn test_delete_selected_moves_selection_to_first() {
        let mut session = empty_session();
        let a = session.create("a").unwrap().id;
        let b = session.create("b").unwrap().id;
        let c = session.create("c").unwrap().id;

        session.select(&b).unwrap();
        assert_eq!(session.delete(&b).unwrap(), DeleteOutcome::Removed);
        assert_eq!(session.selected_id(), Some(a.as_str()));

        session.select(&c).unwrap();
        session.delete(&a).unwrap();
        assert_eq!(session.selected_id(), Some(c.as_str()));
    }

    #[test]
    fn test_delete_unknown_id() {
        let mut session = empty_session();
        session.create("a").unwrap();
        assert!(session.delete("missing").unwrap_err().is_validation());
    }

    #[test]
    fn test_undo_restores_exact_profile() {
        let mut session = empty_session();
        session.create("a").unwrap();
        let b = session.create("b").unwrap();
        session.delete(&b.id).unwrap();

        let restored = session.undo_delete(None).unwrap();
        assert_eq!(restored, b);
        assert_eq!(session.profile(&b.id), Some(&b));
        assert_eq!(session.selected_id(), Some(b.id.as_str()));
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_undo_with_empty_history_changes_nothing() {
        let mut session = empty_session();
        session.create("a").unwrap();
        let before = session.profiles().to_vec();
        assert!(session.undo_delete(None).unwrap_err().is_validation());
        assert_eq!(session.profiles(), before.as_slice());
    }

    #[test]
    fn test_undo_specific_profile() {
        let mut session = empty_session();
        let a = session.create("a").unwrap();
        let b = session.create("b").unwrap();
        session.create("c").unwrap();
        session.delete(&a.id).unwrap();
        session.delete(&b.id).unwrap();

        assert!(session.undo_delete(Some("missing")).is_err());
        assert_eq!(session.undo_delete(Some(&a.id)).unwrap(), a);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].id, b.id);
    }

    #[test]
    fn test_undo_rejects_duplicate_id() {
        let mut session = empty_session();
        session.create("a").unwrap();
        let b = session.create("b").unwrap();
        let snapshot = serde_json::to_string(session.profiles()).unwrap();
        session.delete(&b.id).unwrap();

        // Another window puts the deleted profile back.
        session
            .store_mut()
            .external_write("radar-profiles", Some(&snapshot));
        assert!(session.sync_external());

        let err = session.undo_delete(None).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_history_is_bounded_most_recent_first() {
        let settings = AppSettings {
            seed_samples: false,
            undo_capacity: 2,
            ..Default::default()
        };
        let mut session = ProfileSession::open(MemoryStore::new(), &settings);
        let ids: Vec<String> = ["a", "b", "c", "d"]
            .iter()
            .map(|n| session.create(n).unwrap().id)
            .collect();
        for id in &ids[..3] {
            session.delete(id).unwrap();
        }
        let kept: Vec<&str> = session.history().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(kept, vec![ids[2].as_str(), ids[1].as_str()]);
    }

    #[test]
    fn test_edits_clear_history() {
        let mut session = empty_session();
        let a = session.create("a").unwrap().id;
        let b = session.create("b").unwrap().id;
        session.delete(&b).unwrap();
        assert_eq!(session.history().len(), 1);

        session.rename(&a, "a2").unwrap();
        assert!(session.history().is_empty());

        let c = session.create("c").unwrap().id;
        session.delete(&c).unwrap();
        session.duplicate(&a).unwrap();
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_duplicate() {
        let mut session = empty_session();
        let a = session.create("a").unwrap();
        let copy = session.duplicate(&a.id).unwrap();
        assert_ne!(copy.id, a.id);
        assert_eq!(copy.name, "a (copy)");
        assert_eq!(copy.dimensions, a.dimensions);
        assert_eq!(session.selected_id(), Some(copy.id.as_str()));
        assert!(session.duplicate("missing").is_err());
    }

    #[test]
    fn test_reset_requires_confirmation() {
        let mut session = empty_session();
        let a = session.create("a").unwrap().id;
        session.create("b").unwrap();
        session.delete(&a).unwrap();

        assert!(session.reset(false).is_err());
        assert_eq!(session.profiles().len(), 1);

        session.reset(true).unwrap();
        assert!(session.profiles().is_empty());
        assert!(session.history().is_empty());
        assert_eq!(session.selected_id(), None);
        assert_eq!(session.store().get("radar-profiles").unwrap(), None);
    }

    #[test]
    fn test_failed_write_keeps_previous_state() {
        let mut session = empty_session();
        let a = session.create("a").unwrap();
        session.store_mut().set_fail_writes(true);

        assert!(matches!(session.create("b"), Err(CoreError::Io(_))));
        assert!(matches!(session.delete(&a.id), Err(CoreError::Io(_))));
        assert_eq!(session.profiles(), &[a.clone()]);
        assert!(session.history().is_empty());
        assert_eq!(session.selected_id(), Some(a.id.as_str()));
    }

    #[test]
    fn test_import_and_export() {
        let mut session = empty_session();
        assert!(session.export_csv().unwrap_err().is_validation());

        let count = session
            .import_csv("profile_name,A,B\n\"x\",1,5\n\"y, z\",2,3\n")
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(session.profiles()[1].name, "y, z");
        assert_eq!(session.selected_id(), Some(session.profiles()[0].id.as_str()));

        assert!(session.import_csv("bad").is_err());
        assert_eq!(session.profiles().len(), 2);

        let csv = session.export_csv().unwrap();
        assert!(csv.starts_with("profile_name,A,B,created_at,updated_at\n\"x\",1,5,"));
    }

    #[test]
    fn test_export_csv_file() {
        let dir = tempdir().unwrap();
        let mut session = empty_session();
        session.create("a").unwrap();
        let path = dir.path().join(csv::DEFAULT_EXPORT_FILENAME);
        assert_eq!(session.export_csv_file(&path).unwrap(), 1);
        assert!(path.exists());
    }

    #[test]
    fn test_chart_for_selected_profile() {
        let mut session = empty_session();
        assert!(session.chart(500.0).is_err());
        session.create("a").unwrap();
        let chart = session.chart(500.0).unwrap();
        assert_eq!(chart.polygon.len(), 6);
    }

    #[test]
    fn test_external_change_replaces_collection() {
        let mut session = empty_session();
        let a = session.create("a").unwrap();

        let theirs = vec![RadarProfile {
            id: "remote".into(),
            name: "remote".into(),
            dimensions: vec![Dimension::new("A", 2)],
            created_at: 1,
            updated_at: 1,
        }];
        let raw = serde_json::to_string(&theirs).unwrap();
        session.store_mut().external_write("other-key", Some("[]"));
        session.store_mut().external_write("radar-profiles", Some("garbage"));
        assert!(!session.sync_external());
        assert_eq!(session.profiles(), &[a]);

        session.store_mut().external_write("radar-profiles", Some(&raw));
        assert!(session.sync_external());
        assert_eq!(session.profiles(), theirs.as_slice());
        assert_eq!(session.selected_id(), Some("remote"));

        session.store_mut().external_write("radar-profiles", None);
        assert!(!session.sync_external());
        assert_eq!(session.profiles().len(), 1);
    }

    #[test]
    fn test_external_change_skips_invalid_profiles() {
        let mut session = empty_session();
        session.create("a").unwrap();
        let raw = r#"[
            {"id":"r1","name":"ok","dimensions":[{"name":"A","value":5}],"createdAt":1,"updatedAt":1},
            {"id":"r2","name":"bad","dimensions":[{"name":"A","value":7}],"createdAt":1,"updatedAt":1}
        ]"#;
        session.store_mut().external_write("radar-profiles", Some(raw));
        assert!(session.sync_external());
        let ids: Vec<&str> = session.profiles().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["r1"]);
    }

    #[test]
    fn test_summaries() {
        let mut session = empty_session();
        let id = session.create("a").unwrap().id;
        session.set_dimension_value(&id, 0, 5).unwrap();
        let summaries = session.summaries();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].average, 3.3);
    }
}
