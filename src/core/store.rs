use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use super::error::{CoreError, CoreResult};
use super::paths::is_valid_name;

// ── Key-Value Store ──────────────────────────────────────────────────────────
//
// The profile collection lives under a single key as serialized JSON.  The
// store only moves strings around; (de)serialization is the session's job.

/// A write to the store that did not come from this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChange {
    pub key: String,
    /// `None` when the key was removed.
    pub new_value: Option<String>,
}

pub type ChangeListener = Box<dyn Fn(&StoreChange) + Send>;

/// Persistence capability the session is written against.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> CoreResult<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> CoreResult<()>;

    fn delete(&mut self, key: &str) -> CoreResult<()>;

    /// Register a callback for writes made by someone else.
    fn on_external_change(&mut self, listener: ChangeListener);

    /// Look for external writes and notify listeners.  Stores that learn
    /// about changes some other way need not override this.
    fn poll_external(&mut self) -> CoreResult<usize> {
        Ok(0)
    }
}

fn notify(listeners: &[ChangeListener], change: &StoreChange) {
    for listener in listeners {
        listener(change);
    }
}

// ── In-memory store ──────────────────────────────────────────────────────────

/// Process-local store, used by tests and as a fallback when no data
/// directory is available.
#[derive(Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    listeners: Vec<ChangeListener>,
    fail_writes: bool,
    fail_reads: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate another window writing to the store.
    pub fn external_write(&mut self, key: &str, value: Option<&str>) {
        match value {
            Some(v) => {
                self.entries.insert(key.to_string(), v.to_string());
            }
            None => {
                self.entries.remove(key);
            }
        }
        let change = StoreChange {
            key: key.to_string(),
            new_value: value.map(|v| v.to_string()),
        };
        notify(&self.listeners, &change);
    }

    /// Make every subsequent `set`/`delete` fail, to exercise error paths.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Make every subsequent `get` fail, as an unreadable file would.
    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    fn check_writable(&self) -> CoreResult<()> {
        if self.fail_writes {
            return Err(CoreError::Io("store is read-only".into()));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        if self.fail_reads {
            return Err(CoreError::Io("store is unreadable".into()));
        }
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> CoreResult<()> {
        self.check_writable()?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> CoreResult<()> {
        self.check_writable()?;
        self.entries.remove(key);
        Ok(())
    }

    fn on_external_change(&mut self, listener: ChangeListener) {
        self.listeners.push(listener);
    }
}

// ── File store ───────────────────────────────────────────────────────────────

/// One `<key>.json` file per key inside `dir`.
///
/// The store remembers the last contents it read or wrote for each key;
/// `poll_external` compares that against the disk so writes from another
/// process (a second window, the CLI) are reported to listeners.
pub struct FileStore {
    dir: PathBuf,
    known: HashMap<String, Option<String>>,
    listeners: Vec<ChangeListener>,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> CoreResult<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self {
            dir,
            known: HashMap::new(),
            listeners: Vec::new(),
        })
    }

    /// Start tracking `key` so later external writes to it are reported.
    pub fn watch(&mut self, key: &str) -> CoreResult<()> {
        let current = self.read_disk(key)?;
        self.known.insert(key.to_string(), current);
        Ok(())
    }

    fn key_path(&self, key: &str) -> CoreResult<PathBuf> {
        if !is_valid_name(key) {
            return Err(CoreError::validation(format!("Invalid store key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    fn read_disk(&self, key: &str) -> CoreResult<Option<String>> {
        let path = self.key_path(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> CoreResult<Option<String>> {
        self.read_disk(key)
    }

    fn set(&mut self, key: &str, value: &str) -> CoreResult<()> {
        let path = self.key_path(key)?;
        // Readers never observe a partially written file.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        self.known.insert(key.to_string(), Some(value.to_string()));
        Ok(())
    }

    fn delete(&mut self, key: &str) -> CoreResult<()> {
        let path = self.key_path(key)?;
        if path.exists() {
            fs::remove_file(&path)?;
        }
        self.known.insert(key.to_string(), None);
        Ok(())
    }

    fn on_external_change(&mut self, listener: ChangeListener) {
        self.listeners.push(listener);
    }

    fn poll_external(&mut self) -> CoreResult<usize> {
        let keys: Vec<String> = self.known.keys().cloned().collect();
        let mut changed = 0;
        for key in keys {
            let on_disk = self.read_disk(&key)?;
            if self.known.get(&key) == Some(&on_disk) {
                continue;
            }
            self.known.insert(key.clone(), on_disk.clone());
            notify(
                &self.listeners,
                &StoreChange {
                    key,
                    new_value: on_disk,
                },
            );
            changed += 1;
        }
        Ok(changed)
    }
}
