//! Core library: data model, CSV codec, chart geometry, persistence and the
//! profile session that ties them together.  Nothing in here depends on the
//! desktop shell.

pub mod csv;
pub mod error;
pub mod paths;
pub mod radar;
pub mod session;
pub mod settings;
pub mod store;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use paths::{get_hexradar_dir, get_store_dir, is_valid_name};
pub use radar::{build_chart, RadarChart, TextAnchor};
pub use session::{DeleteOutcome, ProfileSession};
pub use settings::{read_settings, write_settings, AppSettings};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreChange};
pub use types::{Dimension, IdGenerator, ProfileSummary, RadarProfile};

/// Open the on-disk session the desktop app and the CLI share.
pub fn open_default_session(settings: &AppSettings) -> Result<ProfileSession<FileStore>, String> {
    let mut store = FileStore::open(get_store_dir()?).map_err(|e| e.to_string())?;
    store
        .watch(&settings.storage_key)
        .map_err(|e| e.to_string())?;
    Ok(ProfileSession::open(store, settings))
}
