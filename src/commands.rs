//! Tauri command surface.  Each command locks the session, runs exactly one
//! operation and converts errors to strings for the frontend.

mod chart;
mod csv;
mod profiles;
mod settings;

pub use chart::*;
pub use csv::*;
pub use profiles::*;
pub use settings::*;

use std::sync::Mutex;

use crate::core::{AppSettings, CoreResult, FileStore, ProfileSession};

/// Managed state: the one session every window talks to, plus the settings
/// it was opened with that commands still need.
pub struct SessionState {
    pub session: Mutex<ProfileSession<FileStore>>,
    pub chart_size: f64,
}

impl SessionState {
    pub fn new(session: ProfileSession<FileStore>, settings: &AppSettings) -> Self {
        Self {
            session: Mutex::new(session),
            chart_size: settings.chart_size,
        }
    }

    pub(crate) fn with<T>(
        &self,
        op: impl FnOnce(&mut ProfileSession<FileStore>) -> CoreResult<T>,
    ) -> Result<T, String> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| "profile session is unavailable".to_string())?;
        op(&mut *session).map_err(|e| {
            if e.is_validation() {
                tracing::debug!(error = %e, "request rejected");
            } else {
                tracing::error!(error = %e, "request failed");
            }
            e.to_string()
        })
    }
}
