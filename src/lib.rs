pub mod core;

#[cfg(feature = "desktop")]
mod commands;

use tracing_subscriber::EnvFilter;

// ── Logging ──────────────────────────────────────────────────────────────────

/// Install the stderr subscriber.  `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hexradar=info,hexradar_lib=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

// ── App Entry ────────────────────────────────────────────────────────────────

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use commands::*;
    use tauri::{Emitter, Manager};

    init_logging();

    let settings = core::read_settings().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not read settings, using defaults");
        core::AppSettings::default()
    });

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .setup(move |app| {
            let session = core::open_default_session(&settings)?;
            app.manage(SessionState::new(session, &settings));

            // Pick up writes from other windows or the CLI.  Runs on a
            // background thread so it never blocks the UI.
            let handle = app.handle().clone();
            std::thread::spawn(move || loop {
                std::thread::sleep(std::time::Duration::from_secs(2));
                let state = handle.state::<SessionState>();
                let changed = match state.session.lock() {
                    Ok(mut session) => session.sync_external(),
                    Err(e) => {
                        tracing::error!(error = %e, "profile session lock poisoned, stopping external sync");
                        break;
                    }
                };
                if changed {
                    if let Err(e) = handle.emit("profiles-changed", ()) {
                        tracing::warn!(error = %e, "failed to notify frontend");
                    }
                }
            });
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            read_settings,
            write_settings,
            list_profiles,
            list_profile_summaries,
            get_selected_profile,
            select_profile,
            create_profile,
            update_dimensions,
            set_dimension_value,
            rename_dimension,
            move_dimension,
            rename_profile,
            delete_profile,
            undo_delete,
            list_deleted_profiles,
            duplicate_profile,
            reset_profiles,
            import_csv,
            import_csv_file,
            export_csv,
            export_csv_file,
            default_export_filename,
            get_chart,
            get_chart_svg,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
