// Prevents additional console window on Windows in release, DO NOT REMOVE!!
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use hexradar_lib::core;

const USAGE: &str = "usage: hexradar [export-csv <path> | import-csv <path>]";

fn main() {
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("export-csv") | Some("import-csv") => {
            hexradar_lib::init_logging();
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .expect("Failed to create tokio runtime");
            if let Err(e) = rt.block_on(run_headless(&args[1], args.get(2))) {
                eprintln!("hexradar: {}", e);
                std::process::exit(1);
            }
        }
        Some(_) => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
        None => launch_desktop(),
    }
}

async fn run_headless(command: &str, path: Option<&String>) -> Result<(), String> {
    let path = path.ok_or_else(|| USAGE.to_string())?;
    let settings = core::read_settings()?;
    let mut session = core::open_default_session(&settings)?;

    if command == "export-csv" {
        let count = session
            .export_csv_file(std::path::Path::new(path))
            .map_err(|e| e.to_string())?;
        println!("Exported {} profile(s) to {}", count, path);
    } else {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read {}: {}", path, e))?;
        let count = session.import_csv(&content).map_err(|e| e.to_string())?;
        println!("Imported {} profile(s)", count);
    }
    Ok(())
}

#[cfg(feature = "desktop")]
fn launch_desktop() {
    hexradar_lib::run();
}

#[cfg(not(feature = "desktop"))]
fn launch_desktop() {
    eprintln!("hexradar was built without the desktop feature");
    eprintln!("{}", USAGE);
    std::process::exit(2);
}
