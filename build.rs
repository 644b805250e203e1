fn main() {
    // Only the desktop shell embeds tauri.conf.json; the core library and the
    // headless CLI have nothing to generate.
    #[cfg(feature = "desktop")]
    tauri_build::build();

    println!("cargo:rerun-if-changed=tauri.conf.json");
}
