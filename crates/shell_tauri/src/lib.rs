//! Tauri shell bootstrap for the Vibz embedded-browser runtime.
//!
//! This crate keeps command registration and plugin wiring localized so the
//! runtime crates stay decoupled from Tauri internals. The shell hosts one
//! full-screen webview window pointed at the externally hosted page, funnels
//! every OS callback and surface message through a single event channel, and
//! answers over the bridge transport.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

mod bridge;
#[doc(hidden)]
pub mod prefs;
mod push;
pub mod runtime;
mod share;

/// User agent presented by the embedded surface.
pub const USER_AGENT: &str = "VibzWorldApp/1.0";

/// Label of the single shell webview window.
pub const MAIN_WINDOW_LABEL: &str = "main";

/// Starts the Tauri shell host process.
pub fn run() {
    let _ = tracing_subscriber::fmt().with_target(false).try_init();

    tauri::Builder::default()
        .plugin(tauri_plugin_deep_link::init())
        .plugin(tauri_plugin_notification::init())
        .plugin(tauri_plugin_opener::init())
        .invoke_handler(tauri::generate_handler![bridge::bridge_post_message])
        .setup(|app| runtime::attach(app))
        .run(tauri::generate_context!())
        .expect("shell_tauri failed to run Tauri application");
}
