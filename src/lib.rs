//! Foreground-window context extraction and clipboard history logging.
//!
//! A host hands in a [`SourceInfo`] for the focused window; the [`ContextRegistry`]
//! picks the adapter for that application, which walks the accessibility tree and
//! returns a [`ContextRecord`]. The record rides along with the clipboard entry into
//! the [`HistoryLog`].

pub mod adapters;
pub mod automation;
pub mod history;
pub mod models;
pub mod sensing;
pub mod settings;
mod utils;

pub use adapters::{BrowserAdapter, ContextAdapter, ContextRegistry, WeChatAdapter};
pub use history::HistoryLog;
pub use models::{
    ChatType, ClipboardContentType, ClipboardEntry, ContextDetails, ContextRecord, SourceInfo,
    WindowHandle,
};
pub use sensing::ContextCapture;
pub use settings::{CaptureSettings, SettingsStore};

/// Installs the `env_logger` backend. `CLIPCONTEXT_DEBUG=1` lowers the default filter
/// to debug; `RUST_LOG` still wins. Safe to call more than once.
pub fn init_logging() {
    let debug_mode = std::env::var("CLIPCONTEXT_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let _ = env_logger::Builder::new()
        .filter_level(if debug_mode {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .parse_default_env()
        .try_init();
}
