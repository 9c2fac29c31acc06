//! Application-specific context extractors.

pub mod browser;
pub mod heuristics;
pub mod registry;
pub mod wechat;

pub use browser::BrowserAdapter;
pub use heuristics::ChatHeuristics;
pub use registry::ContextRegistry;
pub use wechat::WeChatAdapter;

use crate::models::{ContextRecord, SourceInfo};

/// Extracts context from one host application.
///
/// `can_handle` must stay cheap and never touch the accessibility tree; the registry
/// calls it for every foreground window. `get_context` always returns a record: faults
/// become `success == false` with `error` set, and `fetch_time_ms` covers the whole call.
pub trait ContextAdapter: Send + Sync {
    fn adapter_type(&self) -> &'static str;

    fn can_handle(&self, process_name: &str, window_title: &str) -> bool;

    fn get_context(&self, source: &SourceInfo) -> ContextRecord;
}
