//! Desktop browser adapter: page title from the window title, URL from the address bar.

use std::time::Instant;

use super::ContextAdapter;
use crate::automation::{AccessibilityTree, AutomationProvider, ElementRole, RoleFilter, TreeScope};
use crate::models::{ContextRecord, SourceInfo};
use crate::settings::BrowserAdapterSettings;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

pub const ADAPTER_TYPE: &str = "browser";

const ADDRESS_BAR_CANDIDATES: usize = 5;

pub struct BrowserAdapter<P> {
    provider: P,
    settings: BrowserAdapterSettings,
}

impl<P: AutomationProvider> BrowserAdapter<P> {
    pub fn new(provider: P, settings: BrowserAdapterSettings) -> Self {
        Self { provider, settings }
    }

    fn page_title(&self, title: &str) -> String {
        self.settings
            .title_suffixes
            .iter()
            .find_map(|suffix| title.strip_suffix(suffix.as_str()))
            .unwrap_or(title)
            .trim()
            .to_string()
    }

    fn address_bar_url(&self, session: &P::Session, source: &SourceInfo) -> Option<String> {
        let root = match session.element_from_handle(source.window_handle) {
            Ok(root) => root,
            Err(err) => {
                log_debug!("browser: no root element: {err}");
                return None;
            }
        };

        session
            .find_or_empty(&root, RoleFilter::Only(ElementRole::Edit), TreeScope::Descendants)
            .iter()
            .take(ADDRESS_BAR_CANDIDATES)
            .filter_map(|element| session.element_value(element).ok())
            .find_map(|value| normalize_url(&value))
    }
}

/// Address bar contents as a URL, or `None` when they are a search query or empty.
fn normalize_url(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return None;
    }
    if value.contains("://") || value.starts_with("about:") {
        return Some(value.to_string());
    }
    value.contains('.').then(|| format!("https://{value}"))
}

fn browser_family(process_name: &str) -> &'static str {
    match process_name.to_lowercase().trim_end_matches(".exe") {
        "chrome" => "chrome",
        "msedge" => "edge",
        "firefox" => "firefox",
        "brave" => "brave",
        "opera" => "opera",
        _ => "other",
    }
}

impl<P: AutomationProvider> ContextAdapter for BrowserAdapter<P> {
    fn adapter_type(&self) -> &'static str {
        ADAPTER_TYPE
    }

    fn can_handle(&self, process_name: &str, _window_title: &str) -> bool {
        let process_name = process_name.to_lowercase();
        self.settings.enabled
            && self
                .settings
                .process_names
                .iter()
                .any(|name| name.to_lowercase() == process_name)
    }

    fn get_context(&self, source: &SourceInfo) -> ContextRecord {
        let started = Instant::now();
        let mut record = ContextRecord::browser(ADAPTER_TYPE);

        let page_title = self.page_title(&source.window_title);
        let address = match self.provider.open() {
            Ok(session) => self.address_bar_url(&session, source),
            Err(err) => {
                log_warn!("browser: failed to initialize UI Automation: {err}");
                record.error = Some(format!("Failed to initialize UI Automation: {err}"));
                None
            }
        };

        if let Some(browser) = record.as_browser_mut() {
            browser.page_title = page_title.clone();
            browser.address_bar_url = address.clone().unwrap_or_default();
        }
        record.title = (!page_title.is_empty()).then_some(page_title);
        record.url = address;

        if record.settle("Failed to read the browser address bar") {
            record.insert_metadata("browser", browser_family(&source.process_name));
        }
        record.finish(started);

        log_info!(
            "browser: completed in {}ms, success={}",
            record.fetch_time_ms,
            record.success
        );
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::snapshot::{SnapshotNode, SnapshotProvider, SnapshotTree};
    use crate::models::WindowHandle;

    const HWND: WindowHandle = WindowHandle(0x3003);

    fn adapter(tree: SnapshotTree) -> BrowserAdapter<SnapshotProvider> {
        BrowserAdapter::new(SnapshotProvider::new(tree), BrowserAdapterSettings::default())
    }

    #[test]
    fn handles_known_browsers() {
        let adapter = adapter(SnapshotTree::new());
        assert!(adapter.can_handle("Chrome.exe", ""));
        assert!(adapter.can_handle("msedge.exe", ""));
        assert!(!adapter.can_handle("WeChat.exe", ""));
    }

    #[test]
    fn disabled_browser_adapter_handles_nothing() {
        let settings = BrowserAdapterSettings {
            enabled: false,
            ..BrowserAdapterSettings::default()
        };
        let adapter = BrowserAdapter::new(SnapshotProvider::new(SnapshotTree::new()), settings);
        assert!(!adapter.can_handle("chrome.exe", ""));
    }

    #[test]
    fn reads_address_bar_and_title() {
        let tree = SnapshotTree::new().with_window(
            HWND,
            "Rust Docs - Google Chrome",
            SnapshotNode::pane(vec![
                SnapshotNode::edit("Search tabs", "find a tab"),
                SnapshotNode::edit("Address and search bar", "doc.rust-lang.org/std"),
            ]),
        );
        let source = SourceInfo::new("chrome.exe", "Rust Docs - Google Chrome", HWND);
        let record = adapter(tree).get_context(&source);
        let browser = record.as_browser().unwrap();
        assert!(record.success);
        assert_eq!(browser.address_bar_url, "https://doc.rust-lang.org/std");
        assert_eq!(browser.page_title, "Rust Docs");
        assert_eq!(record.url.as_deref(), Some("https://doc.rust-lang.org/std"));
        assert_eq!(record.metadata.get("browser").map(String::as_str), Some("chrome"));
    }

    #[test]
    fn missing_address_bar_fails_but_keeps_title() {
        let tree = SnapshotTree::new().with_window(HWND, "New Tab - Microsoft Edge", SnapshotNode::pane(vec![]));
        let source = SourceInfo::new("msedge.exe", "New Tab - Microsoft Edge", HWND);
        let record = adapter(tree).get_context(&source);
        assert!(!record.success);
        assert!(record.error.is_some());
        assert_eq!(record.as_browser().unwrap().page_title, "New Tab");
    }

    #[test]
    fn unavailable_automation_keeps_title_and_reports_init_failure() {
        let adapter = BrowserAdapter::new(SnapshotProvider::unavailable(), BrowserAdapterSettings::default());
        let source = SourceInfo::new("firefox.exe", "Crates - Mozilla Firefox", HWND);
        let record = adapter.get_context(&source);
        assert!(!record.success);
        assert!(record
            .error
            .as_deref()
            .unwrap()
            .starts_with("Failed to initialize UI Automation"));
        assert_eq!(record.as_browser().unwrap().page_title, "Crates");
    }

    #[test]
    fn normalizes_urls() {
        assert_eq!(normalize_url("https://a.b/c").as_deref(), Some("https://a.b/c"));
        assert_eq!(normalize_url("example.com").as_deref(), Some("https://example.com"));
        assert_eq!(normalize_url("rust borrow checker"), None);
        assert_eq!(normalize_url("localhost"), None);
        assert_eq!(normalize_url(""), None);
    }
}
