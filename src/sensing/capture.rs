use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::time::{timeout, Duration, Instant};

use crate::{
    adapters::ContextRegistry,
    history::HistoryLog,
    models::{ClipboardEntry, ContextDetails, ContextRecord, SourceInfo},
    settings::CaptureSettings,
};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// Runs context resolution on the blocking pool so a slow accessibility walk never
/// stalls the caller, and drops results that arrive after the deadline.
#[derive(Clone)]
pub struct ContextCapture {
    registry: Arc<ContextRegistry>,
    deadline: Duration,
}

impl ContextCapture {
    pub fn new(registry: ContextRegistry, deadline: Duration) -> Self {
        Self {
            registry: Arc::new(registry),
            deadline,
        }
    }

    pub fn from_settings(registry: ContextRegistry, settings: &CaptureSettings) -> Self {
        Self::new(registry, Duration::from_millis(settings.capture_timeout_ms))
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// `None` when no adapter claims the window, the adapter panicked, or it missed
    /// the deadline. A late extraction keeps running on its worker; its result is ignored.
    pub async fn capture(&self, source: &SourceInfo) -> Option<ContextRecord> {
        let started = Instant::now();
        let registry = Arc::clone(&self.registry);
        let owned = source.clone();
        let task = tokio::task::spawn_blocking(move || registry.resolve(&owned));

        match timeout(self.deadline, task).await {
            Ok(Ok(record)) => record,
            Ok(Err(err)) => {
                log_error!("context extraction for {} aborted: {err}", source.process_name);
                None
            }
            Err(_) => {
                log_warn!(
                    "context extraction for {} timed out after {}ms",
                    source.process_name,
                    started.elapsed().as_millis()
                );
                None
            }
        }
    }

    /// Captures context for `entry`'s source window, attaches it and appends the entry.
    pub async fn record(&self, history: &Arc<HistoryLog>, mut entry: ClipboardEntry) -> Result<()> {
        let context = self.capture(&entry.source).await;
        attach_context(&mut entry, context);

        let history = Arc::clone(history);
        let summary = format!(
            "{} from {}",
            entry.content_type.as_str(),
            entry.source.process_name
        );
        tokio::task::spawn_blocking(move || history.append(&entry))
            .await
            .context("history writer task failed")??;

        log_info!("recorded {summary}");
        Ok(())
    }
}

/// Folds the CF_HTML source URL into the captured context, or into the entry's bare
/// `context_url` when no adapter produced a record.
pub fn attach_context(entry: &mut ClipboardEntry, context: Option<ContextRecord>) {
    let source_url = entry.html_source_url().map(str::to_string);

    match context {
        Some(mut record) => {
            if let (Some(url), ContextDetails::Browser(browser)) = (&source_url, &mut record.details) {
                browser.source_url = url.clone();
                if record.url.as_deref().map_or(true, str::is_empty) {
                    record.url = Some(url.clone());
                }
            }
            entry.context = Some(record);
        }
        None => entry.context_url = source_url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ContextAdapter;
    use crate::models::{ClipboardContentType, WindowHandle};

    struct Slow(std::time::Duration);

    impl ContextAdapter for Slow {
        fn adapter_type(&self) -> &'static str {
            "slow"
        }

        fn can_handle(&self, process_name: &str, _window_title: &str) -> bool {
            process_name == "slow.exe"
        }

        fn get_context(&self, _source: &SourceInfo) -> ContextRecord {
            std::thread::sleep(self.0);
            ContextRecord::base("slow")
        }
    }

    struct Exploding;

    impl ContextAdapter for Exploding {
        fn adapter_type(&self) -> &'static str {
            "exploding"
        }

        fn can_handle(&self, _process_name: &str, _window_title: &str) -> bool {
            true
        }

        fn get_context(&self, _source: &SourceInfo) -> ContextRecord {
            panic!("tree vanished");
        }
    }

    fn source(process: &str) -> SourceInfo {
        SourceInfo::new(process, "", WindowHandle(1))
    }

    #[tokio::test]
    async fn returns_record_within_deadline() {
        let capture = ContextCapture::new(
            ContextRegistry::new().with(Slow(std::time::Duration::ZERO)),
            Duration::from_secs(5),
        );
        let record = capture.capture(&source("slow.exe")).await.unwrap();
        assert_eq!(record.adapter_type, "slow");
    }

    #[tokio::test]
    async fn late_results_are_dropped() {
        let capture = ContextCapture::new(
            ContextRegistry::new().with(Slow(std::time::Duration::from_millis(500))),
            Duration::from_millis(20),
        );
        assert!(capture.capture(&source("slow.exe")).await.is_none());
    }

    #[tokio::test]
    async fn panicking_adapter_yields_no_context() {
        let capture = ContextCapture::new(ContextRegistry::new().with(Exploding), Duration::from_secs(5));
        assert!(capture.capture(&source("any.exe")).await.is_none());
    }

    #[test]
    fn html_source_url_fills_browser_record() {
        let payload = "Version:0.9\r\nSourceURL:https://example.com/page\r\n<html></html>";
        let mut entry = ClipboardEntry::new(ClipboardContentType::Html, payload, source("chrome.exe"));
        attach_context(&mut entry, Some(ContextRecord::browser("browser")));

        let record = entry.context.unwrap();
        assert_eq!(record.as_browser().unwrap().source_url, "https://example.com/page");
        assert_eq!(record.url.as_deref(), Some("https://example.com/page"));
    }

    #[test]
    fn html_source_url_without_context_becomes_context_url() {
        let payload = "Version:0.9\r\nSourceURL:https://example.com/page\r\n<html></html>";
        let mut entry = ClipboardEntry::new(ClipboardContentType::Html, payload, source("word.exe"));
        attach_context(&mut entry, None);
        assert!(entry.context.is_none());
        assert_eq!(entry.context_url.as_deref(), Some("https://example.com/page"));
    }

    #[tokio::test]
    async fn record_appends_entry_with_context() {
        let dir = tempfile::tempdir().unwrap();
        let history = Arc::new(HistoryLog::open(dir.path()).unwrap());
        let capture = ContextCapture::new(
            ContextRegistry::new().with(Slow(std::time::Duration::ZERO)),
            Duration::from_secs(5),
        );

        let entry = ClipboardEntry::new(ClipboardContentType::Text, "copied", source("slow.exe"));
        capture.record(&history, entry).await.unwrap();

        assert_eq!(history.len(), 1);
        let written = std::fs::read_to_string(history.path()).unwrap();
        assert!(written.contains("\"adapter_type\": \"slow\""));
    }
}
