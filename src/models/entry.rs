use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::{ContextRecord, SourceInfo};

const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipboardContentType {
    Text,
    Html,
    Rtf,
    Image,
    Files,
}

impl ClipboardContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipboardContentType::Text => "text",
            ClipboardContentType::Html => "html",
            ClipboardContentType::Rtf => "rtf",
            ClipboardContentType::Image => "image",
            ClipboardContentType::Files => "files",
        }
    }
}

/// One clipboard capture, handed to the history log once its context is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardEntry {
    pub timestamp: DateTime<Local>,
    pub content_type: ClipboardContentType,
    pub content: String,
    pub content_preview: String,
    pub source: SourceInfo,
    pub context: Option<ContextRecord>,
    /// Bare URL recorded when no adapter produced a context record.
    pub context_url: Option<String>,
}

impl ClipboardEntry {
    pub fn new(
        content_type: ClipboardContentType,
        content: impl Into<String>,
        source: SourceInfo,
    ) -> Self {
        let content = content.into();
        Self {
            timestamp: Local::now(),
            content_type,
            content_preview: preview(&content),
            content,
            source,
            context: None,
            context_url: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// `SourceURL` header of a CF_HTML payload.
    pub fn html_source_url(&self) -> Option<&str> {
        if self.content_type != ClipboardContentType::Html {
            return None;
        }
        self.content
            .lines()
            .take_while(|line| !line.trim_start().starts_with('<'))
            .find_map(|line| line.trim().strip_prefix("SourceURL:"))
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

fn preview(content: &str) -> String {
    let mut chars = content.chars();
    let mut flattened: String = chars
        .by_ref()
        .take(PREVIEW_CHARS)
        .map(|ch| if ch == '\r' || ch == '\n' { ' ' } else { ch })
        .collect();
    if chars.next().is_some() {
        flattened.push_str("...");
    }
    flattened
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_long_content() {
        let content = "x".repeat(150);
        let entry = ClipboardEntry::new(ClipboardContentType::Text, content, SourceInfo::default());
        assert_eq!(entry.content_preview.chars().count(), PREVIEW_CHARS + 3);
        assert!(entry.content_preview.ends_with("..."));
    }

    #[test]
    fn preview_flattens_line_breaks() {
        let entry = ClipboardEntry::new(
            ClipboardContentType::Text,
            "line one\r\nline two",
            SourceInfo::default(),
        );
        assert_eq!(entry.content_preview, "line one  line two");
    }

    #[test]
    fn finds_cf_html_source_url() {
        let payload = "Version:0.9\r\nStartHTML:00000097\r\nSourceURL:https://example.com/a?b=1\r\n<html><body>SourceURL:nope</body></html>";
        let entry = ClipboardEntry::new(ClipboardContentType::Html, payload, SourceInfo::default());
        assert_eq!(entry.html_source_url(), Some("https://example.com/a?b=1"));
    }

    #[test]
    fn plain_text_has_no_source_url() {
        let entry = ClipboardEntry::new(
            ClipboardContentType::Text,
            "SourceURL:https://example.com",
            SourceInfo::default(),
        );
        assert_eq!(entry.html_source_url(), None);
    }
}
