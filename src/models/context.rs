//! Context record data model.
//!
//! One record is the outcome of a single adapter invocation against the foreground
//! window, successful or not. Fields shared by every adapter live on [`ContextRecord`];
//! variant-specific fields live in [`ContextDetails`].

use std::collections::BTreeMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Field names emitted by the log writer at the context level. Metadata keys may not
/// reuse them.
pub const RESERVED_FIELDS: &[&str] = &[
    "adapter_type",
    "success",
    "fetch_time_ms",
    "url",
    "title",
    "error",
    "metadata",
    "source_url",
    "address_bar_url",
    "page_title",
    "contact_name",
    "recent_messages",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    Group,
    Private,
}

impl ChatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatType::Group => "group",
            ChatType::Private => "private",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowserContext {
    pub source_url: String,
    pub address_bar_url: String,
    pub page_title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatContext {
    pub contact_name: String,
    pub chat_type: Option<ChatType>,
    /// Oldest to newest.
    pub recent_messages: Vec<String>,
    pub message_count: usize,
}

impl ChatContext {
    pub fn set_messages(&mut self, messages: Vec<String>) {
        self.message_count = messages.len();
        self.recent_messages = messages;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextDetails {
    Base,
    Browser(BrowserContext),
    Chat(ChatContext),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextRecord {
    pub adapter_type: String,
    pub success: bool,
    pub error: Option<String>,
    pub fetch_time_ms: u64,
    pub title: Option<String>,
    pub url: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub details: ContextDetails,
}

impl ContextRecord {
    fn with_details(adapter_type: impl Into<String>, details: ContextDetails) -> Self {
        Self {
            adapter_type: adapter_type.into(),
            success: false,
            error: None,
            fetch_time_ms: 0,
            title: None,
            url: None,
            metadata: BTreeMap::new(),
            details,
        }
    }

    pub fn base(adapter_type: impl Into<String>) -> Self {
        Self::with_details(adapter_type, ContextDetails::Base)
    }

    pub fn browser(adapter_type: impl Into<String>) -> Self {
        Self::with_details(adapter_type, ContextDetails::Browser(BrowserContext::default()))
    }

    pub fn chat(adapter_type: impl Into<String>) -> Self {
        Self::with_details(adapter_type, ContextDetails::Chat(ChatContext::default()))
    }

    pub fn as_chat(&self) -> Option<&ChatContext> {
        match &self.details {
            ContextDetails::Chat(chat) => Some(chat),
            _ => None,
        }
    }

    pub fn as_chat_mut(&mut self) -> Option<&mut ChatContext> {
        match &mut self.details {
            ContextDetails::Chat(chat) => Some(chat),
            _ => None,
        }
    }

    pub fn as_browser(&self) -> Option<&BrowserContext> {
        match &self.details {
            ContextDetails::Browser(browser) => Some(browser),
            _ => None,
        }
    }

    pub fn as_browser_mut(&mut self) -> Option<&mut BrowserContext> {
        match &mut self.details {
            ContextDetails::Browser(browser) => Some(browser),
            _ => None,
        }
    }

    /// The field a record of this variant cannot succeed without.
    pub fn identifying_field(&self) -> Option<&str> {
        let value = match &self.details {
            ContextDetails::Base => self.title.as_deref().unwrap_or_default(),
            ContextDetails::Browser(browser) => browser.address_bar_url.as_str(),
            ContextDetails::Chat(chat) => chat.contact_name.as_str(),
        };
        (!value.is_empty()).then_some(value)
    }

    /// Settles `success` from the identifying field; a record without one gets
    /// `fallback_error` unless an error was already recorded.
    pub fn settle(&mut self, fallback_error: impl Into<String>) -> bool {
        self.success = self.identifying_field().is_some();
        if self.success {
            self.error = None;
        } else if self.error.as_deref().map_or(true, str::is_empty) {
            self.error = Some(fallback_error.into());
        }
        self.success
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.success = false;
        self.error = Some(error.into());
    }

    pub fn finish(&mut self, started: Instant) {
        self.fetch_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    }

    /// Returns false and leaves the map untouched when `key` is a reserved field name.
    pub fn insert_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if RESERVED_FIELDS.contains(&key.as_str()) {
            log::warn!("metadata key '{key}' collides with a context field; dropped");
            return false;
        }
        self.metadata.insert(key, value.into());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_record_without_contact_fails_with_error() {
        let mut record = ContextRecord::chat("wechat");
        assert!(!record.settle("no chat"));
        assert_eq!(record.error.as_deref(), Some("no chat"));
    }

    #[test]
    fn settle_keeps_specific_error() {
        let mut record = ContextRecord::chat("wechat");
        record.error = Some("automation unavailable".into());
        record.settle("no chat");
        assert_eq!(record.error.as_deref(), Some("automation unavailable"));
    }

    #[test]
    fn chat_record_with_contact_succeeds() {
        let mut record = ContextRecord::chat("wechat");
        record.as_chat_mut().unwrap().contact_name = "Alice".into();
        assert!(record.settle("no chat"));
        assert!(record.error.is_none());
    }

    #[test]
    fn reserved_metadata_keys_are_rejected() {
        let mut record = ContextRecord::base("generic");
        assert!(!record.insert_metadata("success", "yes"));
        assert!(record.insert_metadata("chat_type", "group"));
        assert_eq!(record.metadata.len(), 1);
    }

    #[test]
    fn set_messages_caches_count() {
        let mut chat = ChatContext::default();
        chat.set_messages(vec!["a".into(), "b".into()]);
        assert_eq!(chat.message_count, 2);
    }
}
