//! Serialization of one clipboard entry into a self-contained JSON block.
//!
//! Keys come out in a fixed order so the history file diffs and greps predictably;
//! `serde_json` escapes every string value.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::models::{ClipboardEntry, ContextDetails, ContextRecord, SourceInfo};

struct EntryBlock<'a>(&'a ClipboardEntry);

struct SourceBlock<'a>(&'a SourceInfo);

enum ContextBlock<'a> {
    Record(&'a ContextRecord),
    UrlOnly(&'a str),
}

impl Serialize for EntryBlock<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entry = self.0;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("timestamp", &entry.timestamp.to_rfc3339())?;
        map.serialize_entry("content_type", entry.content_type.as_str())?;
        map.serialize_entry("content", &entry.content)?;
        map.serialize_entry("content_preview", &entry.content_preview)?;
        map.serialize_entry("source", &SourceBlock(&entry.source))?;

        let context = match (&entry.context, entry.context_url.as_deref()) {
            (Some(record), _) => Some(ContextBlock::Record(record)),
            (None, Some(url)) if !url.is_empty() => Some(ContextBlock::UrlOnly(url)),
            _ => None,
        };
        if let Some(context) = context {
            map.serialize_entry("context", &context)?;
        }
        map.end()
    }
}

impl Serialize for SourceBlock<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let source = self.0;
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("process_name", &source.process_name)?;
        map.serialize_entry("process_path", &source.process_path)?;
        map.serialize_entry("window_title", &source.window_title)?;
        map.serialize_entry("pid", &source.process_id)?;
        map.end()
    }
}

fn entry_if_present<M: SerializeMap>(map: &mut M, key: &str, value: &str) -> Result<(), M::Error> {
    if value.is_empty() {
        Ok(())
    } else {
        map.serialize_entry(key, value)
    }
}

impl Serialize for ContextBlock<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        let record = match self {
            ContextBlock::UrlOnly(url) => {
                map.serialize_entry("url", url)?;
                return map.end();
            }
            ContextBlock::Record(record) => record,
        };

        map.serialize_entry("adapter_type", &record.adapter_type)?;
        map.serialize_entry("success", &record.success)?;
        map.serialize_entry("fetch_time_ms", &record.fetch_time_ms)?;
        entry_if_present(&mut map, "url", record.url.as_deref().unwrap_or_default())?;
        entry_if_present(&mut map, "title", record.title.as_deref().unwrap_or_default())?;
        entry_if_present(&mut map, "error", record.error.as_deref().unwrap_or_default())?;

        match &record.details {
            ContextDetails::Base => {}
            ContextDetails::Browser(browser) => {
                entry_if_present(&mut map, "source_url", &browser.source_url)?;
                entry_if_present(&mut map, "address_bar_url", &browser.address_bar_url)?;
                entry_if_present(&mut map, "page_title", &browser.page_title)?;
            }
            ContextDetails::Chat(chat) => {
                entry_if_present(&mut map, "contact_name", &chat.contact_name)?;
                if let Some(chat_type) = chat.chat_type {
                    map.serialize_entry("chat_type", chat_type.as_str())?;
                }
                if !chat.recent_messages.is_empty() {
                    map.serialize_entry("recent_messages", &chat.recent_messages)?;
                }
                map.serialize_entry("message_count", &chat.message_count)?;
            }
        }

        if !record.metadata.is_empty() {
            map.serialize_entry("metadata", &record.metadata)?;
        }
        map.end()
    }
}

/// Pretty-printed block, indented to sit inside the document's `entries` array.
pub fn render(entry: &ClipboardEntry) -> serde_json::Result<String> {
    let pretty = serde_json::to_string_pretty(&EntryBlock(entry))?;
    let indented: Vec<String> = pretty.lines().map(|line| format!("  {line}")).collect();
    Ok(indented.join("\n"))
}
