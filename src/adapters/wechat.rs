//! WeChat desktop client adapter.
//!
//! The client renders its chat pane with stock controls but no automation ids, so the
//! pipeline guesses: the chat name is the first plausible text element (else the window
//! title), and the message list is the first list in the window. Each stage runs even
//! when an earlier one came back empty; the record succeeds iff a chat name was found.

use std::time::{Duration, Instant};

use super::ContextAdapter;
use crate::automation::{
    AccessibilityTree, AutomationError, AutomationProvider, ElementRole, RoleFilter, TreeScope,
};
use crate::models::{ChatType, ContextRecord, SourceInfo};
use crate::settings::ChatAdapterSettings;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

pub const ADAPTER_TYPE: &str = "wechat";

const NO_CHAT_ERROR: &str = "Failed to extract chat information";

pub struct WeChatAdapter<P> {
    provider: P,
    settings: ChatAdapterSettings,
}

/// Faults seen by the stages of one extraction; the first explains a failed record.
#[derive(Default)]
struct StageFaults(Vec<AutomationError>);

impl StageFaults {
    fn note<T>(&mut self, stage: &str, result: Result<T, AutomationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                log_debug!("wechat: {stage} failed: {err}");
                self.0.push(err);
                None
            }
        }
    }

    fn first(&self) -> Option<&AutomationError> {
        self.0.first()
    }
}

impl<P: AutomationProvider> WeChatAdapter<P> {
    pub fn new(provider: P, settings: ChatAdapterSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &ChatAdapterSettings {
        &self.settings
    }

    fn extract(&self, session: &P::Session, source: &SourceInfo, record: &mut ContextRecord) {
        let mut faults = StageFaults::default();
        let root = faults.note("root lookup", session.element_from_handle(source.window_handle));

        let chat_name = self.resolve_chat_name(session, root.as_ref(), source, &mut faults);
        let chat_type = chat_name.as_deref().map(|name| self.settings.heuristics.classify(name));

        let messages = match root.as_ref() {
            Some(root) => self.recent_messages(session, root, self.settings.message_count, &mut faults),
            None => Vec::new(),
        };

        if let Some(chat) = record.as_chat_mut() {
            if let Some(name) = &chat_name {
                chat.contact_name = name.clone();
            }
            chat.chat_type = chat_type;
            chat.set_messages(messages);
        }
        record.title = chat_name.clone();

        if let Some(name) = &chat_name {
            log_info!("wechat: chat name '{}' ({})", name, chat_type.map_or("", |t| t.as_str()));
        }

        let error = match faults.first() {
            Some(fault) => format!("{NO_CHAT_ERROR}: {fault}"),
            None => NO_CHAT_ERROR.to_string(),
        };
        if record.settle(error) {
            let message_count = record.as_chat().map_or(0, |chat| chat.message_count);
            record.insert_metadata("message_count", message_count.to_string());
            record.insert_metadata(
                "chat_type",
                chat_type.unwrap_or(ChatType::Private).as_str(),
            );
        } else {
            log_warn!("wechat: no chat name for window {:?}", source.window_handle);
        }
    }

    fn resolve_chat_name(
        &self,
        session: &P::Session,
        root: Option<&<P::Session as AccessibilityTree>::Element>,
        source: &SourceInfo,
        faults: &mut StageFaults,
    ) -> Option<String> {
        let heuristics = &self.settings.heuristics;

        if let Some(root) = root {
            let candidates = faults
                .note(
                    "text search",
                    session.find_all(root, RoleFilter::Only(ElementRole::Text), TreeScope::Descendants),
                )
                .unwrap_or_default();
            let from_tree = candidates
                .iter()
                .take(heuristics.name_candidate_limit)
                .map(|element| session.text_or_empty(element))
                .find(|text| heuristics.accepts_name_candidate(text));
            if from_tree.is_some() {
                return from_tree;
            }
        }

        let live_title = faults
            .note("window title", session.window_title(source.window_handle))
            .filter(|title| !title.is_empty());
        let title = live_title.as_deref().unwrap_or(&source.window_title);
        heuristics.chat_name_from_title(title)
    }

    /// Text of the last `count` items of the message list, oldest first.
    fn recent_messages(
        &self,
        session: &P::Session,
        root: &<P::Session as AccessibilityTree>::Element,
        count: usize,
        faults: &mut StageFaults,
    ) -> Vec<String> {
        if count == 0 {
            return Vec::new();
        }

        let lists = faults
            .note(
                "list search",
                session.find_all(root, RoleFilter::Only(ElementRole::List), TreeScope::Descendants),
            )
            .unwrap_or_default();
        let Some(container) = lists.first() else {
            log_debug!("wechat: no message list found");
            return Vec::new();
        };

        let items = faults
            .note("message items", session.find_all(container, RoleFilter::Any, TreeScope::Children))
            .unwrap_or_default();
        let start = items.len().saturating_sub(count);

        items[start..]
            .iter()
            .map(|item| self.message_text(session, item))
            .filter(|text| !text.is_empty())
            .collect()
    }

    /// Direct element text, else the joined text of its first few descendants.
    fn message_text(&self, session: &P::Session, item: &<P::Session as AccessibilityTree>::Element) -> String {
        let text = session.text_or_empty(item);
        if !text.is_empty() {
            return text;
        }

        session
            .find_or_empty(item, RoleFilter::Any, TreeScope::Descendants)
            .iter()
            .take(self.settings.heuristics.message_descendant_limit)
            .map(|element| session.text_or_empty(element))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<P: AutomationProvider> ContextAdapter for WeChatAdapter<P> {
    fn adapter_type(&self) -> &'static str {
        ADAPTER_TYPE
    }

    fn can_handle(&self, process_name: &str, _window_title: &str) -> bool {
        self.settings.heuristics.matches_process(process_name)
    }

    fn get_context(&self, source: &SourceInfo) -> ContextRecord {
        let started = Instant::now();
        let mut record = ContextRecord::chat(ADAPTER_TYPE);

        match self.provider.open() {
            Ok(session) => self.extract(&session, source, &mut record),
            Err(err) => {
                log_warn!("wechat: failed to initialize UI Automation: {err}");
                record.fail(format!("Failed to initialize UI Automation: {err}"));
            }
        }

        record.finish(started);
        let advisory = Duration::from_millis(self.settings.timeout_ms);
        if started.elapsed() > advisory {
            log_warn!(
                "wechat: extraction took {}ms, over the {}ms budget",
                record.fetch_time_ms,
                self.settings.timeout_ms
            );
            record.insert_metadata("timeout_exceeded", "true");
        }

        log_info!(
            "wechat: completed in {}ms, success={}",
            record.fetch_time_ms,
            record.success
        );
        record
    }
}
