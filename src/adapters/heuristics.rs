//! String heuristics the chat adapter applies to what it reads from the tree.
//!
//! Kept as plain data so hosts can retune them for other client versions or locales
//! through the settings file.

use serde::{Deserialize, Serialize};

use crate::models::ChatType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatHeuristics {
    /// Executable names the adapter claims, compared case-insensitively.
    pub process_names: Vec<String>,
    /// The application's own labels. Text candidates containing one are skipped and a
    /// window title equal to one carries no chat name.
    pub chrome_strings: Vec<String>,
    /// Window title separators; the title is cut at the first one found.
    pub title_suffixes: Vec<String>,
    /// Matched case-sensitively.
    pub group_keywords: Vec<String>,
    /// Matched case-insensitively.
    pub group_keywords_ci: Vec<String>,
    /// Brackets that wrap a member count, as in `工作群(88)`.
    pub bracket_pairs: Vec<(char, char)>,
    pub name_candidate_limit: usize,
    /// Accepted chat names are strictly longer than this many characters.
    pub name_min_chars: usize,
    /// Accepted chat names are strictly shorter than this many characters.
    pub name_max_chars: usize,
    pub message_descendant_limit: usize,
}

impl Default for ChatHeuristics {
    fn default() -> Self {
        Self {
            process_names: vec!["wechat.exe".into()],
            chrome_strings: vec!["微信".into(), "WeChat".into()],
            title_suffixes: vec![" - 微信".into(), " - WeChat".into()],
            group_keywords: vec!["群".into()],
            group_keywords_ci: vec!["group".into()],
            bracket_pairs: vec![('(', ')'), ('（', '）')],
            name_candidate_limit: 10,
            name_min_chars: 1,
            name_max_chars: 100,
            message_descendant_limit: 5,
        }
    }
}

impl ChatHeuristics {
    pub fn matches_process(&self, process_name: &str) -> bool {
        let process_name = process_name.to_lowercase();
        self.process_names
            .iter()
            .any(|name| name.to_lowercase() == process_name)
    }

    /// Whether a text element's content looks like a chat name.
    pub fn accepts_name_candidate(&self, text: &str) -> bool {
        let chars = text.chars().count();
        chars > self.name_min_chars
            && chars < self.name_max_chars
            && !self
                .chrome_strings
                .iter()
                .any(|chrome| text.contains(chrome.as_str()))
    }

    /// Chat name carried by a window title such as `Alice - WeChat`.
    pub fn chat_name_from_title(&self, title: &str) -> Option<String> {
        if title.is_empty() || self.chrome_strings.iter().any(|chrome| chrome == title) {
            return None;
        }
        let name = self
            .title_suffixes
            .iter()
            .find_map(|suffix| title.find(suffix.as_str()).map(|pos| &title[..pos]))
            .unwrap_or(title);
        (!name.is_empty()).then(|| name.to_string())
    }

    pub fn classify(&self, chat_name: &str) -> ChatType {
        let lowered = chat_name.to_lowercase();
        let keyword_hit = self
            .group_keywords
            .iter()
            .any(|keyword| chat_name.contains(keyword.as_str()))
            || self
                .group_keywords_ci
                .iter()
                .any(|keyword| lowered.contains(&keyword.to_lowercase()));

        if keyword_hit || self.has_bracketed_digits(chat_name) {
            ChatType::Group
        } else {
            ChatType::Private
        }
    }

    fn has_bracketed_digits(&self, chat_name: &str) -> bool {
        self.bracket_pairs.iter().any(|&(open, close)| {
            let Some(start) = chat_name.find(open) else {
                return false;
            };
            let inner_start = start + open.len_utf8();
            match chat_name[inner_start..].find(close) {
                Some(len) => chat_name[inner_start..inner_start + len]
                    .chars()
                    .any(|ch| ch.is_ascii_digit()),
                None => false,
            }
        })
    }
}
