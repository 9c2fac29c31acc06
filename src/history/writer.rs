use std::{
    collections::VecDeque,
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use anyhow::{Context, Result};
use chrono::Local;

use super::block;
use crate::models::ClipboardEntry;
use crate::settings::HistorySettings;

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

pub const FORMAT_VERSION: &str = "1.0";

/// Bounded clipboard history, rewritten in full to a single JSON document on every
/// append. The in-memory blocks are the source of truth; the file is never read back.
pub struct HistoryLog {
    path: PathBuf,
    max_entries: usize,
    blocks: Mutex<VecDeque<String>>,
}

impl HistoryLog {
    pub fn open(directory: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(directory, &HistorySettings::default())
    }

    pub fn open_with(directory: impl AsRef<Path>, settings: &HistorySettings) -> Result<Self> {
        let directory = directory.as_ref();
        fs::create_dir_all(directory)
            .with_context(|| format!("failed to create history directory {}", directory.display()))?;

        let path = directory.join(&settings.file_name);
        if path.exists() {
            // Earlier history is not parsed back; the next append replaces it.
            log_info!("history file {} exists and will be rewritten", path.display());
        }

        Ok(Self {
            path,
            max_entries: settings.max_entries.max(1),
            blocks: Mutex::new(VecDeque::new()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Serializes `entry`, evicts the oldest blocks beyond capacity and rewrites the
    /// file. On a write error the entry stays buffered and reaches disk with the next
    /// successful append.
    pub fn append(&self, entry: &ClipboardEntry) -> Result<()> {
        let rendered = block::render(entry).context("failed to serialize clipboard entry")?;

        let mut blocks = self.lock();
        blocks.push_back(rendered);
        while blocks.len() > self.max_entries {
            blocks.pop_front();
        }

        self.write_document(&blocks).map_err(|err| {
            log_error!("failed to write history to {}: {err:?}", self.path.display());
            err
        })
    }

    fn write_document(&self, blocks: &VecDeque<String>) -> Result<()> {
        let mut document = String::with_capacity(blocks.iter().map(|b| b.len() + 2).sum::<usize>() + 128);
        document.push_str("{\n");
        document.push_str(&format!("\"version\": \"{FORMAT_VERSION}\",\n"));
        document.push_str(&format!(
            "\"generated\": {},\n",
            serde_json::to_string(&Local::now().to_rfc3339())?
        ));
        document.push_str("\"entries\": [\n");
        let last = blocks.len().saturating_sub(1);
        for (index, block) in blocks.iter().enumerate() {
            document.push_str(block);
            if index < last {
                document.push(',');
            }
            document.push('\n');
        }
        document.push_str("]\n}\n");

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let mut file = fs::File::create(&tmp_path)
            .with_context(|| format!("failed to open {}", tmp_path.display()))?;
        file.write_all(document.as_bytes())
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        file.sync_all()
            .with_context(|| format!("failed to flush {}", tmp_path.display()))?;
        drop(file);

        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.blocks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClipboardContentType, SourceInfo};
    use serde_json::Value;

    fn text_entry(content: &str) -> ClipboardEntry {
        ClipboardEntry::new(ClipboardContentType::Text, content, SourceInfo::default())
    }

    fn read_document(log: &HistoryLog) -> Value {
        serde_json::from_str(&fs::read_to_string(log.path()).unwrap()).unwrap()
    }

    fn contents(document: &Value) -> Vec<String> {
        document["entries"]
            .as_array()
            .unwrap()
            .iter()
            .map(|entry| entry["content"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn open_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let log = HistoryLog::open(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(log.path(), nested.join("clipboard_history.json"));
        assert!(log.is_empty());
        assert!(!log.path().exists());
    }

    #[test]
    fn append_writes_wrapped_document() {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::open(dir.path()).unwrap();
        log.append(&text_entry("first")).unwrap();
        log.append(&text_entry("second")).unwrap();

        let document = read_document(&log);
        assert_eq!(document["version"], FORMAT_VERSION);
        assert!(document["generated"].as_str().is_some());
        assert_eq!(contents(&document), ["first", "second"]);
        assert!(!dir.path().join("clipboard_history.json.tmp").exists());
    }

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let settings = HistorySettings {
            max_entries: 3,
            ..HistorySettings::default()
        };
        let log = HistoryLog::open_with(dir.path(), &settings).unwrap();
        for i in 0..5 {
            log.append(&text_entry(&format!("entry {i}"))).unwrap();
        }

        assert_eq!(log.len(), 3);
        assert_eq!(contents(&read_document(&log)), ["entry 2", "entry 3", "entry 4"]);
    }

    #[test]
    fn existing_file_is_replaced_not_parsed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("clipboard_history.json"), "garbage from an old build").unwrap();
        let log = HistoryLog::open(dir.path()).unwrap();
        assert!(log.is_empty());
        log.append(&text_entry("fresh")).unwrap();
        assert_eq!(contents(&read_document(&log)), ["fresh"]);
    }

    #[test]
    fn hostile_content_stays_inside_its_value() {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::open(dir.path()).unwrap();
        let nasty = "\"},{\"x\": [\\\n\t\r\u{1}\u{1f}]\n},\n\"entries\": []";
        log.append(&text_entry(nasty)).unwrap();
        log.append(&text_entry("after")).unwrap();

        let document = read_document(&log);
        assert_eq!(contents(&document), [nasty, "after"]);
        assert_eq!(document.as_object().unwrap().len(), 3);
    }

    #[test]
    fn failed_write_keeps_entry_buffered() {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::open(dir.path()).unwrap();
        // A directory squatting on the temp path makes the rewrite fail.
        let tmp = dir.path().join("clipboard_history.json.tmp");
        fs::create_dir(&tmp).unwrap();

        assert!(log.append(&text_entry("lost for now")).is_err());
        assert_eq!(log.len(), 1);

        fs::remove_dir(&tmp).unwrap();
        log.append(&text_entry("recovered")).unwrap();
        assert_eq!(contents(&read_document(&log)), ["lost for now", "recovered"]);
    }
}
