use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::adapters::ChatHeuristics;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatAdapterSettings {
    /// Advisory budget for one extraction; overruns are logged and flagged, not cut short.
    pub timeout_ms: u64,
    pub message_count: usize,
    pub heuristics: ChatHeuristics,
}

impl Default for ChatAdapterSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 1000,
            message_count: 5,
            heuristics: ChatHeuristics::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserAdapterSettings {
    pub enabled: bool,
    pub process_names: Vec<String>,
    pub title_suffixes: Vec<String>,
}

impl Default for BrowserAdapterSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            process_names: ["chrome.exe", "msedge.exe", "firefox.exe", "brave.exe", "opera.exe"]
                .into_iter()
                .map(String::from)
                .collect(),
            title_suffixes: [
                " - Google Chrome",
                " - Microsoft\u{200b} Edge",
                " - Microsoft Edge",
                " — Mozilla Firefox",
                " - Mozilla Firefox",
                " - Brave",
                " - Opera",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    pub max_entries: usize,
    pub file_name: String,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            file_name: "clipboard_history.json".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    pub wechat: ChatAdapterSettings,
    pub browser: BrowserAdapterSettings,
    pub history: HistorySettings,
    /// Hard bound on context resolution when run through `ContextCapture`.
    pub capture_timeout_ms: u64,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            wechat: ChatAdapterSettings::default(),
            browser: BrowserAdapterSettings::default(),
            history: HistorySettings::default(),
            capture_timeout_ms: 1500,
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<CaptureSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("Ignoring unreadable settings in {}: {err}", path.display());
                CaptureSettings::default()
            })
        } else {
            CaptureSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn get(&self) -> CaptureSettings {
        self.read().clone()
    }

    pub fn update(&self, settings: CaptureSettings) -> Result<()> {
        let mut guard = self.write();
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: CaptureSettings = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid settings in {}", self.path.display()))?;
        *self.write() = data;
        Ok(())
    }

    fn persist(&self, data: &CaptureSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, CaptureSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CaptureSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
