use super::{BrowserAdapter, ContextAdapter, WeChatAdapter};
use crate::automation::AutomationProvider;
use crate::models::{ContextRecord, SourceInfo};
use crate::settings::CaptureSettings;

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Adapters in priority order; the first one that claims a window runs alone.
#[derive(Default)]
pub struct ContextRegistry {
    adapters: Vec<Box<dyn ContextAdapter>>,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// WeChat first, then browsers, both over `provider`.
    pub fn standard<P>(provider: P, settings: &CaptureSettings) -> Self
    where
        P: AutomationProvider + Clone + 'static,
    {
        Self::new()
            .with(WeChatAdapter::new(provider.clone(), settings.wechat.clone()))
            .with(BrowserAdapter::new(provider, settings.browser.clone()))
    }

    /// The standard registry over Windows UI Automation.
    #[cfg(windows)]
    pub fn for_platform(settings: &CaptureSettings) -> Self {
        Self::standard(crate::automation::uia::UiaProvider, settings)
    }

    /// Appends an adapter at the lowest priority.
    pub fn with(mut self, adapter: impl ContextAdapter + 'static) -> Self {
        self.register(Box::new(adapter));
        self
    }

    pub fn register(&mut self, adapter: Box<dyn ContextAdapter>) {
        self.adapters.push(adapter);
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    pub fn adapter_for(&self, source: &SourceInfo) -> Option<&dyn ContextAdapter> {
        self.adapters
            .iter()
            .find(|adapter| adapter.can_handle(&source.process_name, &source.window_title))
            .map(|adapter| &**adapter)
    }

    pub fn resolve(&self, source: &SourceInfo) -> Option<ContextRecord> {
        let Some(adapter) = self.adapter_for(source) else {
            log_debug!("no context adapter for {}", source.process_name);
            return None;
        };
        log_debug!("{} adapter handling {}", adapter.adapter_type(), source.process_name);
        Some(adapter.get_context(source))
    }
}
