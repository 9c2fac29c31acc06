use serde::{Deserialize, Serialize};

/// Opaque native window handle (an `HWND` on Windows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WindowHandle(pub isize);

impl WindowHandle {
    pub const NULL: WindowHandle = WindowHandle(0);

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

/// Snapshot of the foreground window supplied by the host's window inspector.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceInfo {
    pub process_name: String,
    pub process_path: String,
    pub window_title: String,
    pub window_handle: WindowHandle,
    pub process_id: u32,
}

impl SourceInfo {
    pub fn new(
        process_name: impl Into<String>,
        window_title: impl Into<String>,
        window_handle: WindowHandle,
    ) -> Self {
        Self {
            process_name: process_name.into(),
            window_title: window_title.into(),
            window_handle,
            ..Self::default()
        }
    }

    pub fn with_process(mut self, process_path: impl Into<String>, process_id: u32) -> Self {
        self.process_path = process_path.into();
        self.process_id = process_id;
        self
    }
}
