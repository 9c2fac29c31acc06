pub mod context;
pub mod entry;
pub mod source;

pub use context::{BrowserContext, ChatContext, ChatType, ContextDetails, ContextRecord};
pub use entry::{ClipboardContentType, ClipboardEntry};
pub use source::{SourceInfo, WindowHandle};
