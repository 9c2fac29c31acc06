//! Append-only clipboard history persisted as one JSON document.

mod block;
pub mod writer;

pub use writer::{HistoryLog, FORMAT_VERSION};
