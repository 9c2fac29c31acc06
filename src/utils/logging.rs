//! Logging macros gated on a module-level `ENABLE_LOGS` flag.
//!
//! Adapters walk foreign UI trees on every clipboard change, so each module decides
//! for itself whether its traversal chatter reaches the `log` backend.
//!
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_debug, log_info, log_warn};
//!
//! log_info!("wechat: resolved chat name {}", name);
//! ```

/// Info-level logging when the calling module's `ENABLE_LOGS` is true.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// Debug-level logging when the calling module's `ENABLE_LOGS` is true.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

/// Warn-level logging when the calling module's `ENABLE_LOGS` is true.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// Error-level logging when the calling module's `ENABLE_LOGS` is true.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}
