//! Accessibility tree facade.
//!
//! A provider opens one automation session per extraction call; elements handed out by
//! a session belong to it and are released when dropped, so nothing obtained here may
//! outlive the call that acquired it. Every operation reports platform faults as an
//! [`AutomationError`]; callers that only need best-effort data use
//! [`AccessibilityTree::text_or_empty`] and [`AccessibilityTree::find_or_empty`], where
//! an empty result means "unknown", never "confirmed absent".

pub mod snapshot;
#[cfg(windows)]
pub mod uia;

use thiserror::Error;

use crate::models::WindowHandle;

const ENABLE_LOGS: bool = true;

use crate::log_debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AutomationError {
    #[error("automation subsystem unavailable: {0}")]
    Unavailable(String),
    #[error("invalid window handle {0:?}")]
    InvalidHandle(WindowHandle),
    #[error("window has no accessible root")]
    NoRoot,
    #[error("element detached or platform busy")]
    Transient,
    #[error("platform error: {0}")]
    Platform(String),
}

/// Control type of an element, as far as the adapters care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRole {
    Window,
    Pane,
    Text,
    Edit,
    List,
    ListItem,
    Button,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleFilter {
    Any,
    Only(ElementRole),
}

impl RoleFilter {
    pub fn matches(&self, role: ElementRole) -> bool {
        match self {
            RoleFilter::Any => true,
            RoleFilter::Only(expected) => *expected == role,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeScope {
    Children,
    Descendants,
}

/// Opens automation sessions. Implementations carry no per-call state.
pub trait AutomationProvider: Send + Sync {
    type Session: AccessibilityTree;

    fn open(&self) -> Result<Self::Session, AutomationError>;
}

pub trait AccessibilityTree {
    type Element;

    fn element_from_handle(&self, handle: WindowHandle) -> Result<Self::Element, AutomationError>;

    /// Display name of the element; empty when it exposes none.
    fn element_text(&self, element: &Self::Element) -> Result<String, AutomationError>;

    /// Value of an editable element (an address bar, a search box).
    fn element_value(&self, element: &Self::Element) -> Result<String, AutomationError> {
        self.element_text(element)
    }

    /// Matching elements under `root` in tree order, `root` itself excluded.
    fn find_all(
        &self,
        root: &Self::Element,
        filter: RoleFilter,
        scope: TreeScope,
    ) -> Result<Vec<Self::Element>, AutomationError>;

    fn window_title(&self, handle: WindowHandle) -> Result<String, AutomationError>;

    fn text_or_empty(&self, element: &Self::Element) -> String {
        self.element_text(element).unwrap_or_else(|err| {
            log_debug!("element text unavailable: {err}");
            String::new()
        })
    }

    fn find_or_empty(
        &self,
        root: &Self::Element,
        filter: RoleFilter,
        scope: TreeScope,
    ) -> Vec<Self::Element> {
        self.find_all(root, filter, scope).unwrap_or_else(|err| {
            log_debug!("element search ({filter:?}, {scope:?}) failed: {err}");
            Vec::new()
        })
    }
}
