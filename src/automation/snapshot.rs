//! In-memory accessibility tree.
//!
//! Replays a recorded window hierarchy through the same facade the platform backend
//! implements. Hosts without UI Automation use it to run adapters against captured
//! trees; it can also inject the faults a live tree produces.

use std::sync::Arc;

use super::{AccessibilityTree, AutomationError, AutomationProvider, ElementRole, RoleFilter, TreeScope};
use crate::models::WindowHandle;

/// Node of a recorded tree, built with the constructors below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotNode {
    pub role: ElementRole,
    pub name: String,
    pub value: Option<String>,
    pub children: Vec<SnapshotNode>,
}

impl SnapshotNode {
    pub fn new(role: ElementRole, name: impl Into<String>) -> Self {
        Self {
            role,
            name: name.into(),
            value: None,
            children: Vec::new(),
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(ElementRole::Text, name)
    }

    pub fn pane(children: Vec<SnapshotNode>) -> Self {
        Self::new(ElementRole::Pane, "").with_children(children)
    }

    pub fn list(children: Vec<SnapshotNode>) -> Self {
        Self::new(ElementRole::List, "").with_children(children)
    }

    pub fn item(name: impl Into<String>) -> Self {
        Self::new(ElementRole::ListItem, name)
    }

    pub fn edit(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(ElementRole::Edit, name).with_value(value)
    }

    pub fn with_children(mut self, children: Vec<SnapshotNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Debug)]
struct FlatNode {
    role: ElementRole,
    name: String,
    value: Option<String>,
    children: Vec<usize>,
}

#[derive(Debug)]
struct SnapshotWindow {
    handle: WindowHandle,
    title: String,
    root: usize,
}

/// Element reference into a [`SnapshotTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotElement(usize);

#[derive(Debug, Default)]
pub struct SnapshotTree {
    nodes: Vec<FlatNode>,
    windows: Vec<SnapshotWindow>,
    fail_searches: bool,
    fail_titles: bool,
}

impl SnapshotTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(mut self, handle: WindowHandle, title: impl Into<String>, root: SnapshotNode) -> Self {
        let root = self.flatten(root);
        self.windows.push(SnapshotWindow {
            handle,
            title: title.into(),
            root,
        });
        self
    }

    /// Every `find_all` reports a transient fault, as a tree mutating mid-walk does.
    pub fn failing_searches(mut self) -> Self {
        self.fail_searches = true;
        self
    }

    /// Live window titles cannot be read.
    pub fn failing_titles(mut self) -> Self {
        self.fail_titles = true;
        self
    }

    fn flatten(&mut self, node: SnapshotNode) -> usize {
        let index = self.nodes.len();
        self.nodes.push(FlatNode {
            role: node.role,
            name: node.name,
            value: node.value,
            children: Vec::new(),
        });
        let children: Vec<usize> = node
            .children
            .into_iter()
            .map(|child| self.flatten(child))
            .collect();
        self.nodes[index].children = children;
        index
    }

    fn window(&self, handle: WindowHandle) -> Result<&SnapshotWindow, AutomationError> {
        if handle.is_null() {
            return Err(AutomationError::InvalidHandle(handle));
        }
        self.windows
            .iter()
            .find(|window| window.handle == handle)
            .ok_or(AutomationError::InvalidHandle(handle))
    }

    fn node(&self, element: &SnapshotElement) -> Result<&FlatNode, AutomationError> {
        self.nodes.get(element.0).ok_or(AutomationError::Transient)
    }

    fn collect(&self, index: usize, filter: RoleFilter, scope: TreeScope, out: &mut Vec<SnapshotElement>) {
        for &child in &self.nodes[index].children {
            if filter.matches(self.nodes[child].role) {
                out.push(SnapshotElement(child));
            }
            if scope == TreeScope::Descendants {
                self.collect(child, filter, scope, out);
            }
        }
    }
}

impl AccessibilityTree for SnapshotTree {
    type Element = SnapshotElement;

    fn element_from_handle(&self, handle: WindowHandle) -> Result<SnapshotElement, AutomationError> {
        self.window(handle).map(|window| SnapshotElement(window.root))
    }

    fn element_text(&self, element: &SnapshotElement) -> Result<String, AutomationError> {
        self.node(element).map(|node| node.name.clone())
    }

    fn element_value(&self, element: &SnapshotElement) -> Result<String, AutomationError> {
        let node = self.node(element)?;
        Ok(node.value.clone().unwrap_or_else(|| node.name.clone()))
    }

    fn find_all(
        &self,
        root: &SnapshotElement,
        filter: RoleFilter,
        scope: TreeScope,
    ) -> Result<Vec<SnapshotElement>, AutomationError> {
        if self.fail_searches {
            return Err(AutomationError::Transient);
        }
        self.node(root)?;
        let mut found = Vec::new();
        self.collect(root.0, filter, scope, &mut found);
        Ok(found)
    }

    fn window_title(&self, handle: WindowHandle) -> Result<String, AutomationError> {
        if self.fail_titles {
            return Err(AutomationError::Platform("window title unavailable".into()));
        }
        self.window(handle).map(|window| window.title.clone())
    }
}

/// Hands out sessions over one shared recorded tree.
#[derive(Debug, Clone)]
pub struct SnapshotProvider {
    tree: Option<Arc<SnapshotTree>>,
}

impl SnapshotProvider {
    pub fn new(tree: SnapshotTree) -> Self {
        Self {
            tree: Some(Arc::new(tree)),
        }
    }

    /// A provider whose sessions never initialize.
    pub fn unavailable() -> Self {
        Self { tree: None }
    }
}

/// Session over a shared [`SnapshotTree`].
#[derive(Debug, Clone)]
pub struct SnapshotSession(Arc<SnapshotTree>);

impl AutomationProvider for SnapshotProvider {
    type Session = SnapshotSession;

    fn open(&self) -> Result<SnapshotSession, AutomationError> {
        self.tree
            .clone()
            .map(SnapshotSession)
            .ok_or_else(|| AutomationError::Unavailable("no recorded tree".into()))
    }
}

impl AccessibilityTree for SnapshotSession {
    type Element = SnapshotElement;

    fn element_from_handle(&self, handle: WindowHandle) -> Result<SnapshotElement, AutomationError> {
        self.0.element_from_handle(handle)
    }

    fn element_text(&self, element: &SnapshotElement) -> Result<String, AutomationError> {
        self.0.element_text(element)
    }

    fn element_value(&self, element: &SnapshotElement) -> Result<String, AutomationError> {
        self.0.element_value(element)
    }

    fn find_all(
        &self,
        root: &SnapshotElement,
        filter: RoleFilter,
        scope: TreeScope,
    ) -> Result<Vec<SnapshotElement>, AutomationError> {
        self.0.find_all(root, filter, scope)
    }

    fn window_title(&self, handle: WindowHandle) -> Result<String, AutomationError> {
        self.0.window_title(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HWND: WindowHandle = WindowHandle(0x1001);

    fn sample() -> SnapshotTree {
        SnapshotTree::new().with_window(
            HWND,
            "Sample",
            SnapshotNode::pane(vec![
                SnapshotNode::text("a"),
                SnapshotNode::pane(vec![SnapshotNode::text("b"), SnapshotNode::list(vec![])]),
                SnapshotNode::text("c"),
            ]),
        )
    }

    #[test]
    fn descendants_come_back_in_tree_order() {
        let tree = sample();
        let root = tree.element_from_handle(HWND).unwrap();
        let texts: Vec<String> = tree
            .find_all(&root, RoleFilter::Only(ElementRole::Text), TreeScope::Descendants)
            .unwrap()
            .iter()
            .map(|element| tree.text_or_empty(element))
            .collect();
        assert_eq!(texts, ["a", "b", "c"]);
    }

    #[test]
    fn children_scope_stops_at_first_level() {
        let tree = sample();
        let root = tree.element_from_handle(HWND).unwrap();
        let children = tree.find_all(&root, RoleFilter::Any, TreeScope::Children).unwrap();
        assert_eq!(children.len(), 3);
    }

    #[test]
    fn unknown_handle_is_invalid() {
        let tree = sample();
        assert_eq!(
            tree.element_from_handle(WindowHandle(7)),
            Err(AutomationError::InvalidHandle(WindowHandle(7)))
        );
        assert!(tree.element_from_handle(WindowHandle::NULL).is_err());
    }

    #[test]
    fn failing_searches_read_as_empty() {
        let tree = sample().failing_searches();
        let root = tree.element_from_handle(HWND).unwrap();
        assert!(tree.find_or_empty(&root, RoleFilter::Any, TreeScope::Descendants).is_empty());
    }

    #[test]
    fn unavailable_provider_fails_to_open() {
        assert!(SnapshotProvider::unavailable().open().is_err());
    }
}
