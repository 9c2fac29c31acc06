//! Windows UI Automation backend.
//!
//! Each session initializes COM on the calling thread and owns one `IUIAutomation`.
//! Element interfaces are reference counted and released on drop, and sessions are not
//! `Send`, so no element can leave the thread (or the call) that acquired it.

use std::ffi::c_void;

use windows::core::VARIANT;
use windows::Win32::Foundation::HWND;
use windows::Win32::System::Com::{
    CoCreateInstance, CoInitializeEx, CoUninitialize, CLSCTX_INPROC_SERVER,
    COINIT_APARTMENTTHREADED,
};
use windows::Win32::UI::Accessibility::{
    CUIAutomation, IUIAutomation, IUIAutomationCondition, IUIAutomationElement,
    IUIAutomationValuePattern, TreeScope_Children, TreeScope_Descendants,
    UIA_ButtonControlTypeId, UIA_ControlTypePropertyId, UIA_EditControlTypeId,
    UIA_ListControlTypeId, UIA_ListItemControlTypeId, UIA_PaneControlTypeId,
    UIA_TextControlTypeId, UIA_ValuePatternId, UIA_WindowControlTypeId, UIA_CONTROLTYPE_ID,
};
use windows::Win32::UI::WindowsAndMessaging::{GetWindowTextW, IsWindow};

use super::{AccessibilityTree, AutomationError, AutomationProvider, ElementRole, RoleFilter, TreeScope};
use crate::models::WindowHandle;

const TITLE_BUFFER_LEN: usize = 512;

impl From<windows::core::Error> for AutomationError {
    fn from(err: windows::core::Error) -> Self {
        AutomationError::Platform(err.message())
    }
}

fn hwnd(handle: WindowHandle) -> HWND {
    HWND(handle.0 as *mut c_void)
}

fn control_type(role: ElementRole) -> Option<UIA_CONTROLTYPE_ID> {
    match role {
        ElementRole::Window => Some(UIA_WindowControlTypeId),
        ElementRole::Pane => Some(UIA_PaneControlTypeId),
        ElementRole::Text => Some(UIA_TextControlTypeId),
        ElementRole::Edit => Some(UIA_EditControlTypeId),
        ElementRole::List => Some(UIA_ListControlTypeId),
        ElementRole::ListItem => Some(UIA_ListItemControlTypeId),
        ElementRole::Button => Some(UIA_ButtonControlTypeId),
        ElementRole::Other => None,
    }
}

/// Balances a successful `CoInitializeEx` on drop.
struct ComApartment {
    initialized: bool,
}

impl ComApartment {
    fn enter() -> Self {
        // RPC_E_CHANGED_MODE still leaves COM usable on this thread, just not ours to tear down.
        let hr = unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) };
        Self {
            initialized: hr.is_ok(),
        }
    }
}

impl Drop for ComApartment {
    fn drop(&mut self) {
        if self.initialized {
            unsafe { CoUninitialize() };
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UiaProvider;

impl AutomationProvider for UiaProvider {
    type Session = UiaSession;

    fn open(&self) -> Result<UiaSession, AutomationError> {
        UiaSession::new()
    }
}

pub struct UiaSession {
    // Declared before the apartment so it is released before COM is torn down.
    automation: IUIAutomation,
    _apartment: ComApartment,
}

impl UiaSession {
    pub fn new() -> Result<Self, AutomationError> {
        let apartment = ComApartment::enter();
        let automation: IUIAutomation =
            unsafe { CoCreateInstance(&CUIAutomation, None, CLSCTX_INPROC_SERVER) }
                .map_err(|err| AutomationError::Unavailable(err.message()))?;
        Ok(Self {
            automation,
            _apartment: apartment,
        })
    }

    fn condition(&self, filter: RoleFilter) -> Result<IUIAutomationCondition, AutomationError> {
        let condition = match filter {
            RoleFilter::Any => unsafe { self.automation.CreateTrueCondition()? },
            RoleFilter::Only(role) => match control_type(role) {
                Some(id) => unsafe {
                    self.automation
                        .CreatePropertyCondition(UIA_ControlTypePropertyId, &VARIANT::from(id.0))?
                },
                None => unsafe { self.automation.CreateTrueCondition()? },
            },
        };
        Ok(condition)
    }
}

impl AccessibilityTree for UiaSession {
    type Element = IUIAutomationElement;

    fn element_from_handle(&self, handle: WindowHandle) -> Result<IUIAutomationElement, AutomationError> {
        if handle.is_null() || !unsafe { IsWindow(hwnd(handle)) }.as_bool() {
            return Err(AutomationError::InvalidHandle(handle));
        }
        unsafe { self.automation.ElementFromHandle(hwnd(handle)) }.map_err(|_| AutomationError::NoRoot)
    }

    fn element_text(&self, element: &IUIAutomationElement) -> Result<String, AutomationError> {
        let name = unsafe { element.CurrentName() }.map_err(|_| AutomationError::Transient)?;
        Ok(name.to_string())
    }

    fn element_value(&self, element: &IUIAutomationElement) -> Result<String, AutomationError> {
        let pattern = unsafe {
            element.GetCurrentPatternAs::<IUIAutomationValuePattern>(UIA_ValuePatternId)
        };
        match pattern {
            Ok(pattern) => {
                let value = unsafe { pattern.CurrentValue() }.map_err(|_| AutomationError::Transient)?;
                Ok(value.to_string())
            }
            Err(_) => self.element_text(element),
        }
    }

    fn find_all(
        &self,
        root: &IUIAutomationElement,
        filter: RoleFilter,
        scope: TreeScope,
    ) -> Result<Vec<IUIAutomationElement>, AutomationError> {
        let condition = self.condition(filter)?;
        let scope = match scope {
            TreeScope::Children => TreeScope_Children,
            TreeScope::Descendants => TreeScope_Descendants,
        };
        let found = unsafe { root.FindAll(scope, &condition) }.map_err(|_| AutomationError::Transient)?;
        let length = unsafe { found.Length()? };
        let mut elements = Vec::with_capacity(usize::try_from(length).unwrap_or_default());
        for index in 0..length {
            if let Ok(element) = unsafe { found.GetElement(index) } {
                elements.push(element);
            }
        }
        Ok(elements)
    }

    fn window_title(&self, handle: WindowHandle) -> Result<String, AutomationError> {
        if handle.is_null() {
            return Err(AutomationError::InvalidHandle(handle));
        }
        let mut buffer = [0u16; TITLE_BUFFER_LEN];
        let copied = unsafe { GetWindowTextW(hwnd(handle), &mut buffer) };
        let copied = usize::try_from(copied).unwrap_or_default().min(TITLE_BUFFER_LEN);
        Ok(String::from_utf16_lossy(&buffer[..copied]))
    }
}
