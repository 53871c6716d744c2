//! In-process host for tests and demos.
//!
//! Mirrors what a real host does at the boundary:
//! - keeps every registered callback table
//! - fires lifecycle slots with an explicit receiver
//! - applies page data synchronously but queues render acknowledgments
//!   until [`MockPage::flush_renders`] is called
//! - broadcasts global events to every listener
//!
//! # Example
//!
//! ```ignore
//! let platform = Rc::new(MockPlatform::new());
//! let ctx = Context::new(platform.clone());
//! let page = use_page_driver(&ctx, PageOptions::default())?;
//!
//! let instance = MockPage::new("pages/index", json!({}));
//! platform.fire_page(0, &instance, "onLoad", &json!({ "id": 7 }));
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use super::{
    AppInstance, AppRef, GlobalEvent, PageInstance, PageRef, Platform, RenderCallback, SystemInfo,
};
use crate::framework::table::CallbackTable;

// =============================================================================
// Mock Page / App
// =============================================================================

/// Shallow-merge `patch` into `target`; a non-object patch replaces it.
fn merge(target: &mut Value, patch: Value) {
    match (target.as_object_mut(), patch) {
        (Some(fields), Value::Object(patch)) => fields.extend(patch),
        (_, patch) => *target = patch,
    }
}

/// Page object with queued render acknowledgments.
pub struct MockPage {
    route: String,
    data: RefCell<Value>,
    exit_state: RefCell<Option<Value>>,
    pending_renders: RefCell<Vec<RenderCallback>>,
}

impl MockPage {
    pub fn new(route: impl Into<String>, data: Value) -> Rc<Self> {
        Rc::new(Self {
            route: route.into(),
            data: RefCell::new(data),
            exit_state: RefCell::new(None),
            pending_renders: RefCell::new(Vec::new()),
        })
    }

    /// Pretend the host restored a saved exit state on cold start.
    pub fn restore_exit_state(&self, state: Value) {
        *self.exit_state.borrow_mut() = Some(state);
    }

    /// Number of render acknowledgments not yet delivered.
    pub fn pending_renders(&self) -> usize {
        self.pending_renders.borrow().len()
    }

    /// Deliver every queued render acknowledgment.
    pub fn flush_renders(&self) {
        let pending: Vec<RenderCallback> = self.pending_renders.borrow_mut().drain(..).collect();
        for callback in pending {
            callback();
        }
    }

    /// Handle for use as a callback receiver.
    pub fn as_page_ref(self: &Rc<Self>) -> PageRef {
        self.clone()
    }
}

impl PageInstance for MockPage {
    fn route(&self) -> String {
        self.route.clone()
    }

    fn data(&self) -> Value {
        self.data.borrow().clone()
    }

    fn set_data(&self, patch: Value, on_rendered: Option<RenderCallback>) {
        merge(&mut self.data.borrow_mut(), patch);
        if let Some(callback) = on_rendered {
            self.pending_renders.borrow_mut().push(callback);
        }
    }

    fn exit_state(&self) -> Option<Value> {
        self.exit_state.borrow().clone()
    }
}

/// App object holding global data.
pub struct MockApp {
    global_data: RefCell<Value>,
}

impl MockApp {
    pub fn new(global_data: Value) -> Rc<Self> {
        Rc::new(Self {
            global_data: RefCell::new(global_data),
        })
    }

    pub fn as_app_ref(self: &Rc<Self>) -> AppRef {
        self.clone()
    }
}

impl AppInstance for MockApp {
    fn global_data(&self) -> Value {
        self.global_data.borrow().clone()
    }

    fn set_global_data(&self, patch: Value) {
        merge(&mut self.global_data.borrow_mut(), patch);
    }
}

// =============================================================================
// Mock Platform
// =============================================================================

type Listener = Rc<dyn Fn(&Value)>;

/// Host platform that records registrations and replays events on demand.
#[derive(Default)]
pub struct MockPlatform {
    pages: RefCell<Vec<CallbackTable<PageRef>>>,
    app: RefCell<Option<CallbackTable<AppRef>>>,
    listeners: RefCell<HashMap<GlobalEvent, Vec<Listener>>>,
    system_info: RefCell<SystemInfo>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_info(info: SystemInfo) -> Self {
        let platform = Self::default();
        *platform.system_info.borrow_mut() = info;
        platform
    }

    /// Number of page tables registered so far.
    pub fn page_count(&self) -> usize {
        self.pages.borrow().len()
    }

    /// Copy of the `index`-th registered page table.
    pub fn page_table(&self, index: usize) -> Option<CallbackTable<PageRef>> {
        self.pages.borrow().get(index).cloned()
    }

    pub fn app_table(&self) -> Option<CallbackTable<AppRef>> {
        self.app.borrow().clone()
    }

    /// Create a page object for the `index`-th table, starting from its `data` slot.
    pub fn open_page(&self, index: usize, route: &str) -> Option<Rc<MockPage>> {
        let table = self.page_table(index)?;
        let data = table.value("data").cloned().unwrap_or_else(|| Value::Object(Default::default()));
        Some(MockPage::new(route, data))
    }

    /// Create the app object, starting from the app table's `globalData` slot.
    pub fn open_app(&self) -> Option<Rc<MockApp>> {
        let table = self.app_table()?;
        let data = table
            .value("globalData")
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default()));
        Some(MockApp::new(data))
    }

    /// Fire a page lifecycle slot on the `index`-th registered table.
    ///
    /// Returns the callback's return value, `None` if the slot is not a callback.
    pub fn fire_page(
        &self,
        index: usize,
        page: &Rc<MockPage>,
        slot: &str,
        args: &Value,
    ) -> Option<Value> {
        // Clone out so callbacks can register more pages.
        let table = self.page_table(index)?;
        table.invoke(slot, &page.as_page_ref(), args)
    }

    /// Fire an app lifecycle slot.
    pub fn fire_app(&self, app: &Rc<MockApp>, slot: &str, args: &Value) -> Option<Value> {
        let table = self.app_table()?;
        table.invoke(slot, &app.as_app_ref(), args)
    }

    /// Broadcast a global event.
    pub fn emit(&self, event: GlobalEvent, payload: &Value) {
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .get(&event)
            .cloned()
            .unwrap_or_default();
        for listener in listeners {
            listener(payload);
        }
    }

    pub fn listener_count(&self, event: GlobalEvent) -> usize {
        self.listeners
            .borrow()
            .get(&event)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl Platform for MockPlatform {
    fn register_page(&self, table: CallbackTable<PageRef>) {
        self.pages.borrow_mut().push(table);
    }

    fn register_app(&self, table: CallbackTable<AppRef>) {
        *self.app.borrow_mut() = Some(table);
    }

    fn subscribe(&self, event: GlobalEvent, listener: Box<dyn Fn(&Value)>) {
        self.listeners
            .borrow_mut()
            .entry(event)
            .or_default()
            .push(Rc::from(listener));
    }

    fn system_info(&self) -> SystemInfo {
        self.system_info.borrow().clone()
    }
}
