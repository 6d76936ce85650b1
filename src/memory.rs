//! In-process hosts.
//!
//! [`MemoryTab`] models a single browser tab: a session history stack, a
//! window that emits before-unload events, and a router that records where it
//! was sent. It backs the unit tests, the session replay runner, and the
//! terminal demo. [`DetachedHost`] stands in when there is no tab at all.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde::Serialize;
use serde_json::Value;

use crate::history::{HistoryPort, PopListener, Subscription};
use crate::navigation::NavigationPort;
use crate::sync::HostPorts;
use crate::unload::{BeforeUnloadEvent, UnloadDecision, UnloadListener, UnloadPort};

/// Listener registry that tolerates listeners which subscribe, unsubscribe,
/// or trigger further dispatches while they run.
struct Listeners<L> {
    next_id: Cell<u64>,
    slots: RefCell<Vec<(u64, Rc<RefCell<L>>)>>,
}

impl<L: 'static> Listeners<L> {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            next_id: Cell::new(0),
            slots: RefCell::new(Vec::new()),
        })
    }

    fn subscribe(self: &Rc<Self>, listener: L) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.slots
            .borrow_mut()
            .push((id, Rc::new(RefCell::new(listener))));

        let registry: Weak<Self> = Rc::downgrade(self);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.slots.borrow_mut().retain(|(slot, _)| *slot != id);
            }
        })
    }

    fn is_registered(&self, id: u64) -> bool {
        self.slots.borrow().iter().any(|(slot, _)| *slot == id)
    }

    fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    fn dispatch(&self, mut call: impl FnMut(&mut L)) {
        let snapshot: Vec<(u64, Rc<RefCell<L>>)> = self.slots.borrow().clone();
        for (id, listener) in snapshot {
            // Removed by an earlier listener in this round
            if !self.is_registered(id) {
                continue;
            }
            match listener.try_borrow_mut() {
                Ok(mut listener) => call(&mut *listener),
                Err(_) => tracing::debug!(id, "Skipping re-entrant listener dispatch"),
            }
        }
    }
}

/// A write recorded by [`MemoryHistory`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "op", content = "state")]
pub enum HistoryOp {
    Replace(Value),
    Push(Value),
}

/// Session history of one in-memory tab.
pub struct MemoryHistory {
    entries: RefCell<Vec<Option<Value>>>,
    cursor: Cell<usize>,
    ops: RefCell<Vec<HistoryOp>>,
    listeners: Rc<Listeners<PopListener>>,
}

impl MemoryHistory {
    /// A tab that reached the current page through one client-side navigation,
    /// so there is exactly one entry to go back to.
    pub fn new() -> Self {
        Self::with_entries(vec![None, None], 1)
    }

    /// A tab with arbitrary entries; `cursor` is clamped to the last entry.
    pub fn with_entries(entries: Vec<Option<Value>>, cursor: usize) -> Self {
        let entries = if entries.is_empty() { vec![None] } else { entries };
        let cursor = cursor.min(entries.len() - 1);
        Self {
            entries: RefCell::new(entries),
            cursor: Cell::new(cursor),
            ops: RefCell::new(Vec::new()),
            listeners: Listeners::new(),
        }
    }

    /// Press Back. Returns false when there is nothing to go back to.
    pub fn back(&self) -> bool {
        self.go(-1)
    }

    /// Press Forward. Returns false when there is nothing ahead.
    pub fn forward(&self) -> bool {
        self.go(1)
    }

    /// Move `delta` entries and notify pop listeners.
    ///
    /// Moves of zero or outside the stack are ignored.
    pub fn go(&self, delta: isize) -> bool {
        if delta == 0 {
            return false;
        }
        let len = self.entries.borrow().len();
        let Some(target) = self.cursor.get().checked_add_signed(delta) else {
            return false;
        };
        if target >= len {
            return false;
        }

        self.cursor.set(target);
        let state = self.entries.borrow()[target].clone();
        tracing::debug!(cursor = target, ?state, "History moved");
        self.notify(state.as_ref());
        true
    }

    /// Deliver a pop with an arbitrary state without moving the cursor.
    pub fn simulate_pop(&self, state: Option<Value>) {
        self.notify(state.as_ref());
    }

    /// State of the current entry.
    pub fn state(&self) -> Option<Value> {
        self.entries.borrow()[self.cursor.get()].clone()
    }

    pub fn cursor(&self) -> usize {
        self.cursor.get()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Every write made through [`HistoryPort`], in order.
    pub fn ops(&self) -> Vec<HistoryOp> {
        self.ops.borrow().clone()
    }

    /// States of every `push_state`, in order.
    pub fn pushes(&self) -> Vec<Value> {
        self.ops
            .borrow()
            .iter()
            .filter_map(|op| match op {
                HistoryOp::Push(state) => Some(state.clone()),
                HistoryOp::Replace(_) => None,
            })
            .collect()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn notify(&self, state: Option<&Value>) {
        self.listeners.dispatch(|listener| listener(state));
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryPort for MemoryHistory {
    fn replace_state(&self, state: Value) {
        self.entries.borrow_mut()[self.cursor.get()] = Some(state.clone());
        self.ops.borrow_mut().push(HistoryOp::Replace(state));
    }

    fn push_state(&self, state: Value) {
        {
            let mut entries = self.entries.borrow_mut();
            entries.truncate(self.cursor.get() + 1);
            entries.push(Some(state.clone()));
            self.cursor.set(entries.len() - 1);
        }
        self.ops.borrow_mut().push(HistoryOp::Push(state));
    }

    fn subscribe_pop(&self, listener: PopListener) -> Subscription {
        self.listeners.subscribe(listener)
    }
}

/// Window of one in-memory tab; emits before-unload on request.
pub struct MemoryWindow {
    listeners: Rc<Listeners<UnloadListener>>,
}

impl MemoryWindow {
    pub fn new() -> Self {
        Self {
            listeners: Listeners::new(),
        }
    }

    /// The user tried to close or reload the tab.
    pub fn request_unload(&self) -> UnloadDecision {
        let mut event = BeforeUnloadEvent::new();
        self.listeners.dispatch(|listener| listener(&mut event));
        event.decision()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for MemoryWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl UnloadPort for MemoryWindow {
    fn subscribe_before_unload(&self, listener: UnloadListener) -> Subscription {
        self.listeners.subscribe(listener)
    }
}

/// Router that only remembers where it was asked to go.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    navigations: RefCell<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.borrow().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.navigations.borrow().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.navigations.borrow().len()
    }
}

impl NavigationPort for RecordingNavigator {
    fn navigate(&self, path: &str) {
        tracing::debug!(path, "Navigation requested");
        self.navigations.borrow_mut().push(path.to_string());
    }
}

/// One in-memory browser tab.
#[derive(Clone)]
pub struct MemoryTab {
    pub history: Rc<MemoryHistory>,
    pub window: Rc<MemoryWindow>,
    pub navigator: Rc<RecordingNavigator>,
}

impl MemoryTab {
    pub fn new() -> Self {
        Self::with_history(MemoryHistory::new())
    }

    pub fn with_history(history: MemoryHistory) -> Self {
        Self {
            history: Rc::new(history),
            window: Rc::new(MemoryWindow::new()),
            navigator: Rc::new(RecordingNavigator::new()),
        }
    }

    pub fn ports(&self) -> HostPorts {
        HostPorts::new(
            self.history.clone(),
            self.navigator.clone(),
            self.window.clone(),
        )
    }
}

impl Default for MemoryTab {
    fn default() -> Self {
        Self::new()
    }
}

/// Host without history, window, or router (server-side construction).
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedHost;

impl DetachedHost {
    pub fn new() -> Self {
        Self
    }

    pub fn ports(&self) -> HostPorts {
        let host = Rc::new(*self);
        HostPorts::new(host.clone(), host.clone(), host)
    }
}

impl HistoryPort for DetachedHost {
    fn is_available(&self) -> bool {
        false
    }

    fn replace_state(&self, _state: Value) {}

    fn push_state(&self, _state: Value) {}

    fn subscribe_pop(&self, _listener: PopListener) -> Subscription {
        Subscription::noop()
    }
}

impl UnloadPort for DetachedHost {
    fn subscribe_before_unload(&self, _listener: UnloadListener) -> Subscription {
        Subscription::noop()
    }
}

impl NavigationPort for DetachedHost {
    fn navigate(&self, _path: &str) {}
}
