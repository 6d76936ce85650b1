//! Wizard step / session history synchronization.
//!
//! [`WizardHistory`] owns the step *position* of a multi-step form. Every
//! forward move pushes a `{step, index}` entry onto the host history, and the
//! host's Back/Forward buttons are mapped back onto the wizard:
//!
//! - popping to an entry the wizard wrote restores that step and truncates
//!   the local stack to it
//! - popping to an entry without a wizard payload means the user backed out
//!   past the first step, so the router is sent to the parent path
//!
//! Owning UIs often react to a pop-driven step change by calling
//! [`WizardHistory::advance_to`] with the step they just observed. The
//! [`NavigationIntent`] flag absorbs exactly one such call so that it does not
//! push a duplicate entry.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde::Serialize;
use serde_json::Value;

use crate::history::{HistoryPort, StepHistoryEntry, StepId, Subscription};
use crate::navigation::NavigationPort;
use crate::unload::{BeforeUnloadEvent, UnloadPort};

/// Furthest a forward pop may land past the end of the local stack.
pub const MAX_FORWARD_GAP: usize = 64;

/// Whether the next `advance_to` call should push or be absorbed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationIntent {
    /// The next advance pushes a new history entry
    #[default]
    Idle,
    /// A pop was just applied; the next advance is treated as already applied
    ReactingToPop,
}

/// Mount parameters supplied by the owning wizard UI
#[derive(Debug, Clone, PartialEq)]
pub struct WizardHistoryOptions<S> {
    /// Step shown on first render
    pub initial_step: S,
    /// Route to navigate to when the user backs out of the first step
    pub parent_path: String,
    /// Whether closing the tab should ask for confirmation
    pub has_unsaved_data: bool,
}

impl<S> WizardHistoryOptions<S> {
    pub fn new(initial_step: S, parent_path: impl Into<String>) -> Self {
        Self {
            initial_step,
            parent_path: parent_path.into(),
            has_unsaved_data: true,
        }
    }

    pub fn with_unsaved_data(mut self, has_unsaved_data: bool) -> Self {
        self.has_unsaved_data = has_unsaved_data;
        self
    }
}

/// The host collaborators a wizard is mounted against
#[derive(Clone)]
pub struct HostPorts {
    pub history: Rc<dyn HistoryPort>,
    pub navigator: Rc<dyn NavigationPort>,
    pub unload: Rc<dyn UnloadPort>,
}

impl HostPorts {
    pub fn new(
        history: Rc<dyn HistoryPort>,
        navigator: Rc<dyn NavigationPort>,
        unload: Rc<dyn UnloadPort>,
    ) -> Self {
        Self {
            history,
            navigator,
            unload,
        }
    }
}

/// State shared with the host listeners.
///
/// Listeners only hold a `Weak` to this, so nothing can reach it once the
/// owning [`WizardHistory`] is gone.
struct Shared<S> {
    current: RefCell<S>,
    stack: RefCell<Vec<S>>,
    intent: Cell<NavigationIntent>,
    parent_path: RefCell<String>,
    history: Rc<dyn HistoryPort>,
    navigator: Rc<dyn NavigationPort>,
}

impl<S: StepId> Shared<S> {
    fn write_entry(&self, entry: &StepHistoryEntry<S>, replace: bool) {
        if !self.history.is_available() {
            return;
        }
        match entry.to_state() {
            Ok(state) if replace => self.history.replace_state(state),
            Ok(state) => self.history.push_state(state),
            Err(err) => {
                tracing::warn!(step = ?entry.step, error = %err, "Step could not be encoded for history");
            }
        }
    }

    /// Whether a pop to `index` can have been written by this wizard.
    ///
    /// Forward pops may skip at most [`MAX_FORWARD_GAP`] entries past the
    /// local stack; anything further belongs to another writer.
    fn is_reachable(&self, index: usize) -> bool {
        let len = self.stack.borrow().len();
        index.checked_add(1).is_some_and(|end| end <= len.saturating_add(MAX_FORWARD_GAP))
    }

    fn handle_pop(&self, state: Option<&Value>) {
        let entry = StepHistoryEntry::<S>::from_state(state).filter(|entry| {
            let reachable = self.is_reachable(entry.index);
            if !reachable {
                tracing::debug!(index = entry.index, "History entry index is out of reach");
            }
            reachable
        });
        let Some(entry) = entry else {
            let parent_path = self.parent_path.borrow().clone();
            tracing::info!(
                parent_path = %parent_path,
                "History entry has no wizard payload, leaving wizard"
            );
            self.navigator.navigate(&parent_path);
            return;
        };

        tracing::debug!(step = ?entry.step, index = entry.index, "Restoring step from history");
        self.intent.set(NavigationIntent::ReactingToPop);

        {
            let mut stack = self.stack.borrow_mut();
            // Bounded by is_reachable
            let len = entry.index + 1;
            if stack.len() >= len {
                stack.truncate(len);
                stack[entry.index] = entry.step.clone();
            } else {
                // Forward past the local mirror; positions the host skipped are unknown
                stack.resize(len, entry.step.clone());
            }
        }
        *self.current.borrow_mut() = entry.step;
    }
}

struct Handlers {
    _pop: Subscription,
    _unload: Option<Subscription>,
}

/// A mounted wizard kept in step with session history.
///
/// Mounting installs the host listeners; dropping (or [`unmount`]) removes
/// them again.
///
/// [`unmount`]: WizardHistory::unmount
pub struct WizardHistory<S: StepId> {
    shared: Rc<Shared<S>>,
    unload: Rc<dyn UnloadPort>,
    has_unsaved_data: bool,
    handlers: Option<Handlers>,
}

impl<S: StepId> WizardHistory<S> {
    /// Mount the wizard: seed the current history entry with the initial step
    /// and start listening for Back/Forward and unload.
    pub fn mount(options: WizardHistoryOptions<S>, ports: HostPorts) -> Self {
        let WizardHistoryOptions {
            initial_step,
            parent_path,
            has_unsaved_data,
        } = options;

        let shared = Rc::new(Shared {
            current: RefCell::new(initial_step.clone()),
            stack: RefCell::new(vec![initial_step.clone()]),
            intent: Cell::new(NavigationIntent::Idle),
            parent_path: RefCell::new(parent_path),
            history: ports.history,
            navigator: ports.navigator,
        });

        let mut wizard = Self {
            shared,
            unload: ports.unload,
            has_unsaved_data,
            handlers: None,
        };

        wizard
            .shared
            .write_entry(&StepHistoryEntry::new(initial_step, 0), true);
        wizard.attach();

        tracing::info!(
            step = ?wizard.current_step(),
            parent_path = %wizard.shared.parent_path.borrow(),
            "Wizard mounted"
        );
        wizard
    }

    /// The step the owning UI should render.
    pub fn current_step(&self) -> S {
        self.shared.current.borrow().clone()
    }

    /// Move forward to `next`, pushing a history entry for it.
    ///
    /// Directly after a pop this call is absorbed instead (see module docs).
    /// `next` is not validated; the owning UI knows which steps exist.
    pub fn advance_to(&self, next: S) {
        if self.shared.intent.replace(NavigationIntent::Idle) == NavigationIntent::ReactingToPop {
            tracing::debug!(step = ?next, "Advance absorbed after history pop");
            return;
        }

        let index = {
            let mut stack = self.shared.stack.borrow_mut();
            stack.push(next.clone());
            stack.len() - 1
        };
        self.shared
            .write_entry(&StepHistoryEntry::new(next.clone(), index), false);
        tracing::debug!(step = ?next, index, "Advanced wizard step");
        *self.shared.current.borrow_mut() = next;
    }

    /// Apply changed mount parameters.
    ///
    /// Both listeners are detached and reattached with the new values. The
    /// history entry seeded at mount is left alone.
    pub fn reconfigure(&mut self, parent_path: impl Into<String>, has_unsaved_data: bool) {
        self.detach();
        *self.shared.parent_path.borrow_mut() = parent_path.into();
        self.has_unsaved_data = has_unsaved_data;
        self.attach();
    }

    /// Toggle the before-unload guard, keeping the parent path.
    pub fn set_unsaved_data(&mut self, has_unsaved_data: bool) {
        if self.has_unsaved_data == has_unsaved_data {
            return;
        }
        let parent_path = self.shared.parent_path.borrow().clone();
        self.reconfigure(parent_path, has_unsaved_data);
    }

    /// Remove every host listener. Equivalent to dropping the wizard.
    pub fn unmount(mut self) {
        self.detach();
        tracing::info!("Wizard unmounted");
    }

    /// Steps visited going forward, index 0 being the initial step.
    ///
    /// Returns a copy; the live stack is rewritten by pops the host
    /// dispatches synchronously.
    pub fn stack(&self) -> Vec<S> {
        self.shared.stack.borrow().clone()
    }

    pub fn intent(&self) -> NavigationIntent {
        self.shared.intent.get()
    }

    pub fn parent_path(&self) -> String {
        self.shared.parent_path.borrow().clone()
    }

    pub fn has_unsaved_data(&self) -> bool {
        self.has_unsaved_data
    }

    /// Whether Back would land on an earlier wizard step.
    pub fn can_go_back(&self) -> bool {
        self.shared.stack.borrow().len() > 1
    }

    fn attach(&mut self) {
        let unload = self.has_unsaved_data.then(|| {
            self.unload
                .subscribe_before_unload(Box::new(|event: &mut BeforeUnloadEvent| {
                    event.prevent_default();
                    event.set_return_value("");
                }))
        });

        let shared: Weak<Shared<S>> = Rc::downgrade(&self.shared);
        let pop = self
            .shared
            .history
            .subscribe_pop(Box::new(move |state: Option<&Value>| {
                if let Some(shared) = shared.upgrade() {
                    shared.handle_pop(state);
                }
            }));

        self.handlers = Some(Handlers {
            _pop: pop,
            _unload: unload,
        });
    }

    fn detach(&mut self) {
        self.handlers = None;
    }
}

impl<S: StepId> std::fmt::Debug for WizardHistory<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WizardHistory")
            .field("current", &*self.shared.current.borrow())
            .field("stack", &*self.shared.stack.borrow())
            .field("intent", &self.shared.intent.get())
            .field("parent_path", &*self.shared.parent_path.borrow())
            .field("has_unsaved_data", &self.has_unsaved_data)
            .field("mounted", &self.handlers.is_some())
            .finish()
    }
}
