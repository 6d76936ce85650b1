//! Session history abstraction layer.
//!
//! Provides a trait-based abstraction over a browser-style history stack to enable:
//! - Unit testing against the in-memory tab in [`crate::memory`]
//! - Driving a real browser through the `web` feature
//! - Graceful no-ops when no history exists (server-side construction)

mod entry;

pub use entry::{StepHistoryEntry, StepId};

use serde_json::Value;

/// Callback invoked when the host moves to another history entry.
///
/// Receives the state stored on the entry that became current, or `None`
/// when that entry carries no state at all.
pub type PopListener = Box<dyn FnMut(Option<&Value>)>;

/// Host session history (one per tab).
///
/// The stack is shared with every other writer in the tab, so states read
/// back through [`PopListener`] may have been written by unrelated code.
pub trait HistoryPort {
    /// Whether a history stack exists at all.
    ///
    /// When false, writes are ignored and subscriptions never fire.
    fn is_available(&self) -> bool {
        true
    }

    /// Overwrite the state of the current entry without adding a frame.
    fn replace_state(&self, state: Value);

    /// Add a new entry after the current one, discarding any forward entries.
    fn push_state(&self, state: Value);

    /// Listen for Back/Forward moves. The listener stays registered until the
    /// returned [`Subscription`] is cancelled or dropped.
    fn subscribe_pop(&self, listener: PopListener) -> Subscription;
}

/// Registration handle returned by the port `subscribe_*` methods.
///
/// Deregisters its listener when cancelled or dropped, whichever comes first.
#[must_use = "dropping a Subscription removes the listener immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wrap the host-specific removal routine.
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription that was never registered with anything.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    /// Whether the listener is still registered through this handle.
    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    /// Remove the listener now.
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_subscription_cancel_runs_once() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let subscription = Subscription::new(move || counter.set(counter.get() + 1));

        assert!(subscription.is_active());
        subscription.cancel();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_subscription_drop_cancels() {
        let calls = Rc::new(Cell::new(0));
        {
            let counter = Rc::clone(&calls);
            let _subscription = Subscription::new(move || counter.set(counter.get() + 1));
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_noop_subscription_is_inactive() {
        let subscription = Subscription::noop();
        assert!(!subscription.is_active());
        // Dropping must not panic
        drop(subscription);
    }
}
