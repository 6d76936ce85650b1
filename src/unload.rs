//! Before-unload guard plumbing.
//!
//! Hosts no longer show application-supplied text in the "leave site?"
//! prompt; cancelling the event is the only signal that matters.

use serde::Serialize;

use crate::history::Subscription;

/// Callback invoked when the tab is about to close, reload, or navigate away.
pub type UnloadListener = Box<dyn FnMut(&mut BeforeUnloadEvent)>;

/// Host window that emits before-unload events.
pub trait UnloadPort {
    fn subscribe_before_unload(&self, listener: UnloadListener) -> Subscription;
}

/// What the host should do once every before-unload listener has run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnloadDecision {
    /// Unload immediately
    Proceed,
    /// Show the native confirmation prompt
    Prompt,
}

/// A single before-unload notification.
#[derive(Debug, Default, Clone)]
pub struct BeforeUnloadEvent {
    default_prevented: bool,
    return_value: Option<String>,
}

impl BeforeUnloadEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the unload, requesting the confirmation prompt.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Legacy return value; older hosts only prompt when it is set.
    pub fn set_return_value(&mut self, value: impl Into<String>) {
        self.return_value = Some(value.into());
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn return_value(&self) -> Option<&str> {
        self.return_value.as_deref()
    }

    pub fn decision(&self) -> UnloadDecision {
        if self.default_prevented || self.return_value.is_some() {
            UnloadDecision::Prompt
        } else {
            UnloadDecision::Proceed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untouched_event_proceeds() {
        let event = BeforeUnloadEvent::new();
        assert!(!event.default_prevented());
        assert_eq!(event.decision(), UnloadDecision::Proceed);
    }

    #[test]
    fn test_prevent_default_prompts() {
        let mut event = BeforeUnloadEvent::new();
        event.prevent_default();
        assert_eq!(event.decision(), UnloadDecision::Prompt);
    }

    #[test]
    fn test_legacy_return_value_prompts() {
        let mut event = BeforeUnloadEvent::new();
        event.set_return_value("");
        assert_eq!(event.return_value(), Some(""));
        assert_eq!(event.decision(), UnloadDecision::Prompt);
    }
}
