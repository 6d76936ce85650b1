//! The `{step, index}` record the wizard stores on its history entries

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Application-defined identifier of a wizard step.
///
/// Usually a fieldless enum deriving `Serialize`/`Deserialize`, or a plain
/// `String` when steps come from configuration.
pub trait StepId: Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + 'static {}

impl<T> StepId for T where T: Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + 'static
{}

/// One frame the wizard wrote into session history.
///
/// `index` is the position in the wizard's own stack (0 = initial step), not
/// the host's global history length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepHistoryEntry<S> {
    pub step: S,
    pub index: usize,
}

impl<S: StepId> StepHistoryEntry<S> {
    pub fn new(step: S, index: usize) -> Self {
        Self { step, index }
    }

    /// Encode as the state object stored on the history entry.
    pub fn to_state(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Read an entry back from host state.
    ///
    /// Returns `None` for missing state and for anything that is not shaped
    /// like `{step, index}`: other code in the tab writes history too.
    pub fn from_state(state: Option<&Value>) -> Option<Self> {
        let state = state?;
        let object = state.as_object()?;
        if !object.contains_key("step") || !object.contains_key("index") {
            return None;
        }
        serde_json::from_value(state.clone()).ok()
    }
}
