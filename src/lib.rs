//! wizard-history - keeps a multi-step form wizard in sync with session history
//!
//! The wizard's current step is mirrored into a browser-style history stack so
//! that the host's Back button steps backwards through the wizard, and backing
//! out of the first step navigates to a parent route. Hosts are reached through
//! small port traits ([`HistoryPort`], [`NavigationPort`], [`UnloadPort`]) so the
//! same component drives a real browser tab, the in-memory tab used by tests and
//! the terminal demo, or nothing at all during server-side construction.

pub mod config;
pub mod history;
pub mod memory;
pub mod navigation;
pub mod replay;
pub mod sync;
pub mod unload;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod web;

pub use history::{HistoryPort, PopListener, StepHistoryEntry, StepId, Subscription};
pub use navigation::{FnNavigator, NavigationPort};
pub use sync::{
    HostPorts, NavigationIntent, WizardHistory, WizardHistoryOptions, MAX_FORWARD_GAP,
};
pub use unload::{BeforeUnloadEvent, UnloadDecision, UnloadListener, UnloadPort};
