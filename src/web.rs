//! Browser host for [`crate::WizardHistory`].
//!
//! The wizard's `{step, index}` payload is stored under [`STATE_KEY`] inside
//! the history state object. Other code in the tab may keep its own keys on
//! the same object, so replacing an entry copies them over instead of
//! trampling them.

use serde::Serialize as _;
use serde_json::Value;
use thiserror::Error;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast as _, JsValue};

use crate::history::{HistoryPort, PopListener, Subscription};
use crate::navigation::NavigationPort;
use crate::unload::{BeforeUnloadEvent, UnloadListener, UnloadPort};

/// Key of the wizard payload inside `history.state`
pub const STATE_KEY: &str = "__wizard_history";

#[derive(Error, Debug)]
pub enum WebHistoryError {
    #[error("no global window object")]
    NoWindow,

    #[error("history state is not an object")]
    StateNotObject,

    #[error("browser call failed: {0}")]
    Js(String),

    #[error("payload conversion failed: {0}")]
    Payload(String),
}

impl From<JsValue> for WebHistoryError {
    fn from(value: JsValue) -> Self {
        Self::Js(format!("{value:?}"))
    }
}

fn window() -> Result<web_sys::Window, WebHistoryError> {
    web_sys::window().ok_or(WebHistoryError::NoWindow)
}

fn to_js(payload: &Value) -> Result<JsValue, WebHistoryError> {
    payload
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|err| WebHistoryError::Payload(err.to_string()))
}

/// Read the wizard payload out of a history state object.
fn extract_payload(state: &JsValue) -> Option<Value> {
    if !state.is_object() {
        return None;
    }
    let value = js_sys::Reflect::get(state, &JsValue::from_str(STATE_KEY)).ok()?;
    if value.is_undefined() || value.is_null() {
        return None;
    }
    serde_wasm_bindgen::from_value(value).ok()
}

/// `window.history` plus its `popstate` event.
pub struct BrowserHistory {
    window: Option<web_sys::Window>,
    history: Option<web_sys::History>,
}

impl BrowserHistory {
    /// Works outside a browser too; the port then reports itself unavailable.
    pub fn new() -> Self {
        let window = web_sys::window();
        let history = window.as_ref().and_then(|w| w.history().ok());
        Self { window, history }
    }

    /// Current state with the wizard payload set, preserving foreign keys.
    fn merged_state(
        history: &web_sys::History,
        payload: &Value,
    ) -> Result<JsValue, WebHistoryError> {
        let state = history.state()?;
        let target = js_sys::Object::new();
        if !(state.is_undefined() || state.is_null()) {
            if !state.is_object() {
                return Err(WebHistoryError::StateNotObject);
            }
            js_sys::Object::assign(&target, state.unchecked_ref());
        }
        js_sys::Reflect::set(&target, &JsValue::from_str(STATE_KEY), &to_js(payload)?)?;
        Ok(target.into())
    }

    fn fresh_state(payload: &Value) -> Result<JsValue, WebHistoryError> {
        let target = js_sys::Object::new();
        js_sys::Reflect::set(&target, &JsValue::from_str(STATE_KEY), &to_js(payload)?)?;
        Ok(target.into())
    }
}

impl Default for BrowserHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryPort for BrowserHistory {
    fn is_available(&self) -> bool {
        self.history.is_some()
    }

    fn replace_state(&self, state: Value) {
        let Some(history) = self.history.as_ref() else {
            return;
        };
        let result = Self::merged_state(history, &state)
            .and_then(|js| history.replace_state(&js, "").map_err(WebHistoryError::from));
        if let Err(err) = result {
            tracing::warn!(error = %err, "history.replaceState failed");
        }
    }

    fn push_state(&self, state: Value) {
        let Some(history) = self.history.as_ref() else {
            return;
        };
        let result = Self::fresh_state(&state)
            .and_then(|js| history.push_state(&js, "").map_err(WebHistoryError::from));
        if let Err(err) = result {
            tracing::warn!(error = %err, "history.pushState failed");
        }
    }

    fn subscribe_pop(&self, mut listener: PopListener) -> Subscription {
        let Some(window) = self.window.clone() else {
            return Subscription::noop();
        };

        let closure = Closure::<dyn FnMut(web_sys::PopStateEvent)>::new(
            move |event: web_sys::PopStateEvent| {
                let payload = extract_payload(&event.state());
                listener(payload.as_ref());
            },
        );
        if let Err(err) =
            window.add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref())
        {
            tracing::warn!(error = ?err, "Failed to add popstate listener");
            return Subscription::noop();
        }

        Subscription::new(move || {
            let _ = window
                .remove_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
            drop(closure);
        })
    }
}

/// `beforeunload` on the global window.
pub struct BrowserWindow {
    window: Option<web_sys::Window>,
}

impl BrowserWindow {
    pub fn new() -> Self {
        Self {
            window: web_sys::window(),
        }
    }
}

impl Default for BrowserWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl UnloadPort for BrowserWindow {
    fn subscribe_before_unload(&self, mut listener: UnloadListener) -> Subscription {
        let Some(window) = self.window.clone() else {
            return Subscription::noop();
        };

        let closure = Closure::<dyn FnMut(web_sys::BeforeUnloadEvent)>::new(
            move |event: web_sys::BeforeUnloadEvent| {
                let mut unload = BeforeUnloadEvent::new();
                listener(&mut unload);
                if unload.default_prevented() {
                    event.prevent_default();
                }
                if let Some(value) = unload.return_value() {
                    event.set_return_value(value);
                }
            },
        );
        if let Err(err) = window
            .add_event_listener_with_callback("beforeunload", closure.as_ref().unchecked_ref())
        {
            tracing::warn!(error = ?err, "Failed to add beforeunload listener");
            return Subscription::noop();
        }

        Subscription::new(move || {
            let _ = window.remove_event_listener_with_callback(
                "beforeunload",
                closure.as_ref().unchecked_ref(),
            );
            drop(closure);
        })
    }
}

/// Full-page navigation through `window.location`.
///
/// Apps with a client-side router should wrap it in
/// [`crate::navigation::FnNavigator`] instead.
pub struct LocationNavigator;

impl NavigationPort for LocationNavigator {
    fn navigate(&self, path: &str) {
        let result = window().and_then(|w| w.location().set_href(path).map_err(Into::into));
        if let Err(err) = result {
            tracing::warn!(path, error = %err, "Navigation failed");
        }
    }
}

/// Ports for the current browser tab.
pub fn browser_ports() -> crate::sync::HostPorts {
    use std::rc::Rc;

    crate::sync::HostPorts::new(
        Rc::new(BrowserHistory::new()),
        Rc::new(LocationNavigator),
        Rc::new(BrowserWindow::new()),
    )
}
