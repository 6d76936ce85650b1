//! Router port used when the user backs out of the wizard

/// Client-side router.
pub trait NavigationPort {
    /// Move the application to `path`.
    fn navigate(&self, path: &str);
}

/// Adapter for routers that expose navigation as a plain callback.
pub struct FnNavigator<F>(F);

impl<F: Fn(&str)> FnNavigator<F> {
    pub fn new(navigate: F) -> Self {
        Self(navigate)
    }
}

impl<F: Fn(&str)> NavigationPort for FnNavigator<F> {
    fn navigate(&self, path: &str) {
        (self.0)(path);
    }
}
