//! Session-scoped authentication flag and route admission.
//!
//! The flag lives in a [`SessionStorage`] owned by the [`Session`] value that
//! is passed to whatever decides route admission. Nothing global.

use std::collections::HashMap;

/// Storage key of the authentication flag.
pub const AUTH_KEY: &str = "mock_authenticated";

/// Tab-scoped key/value storage: survives reloads within a session, not
/// restarts.
pub trait SessionStorage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
}

/// Storage that lives as long as the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    MockLogin,
    Home,
    Dashboard,
    Upload,
    UploadReview,
    UploadConfirmation,
    ConfigTest,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::MockLogin => "/mock-azure-login",
            Route::Home => "/",
            Route::Dashboard => "/dashboard",
            Route::Upload => "/upload",
            Route::UploadReview => "/upload-review",
            Route::UploadConfirmation => "/upload-confirmation",
            Route::ConfigTest => "/config-test",
        }
    }

    /// Routes that require a signed-in participant.
    pub fn is_protected(self) -> bool {
        matches!(
            self,
            Route::Home
                | Route::Dashboard
                | Route::Upload
                | Route::UploadReview
                | Route::UploadConfirmation
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allow,
    Redirect(Route),
}

/// A refused navigation, pointing at where the user should go instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redirect {
    pub from: Route,
    pub to: Route,
}

pub struct Session<S = MemoryStorage> {
    storage: S,
}

impl Default for Session<MemoryStorage> {
    fn default() -> Self {
        Self::new(MemoryStorage::default())
    }
}

impl<S: SessionStorage> Session<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn is_authenticated(&self) -> bool {
        self.storage.get(AUTH_KEY).as_deref() == Some("true")
    }

    /// `true` stores the flag, `false` removes it (absent = signed out).
    pub fn set_authenticated(&mut self, value: bool) {
        if value {
            self.storage.set(AUTH_KEY, "true".to_string());
        } else {
            self.storage.remove(AUTH_KEY);
        }
        tracing::debug!(authenticated = value, "session flag updated");
    }

    pub fn admit(&self, route: Route) -> Admission {
        if route.is_protected() && !self.is_authenticated() {
            Admission::Redirect(Route::Login)
        } else {
            Admission::Allow
        }
    }

    /// Build the page for `route` only once admission has been granted.
    pub fn enter<P>(&self, route: Route, build: impl FnOnce() -> P) -> Result<P, Redirect> {
        match self.admit(route) {
            Admission::Allow => Ok(build()),
            Admission::Redirect(to) => {
                tracing::info!(from = route.path(), to = to.path(), "redirecting unauthenticated visit");
                Err(Redirect { from: route, to })
            }
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}
