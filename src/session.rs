use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::UserProfile;

/// Storage key holding the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Storage key holding the cached user identity (JSON).
pub const USER_KEY: &str = "user";

/// Persisted key-value store backing the session.
///
/// The client reads the token on every request and clears both recognized
/// keys on logout or a 401 response. Implementations decide where the values
/// actually live (process memory, a settings file, a keychain).
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-process [`SessionStore`] used when no external storage is supplied.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        // Each critical section is a single map operation, so a poisoned
        // lock cannot hold an inconsistent map; recover the guard.
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
    }
}

/// Cheap-clone handle over a [`SessionStore`] with typed accessors for the
/// two recognized keys.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn SessionStore>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token().map(|_| "<redacted>"))
            .finish()
    }
}

impl Session {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()))
    }

    /// Current bearer token, if a session is active.
    pub fn token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY)
    }

    pub fn set_token(&self, token: &str) {
        self.store.set(TOKEN_KEY, token);
    }

    /// Cached user identity, decoded from the stored JSON.
    ///
    /// Returns `None` when no identity is stored or the stored value no
    /// longer parses (e.g. written by an older build).
    pub fn user(&self) -> Option<UserProfile> {
        let raw = self.store.get(USER_KEY)?;
        serde_json::from_str(&raw).ok()
    }

    pub fn set_user(&self, user: &UserProfile) {
        if let Ok(raw) = serde_json::to_string(user) {
            self.store.set(USER_KEY, &raw);
        }
    }

    /// Removes the token and the cached identity.
    pub fn clear(&self) {
        self.store.remove(TOKEN_KEY);
        self.store.remove(USER_KEY);
    }
}
