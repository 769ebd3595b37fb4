//! Request session store.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// A shared string-keyed session.
///
/// The transport decides how the session is persisted (cookie, server
/// side, ...); the routing core only reads and writes values. Clones
/// share the same underlying map, so a session bound into a handler
/// observes writes made by decorators on the same request.
#[derive(Clone, Default)]
pub struct Session {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl Session {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        self.values.read().get(name).cloned()
    }

    /// Set a value.
    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        self.values.write().insert(name.into(), value.into());
    }

    /// Remove a value, returning the previous one.
    pub fn remove(&self, name: &str) -> Option<String> {
        self.values.write().remove(name)
    }

    /// Whether a value exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.read().contains_key(name)
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Returns true if the session holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("size", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let session = Session::new();
        assert!(session.is_empty());
        session.set("user", "ann");
        assert_eq!(session.get("user").as_deref(), Some("ann"));
        assert!(session.contains("user"));
        assert_eq!(session.remove("user").as_deref(), Some("ann"));
        assert!(!session.contains("user"));
    }

    #[test]
    fn clones_share_state() {
        let session = Session::new();
        let clone = session.clone();
        session.set("k", "v");
        assert_eq!(clone.get("k").as_deref(), Some("v"));
    }
}
