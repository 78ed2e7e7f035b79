//! Per-session identity cache with negative caching

use super::identity::ResolutionState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Number → resolution state map shared between the presentation side (reads
/// and placeholder writes) and the resolution worker (final writes).
///
/// One mutex serializes every operation, so `clear()` can never interleave
/// with an in-flight `put` for the same number. The cache is created fresh on
/// each session activation and carries nothing across sessions — resolved
/// data may have changed since the last activation.
#[derive(Debug)]
pub struct IdentityCache {
    states: Arc<Mutex<HashMap<String, ResolutionState>>>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self {
            states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Current state for a number; [`ResolutionState::NotQueried`] when the
    /// number has never been seen this session.
    pub fn get(&self, number: &str) -> ResolutionState {
        self.states
            .lock()
            .unwrap()
            .get(number)
            .cloned()
            .unwrap_or_default()
    }

    pub fn put(&self, number: &str, state: ResolutionState) {
        self.states
            .lock()
            .unwrap()
            .insert(number.to_string(), state);
    }

    pub fn clear(&self) {
        self.states.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.states.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Clone for IdentityCache {
    fn clone(&self) -> Self {
        Self {
            states: Arc::clone(&self.states),
        }
    }
}

impl Default for IdentityCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver_core::identity::Identity;

    #[test]
    fn test_unknown_number_is_not_queried() {
        let cache = IdentityCache::new();
        assert!(matches!(cache.get("5551234"), ResolutionState::NotQueried));
    }

    #[test]
    fn test_put_and_get() {
        let cache = IdentityCache::new();

        cache.put("5551234", ResolutionState::QueriedNoMatch);
        assert!(matches!(
            cache.get("5551234"),
            ResolutionState::QueriedNoMatch
        ));

        let identity = Identity::new(3, Some("Alice".to_string()), 2, None, "5551234".to_string());
        cache.put("5551234", ResolutionState::Resolved(Arc::new(identity)));
        match cache.get("5551234") {
            ResolutionState::Resolved(id) => assert_eq!(id.name.as_deref(), Some("Alice")),
            other => panic!("expected resolved state, got {:?}", other),
        }
    }

    #[test]
    fn test_clones_share_state() {
        let cache = IdentityCache::new();
        let alias = cache.clone();

        alias.put("5551234", ResolutionState::QueriedNoMatch);
        assert!(matches!(
            cache.get("5551234"),
            ResolutionState::QueriedNoMatch
        ));
    }

    #[test]
    fn test_clear_empties_cache() {
        let cache = IdentityCache::new();
        cache.put("5551234", ResolutionState::QueriedNoMatch);
        cache.put("5559999", ResolutionState::QueriedNoMatch);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
        assert!(matches!(cache.get("5551234"), ResolutionState::NotQueried));
    }
}
