//! Live rating configuration.
//!
//! ConfigStore holds the credential/model/criteria snapshot the scheduler
//! reads at the start of every batch. Updates replace all three fields at
//! once and never affect a batch that is already in flight.

use std::sync::{Arc, PoisonError, RwLock};

use crate::rating::RatingConfig;

/// Shared, atomically replaceable rating configuration
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    current: Arc<RwLock<RatingConfig>>,
}

impl ConfigStore {
    pub fn new(config: RatingConfig) -> Self {
        Self {
            current: Arc::new(RwLock::new(config)),
        }
    }

    /// Copy of the current configuration
    pub fn snapshot(&self) -> RatingConfig {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace the whole configuration
    pub fn replace(&self, config: RatingConfig) {
        tracing::info!(model = %config.model, credential_set = config.has_credential(), "Rating configuration updated");
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    pub fn has_credential(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .has_credential()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CriteriaSet, Criterion};

    #[test]
    fn test_default_has_no_credential() {
        let store = ConfigStore::default();
        assert!(!store.has_credential());
        assert_eq!(store.snapshot(), RatingConfig::default());
    }

    #[test]
    fn test_replace_swaps_all_fields() {
        let store = ConfigStore::new(RatingConfig::new("old", "gemini-1.5-flash-latest", CriteriaSet::default()));
        let snapshot = store.snapshot();

        let criteria = CriteriaSet::new(vec![Criterion::new("nuance", 3)]);
        store.replace(RatingConfig::new("new", "claude-3-5-haiku-latest", criteria.clone()));

        let current = store.snapshot();
        assert_eq!(current.credential, "new");
        assert_eq!(current.model, "claude-3-5-haiku-latest");
        assert_eq!(current.criteria, criteria);

        // Earlier snapshots are unaffected
        assert_eq!(snapshot.credential, "old");
    }

    #[test]
    fn test_clones_share_state() {
        let store = ConfigStore::default();
        let other = store.clone();
        other.replace(RatingConfig::new("k", "m", CriteriaSet::default()));
        assert!(store.has_credential());
    }
}
