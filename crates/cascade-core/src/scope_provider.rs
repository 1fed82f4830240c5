//! Pluggable source of organizational scope data. Production deployments feed
//! snapshots exported from the org graph; everything else gets the seeded demo.

use std::collections::BTreeMap;

use contracts::{ConfigError, ScopeSnapshot};

pub trait ScopeProvider: Send + Sync {
    fn get_scope(&self, scope_type: &str, scope_name: &str) -> Result<ScopeSnapshot, ConfigError>;

    /// Known `(scope_type, scope_name)` pairs, for discovery endpoints.
    fn available_scopes(&self) -> Vec<(String, String)>;
}

pub struct InMemoryScopeProvider {
    snapshots: BTreeMap<(String, String), ScopeSnapshot>,
    demo_seed: Option<u64>,
}

impl InMemoryScopeProvider {
    pub fn new() -> Self {
        Self {
            snapshots: BTreeMap::new(),
            demo_seed: None,
        }
    }

    /// Falls back to a deterministic generated scope when no registered
    /// snapshot matches the requested boundary.
    pub fn with_demo_fallback(seed: u64) -> Self {
        Self {
            snapshots: BTreeMap::new(),
            demo_seed: Some(seed),
        }
    }

    pub fn register(&mut self, snapshot: ScopeSnapshot) -> Result<(), ConfigError> {
        let violations = snapshot.validate();
        if !violations.is_empty() {
            return Err(ConfigError::InvalidScope(violations));
        }
        let key = (snapshot.scope_type.clone(), snapshot.scope_name.clone());
        self.snapshots.insert(key, snapshot);
        Ok(())
    }

    pub fn register_json(&mut self, json: &str) -> Result<(), ConfigError> {
        let snapshot: ScopeSnapshot =
            serde_json::from_str(json).map_err(|err| ConfigError::InvalidParameter {
                name: "scope_snapshot".to_string(),
                detail: err.to_string(),
            })?;
        self.register(snapshot)
    }
}

impl Default for InMemoryScopeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeProvider for InMemoryScopeProvider {
    fn get_scope(&self, scope_type: &str, scope_name: &str) -> Result<ScopeSnapshot, ConfigError> {
        let key = (scope_type.to_string(), scope_name.to_string());
        if let Some(snapshot) = self.snapshots.get(&key) {
            return Ok(snapshot.clone());
        }
        if let Some(seed) = self.demo_seed {
            return Ok(crate::demo::demo_scope(scope_type, scope_name, seed));
        }
        Err(ConfigError::UnknownScope {
            scope_type: scope_type.to_string(),
            scope_name: scope_name.to_string(),
        })
    }

    fn available_scopes(&self) -> Vec<(String, String)> {
        self.snapshots.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo::demo_scope;

    #[test]
    fn registered_snapshot_wins_over_demo_fallback() {
        let mut provider = InMemoryScopeProvider::with_demo_fallback(1);
        let mut scope = demo_scope("department", "claims", 99);
        scope.scope_name = "claims".to_string();
        provider.register(scope.clone()).unwrap();
        let fetched = provider.get_scope("department", "claims").unwrap();
        assert_eq!(fetched, scope);
    }

    #[test]
    fn unknown_scope_without_fallback_is_an_error() {
        let provider = InMemoryScopeProvider::new();
        let err = provider.get_scope("department", "nowhere").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownScope { .. }));
    }

    #[test]
    fn invalid_snapshot_is_rejected_at_registration() {
        let mut provider = InMemoryScopeProvider::new();
        let mut scope = demo_scope("department", "claims", 3);
        scope.workloads[0].effort_allocation_pct += 50.0;
        assert!(matches!(
            provider.register(scope),
            Err(ConfigError::InvalidScope(_))
        ));
    }

    #[test]
    fn register_json_round_trips() {
        let mut provider = InMemoryScopeProvider::new();
        let scope = demo_scope("team", "billing", 5);
        let json = serde_json::to_string(&scope).unwrap();
        provider.register_json(&json).unwrap();
        assert_eq!(provider.available_scopes().len(), 1);
    }
}
