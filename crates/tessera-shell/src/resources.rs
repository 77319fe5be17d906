//! Per-instance resource namespaces.
//!
//! Resources register on the renderer as `scope:name`. Lookups of a scoped
//! name fall back to the bare name on the renderer side, so an instance only
//! registers what it overrides. The current scope is ambient state swapped
//! in with [`ResourceScopes::enter`]; the returned guard puts the previous
//! state back when it drops, whichever way the caller leaves.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tessera_client::{BridgeClient, ClientError};
use tracing::debug;

/// Ambient state applied while a builder runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeState {
    pub scope: Option<String>,
    pub scale: f32,
}

impl Default for ScopeState {
    fn default() -> Self {
        Self {
            scope: None,
            scale: 1.0,
        }
    }
}

/// `scope:name`, or `name` when unscoped.
pub fn qualify(scope: Option<&str>, name: &str) -> String {
    match scope {
        Some(scope) => format!("{scope}:{name}"),
        None => name.to_string(),
    }
}

#[derive(Debug, Default)]
pub struct ResourceScopes {
    current: Mutex<ScopeState>,
    owned: Mutex<HashMap<String, BTreeSet<String>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ResourceScopes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> ScopeState {
        lock(&self.current).clone()
    }

    pub fn scope(&self) -> Option<String> {
        lock(&self.current).scope.clone()
    }

    pub fn scale(&self) -> f32 {
        lock(&self.current).scale
    }

    /// Switch to `scope` until the guard drops.
    pub fn enter(&self, scope: impl Into<String>, scale: f32) -> ScopeGuard<'_> {
        let next = ScopeState {
            scope: Some(scope.into()),
            scale,
        };
        let previous = std::mem::replace(&mut *lock(&self.current), next);
        ScopeGuard {
            scopes: self,
            previous: Some(previous),
        }
    }

    /// Name as seen from the current scope.
    pub fn qualified(&self, name: &str) -> String {
        qualify(self.scope().as_deref(), name)
    }

    /// Register `data` under the current scope. Returns the full name.
    pub async fn register(
        &self,
        client: &BridgeClient,
        name: &str,
        data: Vec<u8>,
    ) -> Result<String, ClientError> {
        let scope = self.scope();
        let full = qualify(scope.as_deref(), name);
        client.register_resource(&full, data).await?;
        if let Some(scope) = scope {
            lock(&self.owned).entry(scope).or_default().insert(full.clone());
        }
        debug!(resource = %full, "resource registered");
        Ok(full)
    }

    pub fn owned(&self, scope: &str) -> Vec<String> {
        lock(&self.owned)
            .get(scope)
            .map(|names| names.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Unregister everything `scope` registered. Returns how many names
    /// were dropped.
    pub async fn release(&self, client: &BridgeClient, scope: &str) -> Result<usize, ClientError> {
        let names = lock(&self.owned).remove(scope).unwrap_or_default();
        for name in &names {
            client.unregister_resource(name).await?;
        }
        debug!(scope, count = names.len(), "scope released");
        Ok(names.len())
    }
}

/// Restores the previous [`ScopeState`] on drop.
#[must_use = "dropping the guard immediately restores the previous scope"]
pub struct ScopeGuard<'a> {
    scopes: &'a ResourceScopes,
    previous: Option<ScopeState>,
}

impl ScopeGuard<'_> {
    pub fn scope(&self) -> Option<String> {
        self.scopes.scope()
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            *lock(&self.scopes.current) = previous;
        }
    }
}
