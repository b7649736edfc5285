//! Provider registry — known classification oracles and their credentials.
//!
//! Credentials come from two layers: a persistent environment layer seeded
//! at startup, and a runtime layer settable while the app is running. The
//! runtime layer takes precedence when both hold a secret for the same
//! provider. Descriptors are never deleted, only toggled unavailable by
//! clearing their credentials.

use std::collections::HashMap;
use std::sync::RwLock;

// ─── Types ───────────────────────────────────────────────────────────────────

/// Identity and ordering of one classification oracle.
#[derive(Debug, Clone)]
pub struct OracleDescriptor {
    /// Stable key, e.g. `"gemini"`.
    pub name: String,
    /// Human-readable label attached to results for traceability.
    pub display_name: String,
    /// Lower is tried first.
    pub priority: u32,
}

/// A descriptor with a resolved credential — one entry of the snapshot
/// returned by [`ProviderRegistry::list_available`].
#[derive(Debug, Clone)]
pub struct AvailableOracle {
    pub descriptor: OracleDescriptor,
    pub credential: String,
}

#[derive(Debug, Default)]
struct RegistryInner {
    /// Registration order is preserved — it is the tie-break for equal
    /// priorities.
    descriptors: Vec<OracleDescriptor>,
    env_credentials: HashMap<String, String>,
    runtime_credentials: HashMap<String, String>,
}

/// Thread-safe set of oracle descriptors and their live credential state.
///
/// Every method takes the lock exactly once, so concurrent credential
/// updates are observed atomically per call — an in-flight classification
/// sees either the old or the new credential set, never a partial one.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    inner: RwLock<RegistryInner>,
}

// ─── Impl ────────────────────────────────────────────────────────────────────

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor. Initially unavailable (no credential in either layer).
    ///
    /// Re-registering an existing name updates its display name and priority
    /// in place without disturbing registration order.
    pub fn register(&self, name: &str, display_name: &str, priority: u32) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = inner.descriptors.iter_mut().find(|d| d.name == name) {
            existing.display_name = display_name.to_string();
            existing.priority = priority;
            return;
        }
        inner.descriptors.push(OracleDescriptor {
            name: name.to_string(),
            display_name: display_name.to_string(),
            priority,
        });
    }

    /// Set a runtime credential. Effective immediately for subsequent calls.
    pub fn set_credential(&self, name: &str, secret: &str) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner
            .runtime_credentials
            .insert(name.to_string(), secret.to_string());
        tracing::info!(provider = name, "runtime credential set");
    }

    /// Seed the persistent/environment credential layer.
    pub fn seed_env_credential(&self, name: &str, secret: &str) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner
            .env_credentials
            .insert(name.to_string(), secret.to_string());
    }

    /// Mark a provider unavailable by clearing both credential layers.
    pub fn clear_credential(&self, name: &str) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.runtime_credentials.remove(name);
        inner.env_credentials.remove(name);
        tracing::info!(provider = name, "credentials cleared");
    }

    /// Resolve the effective credential for one provider (runtime layer wins).
    pub fn credential(&self, name: &str) -> Option<String> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner
            .runtime_credentials
            .get(name)
            .or_else(|| inner.env_credentials.get(name))
            .cloned()
    }

    /// Descriptors with a credential set, ascending by priority.
    ///
    /// Equal priorities keep registration order (stable sort over an
    /// insertion-ordered list).
    pub fn list_available(&self) -> Vec<AvailableOracle> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let mut available: Vec<AvailableOracle> = inner
            .descriptors
            .iter()
            .filter_map(|d| {
                let credential = inner
                    .runtime_credentials
                    .get(&d.name)
                    .or_else(|| inner.env_credentials.get(&d.name))?
                    .clone();
                Some(AvailableOracle {
                    descriptor: d.clone(),
                    credential,
                })
            })
            .collect();
        available.sort_by_key(|a| a.descriptor.priority);
        available
    }

    /// All registered descriptors in registration order, regardless of
    /// credential state. Used for status displays.
    pub fn list_all(&self) -> Vec<OracleDescriptor> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.descriptors.clone()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ProviderRegistry {
        let r = ProviderRegistry::new();
        r.register("gemini", "Gemini", 1);
        r.register("groq", "Groq", 2);
        r.register("openrouter", "OpenRouter", 3);
        r
    }

    #[test]
    fn test_unavailable_without_credential() {
        let r = registry();
        assert!(r.list_available().is_empty());
    }

    #[test]
    fn test_priority_order() {
        let r = registry();
        r.set_credential("openrouter", "k3");
        r.set_credential("gemini", "k1");
        r.set_credential("groq", "k2");

        let names: Vec<String> = r
            .list_available()
            .into_iter()
            .map(|a| a.descriptor.name)
            .collect();
        assert_eq!(names, vec!["gemini", "groq", "openrouter"]);
    }

    #[test]
    fn test_equal_priority_keeps_registration_order() {
        let r = ProviderRegistry::new();
        r.register("b_first", "B", 5);
        r.register("a_second", "A", 5);
        r.set_credential("a_second", "k");
        r.set_credential("b_first", "k");

        let names: Vec<String> = r
            .list_available()
            .into_iter()
            .map(|a| a.descriptor.name)
            .collect();
        assert_eq!(names, vec!["b_first", "a_second"]);
    }

    #[test]
    fn test_runtime_layer_precedence() {
        let r = registry();
        r.seed_env_credential("gemini", "env-key");
        assert_eq!(r.credential("gemini").as_deref(), Some("env-key"));

        r.set_credential("gemini", "runtime-key");
        assert_eq!(r.credential("gemini").as_deref(), Some("runtime-key"));

        let avail = r.list_available();
        assert_eq!(avail[0].credential, "runtime-key");
    }

    #[test]
    fn test_clear_marks_unavailable() {
        let r = registry();
        r.seed_env_credential("groq", "env-key");
        r.set_credential("groq", "runtime-key");
        r.clear_credential("groq");
        assert!(r.credential("groq").is_none());
        assert!(r.list_available().is_empty());
    }

    #[test]
    fn test_reregister_updates_in_place() {
        let r = registry();
        r.register("gemini", "Gemini Flash", 9);
        let all = r.list_all();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].name, "gemini");
        assert_eq!(all[0].display_name, "Gemini Flash");
        assert_eq!(all[0].priority, 9);
    }
}
