//! Classification orchestration — fallback across oracles, then heuristic.
//!
//! Oracles are attempted sequentially in registry priority order. The first
//! result at or above the confidence threshold short-circuits the chain;
//! transport failures and low-confidence results fall through to the next
//! oracle, and when every oracle is exhausted (or none is available) the
//! local heuristic answers. Classification therefore always produces a
//! command; the only error this layer surfaces is empty input.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use super::errors::ClassifyError;
use super::heuristic;
use super::types::EditCommand;
use crate::oracle::adapter::{ChatOracle, ClassificationOracle};
use crate::oracle::config::ProvidersConfig;
use crate::oracle::errors::OracleFailure;
use crate::oracle::registry::ProviderRegistry;

// ─── Orchestrator ────────────────────────────────────────────────────────────

/// Runs the oracle fallback chain for one utterance at a time.
///
/// Holds no per-call state; safe to share behind an `Arc`.
pub struct ClassificationOrchestrator {
    registry: Arc<ProviderRegistry>,
    oracles: HashMap<String, Box<dyn ClassificationOracle>>,
    /// Minimum confidence accepted without falling through.
    threshold: f32,
}

impl ClassificationOrchestrator {
    pub fn new(registry: Arc<ProviderRegistry>, threshold: f32) -> Self {
        Self {
            registry,
            oracles: HashMap::new(),
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    /// Build the orchestrator from a providers config: registers every
    /// configured provider, seeds environment credentials, and constructs
    /// one `ChatOracle` per provider.
    pub fn from_config(registry: Arc<ProviderRegistry>, config: &ProvidersConfig) -> Self {
        let mut orchestrator = Self::new(registry, config.confidence_threshold);

        for (name, provider) in &config.providers {
            orchestrator
                .registry
                .register(name, &provider.display_name, provider.priority);

            if let Ok(secret) = std::env::var(&provider.api_key_env) {
                if !secret.is_empty() {
                    orchestrator.registry.seed_env_credential(name, &secret);
                }
            }

            match ChatOracle::from_provider_config(name, provider) {
                Ok(oracle) => {
                    orchestrator.register_oracle(Box::new(oracle));
                }
                Err(e) => {
                    tracing::warn!(provider = %name, error = %e, "skipping provider");
                }
            }
        }

        orchestrator
    }

    /// Register (or replace) the oracle implementation for a provider key.
    pub fn register_oracle(&mut self, oracle: Box<dyn ClassificationOracle>) {
        self.oracles.insert(oracle.name().to_string(), oracle);
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Probe one provider's endpoint with its effective credential.
    ///
    /// Unknown providers and providers without a credential report
    /// unreachable.
    pub async fn health_check(&self, provider: &str) -> bool {
        match (self.oracles.get(provider), self.registry.credential(provider)) {
            (Some(oracle), Some(credential)) => oracle.health_check(&credential).await,
            _ => false,
        }
    }

    /// Classify one utterance.
    ///
    /// The available-oracle list is snapshotted once at entry, so credential
    /// changes mid-call do not produce a partial view. With no available
    /// oracle (or all failing), the heuristic answers — this method only
    /// errors on empty input.
    pub async fn classify(
        &self,
        text: &str,
        context: &str,
    ) -> Result<EditCommand, ClassifyError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ClassifyError::EmptyInput);
        }

        let request_id = Uuid::new_v4();
        let available = self.registry.list_available();
        tracing::info!(
            %request_id,
            candidates = available.len(),
            text_chars = trimmed.chars().count(),
            "classification started"
        );

        for entry in &available {
            let name = &entry.descriptor.name;
            let Some(oracle) = self.oracles.get(name) else {
                tracing::warn!(%request_id, provider = %name, "no oracle implementation registered");
                continue;
            };

            match oracle.classify(trimmed, context, &entry.credential).await {
                Ok(command) if command.confidence >= self.threshold => {
                    tracing::info!(
                        %request_id,
                        provider = %name,
                        confidence = command.confidence,
                        "oracle result accepted"
                    );
                    return Ok(command);
                }
                Ok(command) => {
                    tracing::info!(
                        %request_id,
                        provider = %name,
                        confidence = command.confidence,
                        threshold = self.threshold,
                        "oracle result below threshold, trying next"
                    );
                }
                Err(e) => {
                    tracing::warn!(%request_id, provider = %name, error = %e, "oracle failed, trying next");
                }
            }
        }

        tracing::info!(%request_id, "falling back to heuristic classification");
        Ok(heuristic::classify_heuristic(trimmed))
    }

    /// Classify against one named provider only, skipping the chain.
    ///
    /// Any failure (unknown provider, missing credential, transport error)
    /// degrades straight to the heuristic.
    pub async fn classify_pinned(
        &self,
        provider: &str,
        text: &str,
        context: &str,
    ) -> Result<EditCommand, ClassifyError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ClassifyError::EmptyInput);
        }

        let outcome = match (self.oracles.get(provider), self.registry.credential(provider)) {
            (Some(oracle), Some(credential)) => {
                oracle.classify(trimmed, context, &credential).await
            }
            (None, _) => {
                tracing::warn!(provider, "pinned provider has no oracle registered");
                return Ok(heuristic::classify_heuristic(trimmed));
            }
            (_, None) => {
                let err = OracleFailure::MissingCredential {
                    provider: provider.to_string(),
                };
                tracing::warn!(provider, error = %err, "pinned provider unavailable");
                return Ok(heuristic::classify_heuristic(trimmed));
            }
        };

        match outcome {
            Ok(command) => Ok(command),
            Err(e) => {
                tracing::warn!(provider, error = %e, "pinned oracle failed, using heuristic");
                Ok(heuristic::classify_heuristic(trimmed))
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::types::CommandType;
    use crate::oracle::errors::OracleFailure;
    use futures::future::{BoxFuture, FutureExt};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted oracle: counts invocations and replays a fixed outcome.
    struct StubOracle {
        name: String,
        calls: Arc<AtomicUsize>,
        outcome: StubOutcome,
    }

    #[derive(Clone)]
    enum StubOutcome {
        Command { confidence: f32 },
        Failure,
    }

    impl StubOracle {
        fn boxed(name: &str, calls: Arc<AtomicUsize>, outcome: StubOutcome) -> Box<Self> {
            Box::new(Self {
                name: name.to_string(),
                calls,
                outcome,
            })
        }
    }

    impl ClassificationOracle for StubOracle {
        fn name(&self) -> &str {
            &self.name
        }

        fn display_name(&self) -> &str {
            &self.name
        }

        fn classify<'a>(
            &'a self,
            _text: &'a str,
            _context: &'a str,
            _credential: &'a str,
        ) -> BoxFuture<'a, Result<EditCommand, OracleFailure>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let outcome = self.outcome.clone();
            let provider = self.name.clone();
            async move {
                match outcome {
                    StubOutcome::Command { confidence } => Ok(EditCommand {
                        is_command: true,
                        command_type: CommandType::Delete,
                        target: Some("خطأ".into()),
                        confidence,
                        provider: Some(provider),
                        ..Default::default()
                    }
                    .normalize()),
                    StubOutcome::Failure => Err(OracleFailure::ConnectionFailed {
                        endpoint: "stub".into(),
                        reason: "scripted failure".into(),
                    }),
                }
            }
            .boxed()
        }
    }

    fn orchestrator_with(
        entries: Vec<(&str, u32, StubOutcome)>,
    ) -> (ClassificationOrchestrator, Vec<Arc<AtomicUsize>>) {
        let registry = Arc::new(ProviderRegistry::new());
        let mut orchestrator = ClassificationOrchestrator::new(registry.clone(), 0.7);
        let mut counters = Vec::new();
        for (name, priority, outcome) in entries {
            registry.register(name, name, priority);
            registry.set_credential(name, "key");
            let calls = Arc::new(AtomicUsize::new(0));
            counters.push(calls.clone());
            orchestrator.register_oracle(StubOracle::boxed(name, calls, outcome));
        }
        (orchestrator, counters)
    }

    #[tokio::test]
    async fn test_empty_input_rejected_before_any_oracle_call() {
        let (orchestrator, counters) =
            orchestrator_with(vec![("ready", 1, StubOutcome::Command { confidence: 0.9 })]);
        let err = orchestrator.classify("   ", "").await.unwrap_err();
        assert!(matches!(err, ClassifyError::EmptyInput));
        assert_eq!(counters[0].load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_registry_uses_heuristic_without_network() {
        let (orchestrator, _) = orchestrator_with(vec![]);
        let cmd = orchestrator.classify("احذف كلمة خطأ", "").await.unwrap();
        assert_eq!(cmd.provider.as_deref(), Some(heuristic::HEURISTIC_PROVIDER));
        assert_eq!(cmd.command_type, CommandType::Delete);
    }

    #[tokio::test]
    async fn test_first_confident_oracle_short_circuits() {
        let (orchestrator, counters) = orchestrator_with(vec![
            ("first", 1, StubOutcome::Command { confidence: 0.9 }),
            ("second", 2, StubOutcome::Command { confidence: 0.9 }),
        ]);
        let cmd = orchestrator.classify("احذف كلمة خطأ", "").await.unwrap();
        assert_eq!(cmd.provider.as_deref(), Some("first"));
        assert_eq!(counters[0].load(Ordering::SeqCst), 1);
        assert_eq!(counters[1].load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_low_confidence_falls_through() {
        let (orchestrator, counters) = orchestrator_with(vec![
            ("weak", 1, StubOutcome::Command { confidence: 0.3 }),
            ("strong", 2, StubOutcome::Command { confidence: 0.95 }),
        ]);
        let cmd = orchestrator.classify("احذف كلمة خطأ", "").await.unwrap();
        assert_eq!(cmd.provider.as_deref(), Some("strong"));
        assert_eq!(counters[0].load(Ordering::SeqCst), 1);
        assert_eq!(counters[1].load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_failures_reach_heuristic() {
        let (orchestrator, counters) = orchestrator_with(vec![
            ("down_a", 1, StubOutcome::Failure),
            ("down_b", 2, StubOutcome::Failure),
        ]);
        let cmd = orchestrator.classify("احذف كلمة خطأ", "").await.unwrap();
        assert_eq!(cmd.provider.as_deref(), Some(heuristic::HEURISTIC_PROVIDER));
        assert_eq!(counters[0].load(Ordering::SeqCst), 1);
        assert_eq!(counters[1].load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_priority_drives_attempt_order() {
        // Registered out of order; priority decides.
        let (orchestrator, counters) = orchestrator_with(vec![
            ("later", 5, StubOutcome::Command { confidence: 0.9 }),
            ("sooner", 1, StubOutcome::Command { confidence: 0.9 }),
        ]);
        let cmd = orchestrator.classify("احذف كلمة خطأ", "").await.unwrap();
        assert_eq!(cmd.provider.as_deref(), Some("sooner"));
        assert_eq!(counters[0].load(Ordering::SeqCst), 0);
        assert_eq!(counters[1].load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_pinned_success() {
        let (orchestrator, _) = orchestrator_with(vec![
            ("target", 1, StubOutcome::Command { confidence: 0.2 }),
        ]);
        // Pinned mode returns the oracle result even below the threshold.
        let cmd = orchestrator
            .classify_pinned("target", "احذف كلمة خطأ", "")
            .await
            .unwrap();
        assert_eq!(cmd.provider.as_deref(), Some("target"));
    }

    #[tokio::test]
    async fn test_pinned_failure_degrades_to_heuristic() {
        let (orchestrator, _) =
            orchestrator_with(vec![("broken", 1, StubOutcome::Failure)]);
        let cmd = orchestrator
            .classify_pinned("broken", "احذف كلمة خطأ", "")
            .await
            .unwrap();
        assert_eq!(cmd.provider.as_deref(), Some(heuristic::HEURISTIC_PROVIDER));
    }

    #[tokio::test]
    async fn test_pinned_unknown_provider_degrades_to_heuristic() {
        let (orchestrator, _) = orchestrator_with(vec![]);
        let cmd = orchestrator
            .classify_pinned("ghost", "احذف كلمة خطأ", "")
            .await
            .unwrap();
        assert_eq!(cmd.provider.as_deref(), Some(heuristic::HEURISTIC_PROVIDER));
    }

    #[tokio::test]
    async fn test_health_check_unknown_or_credential_less_provider() {
        let (orchestrator, _) = orchestrator_with(vec![]);
        assert!(!orchestrator.health_check("ghost").await);

        let registry = Arc::new(ProviderRegistry::new());
        let mut orchestrator = ClassificationOrchestrator::new(registry.clone(), 0.7);
        registry.register("keyless", "Keyless", 1);
        orchestrator.register_oracle(StubOracle::boxed(
            "keyless",
            Arc::new(AtomicUsize::new(0)),
            StubOutcome::Command { confidence: 0.9 },
        ));
        assert!(!orchestrator.health_check("keyless").await);
    }

    #[tokio::test]
    async fn test_from_config_registers_providers() {
        let registry = Arc::new(ProviderRegistry::new());
        let config = ProvidersConfig::default();
        let orchestrator = ClassificationOrchestrator::from_config(registry.clone(), &config);
        assert_eq!(registry.list_all().len(), 3);
        assert_eq!(orchestrator.oracles.len(), 3);
    }
}
