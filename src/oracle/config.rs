//! Provider configuration loading and validation.
//!
//! Reads `providers.yaml` and resolves environment variables. Config is the
//! single source of truth for oracle endpoints, priorities, and the
//! orchestrator's acceptance threshold. A built-in default set keeps the
//! crate runnable with no file present.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

// ─── Public Types ────────────────────────────────────────────────────────────

/// Configuration loading or validation error.
#[derive(Debug, Error)]
#[error("config error: {reason}")]
pub struct ConfigError {
    pub reason: String,
}

/// A single oracle provider's wire configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub display_name: String,
    /// OpenAI-compatible chat-completions base URL (no trailing slash).
    pub base_url: String,
    pub model: String,
    /// Lower is tried first.
    pub priority: u32,
    /// Environment variable holding the provider's API key.
    pub api_key_env: String,
}

/// Top-level provider registry config (mirrors `providers.yaml`).
#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    /// Minimum oracle confidence accepted without falling through.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    /// Document-tail length (chars) passed as classification context.
    #[serde(default = "default_context_chars")]
    pub context_chars: usize,
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_confidence_threshold() -> f32 {
    0.7
}
fn default_context_chars() -> usize {
    500
}

impl Default for ProvidersConfig {
    /// The built-in provider set: free/fast tiers first.
    fn default() -> Self {
        let mut providers = HashMap::new();
        providers.insert(
            "gemini".to_string(),
            ProviderConfig {
                display_name: "Gemini".to_string(),
                base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
                model: "gemini-2.0-flash".to_string(),
                priority: 1,
                api_key_env: "GEMINI_API_KEY".to_string(),
            },
        );
        providers.insert(
            "groq".to_string(),
            ProviderConfig {
                display_name: "Groq".to_string(),
                base_url: "https://api.groq.com/openai/v1".to_string(),
                model: "llama-3.3-70b-versatile".to_string(),
                priority: 2,
                api_key_env: "GROQ_API_KEY".to_string(),
            },
        );
        providers.insert(
            "openrouter".to_string(),
            ProviderConfig {
                display_name: "OpenRouter".to_string(),
                base_url: "https://openrouter.ai/api/v1".to_string(),
                model: "meta-llama/llama-3.3-70b-instruct:free".to_string(),
                priority: 3,
                api_key_env: "OPENROUTER_API_KEY".to_string(),
            },
        );
        ProvidersConfig {
            confidence_threshold: default_confidence_threshold(),
            context_chars: default_context_chars(),
            providers,
        }
    }
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Resolve the config path.
///
/// 1. `TAHRIR_PROVIDERS_CONFIG` env var, if it points at an existing file.
/// 2. Walk upward from `start` looking for `providers.yaml`.
pub fn find_config_path(start: &Path) -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var("TAHRIR_PROVIDERS_CONFIG") {
        let candidate = PathBuf::from(&explicit);
        if candidate.exists() {
            return Some(candidate);
        }
    }

    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join("providers.yaml");
        if candidate.exists() {
            return Some(candidate);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Load and parse the providers configuration file.
///
/// Performs environment-variable interpolation on string values matching
/// `${VAR_NAME}` or `${VAR_NAME:-default}`.
pub fn load_providers_config(path: &Path) -> Result<ProvidersConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError {
        reason: format!("failed to read {}: {e}", path.display()),
    })?;

    let interpolated = interpolate_env_vars(&raw);

    let config: ProvidersConfig = serde_yaml::from_str(&interpolated).map_err(|e| ConfigError {
        reason: format!("failed to parse config: {e}"),
    })?;

    if config.providers.is_empty() {
        return Err(ConfigError {
            reason: "providers section is empty".into(),
        });
    }

    Ok(config)
}

/// Load the config from the conventional locations, falling back to the
/// built-in default set when no file is found.
pub fn load_or_default(start: &Path) -> ProvidersConfig {
    match find_config_path(start) {
        Some(path) => match load_providers_config(&path) {
            Ok(cfg) => {
                tracing::info!(path = %path.display(), providers = cfg.providers.len(), "loaded providers config");
                cfg
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "invalid providers config, using defaults");
                ProvidersConfig::default()
            }
        },
        None => {
            tracing::info!("no providers.yaml found, using built-in provider set");
            ProvidersConfig::default()
        }
    }
}

// ─── Env-var interpolation ───────────────────────────────────────────────────

/// Replace `${VAR}` and `${VAR:-default}` in a string.
fn interpolate_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            let mut var_expr = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_expr.push(c);
            }
            result.push_str(&resolve_var_expr(&var_expr));
        } else {
            result.push(ch);
        }
    }

    result
}

/// Resolve a variable expression like `VAR` or `VAR:-default`.
fn resolve_var_expr(expr: &str) -> String {
    if let Some(idx) = expr.find(":-") {
        let var_name = &expr[..idx];
        let default = &expr[idx + 2..];
        std::env::var(var_name).unwrap_or_else(|_| default.to_string())
    } else {
        std::env::var(expr).unwrap_or_default()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let cfg = ProvidersConfig::default();
        assert_eq!(cfg.confidence_threshold, 0.7);
        assert_eq!(cfg.context_chars, 500);
        assert_eq!(cfg.providers.len(), 3);
        assert_eq!(cfg.providers["gemini"].priority, 1);
        assert_eq!(cfg.providers["openrouter"].priority, 3);
    }

    #[test]
    fn test_parse_yaml_with_defaults() {
        let yaml = r#"
            providers:
              local:
                display_name: "Local Llama"
                base_url: "http://localhost:11434/v1"
                model: "llama3"
                priority: 1
                api_key_env: LOCAL_API_KEY
        "#;
        let cfg: ProvidersConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.confidence_threshold, 0.7);
        assert_eq!(cfg.providers["local"].model, "llama3");
    }

    #[test]
    fn test_load_rejects_empty_providers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "confidence_threshold: 0.8\nproviders: {{}}").unwrap();
        let result = load_providers_config(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_with_interpolation() {
        std::env::set_var("__TAHRIR_TEST_BASE__", "http://localhost:9999/v1");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
providers:
  local:
    display_name: "Local"
    base_url: "${{__TAHRIR_TEST_BASE__:-http://fallback/v1}}"
    model: "m"
    priority: 1
    api_key_env: K
"#
        )
        .unwrap();
        let cfg = load_providers_config(file.path()).unwrap();
        assert_eq!(cfg.providers["local"].base_url, "http://localhost:9999/v1");
        std::env::remove_var("__TAHRIR_TEST_BASE__");
    }

    #[test]
    fn test_interpolate_with_default() {
        std::env::remove_var("__TAHRIR_NONEXISTENT__");
        let result = interpolate_env_vars("${__TAHRIR_NONEXISTENT__:-fallback}");
        assert_eq!(result, "fallback");
    }

    #[test]
    fn test_interpolate_no_vars() {
        let input = "plain text with no variables";
        assert_eq!(interpolate_env_vars(input), input);
    }
}
