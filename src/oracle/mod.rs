//! Oracle layer — external LLM providers used for classification.
//!
//! Every supported provider speaks the OpenAI-compatible chat-completions
//! format, so one adapter covers them all; which providers exist, in what
//! order, and with which credentials is data, not code:
//! - `providers.yaml` loading with env-var interpolation
//! - Thread-safe registry of descriptors and two credential layers
//! - A single HTTP adapter behind the `ClassificationOracle` trait
//! - The shared classification prompt

pub mod adapter;
pub mod config;
pub mod errors;
pub mod prompt;
pub mod registry;

// Re-exports for convenience
pub use adapter::{ChatOracle, ClassificationOracle};
pub use config::{load_or_default, ProviderConfig, ProvidersConfig};
pub use errors::OracleFailure;
pub use registry::{AvailableOracle, OracleDescriptor, ProviderRegistry};
