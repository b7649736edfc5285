//! Classification — turning one spoken utterance into a structured command.
//!
//! This module owns the command data model, the oracle-reply parser, the
//! fallback orchestrator, and the local heuristic classifier:
//! - Layered JSON extraction from free-form oracle replies
//! - Sequential oracle fallback with a confidence threshold
//! - Keyword-based heuristic as the network-free bottom of the chain
//!
//! Classification always yields an `EditCommand`; the only surfaced error
//! is empty input.

pub mod errors;
pub mod heuristic;
pub mod orchestrator;
pub mod response_parser;
pub mod types;

// Re-exports for convenience
pub use errors::ClassifyError;
pub use heuristic::{classify_heuristic, HEURISTIC_PROVIDER};
pub use orchestrator::ClassificationOrchestrator;
pub use response_parser::parse_command_reply;
pub use types::{context_tail, CommandType, EditCommand, InsertPosition};
