//! Classification error types.
//!
//! Only validation failures cross the orchestrator boundary. Everything
//! else — transport failures, malformed replies, exhausted providers —
//! is absorbed inside the orchestrator and converted into a best-effort
//! command via the heuristic fallback.

use thiserror::Error;

/// Errors surfaced by the classification orchestrator.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Empty or whitespace-only input. Rejected before any oracle call.
    #[error("empty input: classification requires non-empty text")]
    EmptyInput,
}
