//! Oracle transport failure types.
//!
//! All errors implement `std::error::Error` via `thiserror`. A failure from
//! one oracle is never fatal to the caller of the orchestrator — it means
//! "advance to the next oracle" and nothing more. Structured logging is the
//! caller's responsibility; these types carry the context needed for it.

use thiserror::Error;

/// A single oracle attempt that produced no usable command.
#[derive(Debug, Error)]
pub enum OracleFailure {
    /// The registry has no credential for this provider.
    #[error("no credential for provider '{provider}'")]
    MissingCredential { provider: String },

    /// TCP/HTTP connection to the oracle endpoint failed.
    #[error("connection failed to {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    /// The oracle did not respond within the configured timeout.
    #[error("oracle timeout after {duration_secs}s")]
    Timeout { duration_secs: u64 },

    /// Non-2xx HTTP response from the oracle endpoint.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// No command could be extracted from the oracle's reply, even after
    /// every layered parsing strategy was exhausted.
    #[error("malformed oracle reply: {reason}")]
    MalformedReply { raw_reply: String, reason: String },
}
