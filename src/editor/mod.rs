//! Editor — applying structured commands to document text.
//!
//! - Anchor resolution (exact, paired "between A and B", partial word)
//! - Pure splice/delete/replace/format operations with whitespace
//!   normalization
//! - The session object serializing classify-then-apply per utterance

pub mod engine;
pub mod resolver;
pub mod session;

// Re-exports for convenience
pub use engine::{ControlEvent, EditOutcome, TextEditor};
pub use resolver::{AnchorResolver, AnchorSide};
pub use session::{DocumentSession, EditRecord, ProcessedUtterance};
