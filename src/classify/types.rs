//! The structured command data model.
//!
//! `EditCommand` is the single output shape of every classification path —
//! remote oracles and the local heuristic alike. Wire names are camelCase
//! because that is what the oracles are prompted to emit and what the
//! browser client consumes.

use serde::{Deserialize, Deserializer, Serialize};

// ─── Sentinel Targets ────────────────────────────────────────────────────────

/// Reserved `target` values with special handling (no literal-text search).
pub const TARGET_START: &str = "start";
pub const TARGET_END: &str = "end";
pub const TARGET_ALL: &str = "all";
pub const TARGET_LAST: &str = "last";
pub const TARGET_SELECTION: &str = "selection";

/// Whether a target string is one of the reserved sentinels.
pub fn is_sentinel_target(target: &str) -> bool {
    matches!(
        target,
        TARGET_START | TARGET_END | TARGET_ALL | TARGET_LAST | TARGET_SELECTION
    )
}

// ─── Enums ───────────────────────────────────────────────────────────────────

/// The kind of edit a command performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    Insert,
    Delete,
    Replace,
    Format,
    Control,
    /// Not a command — plain content, or an unrecognized type from an oracle.
    #[default]
    #[serde(other)]
    None,
}

/// Where an insert lands relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertPosition {
    Before,
    After,
    Start,
    End,
    Replace,
}

impl InsertPosition {
    /// Parse a wire string. Unknown values return `None` — the editor
    /// degrades unrecognized positions to an end-insert.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "before" => Some(InsertPosition::Before),
            "after" => Some(InsertPosition::After),
            "start" => Some(InsertPosition::Start),
            "end" => Some(InsertPosition::End),
            "replace" => Some(InsertPosition::Replace),
            _ => None,
        }
    }
}

// ─── EditCommand ─────────────────────────────────────────────────────────────

/// Structured output of classification.
///
/// Invariant (enforced by [`EditCommand::normalize`]): `command_type` is
/// non-`None` exactly when `is_command` is true, and `confidence` is in
/// `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct EditCommand {
    /// Whether the input is an edit instruction vs. literal content.
    pub is_command: bool,
    pub command_type: CommandType,
    /// Human-readable description. Diagnostic only — never drives control flow.
    pub action: String,
    /// Anchor text to locate, or a sentinel (`start`/`end`/`all`/`last`/`selection`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Text to insert or use as plain content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Replacement text for replace commands (takes precedence over `content`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "de_position")]
    pub position: Option<InsertPosition>,
    /// Classification confidence in `[0, 1]`. Out-of-range values are clamped.
    pub confidence: f32,
    /// Oracle-supplied explanation of the classification, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Diagnostic label of the oracle (or `"heuristic"`) that produced this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Tolerant position field: unknown strings become `None` instead of
/// failing the whole command parse.
fn de_position<'de, D>(deserializer: D) -> Result<Option<InsertPosition>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(InsertPosition::parse))
}

impl EditCommand {
    /// Build a plain-content (non-command) result carrying the raw text.
    pub fn plain_content(text: &str, confidence: f32, provider: &str) -> Self {
        EditCommand {
            is_command: false,
            command_type: CommandType::None,
            action: "إضافة نص".to_string(),
            content: Some(text.to_string()),
            confidence,
            provider: Some(provider.to_string()),
            ..Default::default()
        }
        .normalize()
    }

    /// Enforce the model invariants.
    ///
    /// - `confidence` clamped to `[0, 1]` (NaN collapses to 0).
    /// - `is_command == false` forces `command_type = None`.
    /// - `command_type == None` forces `is_command = false`.
    pub fn normalize(mut self) -> Self {
        self.confidence = if self.confidence.is_nan() {
            0.0
        } else {
            self.confidence.clamp(0.0, 1.0)
        };
        if !self.is_command {
            self.command_type = CommandType::None;
        } else if self.command_type == CommandType::None {
            self.is_command = false;
        }
        self
    }

    /// Whether `target` is set to a non-sentinel literal string.
    pub fn has_literal_target(&self) -> bool {
        self.target
            .as_deref()
            .map(|t| !t.is_empty() && !is_sentinel_target(t))
            .unwrap_or(false)
    }
}

// ─── ProcessingContext ───────────────────────────────────────────────────────

/// Return the last `max_chars` characters of a document, for use as
/// disambiguation context in classification calls.
///
/// Char-based, never splits a UTF-8 sequence — Arabic text is multi-byte
/// throughout.
pub fn context_tail(document: &str, max_chars: usize) -> &str {
    let total = document.chars().count();
    if total <= max_chars {
        return document;
    }
    let skip = total - max_chars;
    match document.char_indices().nth(skip) {
        Some((byte_idx, _)) => &document[byte_idx..],
        None => document,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
