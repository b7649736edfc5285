//! Oracle reply parsing — extracts one `EditCommand` from free-form text.
//!
//! Oracles are prompted to answer with a bare JSON object, but in practice
//! replies arrive wrapped in prose, code fences, or concatenated with other
//! objects. Extraction is an ordered sequence of strategies, each returning
//! success or failure — no exceptions for expected parse misses:
//!
//! 1. Parse the whole reply as a JSON object.
//! 2. Extract content between code-fence markers and parse that.
//! 3. Parse the first complete brace-balanced object when several are
//!    concatenated.
//! 4. Scan for the first brace-balanced substring anywhere in the text
//!    that parses and carries at least one expected command field.
//! 5. Fail only after all strategies are exhausted.

use crate::classify::types::EditCommand;
use crate::oracle::errors::OracleFailure;

/// Wire fields that identify a candidate object as a command.
const COMMAND_FIELDS: &[&str] = &["isCommand", "commandType", "action"];

// ─── Entry Point ─────────────────────────────────────────────────────────────

/// Extract the first valid command object from a raw oracle reply.
pub fn parse_command_reply(raw: &str) -> Result<EditCommand, OracleFailure> {
    let trimmed = raw.trim();

    if let Some(cmd) = try_whole_reply(trimmed)
        .or_else(|| try_code_fence(trimmed))
        .or_else(|| try_first_balanced(trimmed))
        .or_else(|| try_embedded_scan(trimmed))
    {
        return Ok(cmd.normalize());
    }

    Err(OracleFailure::MalformedReply {
        raw_reply: raw.to_string(),
        reason: "no command object found after all extraction strategies".into(),
    })
}

// ─── Strategies ──────────────────────────────────────────────────────────────

/// Strategy 1: the reply is (only) the object.
fn try_whole_reply(text: &str) -> Option<EditCommand> {
    parse_candidate(text)
}

/// Strategy 2: the object is inside a ``` fence, optionally tagged `json`.
fn try_code_fence(text: &str) -> Option<EditCommand> {
    let mut search_from = 0;
    while let Some(open) = text[search_from..].find("```") {
        let body_start = search_from + open + 3;
        let close = text[body_start..].find("```")?;
        let mut block = text[body_start..body_start + close].trim();
        // Strip a leading language tag line ("json", "JSON", …)
        if let Some(first_newline) = block.find('\n') {
            let tag = block[..first_newline].trim();
            if !tag.is_empty() && !tag.starts_with('{') {
                block = block[first_newline + 1..].trim();
            }
        }
        if let Some(cmd) = parse_candidate(block) {
            return Some(cmd);
        }
        search_from = body_start + close + 3;
    }
    None
}

/// Strategy 3: several brace-balanced objects concatenated — take the first
/// complete one.
fn try_first_balanced(text: &str) -> Option<EditCommand> {
    let start = text.find('{')?;
    let end = find_matching_brace(text, start)?;
    parse_candidate(&text[start..=end])
}

/// Strategy 4: scan every `{` for a balanced substring that parses into an
/// object carrying at least one expected command field.
fn try_embedded_scan(text: &str) -> Option<EditCommand> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            if let Some(end) = find_matching_brace(text, i) {
                if let Some(cmd) = parse_candidate(&text[i..=end]) {
                    return Some(cmd);
                }
                // A balanced-but-foreign object: keep scanning inside it too,
                // the command may be nested.
                i += 1;
                continue;
            }
        }
        i += 1;
    }
    None
}

/// Parse one candidate substring. Accepts only JSON objects that carry at
/// least one of the expected command fields — this rejects unrelated
/// objects the model may have emitted alongside the command.
fn parse_candidate(text: &str) -> Option<EditCommand> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    let obj = value.as_object()?;
    if !COMMAND_FIELDS.iter().any(|f| obj.contains_key(*f)) {
        return None;
    }
    serde_json::from_value(value).ok()
}

// ─── Brace Matching ──────────────────────────────────────────────────────────

/// Find the matching `}` for a `{` at byte position `start`.
///
/// Braces inside quoted strings are ignored, and backslash escapes inside
/// strings are honored, so content like `{"target": "كلمة {خاصة}"}` is
/// matched correctly.
pub(crate) fn find_matching_brace(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape_next = false;
    let mut i = start;

    while i < bytes.len() {
        let b = bytes[i];
        if escape_next {
            escape_next = false;
            i += 1;
            continue;
        }
        if in_string {
            match b {
                b'\\' => escape_next = true,
                b'"' => in_string = false,
                _ => {}
            }
            i += 1;
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

// ─── Tests ───────────────────────────────────────────────────────────────────
