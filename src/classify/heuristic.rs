//! Local heuristic classifier — the network-free fallback.
//!
//! Deterministic keyword scoring over fixed Arabic cue sets. This is the
//! bottom of the fallback chain: it always returns a command, and its
//! "treat as plain text" branch cannot fail. Results are labeled with the
//! [`HEURISTIC_PROVIDER`] tag so the UI can distinguish them from
//! oracle-derived classifications.

use crate::classify::types::{
    CommandType, EditCommand, InsertPosition, TARGET_ALL, TARGET_LAST,
};

/// Diagnostic provider label for heuristic results.
pub const HEURISTIC_PROVIDER: &str = "heuristic";

/// Accumulated score below this classifies the input as plain content.
const LIKELY_COMMAND_THRESHOLD: f32 = 0.4;

// ─── Cue Sets ────────────────────────────────────────────────────────────────

const DELETE_CUES: &[&str] = &["احذف", "امسح", "أزل", "ازل", "شيل", "حذف"];
const INSERT_CUES: &[&str] = &["اكتب", "أكتب", "أضف", "اضف", "أدخل", "ادخل", "ضع"];
const REPLACE_CUES: &[&str] = &["استبدل", "بدل", "غيّر", "غير"];
const FORMAT_CUES: &[&str] = &["عنوان", "نسّق", "نسق"];
const CONTROL_CUES: &[&str] = &[
    "توقف", "قف", "إيقاف", "ايقاف", "أوقف", "استمر", "أكمل", "اكمل", "واصل",
];

/// Indirect desire phrases ("I want to…", "could you…") — weaker signal.
const DESIRE_CUES: &[&str] = &["أريد", "اريد", "ممكن", "من فضلك", "لو سمحت"];

/// Position indicators — small positive signal.
const POSITION_CUES: &[&str] = &["قبل", "بعد", "في البداية", "في النهاية", "أول", "آخر"];

/// Narrative/informational words — bias toward "not a command".
const CONTENT_CUES: &[&str] = &["كان", "كانت", "قال", "قالت", "اليوم", "أمس", "سوف"];

/// Fillers between a command verb and its object ("the word X", …).
const TARGET_FILLERS: &[&str] = &["كلمة", "جملة", "عبارة", "النص"];

// ─── Entry Point ─────────────────────────────────────────────────────────────

/// Classify one utterance using lexical cues only. Always succeeds.
pub fn classify_heuristic(text: &str) -> EditCommand {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return EditCommand::plain_content("", 0.0, HEURISTIC_PROVIDER);
    }

    let detected = detect_command_type(trimmed);

    let mut score: f32 = 0.0;
    if detected.is_some() {
        score += 0.5;
    }
    if find_any(trimmed, DESIRE_CUES).is_some() {
        score += 0.2;
    }
    if find_any(trimmed, POSITION_CUES).is_some() {
        score += 0.1;
    }
    for cue in CONTENT_CUES {
        if cue_position(trimmed, cue).is_some() {
            score -= 0.1;
        }
    }
    let score = score.clamp(0.0, 1.0);

    let command = match detected {
        Some(hit) if score >= LIKELY_COMMAND_THRESHOLD => extract_command(trimmed, hit, score),
        _ => EditCommand::plain_content(trimmed, (1.0 - score).clamp(0.0, 1.0), HEURISTIC_PROVIDER),
    };

    tracing::debug!(
        is_command = command.is_command,
        command_type = ?command.command_type,
        score,
        "heuristic classification"
    );
    command
}

// ─── Cue Matching ────────────────────────────────────────────────────────────

struct CueHit {
    command_type: CommandType,
    position: usize,
    cue: &'static str,
}

/// Byte position of `cue` in `text`, matched on word boundaries.
///
/// Single-word cues only match whole words ("غير" must not fire inside
/// "صغير"); multi-word cues match as phrases. Punctuation counts as a
/// boundary the same as a space, so "توقف." still fires the cue. The
/// punctuation mapping is byte-length preserving, keeping every returned
/// position valid in the original text.
fn cue_position(text: &str, cue: &str) -> Option<usize> {
    let mut mapped = String::with_capacity(text.len());
    for ch in text.chars() {
        if is_boundary_punctuation(ch) {
            for _ in 0..ch.len_utf8() {
                mapped.push(' ');
            }
        } else {
            mapped.push(ch);
        }
    }
    let padded = format!(" {mapped} ");
    let needle = format!(" {cue} ");
    padded.find(&needle)
}

fn is_boundary_punctuation(ch: char) -> bool {
    matches!(
        ch,
        '.' | '،' | ',' | '؟' | '?' | '!' | '؛' | ';' | ':' | '…'
    )
}

/// Earliest cue from `cues`, as `(byte_position, cue)`.
fn find_any(text: &str, cues: &[&'static str]) -> Option<(usize, &'static str)> {
    cues.iter()
        .filter_map(|cue| cue_position(text, cue).map(|p| (p, *cue)))
        .min_by_key(|(p, _)| *p)
}

/// Decide the command type by whichever direct cue occurs earliest in the
/// utterance. Ties keep the listed set order.
fn detect_command_type(text: &str) -> Option<CueHit> {
    let sets: [(CommandType, &[&'static str]); 5] = [
        (CommandType::Control, CONTROL_CUES),
        (CommandType::Delete, DELETE_CUES),
        (CommandType::Replace, REPLACE_CUES),
        (CommandType::Format, FORMAT_CUES),
        (CommandType::Insert, INSERT_CUES),
    ];

    let mut best: Option<CueHit> = None;
    for (command_type, cues) in sets {
        if let Some((position, cue)) = find_any(text, cues) {
            let better = match &best {
                Some(b) => position < b.position,
                None => true,
            };
            if better {
                best = Some(CueHit {
                    command_type,
                    position,
                    cue,
                });
            }
        }
    }
    best
}

// ─── Type-Specific Extraction ────────────────────────────────────────────────

fn extract_command(text: &str, hit: CueHit, score: f32) -> EditCommand {
    let base = EditCommand {
        is_command: true,
        command_type: hit.command_type,
        action: text.to_string(),
        confidence: score,
        provider: Some(HEURISTIC_PROVIDER.to_string()),
        explanation: Some("تصنيف محلي بالكلمات المفتاحية".to_string()),
        ..Default::default()
    };

    let command = match hit.command_type {
        CommandType::Delete => extract_delete(text, &hit, base),
        CommandType::Insert => extract_insert(text, &hit, base),
        CommandType::Replace => extract_replace(text, &hit, base),
        CommandType::Format => extract_format(text, &hit, base),
        CommandType::Control => base,
        CommandType::None => base,
    };
    command.normalize()
}

/// Remainder of the utterance after the command verb, fillers stripped.
fn object_after_cue<'a>(text: &'a str, hit: &CueHit) -> &'a str {
    let mut rest = text[hit.position + hit.cue.len()..].trim();
    for filler in TARGET_FILLERS {
        if let Some(stripped) = rest.strip_prefix(filler) {
            if stripped.starts_with(' ') {
                rest = stripped.trim_start();
                break;
            }
        }
    }
    rest
}

fn extract_delete(text: &str, hit: &CueHit, mut cmd: EditCommand) -> EditCommand {
    let rest = object_after_cue(text, hit);
    cmd.target = if ["كل شيء", "الكل", "كل النص"]
        .iter()
        .any(|s| cue_position(text, s).is_some())
    {
        Some(TARGET_ALL.to_string())
    } else if ["آخر سطر", "السطر الأخير", "آخر جملة"]
        .iter()
        .any(|s| cue_position(text, s).is_some())
    {
        Some(TARGET_LAST.to_string())
    } else if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    };
    cmd
}

fn extract_insert(text: &str, hit: &CueHit, mut cmd: EditCommand) -> EditCommand {
    let rest = object_after_cue(text, hit);

    if let Some(pos) = rest.find(" في البداية") {
        cmd.position = Some(InsertPosition::Start);
        cmd.content = Some(remove_span(rest, pos, " في البداية"));
    } else if let Some(pos) = rest.find(" في النهاية") {
        cmd.position = Some(InsertPosition::End);
        cmd.content = Some(remove_span(rest, pos, " في النهاية"));
    } else if let Some(pos) = rest.find(" بعد ") {
        cmd.position = Some(InsertPosition::After);
        cmd.content = Some(rest[..pos].trim().to_string());
        cmd.target = Some(rest[pos + " بعد ".len()..].trim().to_string());
    } else if let Some(pos) = rest.find(" قبل ") {
        cmd.position = Some(InsertPosition::Before);
        cmd.content = Some(rest[..pos].trim().to_string());
        cmd.target = Some(rest[pos + " قبل ".len()..].trim().to_string());
    } else {
        cmd.position = Some(InsertPosition::End);
        cmd.content = Some(rest.to_string());
    }

    // A command verb with nothing to insert is still reported as a command;
    // the editor treats empty content as a no-op with a diagnostic note.
    if cmd.content.as_deref() == Some("") {
        cmd.content = None;
    }
    cmd
}

fn extract_replace(text: &str, hit: &CueHit, mut cmd: EditCommand) -> EditCommand {
    let rest = object_after_cue(text, hit);

    // "استبدل A بـ B" or the attached form "استبدل A بB"
    if let Some(pos) = rest.find(" بـ") {
        cmd.target = Some(rest[..pos].trim().to_string());
        cmd.replacement = Some(rest[pos + " بـ".len()..].trim().to_string());
    } else if let Some(pos) = rest.find(" ب") {
        cmd.target = Some(rest[..pos].trim().to_string());
        cmd.replacement = Some(rest[pos + " ب".len()..].trim().to_string());
    } else if !rest.is_empty() {
        cmd.target = Some(rest.to_string());
    }
    cmd
}

fn extract_format(text: &str, hit: &CueHit, mut cmd: EditCommand) -> EditCommand {
    let rest = object_after_cue(text, hit);
    if !rest.is_empty() {
        cmd.content = Some(rest.to_string());
    }
    cmd
}

fn remove_span(text: &str, pos: usize, phrase: &str) -> String {
    let mut out = String::with_capacity(text.len());
    out.push_str(text[..pos].trim_end());
    out.push_str(text[pos + phrase.len()..].trim_start());
    out.trim().to_string()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
