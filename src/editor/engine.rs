//! Target resolution and text splicing — the edit engine.
//!
//! `TextEditor::apply` is a pure function from `(document, command)` to a
//! new document state. It never errors: an unresolvable target, an empty
//! document, or a missing field is a valid outcome reported through the
//! `EditOutcome` flags, not an exception. Whitespace normalization at every
//! splice keeps Arabic words from fusing across an insertion boundary.

use crate::classify::types::{
    CommandType, EditCommand, InsertPosition, TARGET_ALL, TARGET_END, TARGET_LAST, TARGET_START,
};
use crate::editor::resolver::{AnchorHit, AnchorResolver, AnchorSide};

// ─── Types ───────────────────────────────────────────────────────────────────

/// A control signal for the speech-capture collaborator. Produces no
/// document mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    StartListening,
    StopListening,
    ContinuousOn,
    ContinuousOff,
}

/// Result of applying one command to the document.
#[derive(Debug, Clone)]
pub struct EditOutcome {
    /// The new document text.
    pub text: String,
    /// Whether the text differs from the input document.
    pub changed: bool,
    /// False when an anchor search exhausted all strategies or a literal
    /// target had no occurrence — a soft condition, reported upward.
    pub target_found: bool,
    /// Control event for the speech collaborator, if any.
    pub control: Option<ControlEvent>,
    /// Diagnostic note for the UI.
    pub note: Option<String>,
}

impl EditOutcome {
    fn unchanged(doc: &str) -> Self {
        EditOutcome {
            text: doc.to_string(),
            changed: false,
            target_found: true,
            control: None,
            note: None,
        }
    }

    fn changed(text: String) -> Self {
        EditOutcome {
            text,
            changed: true,
            target_found: true,
            control: None,
            note: None,
        }
    }

    fn with_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }
}

// ─── TextEditor ──────────────────────────────────────────────────────────────

/// The edit engine. Holds the anchor resolver; carries no document state.
#[derive(Default)]
pub struct TextEditor {
    resolver: AnchorResolver,
}

impl TextEditor {
    pub fn new(resolver: AnchorResolver) -> Self {
        Self { resolver }
    }

    /// Compute the new document state for one command.
    pub fn apply(&self, doc: &str, cmd: &EditCommand) -> EditOutcome {
        if !cmd.is_command {
            return self.apply_plain_content(doc, cmd);
        }

        let outcome = match cmd.command_type {
            CommandType::Insert => self.apply_insert(doc, cmd),
            CommandType::Delete => self.apply_delete(doc, cmd),
            CommandType::Replace => self.apply_replace(doc, cmd),
            CommandType::Format => self.apply_format(doc, cmd),
            CommandType::Control => self.apply_control(doc, cmd),
            // Unreachable for normalized commands; treated as a no-op.
            CommandType::None => EditOutcome::unchanged(doc),
        };

        tracing::debug!(
            command_type = ?cmd.command_type,
            changed = outcome.changed,
            target_found = outcome.target_found,
            "applied command"
        );
        outcome
    }

    // ── Plain content ────────────────────────────────────────────────────

    /// Non-command input: the raw text is appended to the document.
    fn apply_plain_content(&self, doc: &str, cmd: &EditCommand) -> EditOutcome {
        match cmd.content.as_deref().filter(|c| !c.trim().is_empty()) {
            Some(content) => EditOutcome::changed(append_end(doc, content)),
            None => EditOutcome::unchanged(doc),
        }
    }

    // ── Insert ───────────────────────────────────────────────────────────

    fn apply_insert(&self, doc: &str, cmd: &EditCommand) -> EditOutcome {
        let Some(content) = cmd.content.as_deref().filter(|c| !c.is_empty()) else {
            return EditOutcome::unchanged(doc).with_note("لا يوجد محتوى للإدراج");
        };

        // Sentinel targets fold into an explicit position.
        let position = match cmd.target.as_deref() {
            Some(TARGET_START) => Some(InsertPosition::Start),
            Some(TARGET_END) => Some(InsertPosition::End),
            _ => cmd.position,
        };

        match position {
            Some(InsertPosition::Start) => EditOutcome::changed(prepend_start(doc, content)),
            Some(InsertPosition::End) => EditOutcome::changed(append_end(doc, content)),
            Some(InsertPosition::Before) | Some(InsertPosition::After)
                if cmd.has_literal_target() =>
            {
                let side = if position == Some(InsertPosition::Before) {
                    AnchorSide::Before
                } else {
                    AnchorSide::After
                };
                self.insert_at_anchor(doc, cmd, content, side)
            }
            // Missing, unrecognized, or anchor-less positions degrade to an
            // end-insert.
            _ => EditOutcome::changed(append_end(doc, content)),
        }
    }

    fn insert_at_anchor(
        &self,
        doc: &str,
        cmd: &EditCommand,
        content: &str,
        side: AnchorSide,
    ) -> EditOutcome {
        let target = cmd.target.as_deref().unwrap_or_default();
        let explanation = cmd.explanation.as_deref().unwrap_or_default();
        let phrases = [explanation, cmd.action.as_str()];

        match self.resolver.resolve(doc, target, side, &phrases) {
            Some(hit) => {
                tracing::debug!(strategy = ?hit.strategy, index = hit.index, "anchor resolved");
                EditOutcome::changed(splice(doc, hit, content))
            }
            None => {
                // Degrade: append at the end and report the miss.
                let mut outcome = EditOutcome::changed(append_end(doc, content))
                    .with_note("لم يتم العثور على الموضع المطلوب، تمت الإضافة في النهاية");
                outcome.target_found = false;
                outcome
            }
        }
    }

    // ── Delete ───────────────────────────────────────────────────────────

    fn apply_delete(&self, doc: &str, cmd: &EditCommand) -> EditOutcome {
        match cmd.target.as_deref() {
            Some(TARGET_ALL) => {
                // Confirmation before wiping the document is the caller's
                // concern, not this layer's.
                EditOutcome::changed(String::new()).with_note("تم مسح المستند")
            }
            Some(TARGET_LAST) => {
                if doc.is_empty() {
                    return EditOutcome::unchanged(doc);
                }
                let lines: Vec<&str> = doc.split('\n').collect();
                EditOutcome::changed(lines[..lines.len() - 1].join("\n"))
            }
            Some(target) if cmd.has_literal_target() => match doc.find(target) {
                Some(idx) => {
                    let mut text = String::with_capacity(doc.len() - target.len());
                    text.push_str(&doc[..idx]);
                    text.push_str(&doc[idx + target.len()..]);
                    EditOutcome::changed(text)
                }
                None => {
                    let mut outcome =
                        EditOutcome::unchanged(doc).with_note("النص المطلوب حذفه غير موجود");
                    outcome.target_found = false;
                    outcome
                }
            },
            _ => {
                let mut outcome = EditOutcome::unchanged(doc).with_note("لا يوجد هدف للحذف");
                outcome.target_found = false;
                outcome
            }
        }
    }

    // ── Replace ──────────────────────────────────────────────────────────

    /// Replace all occurrences, literal, case-sensitive, left-to-right,
    /// non-overlapping. `replacement` takes precedence over `content`.
    fn apply_replace(&self, doc: &str, cmd: &EditCommand) -> EditOutcome {
        let Some(target) = cmd.target.as_deref().filter(|t| !t.is_empty()) else {
            let mut outcome = EditOutcome::unchanged(doc).with_note("لا يوجد هدف للاستبدال");
            outcome.target_found = false;
            return outcome;
        };
        let Some(replacement) = cmd.replacement.as_deref().or(cmd.content.as_deref()) else {
            return EditOutcome::unchanged(doc).with_note("لا يوجد نص بديل");
        };

        if !doc.contains(target) {
            let mut outcome = EditOutcome::unchanged(doc).with_note("النص المطلوب استبداله غير موجود");
            outcome.target_found = false;
            return outcome;
        }

        EditOutcome::changed(doc.replace(target, replacement))
    }

    // ── Format ───────────────────────────────────────────────────────────

    /// Append a Markdown heading, separated by a blank line when the
    /// document is non-empty.
    fn apply_format(&self, doc: &str, cmd: &EditCommand) -> EditOutcome {
        let Some(content) = cmd.content.as_deref().filter(|c| !c.is_empty()) else {
            return EditOutcome::unchanged(doc).with_note("لا يوجد نص للعنوان");
        };
        let text = if doc.is_empty() {
            format!("# {content}\n")
        } else {
            format!("{doc}\n\n# {content}\n")
        };
        EditOutcome::changed(text)
    }

    // ── Control ──────────────────────────────────────────────────────────

    /// Map stop/continue phrases to a control event. No document mutation.
    fn apply_control(&self, doc: &str, cmd: &EditCommand) -> EditOutcome {
        let mut outcome = EditOutcome::unchanged(doc);
        outcome.control = control_event(&cmd.action);
        if outcome.control.is_none() {
            outcome.note = Some("أمر تحكم غير معروف".to_string());
        }
        outcome
    }
}

// ─── Control Mapping ─────────────────────────────────────────────────────────

const STOP_WORDS: &[&str] = &["توقف", "قف", "إيقاف", "ايقاف", "أوقف", "عطل", "stop"];
const START_WORDS: &[&str] = &[
    "استمر", "أكمل", "اكمل", "واصل", "ابدأ", "ابدا", "تفعيل", "فعل", "شغل", "start", "continue",
];

fn control_event(action: &str) -> Option<ControlEvent> {
    let continuous = action.contains("مستمر") || action.contains("continuous");
    if STOP_WORDS.iter().any(|w| action.contains(w)) {
        return Some(if continuous {
            ControlEvent::ContinuousOff
        } else {
            ControlEvent::StopListening
        });
    }
    if START_WORDS.iter().any(|w| action.contains(w)) {
        return Some(if continuous {
            ControlEvent::ContinuousOn
        } else {
            ControlEvent::StartListening
        });
    }
    None
}

// ─── Splicing ────────────────────────────────────────────────────────────────

/// Prepend with a single-newline separator when the document is non-empty.
fn prepend_start(doc: &str, content: &str) -> String {
    if doc.is_empty() {
        content.to_string()
    } else {
        format!("{content}\n{doc}")
    }
}

/// Append with a single-newline separator when the document is non-empty.
fn append_end(doc: &str, content: &str) -> String {
    if doc.is_empty() {
        content.to_string()
    } else {
        format!("{doc}\n{content}")
    }
}

/// Splice `content` at a resolved anchor with whitespace normalization:
/// exactly one literal space on the anchor side, and a space on the far
/// side only when the adjacent character exists and is neither a space nor
/// a newline.
fn splice(doc: &str, hit: AnchorHit, content: &str) -> String {
    let idx = hit.index;
    let mut out = String::with_capacity(doc.len() + content.len() + 2);
    match hit.side {
        AnchorSide::After => {
            out.push_str(&doc[..idx]);
            out.push(' ');
            out.push_str(content);
            if let Some(c) = doc[idx..].chars().next() {
                if c != ' ' && c != '\n' {
                    out.push(' ');
                }
            }
            out.push_str(&doc[idx..]);
        }
        AnchorSide::Before => {
            out.push_str(&doc[..idx]);
            if let Some(c) = doc[..idx].chars().next_back() {
                if c != ' ' && c != '\n' {
                    out.push(' ');
                }
            }
            out.push_str(content);
            out.push(' ');
            out.push_str(&doc[idx..]);
        }
    }
    out
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> TextEditor {
        TextEditor::default()
    }

    fn insert_cmd(content: &str, target: Option<&str>, position: InsertPosition) -> EditCommand {
        EditCommand {
            is_command: true,
            command_type: CommandType::Insert,
            content: Some(content.to_string()),
            target: target.map(String::from),
            position: Some(position),
            confidence: 0.9,
            ..Default::default()
        }
    }

    fn delete_cmd(target: &str) -> EditCommand {
        EditCommand {
            is_command: true,
            command_type: CommandType::Delete,
            target: Some(target.to_string()),
            confidence: 0.9,
            ..Default::default()
        }
    }

    // ── Insert ───────────────────────────────────────────────────────────

    #[test]
    fn test_insert_start_into_empty_document() {
        let out = editor().apply("", &insert_cmd("بسم الله", None, InsertPosition::Start));
        assert_eq!(out.text, "بسم الله");
        assert!(out.changed);
    }

    #[test]
    fn test_insert_start_prepends_with_newline() {
        let out = editor().apply("قديم", &insert_cmd("جديد", None, InsertPosition::Start));
        assert_eq!(out.text, "جديد\nقديم");
    }

    #[test]
    fn test_insert_end_appends_with_newline() {
        let out = editor().apply("قديم", &insert_cmd("جديد", None, InsertPosition::End));
        assert_eq!(out.text, "قديم\nجديد");
    }

    #[test]
    fn test_insert_after_exact_target() {
        let out = editor().apply(
            "الحمد لله",
            &insert_cmd("تعالى", Some("الحمد لله"), InsertPosition::After),
        );
        assert_eq!(out.text, "الحمد لله تعالى");
        assert!(out.target_found);
    }

    #[test]
    fn test_insert_after_mid_document_adds_far_space() {
        let out = editor().apply(
            "alpha beta",
            &insert_cmd("X", Some("alpha"), InsertPosition::After),
        );
        // Anchor-side space always; far side already has one.
        assert_eq!(out.text, "alpha X beta");
    }

    #[test]
    fn test_insert_after_touching_text_normalizes_both_sides() {
        let out = editor().apply(
            "alphabeta",
            &insert_cmd("X", Some("alpha"), InsertPosition::After),
        );
        assert_eq!(out.text, "alpha X beta");
    }

    #[test]
    fn test_insert_before_target() {
        let out = editor().apply(
            "لله الحمد",
            &insert_cmd("يا", Some("لله"), InsertPosition::Before),
        );
        assert_eq!(out.text, "يا لله الحمد");
    }

    #[test]
    fn test_insert_before_mid_document() {
        let out = editor().apply(
            "alpha beta",
            &insert_cmd("X", Some("beta"), InsertPosition::Before),
        );
        assert_eq!(out.text, "alpha X beta");
    }

    #[test]
    fn test_insert_missing_position_degrades_to_end() {
        let mut cmd = insert_cmd("جديد", None, InsertPosition::End);
        cmd.position = None;
        let out = editor().apply("قديم", &cmd);
        assert_eq!(out.text, "قديم\nجديد");
    }

    #[test]
    fn test_insert_unresolvable_target_degrades_to_end() {
        let out = editor().apply(
            "نص موجود",
            &insert_cmd("جديد", Some("غائب تماما"), InsertPosition::After),
        );
        assert_eq!(out.text, "نص موجود\nجديد");
        assert!(!out.target_found);
        assert!(out.note.is_some());
    }

    #[test]
    fn test_insert_sentinel_target_start() {
        let out = editor().apply(
            "قديم",
            &insert_cmd("جديد", Some(TARGET_START), InsertPosition::After),
        );
        assert_eq!(out.text, "جديد\nقديم");
    }

    #[test]
    fn test_insert_between_pattern_tie_break() {
        // B named first in the phrase, A occurs first in the document —
        // content lands adjacent to A.
        let mut cmd = insert_cmd("X", Some("nonexistent"), InsertPosition::After);
        cmd.explanation = Some("insert X between B and A".to_string());
        let out = editor().apply("A something B", &cmd);
        assert_eq!(out.text, "A X something B");
        assert!(out.target_found);
    }

    #[test]
    fn test_insert_empty_content_is_noop() {
        let mut cmd = insert_cmd("", None, InsertPosition::End);
        cmd.content = Some(String::new());
        let out = editor().apply("نص", &cmd);
        assert!(!out.changed);
        assert!(out.note.is_some());
    }

    // ── Delete ───────────────────────────────────────────────────────────

    #[test]
    fn test_delete_all() {
        let out = editor().apply("أي نص", &delete_cmd(TARGET_ALL));
        assert_eq!(out.text, "");
        assert!(out.changed);
    }

    #[test]
    fn test_delete_last_line() {
        let out = editor().apply("line1\nline2\nline3", &delete_cmd(TARGET_LAST));
        assert_eq!(out.text, "line1\nline2");
    }

    #[test]
    fn test_delete_last_single_line() {
        let out = editor().apply("وحيد", &delete_cmd(TARGET_LAST));
        assert_eq!(out.text, "");
    }

    #[test]
    fn test_delete_last_empty_document() {
        let out = editor().apply("", &delete_cmd(TARGET_LAST));
        assert_eq!(out.text, "");
        assert!(!out.changed);
    }

    #[test]
    fn test_delete_first_occurrence_only() {
        let out = editor().apply("x a x", &delete_cmd("x"));
        assert_eq!(out.text, " a x");
    }

    #[test]
    fn test_delete_preserves_surrounding_bytes() {
        let doc = "قبل الهدف بعد";
        let out = editor().apply(doc, &delete_cmd("الهدف "));
        assert_eq!(out.text, "قبل بعد");
    }

    #[test]
    fn test_delete_missing_target_unchanged() {
        let doc = "نص ثابت";
        let out = editor().apply(doc, &delete_cmd("غائب"));
        assert_eq!(out.text, doc);
        assert!(!out.changed);
        assert!(!out.target_found);
    }

    // ── Replace ──────────────────────────────────────────────────────────

    #[test]
    fn test_replace_all_occurrences() {
        let cmd = EditCommand {
            is_command: true,
            command_type: CommandType::Replace,
            target: Some("a".into()),
            replacement: Some("x".into()),
            confidence: 0.9,
            ..Default::default()
        };
        let out = editor().apply("a b a", &cmd);
        assert_eq!(out.text, "x b x");
    }

    #[test]
    fn test_replace_prefers_replacement_over_content() {
        let cmd = EditCommand {
            is_command: true,
            command_type: CommandType::Replace,
            target: Some("قديم".into()),
            replacement: Some("بديل".into()),
            content: Some("محتوى".into()),
            confidence: 0.9,
            ..Default::default()
        };
        let out = editor().apply("نص قديم", &cmd);
        assert_eq!(out.text, "نص بديل");
    }

    #[test]
    fn test_replace_missing_target_is_identity() {
        let cmd = EditCommand {
            is_command: true,
            command_type: CommandType::Replace,
            target: Some("غائب".into()),
            replacement: Some("بديل".into()),
            confidence: 0.9,
            ..Default::default()
        };
        let doc = "نص ثابت";
        let out = editor().apply(doc, &cmd);
        assert_eq!(out.text, doc);
        assert!(!out.target_found);
    }

    // ── Format ───────────────────────────────────────────────────────────

    #[test]
    fn test_format_empty_document() {
        let cmd = EditCommand {
            is_command: true,
            command_type: CommandType::Format,
            content: Some("المقدمة".into()),
            confidence: 0.9,
            ..Default::default()
        };
        let out = editor().apply("", &cmd);
        assert_eq!(out.text, "# المقدمة\n");
    }

    #[test]
    fn test_format_nonempty_document_blank_line_separator() {
        let cmd = EditCommand {
            is_command: true,
            command_type: CommandType::Format,
            content: Some("الخاتمة".into()),
            confidence: 0.9,
            ..Default::default()
        };
        let out = editor().apply("نص سابق", &cmd);
        assert_eq!(out.text, "نص سابق\n\n# الخاتمة\n");
    }

    // ── Control ──────────────────────────────────────────────────────────

    #[test]
    fn test_control_stop() {
        let cmd = EditCommand {
            is_command: true,
            command_type: CommandType::Control,
            action: "توقف عن الاستماع".into(),
            confidence: 0.9,
            ..Default::default()
        };
        let out = editor().apply("نص", &cmd);
        assert_eq!(out.control, Some(ControlEvent::StopListening));
        assert!(!out.changed);
        assert_eq!(out.text, "نص");
    }

    #[test]
    fn test_control_continuous_modes() {
        assert_eq!(
            control_event("تفعيل الوضع المستمر"),
            Some(ControlEvent::ContinuousOn)
        );
        assert_eq!(
            control_event("إيقاف الوضع المستمر"),
            Some(ControlEvent::ContinuousOff)
        );
        assert_eq!(control_event("واصل"), Some(ControlEvent::StartListening));
        assert_eq!(control_event("كلام آخر"), None);
    }

    // ── Plain content ────────────────────────────────────────────────────

    #[test]
    fn test_plain_content_appends() {
        let cmd = EditCommand::plain_content("جملة مملاة", 0.8, "heuristic");
        let out = editor().apply("سطر أول", &cmd);
        assert_eq!(out.text, "سطر أول\nجملة مملاة");
    }

    // ── Round-trip ───────────────────────────────────────────────────────

    #[test]
    fn test_insert_then_delete_round_trip_modulo_spaces() {
        let doc = "alpha beta";
        let editor = editor();
        let inserted = editor.apply(doc, &insert_cmd("NEW", Some("alpha"), InsertPosition::After));
        assert_eq!(inserted.text, "alpha NEW beta");

        let deleted = editor.apply(&inserted.text, &delete_cmd("NEW"));
        // The anchor-side space survives deletion of the content itself.
        assert_eq!(deleted.text, "alpha  beta");
        assert_eq!(deleted.text.replace("  ", " "), doc);
    }
}
