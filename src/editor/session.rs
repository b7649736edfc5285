//! Document session — serialized classify-then-apply over one document.
//!
//! The session owns the document text and its edit history behind one async
//! mutex. The lock is held across the entire classify-then-apply span of an
//! utterance, so concurrent utterances observe a consistent document and the
//! context tail sent to the oracles always matches the text the edit will
//! land on.

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::classify::errors::ClassifyError;
use crate::classify::orchestrator::ClassificationOrchestrator;
use crate::classify::types::{context_tail, CommandType, EditCommand};
use crate::editor::engine::{EditOutcome, TextEditor};

// ─── Types ───────────────────────────────────────────────────────────────────

/// One applied (or attempted) edit, for history display.
#[derive(Debug, Clone)]
pub struct EditRecord {
    pub at: DateTime<Utc>,
    pub command_type: CommandType,
    /// Which oracle (or `"heuristic"`) classified the utterance.
    pub provider: Option<String>,
    pub description: String,
    pub changed: bool,
}

/// The full result of processing one utterance.
#[derive(Debug, Clone)]
pub struct ProcessedUtterance {
    pub command: EditCommand,
    pub outcome: EditOutcome,
}

#[derive(Default)]
struct SessionState {
    text: String,
    history: Vec<EditRecord>,
}

// ─── DocumentSession ─────────────────────────────────────────────────────────

/// A live editing session over one document.
pub struct DocumentSession {
    state: Mutex<SessionState>,
    orchestrator: ClassificationOrchestrator,
    editor: TextEditor,
    /// Document-tail length (chars) passed as classification context.
    context_chars: usize,
}

impl DocumentSession {
    pub fn new(orchestrator: ClassificationOrchestrator, context_chars: usize) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            orchestrator,
            editor: TextEditor::default(),
            context_chars,
        }
    }

    pub fn orchestrator(&self) -> &ClassificationOrchestrator {
        &self.orchestrator
    }

    /// Classify one utterance and apply the result to the document.
    pub async fn process(&self, utterance: &str) -> Result<ProcessedUtterance, ClassifyError> {
        let mut state = self.state.lock().await;
        let context = context_tail(&state.text, self.context_chars).to_string();
        let command = self.orchestrator.classify(utterance, &context).await?;
        Ok(self.apply_locked(&mut state, command, utterance))
    }

    /// Like [`process`](Self::process) but pinned to one named provider.
    pub async fn process_pinned(
        &self,
        provider: &str,
        utterance: &str,
    ) -> Result<ProcessedUtterance, ClassifyError> {
        let mut state = self.state.lock().await;
        let context = context_tail(&state.text, self.context_chars).to_string();
        let command = self
            .orchestrator
            .classify_pinned(provider, utterance, &context)
            .await?;
        Ok(self.apply_locked(&mut state, command, utterance))
    }

    fn apply_locked(
        &self,
        state: &mut SessionState,
        mut command: EditCommand,
        utterance: &str,
    ) -> ProcessedUtterance {
        // An oracle may answer "not a command" without echoing the text back.
        // The user's words are never dropped silently: fall back to the raw
        // utterance as the content to append.
        if !command.is_command
            && command
                .content
                .as_deref()
                .map_or(true, |c| c.trim().is_empty())
        {
            command.content = Some(utterance.trim().to_string());
        }

        let outcome = self.editor.apply(&state.text, &command);

        state.history.push(EditRecord {
            at: Utc::now(),
            command_type: command.command_type,
            provider: command.provider.clone(),
            description: describe(&command),
            changed: outcome.changed,
        });
        if outcome.changed {
            state.text = outcome.text.clone();
        }

        tracing::info!(
            command_type = ?command.command_type,
            provider = command.provider.as_deref().unwrap_or("-"),
            changed = outcome.changed,
            doc_chars = state.text.chars().count(),
            "utterance processed"
        );

        ProcessedUtterance { command, outcome }
    }

    /// Current document text.
    pub async fn text(&self) -> String {
        self.state.lock().await.text.clone()
    }

    /// Edit history, oldest first.
    pub async fn history(&self) -> Vec<EditRecord> {
        self.state.lock().await.history.clone()
    }

    /// Reset the document and history.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.text.clear();
        state.history.clear();
    }
}

/// Short human-readable summary of a command, for history rows.
fn describe(command: &EditCommand) -> String {
    if !command.is_command {
        return "إضافة نص إلى المستند".to_string();
    }
    match command.target.as_deref() {
        Some(target) if !target.is_empty() => {
            format!("{}: {target}", command.action)
        }
        _ => command.action.clone(),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
