//! UI-level state that drives rendering.
//! This is a read-only projection of the chat engine state,
//! updated each frame by draining the EventBus.

use askdocs_types::entry::{Sentiment, TranscriptEntry};
use askdocs_types::event::ChatEvent;
use askdocs_types::wire::DocumentRef;

/// State visible to UI panels
pub struct UiState {
    /// Rendered transcript snapshot
    pub entries: Vec<TranscriptEntry>,
    /// Typing-indicator visibility (a request is pending)
    pub typing: bool,
    /// Input field content
    pub input_text: String,
    /// Documents shown in the sidebar
    pub documents: Vec<DocumentRef>,
    /// Open feedback capture flow, if any
    pub feedback: Option<FeedbackDraft>,
    /// Open citation viewer overlay, if any
    pub viewer: Option<CitationView>,
    /// Transient error banner
    pub error_banner: Option<String>,
    /// Whether the clear-confirmation dialog is showing
    pub confirm_clear: bool,
}

/// A feedback form in progress, pre-filled with the rated exchange
#[derive(Clone)]
pub struct FeedbackDraft {
    pub entry_id: usize,
    pub sentiment: Sentiment,
    pub question: String,
    pub answer: String,
    pub text: String,
}

/// A resolved citation being displayed
#[derive(Clone)]
pub struct CitationView {
    pub entry_id: usize,
    pub document_url: String,
    pub excerpts: Vec<String>,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            typing: false,
            input_text: String::new(),
            documents: Vec::new(),
            feedback: None,
            viewer: None,
            error_banner: None,
            confirm_clear: false,
        }
    }

    /// Process events from the EventBus and update the projection
    pub fn process_events(&mut self, events: Vec<ChatEvent>) {
        for event in events {
            match event {
                ChatEvent::TranscriptChanged { entries } => {
                    self.entries = entries;
                }
                ChatEvent::TypingChanged { visible } => {
                    self.typing = visible;
                }
                ChatEvent::FeedbackPrompt {
                    entry_id,
                    sentiment,
                    question,
                    answer,
                } => {
                    self.feedback = Some(FeedbackDraft {
                        entry_id,
                        sentiment,
                        question,
                        answer,
                        text: String::new(),
                    });
                }
                ChatEvent::CitationResolved {
                    entry_id,
                    document_url,
                    excerpts,
                } => {
                    self.viewer = Some(CitationView {
                        entry_id,
                        document_url,
                        excerpts,
                    });
                }
                ChatEvent::TransientError { message } => {
                    self.error_banner = Some(message);
                }
            }
        }
    }

    /// Whether the submit affordance should accept input
    pub fn can_submit(&self, min_len: usize) -> bool {
        self.input_text.trim().chars().count() >= min_len && !self.typing
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}
