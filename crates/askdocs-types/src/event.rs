use serde::{Deserialize, Serialize};
use crate::entry::{Sentiment, TranscriptEntry};

/// Events emitted by the chat engine.
/// The UI drains these from the event bus each frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChatEvent {
    /// The transcript was mutated; carries the new snapshot for rendering
    TranscriptChanged { entries: Vec<TranscriptEntry> },

    /// Typing-indicator visibility — exactly "a request is pending"
    TypingChanged { visible: bool },

    /// A rating landed; open the feedback capture flow pre-filled
    FeedbackPrompt {
        entry_id: usize,
        sentiment: Sentiment,
        question: String,
        answer: String,
    },

    /// A cited document resolved; drive the viewer overlay
    CitationResolved {
        entry_id: usize,
        document_url: String,
        excerpts: Vec<String>,
    },

    /// A side channel failed; show a transient indicator, never fatal
    TransientError { message: String },
}

/// Events surfaced by a transport channel adapter, buffered until the
/// controller drains them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ChannelEvent {
    /// Raw inbound frame (answer payload, unparsed)
    Message { raw: String },

    /// The channel reached Closed. `user_initiated` distinguishes an
    /// explicit close() from an unexpected drop.
    Closed { user_initiated: bool },
}

/// Transport channel lifecycle. A socket is created fresh for each
/// Connecting→Open transition; a closed socket is never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelState {
    Closed,
    Connecting,
    Open,
    Closing,
}
