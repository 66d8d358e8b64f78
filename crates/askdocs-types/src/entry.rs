use serde::{Deserialize, Serialize};

/// Who produced a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// User rating of an assistant answer. Re-rating overwrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    #[default]
    Unset,
    Positive,
    Negative,
}

impl Sentiment {
    /// Wire label used by the feedback endpoint
    pub fn as_str(&self) -> &str {
        match self {
            Sentiment::Unset => "unset",
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
        }
    }
}

/// A reference from an assistant answer to a source document excerpt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub source_id: String,
    pub name: String,
    pub excerpt: String,
}

/// A single message in the conversation log.
///
/// `id` is the entry's index at creation time and is position-stable: the
/// transcript is append-only except for full clears, so ids are never
/// reused. Everything except `sentiment` is immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub id: usize,
    pub role: Role,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub sentiment: Sentiment,
}

impl TranscriptEntry {
    pub fn user(id: usize, text: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::User,
            text: text.into(),
            citations: Vec::new(),
            sentiment: Sentiment::Unset,
        }
    }

    pub fn assistant(id: usize, text: impl Into<String>, citations: Vec<Citation>) -> Self {
        Self {
            id,
            role: Role::Assistant,
            text: text.into(),
            citations,
            sentiment: Sentiment::Unset,
        }
    }

    /// Entry 0 of every transcript: the assistant greeting.
    /// Exempt from rating and citation actions.
    pub fn greeting(text: impl Into<String>) -> Self {
        Self::assistant(0, text, Vec::new())
    }

    pub fn is_greeting(&self) -> bool {
        self.id == 0
    }
}
