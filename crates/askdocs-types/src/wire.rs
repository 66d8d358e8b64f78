//! Wire shapes for the answering backend and its REST side channels.
//!
//! Field names follow the observed protocol exactly; do not rename without
//! a matching backend change.

use serde::{Deserialize, Serialize};

/// Outbound question frame sent over the query channel.
///
/// `context` carries prior conversation turns so the backend can answer
/// follow-up questions; simpler backends ignore it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionMessage {
    pub data: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub context: Vec<ContextTurn>,
}

/// One prior conversation turn in a question's context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextTurn {
    #[serde(rename = "type")]
    pub kind: TurnKind,
    pub text: String,
}

/// The wire distinguishes `user` and `bot` turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnKind {
    User,
    Bot,
}

/// Inbound answer element. The full frame is a JSON array with exactly one
/// of these; `doc_ids`, `texts` and `names` are parallel arrays where index
/// i describes one citation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerPayload {
    pub answer: String,
    #[serde(default)]
    pub doc_ids: Vec<String>,
    #[serde(default)]
    pub texts: Vec<String>,
    #[serde(default)]
    pub names: Vec<String>,
}

/// Body of a feedback submission to the ingest endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSubmission {
    pub feedback_type: String,
    pub feedback_text: String,
    /// The question/answer pair the feedback refers to
    pub feedback_to: String,
    pub email: String,
}

/// A document known to the backend, as returned by the document endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<String>,
}
