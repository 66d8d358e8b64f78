//! Correlation Layer — matches outbound questions to inbound answers.
//!
//! The wire protocol carries no request ids, so correlation is positional:
//! exactly one request may be pending, and the next inbound frame answers
//! it. The typing indicator is exactly "a request is pending".

use uuid::Uuid;
use askdocs_types::{
    ChatError, Result,
    entry::Citation,
    wire::AnswerPayload,
};

/// Opaque identifier of one in-flight question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestId(Uuid);

impl RequestId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Default)]
pub struct Correlation {
    pending: Option<RequestId>,
}

impl Correlation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the single pending slot. Fails with `RequestInProgress` while
    /// another request is outstanding.
    pub fn begin(&mut self) -> Result<RequestId> {
        if self.pending.is_some() {
            return Err(ChatError::RequestInProgress);
        }
        let id = RequestId::new();
        self.pending = Some(id);
        Ok(id)
    }

    /// Complete the pending request. Returns None when nothing was pending
    /// — the caller drops the frame as stale.
    pub fn complete(&mut self) -> Option<RequestId> {
        self.pending.take()
    }

    /// Clear pending state without producing a transcript entry.
    /// Used on clear() and channel teardown.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// A parsed inbound answer, ready for the Transcript Engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAnswer {
    pub answer: String,
    pub citations: Vec<Citation>,
}

/// Parse a raw answer frame: a JSON array with exactly one payload element
/// whose `doc_ids`/`texts`/`names` arrays are positionally correlated.
///
/// This is the `MalformedAnswer` boundary — failures here are logged by
/// the caller and never corrupt the transcript.
pub fn parse_answer(raw: &str) -> Result<ParsedAnswer> {
    let mut frames: Vec<AnswerPayload> = serde_json::from_str(raw)
        .map_err(|e| ChatError::MalformedAnswer(e.to_string()))?;
    if frames.len() != 1 {
        return Err(ChatError::MalformedAnswer(format!(
            "expected 1 answer element, got {}",
            frames.len()
        )));
    }
    let payload = frames.remove(0);

    let citations = payload
        .doc_ids
        .iter()
        .enumerate()
        .map(|(i, source_id)| Citation {
            source_id: source_id.clone(),
            name: payload.names.get(i).cloned().unwrap_or_default(),
            excerpt: payload.texts.get(i).cloned().unwrap_or_default(),
        })
        .collect();

    Ok(ParsedAnswer {
        answer: payload.answer,
        citations,
    })
}

/// Collapse citations to one affordance per distinct source document.
///
/// Keyed by source id only: when an answer cites the same source with
/// several excerpts, the first wins and the rest are dropped here (the
/// viewer still receives every excerpt).
pub fn dedup_citations(citations: &[Citation]) -> Vec<Citation> {
    let mut seen: Vec<&str> = Vec::new();
    let mut out = Vec::new();
    for citation in citations {
        if seen.contains(&citation.source_id.as_str()) {
            continue;
        }
        seen.push(&citation.source_id);
        out.push(citation.clone());
    }
    out
}
