//! Transcript Engine — the append-only conversation log.
//!
//! The transcript is mutated only through the operations below. Entry ids
//! are creation-time indices; since the log is append-only except for full
//! clears, an id never moves and is never reused. Entry 0 is always the
//! assistant greeting and cannot be rated.
//!
//! Every successful mutation write-throughs to the Session Store and emits
//! a `TranscriptChanged` snapshot on the bus.

use askdocs_types::{
    ChatError, Result,
    entry::{Citation, Role, Sentiment, TranscriptEntry},
    event::ChatEvent,
    session::Session,
};
use crate::event_bus::EventBus;
use crate::store::SessionStore;

pub struct Transcript {
    entries: Vec<TranscriptEntry>,
    store: SessionStore,
    bus: EventBus,
}

impl Transcript {
    /// Restore from the store, or start fresh with the greeting entry.
    pub async fn restore(store: SessionStore, bus: EventBus, greeting: &str) -> Self {
        let entries = match store.load().await {
            Some(session) if !session.transcript.is_empty() => session.transcript,
            _ => vec![TranscriptEntry::greeting(greeting)],
        };
        let transcript = Self { entries, store, bus };
        transcript.notify();
        transcript
    }

    /// Append an entry. Never fails; returns the new entry's id.
    pub async fn append(&mut self, role: Role, text: &str, citations: Vec<Citation>) -> usize {
        let id = self.entries.len();
        let entry = match role {
            Role::User => TranscriptEntry::user(id, text),
            Role::Assistant => TranscriptEntry::assistant(id, text, citations),
        };
        self.entries.push(entry);
        self.persist().await;
        self.notify();
        id
    }

    /// Rate an entry. Re-rating overwrites. The greeting (entry 0) and
    /// out-of-range ids are rejected.
    pub async fn set_sentiment(&mut self, id: usize, sentiment: Sentiment) -> Result<()> {
        if id == 0 || id >= self.entries.len() {
            return Err(ChatError::InvalidEntry(id));
        }
        self.entries[id].sentiment = sentiment;
        self.persist().await;
        self.notify();
        Ok(())
    }

    /// Atomically swap the whole log. Used only by clear() and
    /// restore-from-store; observers never see a partial transcript.
    pub async fn replace_all(&mut self, entries: Vec<TranscriptEntry>) {
        self.entries = entries;
        self.persist().await;
        self.notify();
    }

    /// clear(): back to a single fresh greeting.
    pub async fn reset(&mut self, greeting: &str) {
        self.replace_all(vec![TranscriptEntry::greeting(greeting)]).await;
    }

    /// Read-only copy for persistence and rendering.
    pub fn snapshot(&self) -> Vec<TranscriptEntry> {
        self.entries.clone()
    }

    pub fn entry(&self, id: usize) -> Option<&TranscriptEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    async fn persist(&self) {
        self.store.save(&Session::new(self.entries.clone())).await;
    }

    fn notify(&self) {
        self.bus.emit(ChatEvent::TranscriptChanged {
            entries: self.snapshot(),
        });
    }
}
