//! Port traits — the hexagonal architecture boundary.
//!
//! These traits are defined here in `askdocs-core` (pure Rust).
//! Implementations live in `askdocs-platform` (browser adapters).
//! The core never imports platform code; it only depends on these traits.

use async_trait::async_trait;
use askdocs_types::{
    Result,
    event::{ChannelEvent, ChannelState},
    wire::{DocumentRef, FeedbackSubmission, QuestionMessage},
};

// ─── Transport Channel Port ──────────────────────────────────

/// A reconnectable duplex message channel to the answering service.
///
/// Exactly one live socket exists per channel at a time. Inbound frames and
/// close notifications are buffered; the controller drains them with
/// `drain_events` on each pump.
#[async_trait(?Send)]
pub trait ChannelPort {
    fn state(&self) -> ChannelState;

    /// Resolve once the channel reaches `Open`. Idempotent: an already-open
    /// channel resolves immediately without creating a new socket.
    async fn open(&self) -> Result<()>;

    /// Fails with `ChannelNotOpen` unless the state is `Open`.
    /// Implementations must not queue silently — call `open()` first.
    fn send(&self, msg: &QuestionMessage) -> Result<()>;

    /// Transition Closing → Closed. Idempotent; safe on a closed channel.
    fn close(&self);

    /// Take all buffered channel events, oldest first.
    fn drain_events(&self) -> Vec<ChannelEvent>;

    /// Whether `drain_events` would return anything.
    fn has_events(&self) -> bool;
}

// ─── Storage Port ────────────────────────────────────────────

/// Durable key-value persistence for the serialized session blob.
#[async_trait(?Send)]
pub trait StoragePort {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}

// ─── Feedback & Citation Gateway Port ────────────────────────

/// Out-of-band HTTP exchanges, independent of the main channel and
/// stateless with respect to the transcript.
#[async_trait(?Send)]
pub trait GatewayPort {
    async fn submit_feedback(&self, feedback: &FeedbackSubmission) -> Result<()>;

    /// Fetch the document a citation points at, by source identifier.
    async fn resolve_citation(&self, source_id: &str) -> Result<DocumentRef>;

    async fn list_documents(&self) -> Result<Vec<DocumentRef>>;

    async fn delete_document(&self, id: &str) -> Result<()>;
}

// ─── Credentials Port ────────────────────────────────────────

/// Injected credential capability. Replaces ambient global token state:
/// the channel and gateway receive this at construction.
pub trait CredentialsPort {
    fn token(&self) -> Option<String>;
    fn given_name(&self) -> Option<String>;
    fn email(&self) -> Option<String>;
    fn logout(&self);
}

// ─── Delay Port ──────────────────────────────────────────────

/// A cooperative timer. The scripted easter-egg reply suspends on this.
#[async_trait(?Send)]
pub trait DelayPort {
    async fn delay_ms(&self, ms: u32);
}
