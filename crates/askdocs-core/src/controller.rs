//! Session Controller — orchestrates transcript, correlation, channel and
//! gateway on behalf of the presentation layer.
//!
//! All mutations run synchronously within one callback turn; suspension
//! happens only at the explicit await points (channel open, storage I/O,
//! gateway calls, the scripted delay). The composition root spawns each
//! entry point with `spawn_local` and calls `pump()` whenever the channel
//! has buffered events.

use std::rc::Rc;

use askdocs_types::{
    ChatError, Result,
    config::ChatConfig,
    entry::{Role, Sentiment},
    event::{ChannelEvent, ChannelState, ChatEvent},
    wire::{ContextTurn, FeedbackSubmission, QuestionMessage, TurnKind},
};

use crate::correlate::{parse_answer, Correlation};
use crate::event_bus::EventBus;
use crate::ports::{ChannelPort, CredentialsPort, DelayPort, GatewayPort, StoragePort};
use crate::store::SessionStore;
use crate::transcript::Transcript;

pub struct SessionController {
    config: ChatConfig,
    transcript: Transcript,
    correlation: Correlation,
    channel: Rc<dyn ChannelPort>,
    gateway: Rc<dyn GatewayPort>,
    credentials: Rc<dyn CredentialsPort>,
    delay: Rc<dyn DelayPort>,
    bus: EventBus,
}

impl SessionController {
    /// Build the controller, restoring the prior session if one is stored.
    /// Does not open the channel — the caller decides when to connect.
    pub async fn restore(
        config: ChatConfig,
        storage: Rc<dyn StoragePort>,
        channel: Rc<dyn ChannelPort>,
        gateway: Rc<dyn GatewayPort>,
        credentials: Rc<dyn CredentialsPort>,
        delay: Rc<dyn DelayPort>,
        bus: EventBus,
    ) -> Self {
        let store = SessionStore::new(storage, config.session_key.clone());
        let transcript = Transcript::restore(store, bus.clone(), &config.greeting).await;
        Self {
            config,
            transcript,
            correlation: Correlation::new(),
            channel,
            gateway,
            credentials,
            delay,
            bus,
        }
    }

    /// Connect the transport channel. Logged, never fatal: the transcript
    /// stays usable and a later submit retries the open.
    pub async fn connect(&self) {
        if let Err(e) = self.channel.open().await {
            log::warn!("Channel open failed: {}", e);
        }
    }

    /// Submit a question. A no-op when the input is below the minimum
    /// length or another request is pending. Failures to reach the backend
    /// are logged and leave the typing indicator recoverable.
    pub async fn submit(&mut self, question: &str) {
        let question = question.trim();
        if question.chars().count() < self.config.min_question_len {
            return;
        }
        if self.correlation.is_pending() {
            return;
        }

        if question == self.config.easter_egg.trigger {
            self.run_easter_egg().await;
            return;
        }

        let context = self.context_turns();
        self.transcript.append(Role::User, question, Vec::new()).await;

        // Cannot fail: pending was checked above
        if self.correlation.begin().is_err() {
            return;
        }
        self.set_typing(true);

        let msg = QuestionMessage {
            data: question.to_string(),
            context,
        };
        if let Err(e) = self.dispatch(&msg).await {
            log::error!("Question send failed: {}", e);
            self.correlation.cancel();
            self.set_typing(false);
            self.bus.emit(ChatEvent::TransientError {
                message: "Could not reach the answering service. Please try again.".to_string(),
            });
        }
    }

    /// Drain and process buffered channel events.
    pub async fn pump(&mut self) {
        for event in self.channel.drain_events() {
            match event {
                ChannelEvent::Message { raw } => self.on_message(&raw).await,
                ChannelEvent::Closed { user_initiated } => {
                    self.on_closed(user_initiated).await;
                }
            }
        }
    }

    /// Wipe the session: close the channel, drop any pending request,
    /// swap in a fresh greeting transcript, persist it, and open a new
    /// channel for subsequent use. The UI obtains interactive confirmation
    /// before calling this.
    pub async fn clear(&mut self) {
        self.channel.close();
        self.correlation.cancel();
        self.set_typing(false);
        self.transcript.reset(&self.config.greeting).await;
        self.connect().await;
    }

    /// Rate an entry, then open the feedback capture flow pre-filled with
    /// the surrounding question/answer pair.
    pub async fn rate(&mut self, entry_id: usize, sentiment: Sentiment) -> Result<()> {
        self.transcript.set_sentiment(entry_id, sentiment).await?;
        let (question, answer) = self.qa_pair(entry_id);
        self.bus.emit(ChatEvent::FeedbackPrompt {
            entry_id,
            sentiment,
            question,
            answer,
        });
        Ok(())
    }

    /// Fire-and-forget feedback submission. Failure is logged and shown as
    /// a transient indicator; the chat flow is never blocked.
    pub async fn send_feedback(&self, entry_id: usize, sentiment: Sentiment, text: &str) {
        let (question, answer) = self.qa_pair(entry_id);
        let submission = FeedbackSubmission {
            feedback_type: sentiment.as_str().to_string(),
            feedback_text: text.to_string(),
            feedback_to: format!("question: {}\nanswer: {}", question, answer),
            email: self.credentials.email().unwrap_or_default(),
        };
        if let Err(e) = self.gateway.submit_feedback(&submission).await {
            log::warn!("Feedback submission failed: {}", e);
            self.bus.emit(ChatEvent::TransientError {
                message: "Feedback could not be submitted.".to_string(),
            });
        }
    }

    /// Resolve a cited document and drive the viewer overlay. Every excerpt
    /// of the entry is handed to the viewer, even when the affordance was
    /// deduplicated down to one per source.
    pub async fn open_citation(&mut self, entry_id: usize, source_id: &str) -> Result<()> {
        let entry = self
            .transcript
            .entry(entry_id)
            .filter(|e| !e.is_greeting() && e.role == Role::Assistant)
            .ok_or(ChatError::InvalidEntry(entry_id))?;
        let excerpts: Vec<String> = entry.citations.iter().map(|c| c.excerpt.clone()).collect();

        match self.gateway.resolve_citation(source_id).await {
            Ok(doc) => {
                let document_url =
                    format!("{}/uploads/{}", self.config.backend_url, doc.name);
                self.bus.emit(ChatEvent::CitationResolved {
                    entry_id,
                    document_url,
                    excerpts,
                });
                Ok(())
            }
            Err(e) => {
                log::warn!("Citation lookup failed for {}: {}", source_id, e);
                self.bus.emit(ChatEvent::TransientError {
                    message: "The cited document could not be loaded.".to_string(),
                });
                Err(e)
            }
        }
    }

    /// Typing-indicator truth value
    pub fn is_typing(&self) -> bool {
        self.correlation.is_pending()
    }

    pub fn channel_state(&self) -> ChannelState {
        self.channel.state()
    }

    pub fn channel_has_events(&self) -> bool {
        self.channel.has_events()
    }

    // ─── internals ───────────────────────────────────────────

    async fn dispatch(&self, msg: &QuestionMessage) -> Result<()> {
        if self.channel.state() != ChannelState::Open {
            self.channel.open().await?;
        }
        self.channel.send(msg)
    }

    async fn on_message(&mut self, raw: &str) {
        if self.correlation.complete().is_none() {
            // Stale frame: the pending request was superseded by clear()
            // or channel teardown.
            log::warn!("Dropping answer frame with no pending question");
            return;
        }
        self.set_typing(false);
        match parse_answer(raw) {
            Ok(parsed) => {
                self.transcript
                    .append(Role::Assistant, &parsed.answer, parsed.citations)
                    .await;
            }
            Err(e) => {
                log::error!("Discarding malformed answer: {}", e);
                self.bus.emit(ChatEvent::TransientError {
                    message: "The answer could not be read. Please try again.".to_string(),
                });
            }
        }
    }

    async fn on_closed(&mut self, user_initiated: bool) {
        if self.correlation.is_pending() {
            self.correlation.cancel();
            self.set_typing(false);
        }
        if !user_initiated {
            log::warn!("Channel dropped unexpectedly, reopening");
            self.connect().await;
        }
    }

    /// The scripted reply: no network at all. The pending slot is held for
    /// the duration so the typing indicator stays truthful and a second
    /// submit stays blocked.
    async fn run_easter_egg(&mut self) {
        let egg = self.config.easter_egg.clone();
        self.transcript.append(Role::User, &egg.display, Vec::new()).await;
        if self.correlation.begin().is_err() {
            return;
        }
        self.set_typing(true);
        self.delay.delay_ms(egg.delay_ms).await;
        self.correlation.complete();
        self.set_typing(false);
        self.transcript.append(Role::Assistant, &egg.reply, Vec::new()).await;
    }

    /// Prior turns for the outbound context, greeting excluded.
    fn context_turns(&self) -> Vec<ContextTurn> {
        self.transcript
            .snapshot()
            .into_iter()
            .filter(|e| !e.is_greeting())
            .map(|e| ContextTurn {
                kind: match e.role {
                    Role::User => TurnKind::User,
                    Role::Assistant => TurnKind::Bot,
                },
                text: e.text,
            })
            .collect()
    }

    /// The question/answer pair around an assistant entry: the entry's own
    /// text and the user entry just before it.
    fn qa_pair(&self, entry_id: usize) -> (String, String) {
        let answer = self
            .transcript
            .entry(entry_id)
            .map(|e| e.text.clone())
            .unwrap_or_default();
        let question = entry_id
            .checked_sub(1)
            .and_then(|i| self.transcript.entry(i))
            .filter(|e| e.role == Role::User)
            .map(|e| e.text.clone())
            .unwrap_or_default();
        (question, answer)
    }

    fn set_typing(&self, visible: bool) {
        self.bus.emit(ChatEvent::TypingChanged { visible });
    }
}
