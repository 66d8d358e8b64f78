#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::{HashMap, VecDeque};
    use std::rc::Rc;

    use async_trait::async_trait;

    use askdocs_types::{
        ChatError, Result,
        config::ChatConfig,
        entry::{Citation, Role, Sentiment},
        event::{ChannelEvent, ChannelState, ChatEvent},
        session::Session,
        wire::{DocumentRef, FeedbackSubmission, QuestionMessage, TurnKind},
    };

    use crate::controller::SessionController;
    use crate::correlate::{dedup_citations, parse_answer, Correlation};
    use crate::event_bus::EventBus;
    use crate::ports::*;
    use crate::store::SessionStore;
    use crate::transcript::Transcript;

    // Simple single-threaded executor; every awaited mock completes
    // immediately, so polling never actually spins.
    fn block_on<F: std::future::Future<Output = T>, T>(f: F) -> T {
        use std::sync::Arc;
        use std::task::{Context, Poll, Wake, Waker};

        struct NoopWaker;
        impl Wake for NoopWaker {
            fn wake(self: Arc<Self>) {}
        }

        let waker = Waker::from(Arc::new(NoopWaker));
        let mut cx = Context::from_waker(&waker);
        let mut f = std::pin::pin!(f);

        loop {
            match f.as_mut().poll(&mut cx) {
                Poll::Ready(val) => return val,
                Poll::Pending => std::thread::yield_now(),
            }
        }
    }

    // ─── Mock ports ──────────────────────────────────────────

    struct MockStorage {
        data: RefCell<HashMap<String, Vec<u8>>>,
        set_calls: Cell<usize>,
        fail_sets: Cell<bool>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                data: RefCell::new(HashMap::new()),
                set_calls: Cell::new(0),
                fail_sets: Cell::new(false),
            }
        }
    }

    #[async_trait(?Send)]
    impl StoragePort for MockStorage {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            Ok(self.data.borrow().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
            self.set_calls.set(self.set_calls.get() + 1);
            if self.fail_sets.get() {
                return Err(ChatError::Storage("quota exceeded".to_string()));
            }
            self.data.borrow_mut().insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.data.borrow_mut().remove(key);
            Ok(())
        }

        fn backend_name(&self) -> &str {
            "mock"
        }
    }

    struct MockChannel {
        state: Cell<ChannelState>,
        sent: RefCell<Vec<QuestionMessage>>,
        events: RefCell<VecDeque<ChannelEvent>>,
        open_calls: Cell<usize>,
        close_calls: Cell<usize>,
        fail_send: Cell<bool>,
        fail_open: Cell<bool>,
    }

    impl MockChannel {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                state: Cell::new(ChannelState::Closed),
                sent: RefCell::new(Vec::new()),
                events: RefCell::new(VecDeque::new()),
                open_calls: Cell::new(0),
                close_calls: Cell::new(0),
                fail_send: Cell::new(false),
                fail_open: Cell::new(false),
            })
        }

        fn push_answer(&self, raw: &str) {
            self.events.borrow_mut().push_back(ChannelEvent::Message {
                raw: raw.to_string(),
            });
        }

        fn push_closed(&self, user_initiated: bool) {
            self.events
                .borrow_mut()
                .push_back(ChannelEvent::Closed { user_initiated });
        }
    }

    #[async_trait(?Send)]
    impl ChannelPort for MockChannel {
        fn state(&self) -> ChannelState {
            self.state.get()
        }

        async fn open(&self) -> Result<()> {
            self.open_calls.set(self.open_calls.get() + 1);
            if self.fail_open.get() {
                return Err(ChatError::Network("refused".to_string()));
            }
            self.state.set(ChannelState::Open);
            Ok(())
        }

        fn send(&self, msg: &QuestionMessage) -> Result<()> {
            if self.state.get() != ChannelState::Open {
                return Err(ChatError::ChannelNotOpen);
            }
            if self.fail_send.get() {
                return Err(ChatError::Network("broken pipe".to_string()));
            }
            self.sent.borrow_mut().push(msg.clone());
            Ok(())
        }

        fn close(&self) {
            self.close_calls.set(self.close_calls.get() + 1);
            self.state.set(ChannelState::Closed);
        }

        fn drain_events(&self) -> Vec<ChannelEvent> {
            self.events.borrow_mut().drain(..).collect()
        }

        fn has_events(&self) -> bool {
            !self.events.borrow().is_empty()
        }
    }

    struct MockGateway {
        feedback: RefCell<Vec<FeedbackSubmission>>,
        fail: Cell<bool>,
    }

    impl MockGateway {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                feedback: RefCell::new(Vec::new()),
                fail: Cell::new(false),
            })
        }
    }

    #[async_trait(?Send)]
    impl GatewayPort for MockGateway {
        async fn submit_feedback(&self, feedback: &FeedbackSubmission) -> Result<()> {
            if self.fail.get() {
                return Err(ChatError::Network("503".to_string()));
            }
            self.feedback.borrow_mut().push(feedback.clone());
            Ok(())
        }

        async fn resolve_citation(&self, source_id: &str) -> Result<DocumentRef> {
            if self.fail.get() {
                return Err(ChatError::Network("503".to_string()));
            }
            Ok(DocumentRef {
                id: source_id.to_string(),
                name: format!("{}.pdf", source_id),
                source: None,
            })
        }

        async fn list_documents(&self) -> Result<Vec<DocumentRef>> {
            Ok(Vec::new())
        }

        async fn delete_document(&self, _id: &str) -> Result<()> {
            Ok(())
        }
    }

    struct MockCredentials;

    impl CredentialsPort for MockCredentials {
        fn token(&self) -> Option<String> {
            Some("test-token".to_string())
        }

        fn given_name(&self) -> Option<String> {
            Some("Test".to_string())
        }

        fn email(&self) -> Option<String> {
            Some("test@example.com".to_string())
        }

        fn logout(&self) {}
    }

    struct MockDelay {
        calls: RefCell<Vec<u32>>,
    }

    impl MockDelay {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                calls: RefCell::new(Vec::new()),
            })
        }
    }

    #[async_trait(?Send)]
    impl DelayPort for MockDelay {
        async fn delay_ms(&self, ms: u32) {
            self.calls.borrow_mut().push(ms);
        }
    }

    struct Harness {
        controller: SessionController,
        channel: Rc<MockChannel>,
        gateway: Rc<MockGateway>,
        storage: Rc<MockStorage>,
        delay: Rc<MockDelay>,
        bus: EventBus,
    }

    fn make_harness() -> Harness {
        let storage = Rc::new(MockStorage::new());
        let channel = MockChannel::new();
        let gateway = MockGateway::new();
        let delay = MockDelay::new();
        let bus = EventBus::new();
        let controller = block_on(SessionController::restore(
            ChatConfig::default(),
            storage.clone(),
            channel.clone(),
            gateway.clone(),
            Rc::new(MockCredentials),
            delay.clone(),
            bus.clone(),
        ));
        // Drop the restore-time snapshot event
        let _ = bus.drain();
        Harness {
            controller,
            channel,
            gateway,
            storage,
            delay,
            bus,
        }
    }

    fn transcript_of(bus: &EventBus) -> Option<Vec<askdocs_types::entry::TranscriptEntry>> {
        bus.drain().into_iter().rev().find_map(|e| match e {
            ChatEvent::TranscriptChanged { entries } => Some(entries),
            _ => None,
        })
    }

    const PLAIN_ANSWER: &str = r#"[{"answer":"Hello!","doc_ids":[],"texts":[],"names":[]}]"#;

    // ─── EventBus Tests ──────────────────────────────────────

    #[test]
    fn test_event_bus_emit_and_drain() {
        let bus = EventBus::new();
        bus.emit(ChatEvent::TypingChanged { visible: true });
        bus.emit(ChatEvent::TypingChanged { visible: false });
        assert!(bus.has_pending());
        assert_eq!(bus.drain().len(), 2);
        assert!(!bus.has_pending());
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_event_bus_clone_shares_state() {
        let bus1 = EventBus::new();
        let bus2 = bus1.clone();
        bus1.emit(ChatEvent::TypingChanged { visible: true });
        assert!(bus2.has_pending());
        assert_eq!(bus2.drain().len(), 1);
        assert!(!bus1.has_pending());
    }

    // ─── Correlation Tests ───────────────────────────────────

    #[test]
    fn test_correlation_single_pending_slot() {
        let mut correlation = Correlation::new();
        assert!(!correlation.is_pending());

        let first = correlation.begin().unwrap();
        assert!(correlation.is_pending());
        assert!(matches!(
            correlation.begin(),
            Err(ChatError::RequestInProgress)
        ));

        let completed = correlation.complete().unwrap();
        assert_eq!(completed, first);
        assert!(!correlation.is_pending());
    }

    #[test]
    fn test_correlation_complete_without_pending() {
        let mut correlation = Correlation::new();
        assert!(correlation.complete().is_none());
    }

    #[test]
    fn test_correlation_cancel_clears_pending() {
        let mut correlation = Correlation::new();
        correlation.begin().unwrap();
        correlation.cancel();
        assert!(!correlation.is_pending());
        assert!(correlation.begin().is_ok());
    }

    // ─── Answer Parsing Tests ────────────────────────────────

    #[test]
    fn test_parse_answer_zips_citation_arrays() {
        let raw = r#"[{"answer":"See chapter 2.","doc_ids":["a","b"],"texts":["t1","t2"],"names":["x.pdf","y.pdf"]}]"#;
        let parsed = parse_answer(raw).unwrap();
        assert_eq!(parsed.answer, "See chapter 2.");
        assert_eq!(parsed.citations.len(), 2);
        assert_eq!(parsed.citations[0].source_id, "a");
        assert_eq!(parsed.citations[0].excerpt, "t1");
        assert_eq!(parsed.citations[1].name, "y.pdf");
    }

    #[test]
    fn test_parse_answer_without_citations() {
        let parsed = parse_answer(PLAIN_ANSWER).unwrap();
        assert_eq!(parsed.answer, "Hello!");
        assert!(parsed.citations.is_empty());
    }

    #[test]
    fn test_parse_answer_rejects_invalid_json() {
        assert!(matches!(
            parse_answer("{{nope"),
            Err(ChatError::MalformedAnswer(_))
        ));
    }

    #[test]
    fn test_parse_answer_rejects_wrong_element_count() {
        assert!(matches!(
            parse_answer("[]"),
            Err(ChatError::MalformedAnswer(_))
        ));
        let two = r#"[{"answer":"a"},{"answer":"b"}]"#;
        assert!(matches!(
            parse_answer(two),
            Err(ChatError::MalformedAnswer(_))
        ));
    }

    #[test]
    fn test_parse_answer_rejects_error_frame() {
        // The backend answers empty input with an error object, not an array
        assert!(parse_answer(r#"{"error":"Empty input"}"#).is_err());
    }

    // ─── Citation Dedup Tests ────────────────────────────────

    #[test]
    fn test_dedup_citations_by_source_id() {
        let citations = vec![
            Citation {
                source_id: "a".to_string(),
                name: "x.pdf".to_string(),
                excerpt: "first".to_string(),
            },
            Citation {
                source_id: "a".to_string(),
                name: "x.pdf".to_string(),
                excerpt: "second".to_string(),
            },
            Citation {
                source_id: "b".to_string(),
                name: "y.pdf".to_string(),
                excerpt: "third".to_string(),
            },
        ];
        let deduped = dedup_citations(&citations);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].source_id, "a");
        // First excerpt wins for a repeated source
        assert_eq!(deduped[0].excerpt, "first");
        assert_eq!(deduped[1].source_id, "b");
    }

    #[test]
    fn test_dedup_citations_empty() {
        assert!(dedup_citations(&[]).is_empty());
    }

    // ─── Session Store Tests ─────────────────────────────────

    #[test]
    fn test_store_load_absent_is_none() {
        let store = SessionStore::new(Rc::new(MockStorage::new()), "k");
        assert!(block_on(store.load()).is_none());
    }

    #[test]
    fn test_store_load_malformed_is_none() {
        let storage = Rc::new(MockStorage::new());
        storage
            .data
            .borrow_mut()
            .insert("k".to_string(), b"not json".to_vec());
        let store = SessionStore::new(storage, "k");
        assert!(block_on(store.load()).is_none());
    }

    #[test]
    fn test_store_save_load_roundtrip() {
        let store = SessionStore::new(Rc::new(MockStorage::new()), "k");
        let session = Session::new(vec![
            askdocs_types::entry::TranscriptEntry::greeting("Hi"),
            askdocs_types::entry::TranscriptEntry::user(1, "hi there"),
        ]);
        block_on(store.save(&session));
        let loaded = block_on(store.load()).unwrap();
        assert_eq!(loaded, session);
    }

    #[test]
    fn test_store_save_failure_is_swallowed() {
        let storage = Rc::new(MockStorage::new());
        storage.fail_sets.set(true);
        let store = SessionStore::new(storage, "k");
        // Must not panic or error
        block_on(store.save(&Session::new(Vec::new())));
    }

    // ─── Transcript Engine Tests ─────────────────────────────

    fn make_transcript() -> (Transcript, Rc<MockStorage>, EventBus) {
        let storage = Rc::new(MockStorage::new());
        let bus = EventBus::new();
        let store = SessionStore::new(storage.clone(), "askdocs:session");
        let transcript = block_on(Transcript::restore(store, bus.clone(), "Hi"));
        let _ = bus.drain();
        (transcript, storage, bus)
    }

    #[test]
    fn test_transcript_fresh_has_greeting() {
        let (transcript, _, _) = make_transcript();
        assert_eq!(transcript.len(), 1);
        let greeting = transcript.entry(0).unwrap();
        assert!(greeting.is_greeting());
        assert_eq!(greeting.role, Role::Assistant);
        assert_eq!(greeting.text, "Hi");
    }

    #[test]
    fn test_transcript_append_assigns_sequential_ids() {
        let (mut transcript, _, _) = make_transcript();
        let first = block_on(transcript.append(Role::User, "hi there", Vec::new()));
        let second = block_on(transcript.append(Role::Assistant, "Hello!", Vec::new()));
        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(transcript.len(), 3);
    }

    #[test]
    fn test_transcript_every_mutation_persists() {
        let (mut transcript, storage, _) = make_transcript();
        let before = storage.set_calls.get();
        block_on(transcript.append(Role::User, "one", Vec::new()));
        block_on(transcript.append(Role::Assistant, "two", Vec::new()));
        block_on(transcript.set_sentiment(2, Sentiment::Positive)).unwrap();
        assert_eq!(storage.set_calls.get(), before + 3);
    }

    #[test]
    fn test_transcript_mutation_notifies() {
        let (mut transcript, _, bus) = make_transcript();
        block_on(transcript.append(Role::User, "hi there", Vec::new()));
        let entries = transcript_of(&bus).expect("TranscriptChanged expected");
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_transcript_set_sentiment_rejects_greeting() {
        let (mut transcript, _, _) = make_transcript();
        let result = block_on(transcript.set_sentiment(0, Sentiment::Positive));
        assert!(matches!(result, Err(ChatError::InvalidEntry(0))));
        assert_eq!(transcript.entry(0).unwrap().sentiment, Sentiment::Unset);
    }

    #[test]
    fn test_transcript_set_sentiment_rejects_out_of_range() {
        let (mut transcript, _, _) = make_transcript();
        let result = block_on(transcript.set_sentiment(9, Sentiment::Negative));
        assert!(matches!(result, Err(ChatError::InvalidEntry(9))));
    }

    #[test]
    fn test_transcript_rerating_overwrites() {
        let (mut transcript, _, _) = make_transcript();
        block_on(transcript.append(Role::User, "hi there", Vec::new()));
        block_on(transcript.append(Role::Assistant, "Hello!", Vec::new()));
        block_on(transcript.set_sentiment(2, Sentiment::Positive)).unwrap();
        block_on(transcript.set_sentiment(2, Sentiment::Negative)).unwrap();
        assert_eq!(transcript.entry(2).unwrap().sentiment, Sentiment::Negative);
    }

    #[test]
    fn test_transcript_reset_leaves_single_greeting() {
        let (mut transcript, storage, _) = make_transcript();
        block_on(transcript.append(Role::User, "hi there", Vec::new()));
        block_on(transcript.append(Role::Assistant, "Hello!", Vec::new()));
        let before = storage.set_calls.get();
        block_on(transcript.reset("Hi"));
        assert_eq!(transcript.len(), 1);
        assert!(transcript.entry(0).unwrap().is_greeting());
        // The cleared state hit the store immediately
        assert_eq!(storage.set_calls.get(), before + 1);
    }

    #[test]
    fn test_transcript_restores_persisted_entries() {
        let storage = Rc::new(MockStorage::new());
        let store = SessionStore::new(storage.clone(), "askdocs:session");
        let session = Session::new(vec![
            askdocs_types::entry::TranscriptEntry::greeting("Hi"),
            askdocs_types::entry::TranscriptEntry::user(1, "hi there"),
            askdocs_types::entry::TranscriptEntry::assistant(2, "Hello!", Vec::new()),
        ]);
        block_on(store.save(&session));

        let store = SessionStore::new(storage, "askdocs:session");
        let transcript = block_on(Transcript::restore(store, EventBus::new(), "Hi"));
        assert_eq!(transcript.snapshot(), session.transcript);
    }

    // ─── Session Controller Tests ────────────────────────────

    #[test]
    fn test_submit_appends_user_and_marks_pending() {
        let mut h = make_harness();
        block_on(h.controller.submit("hi there"));

        assert!(h.controller.is_typing());
        let sent = h.channel.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].data, "hi there");
        // First question: greeting is excluded, so no prior context
        assert!(sent[0].context.is_empty());

        let entries = transcript_of(&h.bus).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].role, Role::User);
        assert_eq!(entries[1].text, "hi there");
    }

    #[test]
    fn test_submit_opens_closed_channel() {
        let mut h = make_harness();
        assert_eq!(h.channel.state(), ChannelState::Closed);
        block_on(h.controller.submit("hi there"));
        assert_eq!(h.channel.open_calls.get(), 1);
        assert_eq!(h.channel.state(), ChannelState::Open);
    }

    #[test]
    fn test_submit_short_input_is_noop() {
        let mut h = make_harness();
        block_on(h.controller.submit("hi"));
        block_on(h.controller.submit("  a  "));
        assert!(!h.controller.is_typing());
        assert!(h.channel.sent.borrow().is_empty());
        assert!(transcript_of(&h.bus).is_none());
    }

    #[test]
    fn test_submit_while_pending_is_noop() {
        let mut h = make_harness();
        block_on(h.controller.submit("hi there"));
        let _ = h.bus.drain();
        block_on(h.controller.submit("second question"));
        assert_eq!(h.channel.sent.borrow().len(), 1);
        assert!(transcript_of(&h.bus).is_none());
    }

    #[test]
    fn test_answer_round_completes_exchange() {
        let mut h = make_harness();
        block_on(h.controller.submit("hi there"));
        h.channel.push_answer(PLAIN_ANSWER);
        block_on(h.controller.pump());

        assert!(!h.controller.is_typing());
        let entries = transcript_of(&h.bus).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].role, Role::User);
        assert_eq!(entries[2].role, Role::Assistant);
        assert_eq!(entries[2].text, "Hello!");
        assert!(entries[2].citations.is_empty());
    }

    #[test]
    fn test_transcript_grows_two_per_round_with_alternation() {
        let mut h = make_harness();
        for i in 0..4 {
            block_on(h.controller.submit(&format!("question {}", i)));
            h.channel.push_answer(PLAIN_ANSWER);
            block_on(h.controller.pump());
        }
        let entries = transcript_of(&h.bus).unwrap();
        assert_eq!(entries.len(), 1 + 2 * 4);
        for (i, entry) in entries.iter().enumerate().skip(1) {
            let expected = if i % 2 == 1 { Role::User } else { Role::Assistant };
            assert_eq!(entry.role, expected, "entry {} out of order", i);
        }
    }

    #[test]
    fn test_second_question_carries_context() {
        let mut h = make_harness();
        block_on(h.controller.submit("first question"));
        h.channel.push_answer(PLAIN_ANSWER);
        block_on(h.controller.pump());
        block_on(h.controller.submit("and a follow-up?"));

        let sent = h.channel.sent.borrow();
        let context = &sent[1].context;
        assert_eq!(context.len(), 2);
        assert_eq!(context[0].kind, TurnKind::User);
        assert_eq!(context[0].text, "first question");
        assert_eq!(context[1].kind, TurnKind::Bot);
        assert_eq!(context[1].text, "Hello!");
    }

    #[test]
    fn test_answer_with_citations_lands_on_entry() {
        let mut h = make_harness();
        block_on(h.controller.submit("what does the report say?"));
        h.channel.push_answer(
            r#"[{"answer":"See chapter 2.","doc_ids":["a","a","b"],"texts":["t1","t2","t3"],"names":["x.pdf","x.pdf","y.pdf"]}]"#,
        );
        block_on(h.controller.pump());

        let entries = transcript_of(&h.bus).unwrap();
        let answer = &entries[2];
        assert_eq!(answer.citations.len(), 3);
        // Affordances collapse to one per source document
        let affordances = dedup_citations(&answer.citations);
        assert_eq!(affordances.len(), 2);
        assert_eq!(affordances[0].source_id, "a");
        assert_eq!(affordances[1].source_id, "b");
    }

    #[test]
    fn test_malformed_answer_leaves_transcript_intact() {
        let mut h = make_harness();
        block_on(h.controller.submit("hi there"));
        let _ = h.bus.drain();
        h.channel.push_answer("{{garbage");
        block_on(h.controller.pump());

        assert!(!h.controller.is_typing());
        // No assistant entry was appended
        assert!(transcript_of(&h.bus).is_none());
    }

    #[test]
    fn test_stale_answer_after_clear_is_dropped() {
        let mut h = make_harness();
        block_on(h.controller.submit("hi there"));
        block_on(h.controller.clear());
        let _ = h.bus.drain();

        // The in-flight answer arrives for the superseded request
        h.channel.push_answer(PLAIN_ANSWER);
        block_on(h.controller.pump());
        assert!(transcript_of(&h.bus).is_none());
        assert!(!h.controller.is_typing());
    }

    #[test]
    fn test_send_failure_clears_pending() {
        let mut h = make_harness();
        h.channel.fail_send.set(true);
        block_on(h.controller.submit("hi there"));

        // The user entry stands, but the typing indicator is recoverable
        assert!(!h.controller.is_typing());
        let events = h.bus.drain();
        assert!(events
            .iter()
            .any(|e| matches!(e, ChatEvent::TransientError { .. })));
        h.channel.fail_send.set(false);
        block_on(h.controller.submit("retry works"));
        assert!(h.controller.is_typing());
    }

    #[test]
    fn test_open_failure_clears_pending() {
        let mut h = make_harness();
        h.channel.fail_open.set(true);
        block_on(h.controller.submit("hi there"));
        assert!(!h.controller.is_typing());
    }

    #[test]
    fn test_clear_resets_to_greeting_and_recycles_channel() {
        let mut h = make_harness();
        block_on(h.controller.submit("hi there"));
        let saves_before = h.storage.set_calls.get();
        block_on(h.controller.clear());

        let entries = transcript_of(&h.bus).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_greeting());
        assert!(h.storage.set_calls.get() > saves_before);
        assert!(!h.controller.is_typing());
        assert_eq!(h.channel.close_calls.get(), 1);
        // A fresh channel was opened for subsequent use
        assert_eq!(h.channel.state(), ChannelState::Open);
    }

    #[test]
    fn test_unexpected_drop_reopens_once() {
        let mut h = make_harness();
        block_on(h.controller.submit("hi there"));
        let opens_before = h.channel.open_calls.get();
        h.channel.state.set(ChannelState::Closed);
        h.channel.push_closed(false);
        block_on(h.controller.pump());

        assert!(!h.controller.is_typing());
        assert_eq!(h.channel.open_calls.get(), opens_before + 1);
    }

    #[test]
    fn test_user_initiated_close_does_not_reopen() {
        let mut h = make_harness();
        let opens_before = h.channel.open_calls.get();
        h.channel.push_closed(true);
        block_on(h.controller.pump());
        assert_eq!(h.channel.open_calls.get(), opens_before);
    }

    #[test]
    fn test_easter_egg_is_scripted_and_offline() {
        let mut h = make_harness();
        let trigger = ChatConfig::default().easter_egg.trigger;
        block_on(h.controller.submit(&trigger));

        // No network call was made
        assert!(h.channel.sent.borrow().is_empty());
        assert_eq!(h.channel.open_calls.get(), 0);
        // The fixed delay elapsed
        assert_eq!(h.delay.calls.borrow().as_slice(), &[3000]);

        let entries = transcript_of(&h.bus).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].role, Role::User);
        assert_eq!(entries[2].role, Role::Assistant);
        assert_eq!(entries[2].text, ChatConfig::default().easter_egg.reply);
        assert!(!h.controller.is_typing());
    }

    #[test]
    fn test_rate_sets_sentiment_and_prompts_feedback() {
        let mut h = make_harness();
        block_on(h.controller.submit("hi there"));
        h.channel.push_answer(PLAIN_ANSWER);
        block_on(h.controller.pump());
        let _ = h.bus.drain();

        block_on(h.controller.rate(2, Sentiment::Positive)).unwrap();

        let events = h.bus.drain();
        let prompt = events
            .iter()
            .find_map(|e| match e {
                ChatEvent::FeedbackPrompt {
                    entry_id,
                    sentiment,
                    question,
                    answer,
                } => Some((*entry_id, *sentiment, question.clone(), answer.clone())),
                _ => None,
            })
            .expect("FeedbackPrompt expected");
        assert_eq!(prompt.0, 2);
        assert_eq!(prompt.1, Sentiment::Positive);
        assert_eq!(prompt.2, "hi there");
        assert_eq!(prompt.3, "Hello!");
    }

    #[test]
    fn test_rate_greeting_fails_and_changes_nothing() {
        let mut h = make_harness();
        let result = block_on(h.controller.rate(0, Sentiment::Positive));
        assert!(matches!(result, Err(ChatError::InvalidEntry(0))));
        assert!(h.bus.drain().is_empty());
    }

    #[test]
    fn test_rate_out_of_range_fails() {
        let mut h = make_harness();
        let result = block_on(h.controller.rate(42, Sentiment::Negative));
        assert!(matches!(result, Err(ChatError::InvalidEntry(42))));
    }

    #[test]
    fn test_send_feedback_packages_qa_pair() {
        let mut h = make_harness();
        block_on(h.controller.submit("hi there"));
        h.channel.push_answer(PLAIN_ANSWER);
        block_on(h.controller.pump());

        block_on(h.controller.send_feedback(2, Sentiment::Negative, "too vague"));

        let feedback = h.gateway.feedback.borrow();
        assert_eq!(feedback.len(), 1);
        assert_eq!(feedback[0].feedback_type, "negative");
        assert_eq!(feedback[0].feedback_text, "too vague");
        assert!(feedback[0].feedback_to.contains("hi there"));
        assert!(feedback[0].feedback_to.contains("Hello!"));
        assert_eq!(feedback[0].email, "test@example.com");
    }

    #[test]
    fn test_send_feedback_failure_never_blocks() {
        let mut h = make_harness();
        block_on(h.controller.submit("hi there"));
        h.channel.push_answer(PLAIN_ANSWER);
        block_on(h.controller.pump());
        let _ = h.bus.drain();

        h.gateway.fail.set(true);
        block_on(h.controller.send_feedback(2, Sentiment::Positive, "nice"));
        let events = h.bus.drain();
        assert!(events
            .iter()
            .any(|e| matches!(e, ChatEvent::TransientError { .. })));
    }

    #[test]
    fn test_open_citation_resolves_and_emits_all_excerpts() {
        let mut h = make_harness();
        block_on(h.controller.submit("what does the report say?"));
        h.channel.push_answer(
            r#"[{"answer":"See chapter 2.","doc_ids":["a","a"],"texts":["t1","t2"],"names":["x.pdf","x.pdf"]}]"#,
        );
        block_on(h.controller.pump());
        let _ = h.bus.drain();

        block_on(h.controller.open_citation(2, "a")).unwrap();

        let events = h.bus.drain();
        let resolved = events
            .iter()
            .find_map(|e| match e {
                ChatEvent::CitationResolved {
                    entry_id,
                    document_url,
                    excerpts,
                } => Some((*entry_id, document_url.clone(), excerpts.clone())),
                _ => None,
            })
            .expect("CitationResolved expected");
        assert_eq!(resolved.0, 2);
        assert!(resolved.1.ends_with("/uploads/a.pdf"));
        // Every excerpt of the entry travels to the viewer
        assert_eq!(resolved.2, vec!["t1".to_string(), "t2".to_string()]);
    }

    #[test]
    fn test_open_citation_on_greeting_fails() {
        let mut h = make_harness();
        let result = block_on(h.controller.open_citation(0, "a"));
        assert!(matches!(result, Err(ChatError::InvalidEntry(0))));
    }

    #[test]
    fn test_open_citation_failure_is_transient() {
        let mut h = make_harness();
        block_on(h.controller.submit("what does the report say?"));
        h.channel.push_answer(
            r#"[{"answer":"See chapter 2.","doc_ids":["a"],"texts":["t1"],"names":["x.pdf"]}]"#,
        );
        block_on(h.controller.pump());
        let _ = h.bus.drain();

        h.gateway.fail.set(true);
        let result = block_on(h.controller.open_citation(2, "a"));
        assert!(result.is_err());
        let events = h.bus.drain();
        assert!(events
            .iter()
            .any(|e| matches!(e, ChatEvent::TransientError { .. })));
    }

    #[test]
    fn test_session_survives_restart() {
        let storage = Rc::new(MockStorage::new());
        let bus = EventBus::new();
        let mut controller = block_on(SessionController::restore(
            ChatConfig::default(),
            storage.clone(),
            MockChannel::new(),
            MockGateway::new(),
            Rc::new(MockCredentials),
            MockDelay::new(),
            bus.clone(),
        ));
        block_on(controller.submit("hi there"));
        drop(controller);

        // Second life: same storage, fresh everything else
        let bus2 = EventBus::new();
        let _restored = block_on(SessionController::restore(
            ChatConfig::default(),
            storage,
            MockChannel::new(),
            MockGateway::new(),
            Rc::new(MockCredentials),
            MockDelay::new(),
            bus2.clone(),
        ));
        let entries = transcript_of(&bus2).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].text, "hi there");
    }
}
