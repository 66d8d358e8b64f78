//! WASM-target tests for askdocs-types.
//!
//! Runs serde round-trips under wasm32-unknown-unknown via
//! `wasm-pack test --node`.

use wasm_bindgen_test::*;

use askdocs_types::entry::{Role, Sentiment, TranscriptEntry};
use askdocs_types::session::Session;
use askdocs_types::wire::AnswerPayload;

#[wasm_bindgen_test]
fn entry_roundtrip() {
    let entry = TranscriptEntry::user(1, "hi there");
    let json = serde_json::to_string(&entry).unwrap();
    let back: TranscriptEntry = serde_json::from_str(&json).unwrap();
    assert_eq!(back.role, Role::User);
    assert_eq!(back.sentiment, Sentiment::Unset);
}

#[wasm_bindgen_test]
fn session_roundtrip() {
    let session = Session::new(vec![TranscriptEntry::greeting("Hi")]);
    let json = serde_json::to_string(&session).unwrap();
    let back: Session = serde_json::from_str(&json).unwrap();
    assert_eq!(back, session);
}

#[wasm_bindgen_test]
fn answer_payload_parses() {
    let payload: AnswerPayload =
        serde_json::from_str(r#"{"answer":"Hello!","doc_ids":[],"texts":[],"names":[]}"#)
            .unwrap();
    assert_eq!(payload.answer, "Hello!");
}
