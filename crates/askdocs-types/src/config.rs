use serde::{Deserialize, Serialize};

/// Client configuration. Defaults target a same-host backend; deployments
/// override the urls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Base url for the REST side channels (feedback, documents)
    pub backend_url: String,
    /// Websocket endpoint of the answering service
    pub query_url: String,
    /// Assistant greeting shown as entry 0 of every fresh transcript
    pub greeting: String,
    /// Questions shorter than this are silently ignored
    pub min_question_len: usize,
    /// Storage key the serialized session lives under
    pub session_key: String,
    pub easter_egg: EasterEggConfig,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
            query_url: "ws://localhost:8000/ws/query".to_string(),
            greeting: DEFAULT_GREETING.to_string(),
            min_question_len: 3,
            session_key: "askdocs:session".to_string(),
            easter_egg: EasterEggConfig::default(),
        }
    }
}

/// The scripted reply: a trigger phrase bypasses the backend entirely and,
/// after a fixed delay, injects a canned assistant answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EasterEggConfig {
    /// Exact input that triggers the script
    pub trigger: String,
    /// User-side line shown in place of the trigger
    pub display: String,
    /// The canned assistant reply
    pub reply: String,
    pub delay_ms: u32,
}

impl Default for EasterEggConfig {
    fn default() -> Self {
        Self {
            trigger: "do a barrel roll".to_string(),
            display: "Do a barrel roll!".to_string(),
            reply: "a lil fun is always allowed 😉".to_string(),
            delay_ms: 3000,
        }
    }
}

const DEFAULT_GREETING: &str = "Hi, start by either uploading some documents \
on the left or start by typing your first question below...";
