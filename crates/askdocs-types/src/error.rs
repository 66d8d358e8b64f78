use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ChatError {
    #[error("Channel is not open")]
    ChannelNotOpen,

    #[error("A request is already in progress")]
    RequestInProgress,

    #[error("Invalid transcript entry: {0}")]
    InvalidEntry(usize),

    #[error("Malformed answer payload: {0}")]
    MalformedAnswer(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Authentication error: {0}")]
    Auth(String),
}

impl From<serde_json::Error> for ChatError {
    fn from(e: serde_json::Error) -> Self {
        ChatError::Serialization(e.to_string())
    }
}
