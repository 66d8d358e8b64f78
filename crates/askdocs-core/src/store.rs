//! Session Store — durable persistence of the serialized session.
//!
//! One record, one fixed key, always overwritten wholesale. Loads fail
//! soft: absent or malformed data means "no prior session". Saves are
//! best-effort: a quota or I/O failure is logged and the in-memory
//! transcript stands.

use std::rc::Rc;
use askdocs_types::session::Session;
use crate::ports::StoragePort;

pub struct SessionStore {
    storage: Rc<dyn StoragePort>,
    key: String,
}

impl SessionStore {
    pub fn new(storage: Rc<dyn StoragePort>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Restore the prior session, or None when nothing usable is stored.
    /// Never surfaces an error to the caller.
    pub async fn load(&self) -> Option<Session> {
        let data = match self.storage.get(&self.key).await {
            Ok(Some(data)) => data,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Session load failed on {}: {}", self.storage.backend_name(), e);
                return None;
            }
        };
        match serde_json::from_slice::<Session>(&data) {
            Ok(session) => Some(session),
            Err(e) => {
                log::warn!("Discarding malformed session record: {}", e);
                None
            }
        }
    }

    /// Overwrite the full prior record. Best-effort: failure is logged,
    /// not surfaced, and does not roll back the in-memory transcript.
    pub async fn save(&self, session: &Session) {
        let data = match serde_json::to_vec(session) {
            Ok(data) => data,
            Err(e) => {
                log::error!("Session serialization failed: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.set(&self.key, &data).await {
            log::warn!("Session save failed on {}: {}", self.storage.backend_name(), e);
        }
    }
}
