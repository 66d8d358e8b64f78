//! Auto-detect the best available storage backend.
//!
//! Priority: IndexedDB → Memory (fallback). A memory fallback keeps the
//! chat usable in private-browsing modes that block IndexedDB; the session
//! then simply does not survive a reload.

use std::rc::Rc;
use askdocs_core::ports::StoragePort;
use super::{IndexedDbStorage, MemoryStorage};

/// Open the best available storage backend.
/// Returns a trait object so callers are backend-agnostic.
pub async fn auto_detect_storage() -> Rc<dyn StoragePort> {
    match IndexedDbStorage::open().await {
        Ok(idb) => {
            log::info!("Storage backend: IndexedDB");
            Rc::new(idb)
        }
        Err(e) => {
            log::warn!("IndexedDB unavailable ({}), falling back to memory", e);
            Rc::new(MemoryStorage::new())
        }
    }
}
