//! WASM-target tests for askdocs-platform.
//!
//! Runs storage and credential-parsing checks under
//! wasm32-unknown-unknown via `wasm-pack test --node`.

use wasm_bindgen_test::*;

use askdocs_core::ports::{CredentialsPort, StoragePort};
use askdocs_platform::auth::QueryTokenCredentials;
use askdocs_platform::storage::MemoryStorage;

#[wasm_bindgen_test]
async fn memory_storage_roundtrip() {
    let storage = MemoryStorage::new();
    storage.set("askdocs:session", b"{}").await.unwrap();
    let data = storage.get("askdocs:session").await.unwrap().unwrap();
    assert_eq!(data, b"{}");

    storage.delete("askdocs:session").await.unwrap();
    assert!(storage.get("askdocs:session").await.unwrap().is_none());
}

#[wasm_bindgen_test]
fn memory_storage_backend_name() {
    assert_eq!(MemoryStorage::new().backend_name(), "memory");
}

#[wasm_bindgen_test]
fn credentials_from_query() {
    let credentials =
        QueryTokenCredentials::from_query("?token=abc123&given_name=Ada&email=ada%40example.com");
    assert_eq!(credentials.token().as_deref(), Some("abc123"));
    assert_eq!(credentials.given_name().as_deref(), Some("Ada"));
    assert!(credentials.email().is_some());
}

#[wasm_bindgen_test]
fn credentials_missing_params() {
    let credentials = QueryTokenCredentials::from_query("");
    assert!(credentials.token().is_none());
    assert!(credentials.given_name().is_none());
}
