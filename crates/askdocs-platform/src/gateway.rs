//! HTTP gateway for the feedback and document side channels.
//!
//! Uses browser `fetch()` via gloo-net for WASM compatibility. Every
//! request carries the bearer token from the injected credential provider;
//! a 401 logs the session out.

use std::rc::Rc;

use async_trait::async_trait;
use gloo_net::http::{Request, RequestBuilder, Response};
use serde::Deserialize;

use askdocs_core::ports::{CredentialsPort, GatewayPort};
use askdocs_types::{
    ChatError, Result,
    wire::{DocumentRef, FeedbackSubmission},
};

pub struct HttpGateway {
    base_url: String,
    credentials: Rc<dyn CredentialsPort>,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, credentials: Rc<dyn CredentialsPort>) -> Self {
        Self {
            base_url: base_url.into(),
            credentials,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.credentials.token() {
            Some(token) => builder.header("Authorization", &token),
            None => builder,
        }
    }

    /// Map a non-2xx response onto the user-facing error policy: 401 ends
    /// the session, 403 names the missing right, everything ≥500 collapses
    /// into a retryable generic message.
    fn normalize(&self, response: &Response) -> ChatError {
        match response.status() {
            401 => {
                self.credentials.logout();
                ChatError::Auth("Login required.".to_string())
            }
            403 => ChatError::Auth(
                "You do not have the right to perform this operation.".to_string(),
            ),
            status if status >= 500 => ChatError::Network(
                "An internal error occurred. Please try again in a few seconds.".to_string(),
            ),
            status => ChatError::Network(format!("HTTP {}", status)),
        }
    }

    async fn fetch_documents(&self, path: &str) -> Result<Vec<DocumentRef>> {
        let response = self
            .authorize(Request::get(&self.endpoint(path)))
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;
        if !response.ok() {
            return Err(self.normalize(&response));
        }
        let envelope: DataEnvelope = response
            .json()
            .await
            .map_err(|e| ChatError::Serialization(e.to_string()))?;
        Ok(envelope.data)
    }
}

#[async_trait(?Send)]
impl GatewayPort for HttpGateway {
    async fn submit_feedback(&self, feedback: &FeedbackSubmission) -> Result<()> {
        let response = self
            .authorize(Request::post(&self.endpoint("/api/ingest_feedback")))
            .header("Content-Type", "application/json")
            .json(feedback)
            .map_err(|e| ChatError::Serialization(e.to_string()))?
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;
        if !response.ok() {
            return Err(self.normalize(&response));
        }
        Ok(())
    }

    async fn resolve_citation(&self, source_id: &str) -> Result<DocumentRef> {
        let path = format!("/api/get_documents_by_id?id={}", source_id);
        let documents = self.fetch_documents(&path).await?;
        documents
            .into_iter()
            .next()
            .ok_or_else(|| ChatError::Network(format!("document {} not found", source_id)))
    }

    async fn list_documents(&self) -> Result<Vec<DocumentRef>> {
        self.fetch_documents("/api/get_documents").await
    }

    async fn delete_document(&self, id: &str) -> Result<()> {
        let path = format!("/api/delete_document?id={}", id);
        let response = self
            .authorize(Request::delete(&self.endpoint(&path)))
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;
        if !response.ok() {
            return Err(self.normalize(&response));
        }
        Ok(())
    }
}

// ─── API response types ──────────────────────────────────────

#[derive(Deserialize)]
struct DataEnvelope {
    data: Vec<DocumentRef>,
}
