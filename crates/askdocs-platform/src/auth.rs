//! Credential provider adapter.
//!
//! The login flow runs outside this app: the identity provider redirects
//! back with the bearer token (and optional profile claims) in the page
//! query string. This adapter captures them once at startup and hands them
//! to the channel and gateway as an injected capability — no process-wide
//! token global.

use std::cell::RefCell;

use askdocs_core::ports::CredentialsPort;

pub struct QueryTokenCredentials {
    token: RefCell<Option<String>>,
    given_name: RefCell<Option<String>>,
    email: RefCell<Option<String>>,
}

impl QueryTokenCredentials {
    /// Read credentials from the current page url.
    pub fn from_location() -> Self {
        let search = web_sys::window()
            .and_then(|w| w.location().search().ok())
            .unwrap_or_default();
        Self::from_query(&search)
    }

    pub fn from_query(search: &str) -> Self {
        Self {
            token: RefCell::new(query_param(search, "token")),
            given_name: RefCell::new(query_param(search, "given_name")),
            email: RefCell::new(query_param(search, "email")),
        }
    }
}

impl CredentialsPort for QueryTokenCredentials {
    fn token(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    fn given_name(&self) -> Option<String> {
        self.given_name.borrow().clone()
    }

    fn email(&self) -> Option<String> {
        self.email.borrow().clone()
    }

    /// Drop the token and bounce through the login redirect.
    fn logout(&self) {
        self.token.borrow_mut().take();
        self.given_name.borrow_mut().take();
        self.email.borrow_mut().take();
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.location().reload() {
                log::warn!("Reload after logout failed: {:?}", e);
            }
        }
    }
}

fn query_param(search: &str, name: &str) -> Option<String> {
    search
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}
