//! Browser WebSocket adapter for the transport channel.
//!
//! One live socket per channel. A socket is created fresh on every
//! Connecting→Open transition and never reused after close; a generation
//! counter makes callbacks from superseded sockets inert, so frames that
//! arrive after a close or replacement are dropped rather than buffered.
//!
//! Inbound frames and close notifications are queued and drained by the
//! controller on each pump.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use async_trait::async_trait;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{CloseEvent, MessageEvent, WebSocket};

use askdocs_core::ports::{ChannelPort, CredentialsPort};
use askdocs_types::{
    ChatError, Result,
    event::{ChannelEvent, ChannelState},
    wire::QuestionMessage,
};

pub struct WsChannel {
    url: String,
    credentials: Rc<dyn CredentialsPort>,
    shared: Rc<ChannelShared>,
    socket: RefCell<Option<WebSocket>>,
}

/// State visible to the socket callbacks
struct ChannelShared {
    state: Cell<ChannelState>,
    events: RefCell<VecDeque<ChannelEvent>>,
    generation: Cell<u64>,
}

impl WsChannel {
    pub fn new(url: impl Into<String>, credentials: Rc<dyn CredentialsPort>) -> Self {
        Self {
            url: url.into(),
            credentials,
            shared: Rc::new(ChannelShared {
                state: Cell::new(ChannelState::Closed),
                events: RefCell::new(VecDeque::new()),
                generation: Cell::new(0),
            }),
            socket: RefCell::new(None),
        }
    }

    /// The answering service authenticates the socket via a token query
    /// parameter on the upgrade request.
    fn connect_url(&self) -> String {
        match self.credentials.token() {
            Some(token) => format!("{}?token={}", self.url, token),
            None => self.url.clone(),
        }
    }
}

#[async_trait(?Send)]
impl ChannelPort for WsChannel {
    fn state(&self) -> ChannelState {
        self.shared.state.get()
    }

    async fn open(&self) -> Result<()> {
        match self.shared.state.get() {
            ChannelState::Open => return Ok(()),
            ChannelState::Connecting => {
                // Two live sockets are never allowed; the caller retries
                // once the in-flight connect settles.
                return Err(ChatError::Network("channel already connecting".to_string()));
            }
            ChannelState::Closed | ChannelState::Closing => {}
        }

        let generation = self.shared.generation.get() + 1;
        self.shared.generation.set(generation);
        self.shared.state.set(ChannelState::Connecting);

        let ws = WebSocket::new(&self.connect_url()).map_err(|e| {
            self.shared.state.set(ChannelState::Closed);
            ChatError::Network(format!("{:?}", e))
        })?;

        let shared = self.shared.clone();
        let onmessage = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            if shared.generation.get() != generation {
                return;
            }
            if let Some(text) = event.data().as_string() {
                shared
                    .events
                    .borrow_mut()
                    .push_back(ChannelEvent::Message { raw: text });
            }
        });
        ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        onmessage.forget();

        let shared = self.shared.clone();
        let onclose = Closure::<dyn FnMut(CloseEvent)>::new(move |_event: CloseEvent| {
            // close() bumps the generation, so a callback that still
            // matches can only be an unexpected drop.
            if shared.generation.get() != generation {
                return;
            }
            shared.state.set(ChannelState::Closed);
            shared.events.borrow_mut().push_back(ChannelEvent::Closed {
                user_initiated: false,
            });
        });
        ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));
        onclose.forget();

        let opened = JsFuture::from(ws_open_to_promise(&ws)).await;
        if self.shared.generation.get() != generation {
            // close() superseded this connect mid-flight; the socket is
            // stale and must not be promoted.
            let _ = ws.close();
            return Err(ChatError::ChannelNotOpen);
        }
        match opened {
            Ok(_) => {
                self.shared.state.set(ChannelState::Open);
                *self.socket.borrow_mut() = Some(ws);
                Ok(())
            }
            Err(e) => {
                self.shared.state.set(ChannelState::Closed);
                Err(ChatError::Network(format!("{:?}", e)))
            }
        }
    }

    fn send(&self, msg: &QuestionMessage) -> Result<()> {
        if self.shared.state.get() != ChannelState::Open {
            return Err(ChatError::ChannelNotOpen);
        }
        let socket = self.socket.borrow();
        let ws = socket.as_ref().ok_or(ChatError::ChannelNotOpen)?;
        let json = serde_json::to_string(msg)?;
        ws.send_with_str(&json)
            .map_err(|e| ChatError::Network(format!("{:?}", e)))
    }

    fn close(&self) {
        match self.shared.state.get() {
            ChannelState::Closed | ChannelState::Closing => return,
            ChannelState::Connecting | ChannelState::Open => {}
        }
        self.shared.state.set(ChannelState::Closing);
        // Invalidate the current socket's callbacks: late frames and its
        // own close notification must not outlive a user-initiated close.
        self.shared.generation.set(self.shared.generation.get() + 1);
        if let Some(ws) = self.socket.borrow_mut().take() {
            let _ = ws.close();
        }
        self.shared.state.set(ChannelState::Closed);
        self.shared.events.borrow_mut().push_back(ChannelEvent::Closed {
            user_initiated: true,
        });
    }

    fn drain_events(&self) -> Vec<ChannelEvent> {
        self.shared.events.borrow_mut().drain(..).collect()
    }

    fn has_events(&self) -> bool {
        !self.shared.events.borrow().is_empty()
    }
}

/// Wrap the socket's onopen/onerror callbacks into a JS Promise so the
/// connect can be awaited with JsFuture.
fn ws_open_to_promise(ws: &WebSocket) -> js_sys::Promise {
    let ws_for_callbacks = ws.clone();
    js_sys::Promise::new(&mut move |resolve, reject| {
        let onopen = Closure::once(move |_: web_sys::Event| {
            let _ = resolve.call0(&JsValue::NULL);
        });
        let onerror = Closure::once(move |_: web_sys::Event| {
            let _ = reject.call1(&JsValue::NULL, &JsValue::from_str("WebSocket connect failed"));
        });
        ws_for_callbacks.set_onopen(Some(onopen.as_ref().unchecked_ref()));
        ws_for_callbacks.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onopen.forget();
        onerror.forget();
    })
}
