//! Main egui application — composes all panels and manages the chat engine.
//!
//! Controller entry points are async; each dispatch takes the controller
//! out of its cell for the operation's duration and skips when one is
//! already in flight. Channel events stay queued and are picked up on a
//! later frame.

use std::cell::RefCell;
use std::rc::Rc;

use egui::{self, Align, CentralPanel, Layout, RichText, SidePanel, TopBottomPanel};
use wasm_bindgen_futures::spawn_local;

use askdocs_core::controller::SessionController;
use askdocs_core::event_bus::EventBus;
use askdocs_core::ports::{ChannelPort, CredentialsPort, GatewayPort};
use askdocs_platform::auth::QueryTokenCredentials;
use askdocs_platform::channel::WsChannel;
use askdocs_platform::delay::BrowserDelay;
use askdocs_platform::gateway::HttpGateway;
use askdocs_platform::storage::auto_detect_storage;
use askdocs_types::config::ChatConfig;
use askdocs_types::wire::DocumentRef;
use askdocs_ui::panels::{chat, documents, feedback, viewer};
use askdocs_ui::state::UiState;
use askdocs_ui::theme;

type ControllerSlot = Rc<RefCell<Option<SessionController>>>;
type DocumentsSlot = Rc<RefCell<Option<Vec<DocumentRef>>>>;

/// The main application state
pub struct AskDocsApp {
    ui_state: UiState,
    config: ChatConfig,
    bus: EventBus,
    /// Filled once the async bootstrap (storage detect + session restore)
    /// completes
    controller: ControllerSlot,
    channel: Rc<dyn ChannelPort>,
    gateway: Rc<dyn GatewayPort>,
    credentials: Rc<QueryTokenCredentials>,
    documents: DocumentsSlot,
    first_frame: bool,
}

impl AskDocsApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let config = ChatConfig::default();
        let bus = EventBus::new();
        let credentials = Rc::new(QueryTokenCredentials::from_location());
        let channel: Rc<dyn ChannelPort> = Rc::new(WsChannel::new(
            config.query_url.clone(),
            credentials.clone(),
        ));
        let gateway: Rc<dyn GatewayPort> = Rc::new(HttpGateway::new(
            config.backend_url.clone(),
            credentials.clone(),
        ));

        let app = Self {
            ui_state: UiState::new(),
            config: config.clone(),
            bus: bus.clone(),
            controller: Rc::new(RefCell::new(None)),
            channel: channel.clone(),
            gateway: gateway.clone(),
            credentials: credentials.clone(),
            documents: Rc::new(RefCell::new(None)),
            first_frame: true,
        };

        Self::bootstrap(app.controller.clone(), config, bus, channel, gateway, credentials);
        app.refresh_documents();

        app
    }

    /// Detect storage, restore the prior session and connect the channel.
    fn bootstrap(
        slot: ControllerSlot,
        config: ChatConfig,
        bus: EventBus,
        channel: Rc<dyn ChannelPort>,
        gateway: Rc<dyn GatewayPort>,
        credentials: Rc<QueryTokenCredentials>,
    ) {
        spawn_local(async move {
            let storage = auto_detect_storage().await;
            let controller = SessionController::restore(
                config,
                storage,
                channel,
                gateway,
                credentials,
                Rc::new(BrowserDelay),
                bus,
            )
            .await;
            controller.connect().await;
            *slot.borrow_mut() = Some(controller);
            log::info!("Session ready");
        });
    }

    fn refresh_documents(&self) {
        let gateway = self.gateway.clone();
        let slot = self.documents.clone();
        spawn_local(async move {
            match gateway.list_documents().await {
                Ok(docs) => *slot.borrow_mut() = Some(docs),
                Err(e) => log::warn!("Document list failed: {}", e),
            }
        });
    }

    /// Run one async controller operation, skipping when another is in
    /// flight. The controller is taken out of its cell for the operation's
    /// duration so no borrow is ever held across an await.
    fn with_controller<F, Fut>(&self, ctx: &egui::Context, op: F)
    where
        F: FnOnce(SessionController) -> Fut + 'static,
        Fut: std::future::Future<Output = SessionController>,
    {
        let slot = self.controller.clone();
        let ctx = ctx.clone();
        spawn_local(async move {
            let taken = slot.borrow_mut().take();
            match taken {
                // A None means bootstrap has not finished yet or another
                // operation is mid-flight.
                None => log::warn!("Chat engine busy, dropping interaction"),
                Some(controller) => {
                    let controller = op(controller).await;
                    *slot.borrow_mut() = Some(controller);
                }
            }
            ctx.request_repaint();
        });
    }

    fn handle_chat_action(&mut self, action: chat::ChatAction, ctx: &egui::Context) {
        match action {
            chat::ChatAction::Submit(text) => {
                self.with_controller(ctx, move |mut controller| async move {
                    controller.submit(&text).await;
                    controller
                });
            }
            chat::ChatAction::Rate { entry_id, sentiment } => {
                self.with_controller(ctx, move |mut controller| async move {
                    if let Err(e) = controller.rate(entry_id, sentiment).await {
                        log::warn!("Rating failed: {}", e);
                    }
                    controller
                });
            }
            chat::ChatAction::OpenCitation { entry_id, source_id } => {
                self.with_controller(ctx, move |mut controller| async move {
                    let _ = controller.open_citation(entry_id, &source_id).await;
                    controller
                });
            }
            chat::ChatAction::ConfirmClear => {
                self.with_controller(ctx, move |mut controller| async move {
                    controller.clear().await;
                    controller
                });
            }
        }
    }

    fn handle_documents_action(&mut self, action: documents::DocumentsAction) {
        match action {
            documents::DocumentsAction::Refresh => self.refresh_documents(),
            documents::DocumentsAction::Delete(id) => {
                let gateway = self.gateway.clone();
                let slot = self.documents.clone();
                spawn_local(async move {
                    if let Err(e) = gateway.delete_document(&id).await {
                        log::warn!("Document delete failed: {}", e);
                        return;
                    }
                    match gateway.list_documents().await {
                        Ok(docs) => *slot.borrow_mut() = Some(docs),
                        Err(e) => log::warn!("Document list failed: {}", e),
                    }
                });
            }
        }
    }

    fn handle_feedback_action(&mut self, action: feedback::FeedbackAction, ctx: &egui::Context) {
        match action {
            feedback::FeedbackAction::Submit {
                entry_id,
                sentiment,
                text,
            } => {
                self.ui_state.feedback = None;
                self.with_controller(ctx, move |controller| async move {
                    controller.send_feedback(entry_id, sentiment, &text).await;
                    controller
                });
            }
            feedback::FeedbackAction::Dismiss => {
                self.ui_state.feedback = None;
            }
        }
    }
}

impl eframe::App for AskDocsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.first_frame {
            theme::apply_theme(ctx);
            self.first_frame = false;
        }

        // Drain events from the chat engine
        let events = self.bus.drain();
        if !events.is_empty() {
            self.ui_state.process_events(events);
            ctx.request_repaint();
        }

        // Answers arrive on the channel's schedule, not the frame's. The
        // idle check keeps a queued frame from spamming the busy path
        // while a long operation holds the controller.
        if self.channel.has_events() && self.controller.borrow().is_some() {
            self.with_controller(ctx, |mut controller| async move {
                controller.pump().await;
                controller
            });
        }

        if let Some(docs) = self.documents.borrow_mut().take() {
            self.ui_state.documents = docs;
        }

        if self.ui_state.typing {
            ctx.request_repaint();
        }

        // ── Top bar ──────────────────────────────────────────
        TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new("AskDocs")
                        .strong()
                        .color(theme::ACCENT)
                        .size(16.0),
                );
                ui.separator();
                ui.label(
                    RichText::new("Chat with your documents")
                        .color(theme::TEXT_SECONDARY)
                        .small(),
                );
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    if let Some(name) = self.credentials.given_name() {
                        ui.label(
                            RichText::new(format!("Hi, {}", name))
                                .color(theme::TEXT_SECONDARY)
                                .small(),
                        );
                    }
                });
            });
        });

        // ── Documents sidebar ────────────────────────────────
        let mut documents_action = None;
        SidePanel::left("documents_panel")
            .min_width(200.0)
            .max_width(280.0)
            .show(ctx, |ui| {
                documents_action = documents::documents_panel(ui, &mut self.ui_state);
            });
        if let Some(action) = documents_action {
            self.handle_documents_action(action);
        }

        // ── Chat ─────────────────────────────────────────────
        let mut chat_action = None;
        CentralPanel::default().show(ctx, |ui| {
            chat_action = chat::chat_panel(ui, &mut self.ui_state, self.config.min_question_len);
        });
        if let Some(action) = chat_action {
            self.handle_chat_action(action, ctx);
        }

        // ── Overlays ─────────────────────────────────────────
        let mut feedback_action = None;
        if let Some(draft) = self.ui_state.feedback.as_mut() {
            feedback_action = feedback::feedback_modal(ctx, draft);
        }
        if let Some(action) = feedback_action {
            self.handle_feedback_action(action, ctx);
        }

        if let Some(view) = self.ui_state.viewer.clone() {
            if viewer::viewer_overlay(ctx, &view) {
                self.ui_state.viewer = None;
            }
        }
    }
}
