//! Chat panel — transcript, citation chips, rating buttons, typing
//! indicator and the question input.

use egui::{self, Align, Layout, RichText, ScrollArea, Vec2};

use askdocs_core::correlate::dedup_citations;
use askdocs_types::entry::{Role, Sentiment, TranscriptEntry};

use crate::state::UiState;
use crate::theme::*;

/// Interactions the panel hands back to the composition root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatAction {
    Submit(String),
    Rate { entry_id: usize, sentiment: Sentiment },
    OpenCitation { entry_id: usize, source_id: String },
    ConfirmClear,
}

/// Render the chat panel. Returns Some(action) when the user interacts.
/// `min_question_len` mirrors the engine's own submit gate.
pub fn chat_panel(
    ui: &mut egui::Ui,
    state: &mut UiState,
    min_question_len: usize,
) -> Option<ChatAction> {
    let mut action = None;

    egui::Frame::default()
        .fill(BG_PRIMARY)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.vertical(|ui| {
                // Header
                ui.horizontal(|ui| {
                    ui.heading(RichText::new("Ask your documents").color(TEXT_PRIMARY).strong());
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if ui.button(RichText::new("Clear chat").color(TEXT_SECONDARY)).clicked() {
                            state.confirm_clear = true;
                        }
                    });
                });

                if let Some(message) = &state.error_banner {
                    let message = message.clone();
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(&message).color(ERROR).small());
                        if ui.small_button("✕").clicked() {
                            state.error_banner = None;
                        }
                    });
                }

                ui.separator();

                // Messages area
                let available_height = ui.available_height() - 60.0;
                ScrollArea::vertical()
                    .max_height(available_height)
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        for entry in &state.entries {
                            if let Some(a) = render_entry(ui, entry) {
                                action = Some(a);
                            }
                            ui.add_space(4.0);
                        }

                        if state.typing {
                            render_typing_indicator(ui);
                        }
                    });

                ui.add_space(8.0);

                // Input area
                ui.horizontal(|ui| {
                    let input = egui::TextEdit::singleline(&mut state.input_text)
                        .hint_text("Type a question for your documents...")
                        .desired_width(ui.available_width() - 70.0)
                        .font(egui::FontId::proportional(14.0));

                    let response = ui.add(input);

                    let send_enabled = state.can_submit(min_question_len);
                    let send_btn = ui.add_enabled(
                        send_enabled,
                        egui::Button::new(RichText::new("Send").color(BG_PRIMARY))
                            .fill(if send_enabled { ACCENT } else { BG_SURFACE })
                            .corner_radius(PANEL_ROUNDING)
                            .min_size(Vec2::new(60.0, 0.0)),
                    );

                    // Submit on Enter or button click
                    if (response.lost_focus()
                        && ui.input(|i| i.key_pressed(egui::Key::Enter))
                        && send_enabled)
                        || send_btn.clicked()
                    {
                        let text = state.input_text.trim().to_string();
                        action = Some(ChatAction::Submit(text));
                        state.input_text.clear();
                        response.request_focus();
                    }
                });
            });
        });

    if state.confirm_clear {
        if let Some(confirmed) = confirm_clear_dialog(ui.ctx()) {
            state.confirm_clear = false;
            if confirmed {
                action = Some(ChatAction::ConfirmClear);
            }
        }
    }

    action
}

fn render_entry(ui: &mut egui::Ui, entry: &TranscriptEntry) -> Option<ChatAction> {
    let mut action = None;

    let (label, label_color, layout) = match entry.role {
        Role::User => ("You", ACCENT, Layout::top_down(Align::Max)),
        Role::Assistant => ("Assistant", SUCCESS, Layout::top_down(Align::Min)),
    };

    ui.with_layout(layout, |ui| {
        egui::Frame::default()
            .fill(BG_SECONDARY)
            .corner_radius(PANEL_ROUNDING)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.set_max_width(ui.available_width() * 0.75);
                ui.label(RichText::new(label).color(label_color).strong().small());
                ui.label(RichText::new(&entry.text).color(TEXT_PRIMARY));

                // Grounded answers carry citation chips and rating buttons;
                // the greeting carries neither.
                if entry.role == Role::Assistant
                    && !entry.is_greeting()
                    && !entry.citations.is_empty()
                {
                    ui.add_space(4.0);
                    ui.horizontal_wrapped(|ui| {
                        for citation in dedup_citations(&entry.citations) {
                            let chip = egui::Button::new(
                                RichText::new(truncate_name(&citation.name))
                                    .color(BG_PRIMARY)
                                    .small(),
                            )
                            .fill(CITATION)
                            .corner_radius(PANEL_ROUNDING);
                            if ui.add(chip).clicked() {
                                action = Some(ChatAction::OpenCitation {
                                    entry_id: entry.id,
                                    source_id: citation.source_id.clone(),
                                });
                            }
                        }

                        if let Some(a) = rating_buttons(ui, entry) {
                            action = Some(a);
                        }
                    });
                }
            });
    });

    action
}

fn rating_buttons(ui: &mut egui::Ui, entry: &TranscriptEntry) -> Option<ChatAction> {
    let mut action = None;
    for (icon, sentiment) in [("👍", Sentiment::Positive), ("👎", Sentiment::Negative)] {
        let selected = entry.sentiment == sentiment;
        if ui.selectable_label(selected, icon).clicked() {
            action = Some(ChatAction::Rate {
                entry_id: entry.id,
                sentiment,
            });
        }
    }
    action
}

fn render_typing_indicator(ui: &mut egui::Ui) {
    egui::Frame::default()
        .fill(BG_SECONDARY)
        .corner_radius(PANEL_ROUNDING)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.label(RichText::new("Assistant is typing…").color(TEXT_SECONDARY).italics());
        });
}

/// Returns Some(true) on confirm, Some(false) on cancel, None while open.
fn confirm_clear_dialog(ctx: &egui::Context) -> Option<bool> {
    let mut result = None;
    egui::Window::new("Clear conversation?")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, Vec2::ZERO)
        .show(ctx, |ui| {
            ui.label("This removes the whole conversation and cannot be undone.");
            ui.horizontal(|ui| {
                if ui.button("Cancel").clicked() {
                    result = Some(false);
                }
                let clear = egui::Button::new(RichText::new("Clear").color(BG_PRIMARY))
                    .fill(ERROR)
                    .corner_radius(PANEL_ROUNDING);
                if ui.add(clear).clicked() {
                    result = Some(true);
                }
            });
        });
    result
}

/// Long document names collapse to "start...end" on the chip.
pub(crate) fn truncate_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() > 20 {
        let head: String = chars[..12].iter().collect();
        let tail: String = chars[chars.len() - 3..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        name.to_string()
    }
}
