//! Feedback capture modal — opens after a rating, pre-filled with the
//! rated question/answer pair, and collects an optional free-text comment.

use egui::{self, RichText, Vec2};

use askdocs_types::entry::Sentiment;

use crate::state::FeedbackDraft;
use crate::theme::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackAction {
    Submit {
        entry_id: usize,
        sentiment: Sentiment,
        text: String,
    },
    Dismiss,
}

pub fn feedback_modal(ctx: &egui::Context, draft: &mut FeedbackDraft) -> Option<FeedbackAction> {
    let mut action = None;

    egui::Window::new("Feedback Form")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, Vec2::ZERO)
        .show(ctx, |ui| {
            let icon = match draft.sentiment {
                Sentiment::Positive => "👍",
                _ => "👎",
            };
            ui.label(RichText::new(format!("{} Tell us more", icon)).strong());

            ui.add_space(4.0);
            ui.label(RichText::new(format!("Q: {}", draft.question)).color(TEXT_SECONDARY).small());
            ui.label(RichText::new(format!("A: {}", draft.answer)).color(TEXT_SECONDARY).small());

            ui.add_space(4.0);
            ui.label("Feedback:");
            ui.add(
                egui::TextEdit::multiline(&mut draft.text)
                    .desired_rows(3)
                    .desired_width(320.0),
            );

            ui.horizontal(|ui| {
                if ui.button("Close").clicked() {
                    action = Some(FeedbackAction::Dismiss);
                }
                let submit = egui::Button::new(RichText::new("Submit Feedback").color(BG_PRIMARY))
                    .fill(ACCENT)
                    .corner_radius(PANEL_ROUNDING);
                if ui.add(submit).clicked() {
                    action = Some(FeedbackAction::Submit {
                        entry_id: draft.entry_id,
                        sentiment: draft.sentiment,
                        text: draft.text.clone(),
                    });
                }
            });
        });

    action
}
