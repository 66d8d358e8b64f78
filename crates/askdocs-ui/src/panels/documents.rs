//! Documents sidebar — lists the uploaded documents the assistant answers
//! over. Upload and preview live with the backend collaborators; this
//! panel only lists and deletes.

use egui::{self, RichText, ScrollArea};

use crate::state::UiState;
use crate::theme::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentsAction {
    Refresh,
    Delete(String),
}

pub fn documents_panel(ui: &mut egui::Ui, state: &mut UiState) -> Option<DocumentsAction> {
    let mut action = None;

    egui::Frame::default()
        .fill(BG_PRIMARY)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.heading(RichText::new("Documents").color(TEXT_PRIMARY).strong());
                if ui.small_button("⟳").clicked() {
                    action = Some(DocumentsAction::Refresh);
                }
            });
            ui.separator();

            if state.documents.is_empty() {
                ui.label(
                    RichText::new("No documents yet. Upload some to get grounded answers.")
                        .color(TEXT_SECONDARY)
                        .small(),
                );
                return;
            }

            ScrollArea::vertical().auto_shrink([false, true]).show(ui, |ui| {
                for doc in &state.documents {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(&doc.name).color(TEXT_PRIMARY).small());
                        if ui.small_button("🗑").clicked() {
                            action = Some(DocumentsAction::Delete(doc.id.clone()));
                        }
                    });
                }
            });
        });

    action
}
