//! Citation viewer overlay — shows the resolved document link and the
//! excerpts that grounded the answer. The actual PDF rendering and
//! keyword highlighting belong to the external viewer the link opens.

use egui::{self, RichText, ScrollArea, Vec2};

use crate::state::CitationView;
use crate::theme::*;

/// Render the overlay. Returns true when the user closes it.
pub fn viewer_overlay(ctx: &egui::Context, view: &CitationView) -> bool {
    let mut closed = false;

    egui::Window::new("Cited document")
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, Vec2::ZERO)
        .show(ctx, |ui| {
            ui.hyperlink_to(
                RichText::new("Open document").color(CITATION),
                &view.document_url,
            );

            ui.add_space(6.0);
            ui.label(RichText::new("Relevant passages").color(TEXT_SECONDARY).small());
            ScrollArea::vertical().max_height(240.0).show(ui, |ui| {
                for excerpt in &view.excerpts {
                    egui::Frame::default()
                        .fill(BG_SECONDARY)
                        .corner_radius(PANEL_ROUNDING)
                        .inner_margin(6.0)
                        .show(ui, |ui| {
                            ui.label(RichText::new(excerpt).color(TEXT_PRIMARY).small());
                        });
                    ui.add_space(4.0);
                }
            });

            if ui.button("Close").clicked() {
                closed = true;
            }
        });

    closed
}
