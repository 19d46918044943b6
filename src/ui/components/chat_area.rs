use eframe::egui;

use crate::session::render::DisplayRecord;

pub fn render(ui: &mut egui::Ui, records: &[DisplayRecord]) {
    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            for record in records {
                ui.horizontal_wrapped(|ui| {
                    ui.label(egui::RichText::new(&record.author_text).strong());
                    ui.label(record.body_text.as_str());
                    ui.label(egui::RichText::new(&record.posted_at_text).weak())
                        .on_hover_text(record.posted_at_iso.as_str());
                });
            }
        });
}
