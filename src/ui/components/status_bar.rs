use eframe::egui;

use crate::common::{ConnectionState, SessionStatus};

pub fn render(ui: &mut egui::Ui, endpoint: &str, status: &SessionStatus) {
    ui.heading("Connection");
    ui.separator();

    let color = match status.state {
        ConnectionState::Open => egui::Color32::GREEN,
        ConnectionState::Connecting => egui::Color32::YELLOW,
        ConnectionState::Closed => egui::Color32::GRAY,
        ConnectionState::Failed => egui::Color32::RED,
    };

    ui.horizontal(|ui| {
        ui.colored_label(color, "●");
        ui.label(status.state.to_string());
        if status.attempt > 0 {
            ui.label(egui::RichText::new(format!("(attempt {})", status.attempt)).weak());
        }
    });
    ui.label(egui::RichText::new(endpoint).weak());

    if let Some(detail) = &status.detail {
        ui.separator();
        ui.colored_label(color, detail.as_str());
    }
}
