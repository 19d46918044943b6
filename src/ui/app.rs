use eframe::egui;
use tokio::sync::mpsc;

use crate::session::SessionHandle;
use crate::session::render::DisplayRecord;

use super::components::{chat_area, input_bar, status_bar};
use super::state::AppState;

pub struct ChatApp {
    state: AppState,
    endpoint: String,
    session: SessionHandle,
    record_receiver: mpsc::UnboundedReceiver<DisplayRecord>,
}

impl ChatApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        endpoint: String,
        username: Option<String>,
        session: SessionHandle,
        record_receiver: mpsc::UnboundedReceiver<DisplayRecord>,
    ) -> Self {
        Self {
            state: AppState::new(username),
            endpoint,
            session,
            record_receiver,
        }
    }

    fn drain_records(&mut self) {
        while let Ok(record) = self.record_receiver.try_recv() {
            self.state.push_record(record);
        }
    }

    fn send_message(&mut self, text: String) {
        let result = self.session.send(&text, self.state.username());
        self.state.commit_send(result);
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_records();
        let status = self.session.status();

        egui::SidePanel::left("status_panel")
            .resizable(true)
            .default_width(200.0)
            .show(ctx, |ui| {
                status_bar::render(ui, &self.endpoint, &status);
                ui.separator();
                ui.label("Name");
                ui.text_edit_singleline(&mut self.state.username_input);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("WebSocket Chat");
            ui.separator();
            chat_area::render(ui, &self.state.records);

            ui.separator();
            if let Some(text) = input_bar::render(ui, &mut self.state.input_text) {
                self.send_message(text);
            }
            if let Some(notice) = &self.state.notice {
                ui.colored_label(egui::Color32::RED, notice.as_str());
            }
        });

        ctx.request_repaint();
    }
}
