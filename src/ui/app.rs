use eframe::egui;
use egui::Layout;
use std::sync::mpsc;
use std::time::Duration;

use crate::engine::engine::Engine;
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::engine::session::SessionContext;
use crate::model::message::{Message, Role};
use crate::model::transcript::Transcript;
use crate::ui::center_panel::draw_center_panel;
use crate::ui::settings::UiSettings;
use crate::ui::settings_io::{load_settings, save_settings};

/* =========================
   UI State
   ========================= */

#[derive(Default)]
pub struct UiState {
    pub input_text: String,
    pub rendered_messages: Vec<Message>,
    pub warning: Option<String>,

    /// A question is with the engine and no response has arrived yet.
    pub waiting: bool,
    pub should_auto_scroll: bool,
    pub show_appearance: bool,
}

/* =========================
   App
   ========================= */

pub struct ChatApp {
    pub ui: UiState,
    pub settings: UiSettings,

    cmd_tx: mpsc::Sender<EngineCommand>,
    resp_rx: mpsc::Receiver<EngineResponse>,
}

impl ChatApp {
    pub fn new(ctx: SessionContext) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();

        std::thread::spawn(move || {
            let mut engine = Engine::new(cmd_rx, resp_tx, ctx);
            engine.run();
        });

        Self {
            ui: UiState {
                rendered_messages: Transcript::new().messages().to_vec(),
                ..Default::default()
            },
            settings: load_settings(),
            cmd_tx,
            resp_rx,
        }
    }

    pub fn send_command(&mut self, cmd: EngineCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            tracing::error!("engine thread is gone");
            self.ui.warning = Some("❌ The chat engine stopped. Please restart the app.".into());
            return;
        }
        self.ui.waiting = true;
    }

    fn drain_responses(&mut self) {
        while let Ok(resp) = self.resp_rx.try_recv() {
            self.ui.waiting = false;
            match resp {
                EngineResponse::FullTranscript(msgs) => {
                    self.ui.rendered_messages = msgs;
                    self.ui.warning = None;
                    self.ui.should_auto_scroll = true;
                }
                EngineResponse::Warning(text) => {
                    self.ui.warning = Some(text);
                }
            }
        }
    }

    pub fn draw_message(&self, ui: &mut egui::Ui, msg: &Message) {
        let bg = self.settings.color(msg.role);

        ui.add_space(6.0);

        if msg.role == Role::User {
            ui.with_layout(Layout::right_to_left(egui::Align::TOP), |ui| {
                bubble(ui, bg, &msg.content);
            });
        } else {
            bubble(ui, bg, &msg.content);
        }
    }
}

/* =========================
   egui App
   ========================= */

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        ctx.set_pixels_per_point(self.settings.ui_scale);

        self.drain_responses();

        /* HEADER */
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("🤖 Arduino Expert Chatbot");
                ui.with_layout(Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.toggle_value(&mut self.ui.show_appearance, "🎨");
                });
            });

            if self.ui.show_appearance {
                draw_appearance(ui, &mut self.settings);
            }
        });

        draw_center_panel(ctx, self);

        self.ui.should_auto_scroll = false;

        if self.ui.waiting {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

/* =========================
   UI Helpers
   ========================= */

fn draw_appearance(ui: &mut egui::Ui, settings: &mut UiSettings) {
    ui.separator();
    let mut changed = false;

    ui.horizontal(|ui| {
        ui.label("UI Scale");
        changed |= ui
            .add(egui::Slider::new(&mut settings.ui_scale, 0.75..=2.0))
            .drag_stopped();
    });

    ui.horizontal(|ui| {
        for role in [Role::User, Role::Assistant, Role::System] {
            let mut color = settings.color(role);
            ui.label(role.label());
            if egui::color_picker::color_edit_button_srgba(
                ui,
                &mut color,
                egui::color_picker::Alpha::Opaque,
            )
            .changed()
            {
                settings.set_color(role, color);
                changed = true;
            }
        }
    });

    if changed {
        save_settings(settings);
    }
}

fn bubble(ui: &mut egui::Ui, color: egui::Color32, text: &str) {
    egui::Frame::new()
        .fill(color)
        .corner_radius(egui::CornerRadius::same(8))
        .inner_margin(egui::Margin::symmetric(10, 6))
        .show(ui, |ui| {
            ui.label(egui::RichText::new(text).color(egui::Color32::WHITE));
        });
}
