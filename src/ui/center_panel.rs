use eframe::egui;

use crate::engine::protocol::EngineCommand;
use super::app::ChatApp;

pub fn draw_center_panel(ctx: &egui::Context, app: &mut ChatApp) {
    let input_id = egui::Id::new("chat_input_box");

    // ---------- Input bar ----------
    egui::TopBottomPanel::bottom("chat_input").show(ctx, |ui| {
        let mut send_now = false;
        let mut clear_now = false;

        if let Some(warning) = app.ui.warning.clone() {
            ui.horizontal(|ui| {
                ui.colored_label(egui::Color32::from_rgb(230, 160, 0), warning);
                if ui.small_button("✖").clicked() {
                    app.ui.warning = None;
                }
            });
        }

        ui.horizontal(|ui| {
            let response = ui.add_sized(
                [ui.available_width() - 150.0, 60.0],
                egui::TextEdit::multiline(&mut app.ui.input_text)
                    .id(input_id)
                    .hint_text("Type your Arduino question here…")
                    .lock_focus(true),
            );

            // Enter vs Shift+Enter
            if response.has_focus()
                && ui.input(|i| i.key_pressed(egui::Key::Enter) && !i.modifiers.shift)
            {
                send_now = true;
            }

            ui.add_enabled_ui(!app.ui.waiting, |ui| {
                if ui.button("🚀 Send").clicked() {
                    send_now = true;
                }
                if ui.button("🗑 Clear Chat").clicked() {
                    clear_now = true;
                }
            });
        });

        if app.ui.waiting {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Thinking…");
            });
        }

        if send_now && !app.ui.waiting {
            let text = app.ui.input_text.trim().to_string();

            // Blank input still goes to the engine so the user sees the warning.
            app.send_command(EngineCommand::Ask(text));
            app.ui.input_text.clear();

            // Keep cursor focused
            ui.memory_mut(|m| m.request_focus(input_id));
        }

        if clear_now {
            app.send_command(EngineCommand::Clear);
        }
    });

    // ---------- Chat history ----------
    egui::CentralPanel::default().show(ctx, |ui| {
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(app.ui.should_auto_scroll)
            .show(ui, |ui| {
                for msg in &app.ui.rendered_messages {
                    app.draw_message(ui, msg);
                }
            });
    });
}
