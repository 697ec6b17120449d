use eframe::egui;

use crate::ui::session::UploadState;

/// Kết quả tương tác với thanh nhập liệu trong một frame.
#[derive(Default)]
pub struct InputActions {
    pub send: bool,
    pub text_changed: bool,
    pub toggle_emoji: bool,
    /// Path file user chọn để upload.
    pub attach_path: Option<String>,
}

pub fn render(
    ui: &mut egui::Ui,
    input_text: &mut String,
    attach_input: &mut String,
    show_attach_popup: &mut bool,
    upload_state: UploadState,
) -> InputActions {
    let mut actions = InputActions::default();

    if *show_attach_popup {
        ui.horizontal(|ui| {
            ui.label("File path:");
            ui.text_edit_singleline(attach_input);
            if ui.button("Upload").clicked() && !attach_input.trim().is_empty() {
                actions.attach_path = Some(attach_input.trim().to_string());
                attach_input.clear();
                *show_attach_popup = false;
            }
        });
        ui.label(egui::RichText::new("or drop a file onto the window").weak().small());
    }

    ui.horizontal(|ui| {
        if ui.button("😀").clicked() {
            actions.toggle_emoji = true;
        }

        match upload_state {
            UploadState::InProgress(percent) => {
                // Đang upload thì khóa nút đính kèm, hiện phần trăm
                ui.add_enabled(false, egui::Button::new(format!("{percent}%")));
            }
            UploadState::Idle => {
                if ui.button("📎").clicked() {
                    *show_attach_popup = !*show_attach_popup;
                }
            }
        }

        let send_disabled = input_text.trim().is_empty();
        let edit_width = (ui.available_width() - 64.0).max(80.0);
        let response = ui.add_sized(
            [edit_width, 24.0],
            egui::TextEdit::singleline(input_text).hint_text("Type a message"),
        );
        if response.changed() {
            actions.text_changed = true;
        }
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            actions.send = true;
        }

        if ui.add_enabled(!send_disabled, egui::Button::new("Send")).clicked() {
            actions.send = true;
        }
    });

    actions
}
