use eframe::egui;

use crate::common::types::User;

/// Deployment chỉ có hai user: đăng nhập = chọn mình là ai trong roster.
pub enum LoginAction {
    LoggedIn(User),
    Retry,
}

pub fn render(
    ui: &mut egui::Ui,
    users: &[User],
    loading: bool,
    error: Option<&str>,
) -> Option<LoginAction> {
    let mut action = None;

    ui.vertical_centered(|ui| {
        ui.add_space(48.0);
        ui.heading("Pair Chat");
        ui.label(egui::RichText::new("Who are you?").weak());
        ui.add_space(16.0);

        if loading {
            ui.spinner();
            ui.label("Loading users...");
        } else if let Some(error) = error {
            ui.colored_label(egui::Color32::RED, error);
            if ui.button("Retry").clicked() {
                action = Some(LoginAction::Retry);
            }
        } else if users.is_empty() {
            ui.label("No users registered on this backend");
        } else {
            for user in users {
                let label = format!("{}  {}", user.avatar, user.display_name);
                if ui.button(label).clicked() {
                    action = Some(LoginAction::LoggedIn(user.clone()));
                }
                ui.add_space(4.0);
            }
        }
    });

    action
}
