use std::collections::HashMap;

use eframe::egui;

use crate::common::types::User;

#[derive(Default)]
pub struct SidebarActions {
    pub selected: Option<User>,
    pub logout: bool,
}

/// Danh sách hội thoại: mọi user trừ mình, kèm chấm online và badge chưa đọc.
#[allow(clippy::too_many_arguments)]
pub fn render(
    ui: &mut egui::Ui,
    users: &[User],
    current_user: &User,
    selected_peer_id: Option<&str>,
    online_users: &[String],
    unread: &HashMap<String, u32>,
    connected: bool,
) -> SidebarActions {
    let mut actions = SidebarActions::default();

    ui.horizontal(|ui| {
        ui.heading("Chats");
        if !connected {
            ui.label(egui::RichText::new("(reconnecting...)").weak());
        }
    });
    ui.separator();
    ui.horizontal(|ui| {
        ui.label(format!("{}  {}", current_user.avatar, current_user.display_name));
        if ui.small_button("Log out").clicked() {
            actions.logout = true;
        }
    });
    ui.separator();

    for user in users.iter().filter(|user| user.id != current_user.id) {
        let online = online_users.iter().any(|id| id == &user.id);
        let is_selected = selected_peer_id == Some(user.id.as_str());

        ui.horizontal(|ui| {
            // Chấm online màu xanh, offline màu xám
            if online {
                ui.colored_label(egui::Color32::GREEN, "●");
            } else {
                ui.colored_label(egui::Color32::GRAY, "○");
            }

            let label = format!("{}  {}", user.avatar, user.display_name);
            if ui.selectable_label(is_selected, label).clicked() {
                actions.selected = Some(user.clone());
            }

            ui.label(
                egui::RichText::new(if online { "Online" } else { "Offline" }).weak(),
            );

            if let Some(count) = unread.get(&user.id).filter(|count| **count > 0) {
                ui.colored_label(egui::Color32::LIGHT_RED, format!("({count})"));
            }
        });
    }

    actions
}
