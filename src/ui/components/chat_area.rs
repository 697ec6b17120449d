use chrono::{DateTime, Utc};
use eframe::egui;

use crate::common::time;
use crate::common::types::{ChatMessage, MessageKind};
use crate::ui::session::ChatSession;

/// Hành động user thao tác trong vùng chat (mỗi frame nhiều nhất một).
pub enum ChatAction {
    ImageClicked(String),
    Back,
}

/// Header + message list của hội thoại đang mở, gom theo date separator.
pub fn render(
    ui: &mut egui::Ui,
    session: &ChatSession,
    peer_online: bool,
    show_back: bool,
    now: DateTime<Utc>,
) -> Option<ChatAction> {
    let mut action = None;

    ui.horizontal(|ui| {
        if show_back && ui.button("←").clicked() {
            action = Some(ChatAction::Back);
        }
        ui.label(egui::RichText::new(&session.peer.avatar).size(24.0));
        ui.vertical(|ui| {
            ui.label(egui::RichText::new(&session.peer.display_name).strong());
            let status = if session.peer_typing {
                "typing..."
            } else if peer_online {
                "online"
            } else {
                "offline"
            };
            ui.label(egui::RichText::new(status).weak().small());
        });
    });
    ui.separator();

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            for (label, messages) in session.grouped_messages(now) {
                ui.vertical_centered(|ui| {
                    ui.label(egui::RichText::new(label).weak().small());
                });
                for message in messages {
                    if let Some(clicked) = render_bubble(ui, message, session.is_own(message)) {
                        action = Some(clicked);
                    }
                }
            }
        });

    action
}

/// Một bubble: chọn cách trình bày theo loại nội dung. Không giữ state,
/// chỉ báo lại URL khi user bấm vào ảnh.
fn render_bubble(
    ui: &mut egui::Ui,
    message: &ChatMessage,
    is_own: bool,
) -> Option<ChatAction> {
    let mut action = None;
    let align = if is_own { egui::Align::Max } else { egui::Align::Min };

    ui.with_layout(egui::Layout::top_down(align), |ui| {
        let fill = if is_own {
            egui::Color32::from_rgb(0, 76, 64)
        } else {
            ui.visuals().faint_bg_color
        };
        egui::Frame::group(ui.style())
            .fill(fill)
            .corner_radius(egui::CornerRadius::same(8))
            .show(ui, |ui| {
                match message.kind {
                    MessageKind::Image => {
                        if ui.button("🖼 View photo").clicked() {
                            action = Some(ChatAction::ImageClicked(message.content.clone()));
                        }
                    }
                    MessageKind::Video => {
                        ui.hyperlink_to("🎞 Play video", &message.content);
                    }
                    MessageKind::File => {
                        let name = message.file_name.as_deref().unwrap_or("Download File");
                        ui.hyperlink_to(format!("📄 {name}"), &message.content);
                    }
                    MessageKind::Text => {
                        ui.label(&message.content);
                    }
                }
                ui.label(
                    egui::RichText::new(time::format_clock(message.timestamp))
                        .weak()
                        .small(),
                );
            });
    });

    action
}
