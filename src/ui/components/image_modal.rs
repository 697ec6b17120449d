use eframe::egui;

/// Overlay phóng to ảnh đang chọn. egui không tự tải ảnh qua HTTP nên khung
/// hiển thị URL kèm link mở bằng trình duyệt.
///
/// Trả về true khi user bấm đóng.
pub fn render(ctx: &egui::Context, image_url: &str) -> bool {
    let mut close = false;

    egui::Window::new("image_modal")
        .title_bar(false)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(egui::RichText::new("🖼").size(48.0));
                ui.hyperlink_to("Open full size", image_url);
                ui.label(egui::RichText::new(image_url).weak().small());
                ui.add_space(8.0);
                if ui.button("✕ Close").clicked() {
                    close = true;
                }
            });
        });

    close
}
