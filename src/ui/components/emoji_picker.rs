use eframe::egui;

/// Bảng emoji tĩnh thay cho thư viện picker của bản web; đủ dùng cho
/// composer, không search/skin-tone.
const EMOJIS: &[&str] = &[
    "😀", "😂", "😅", "😉", "😊", "😍", "😘", "😎",
    "🤔", "😴", "😢", "😭", "😡", "😮", "🙄", "🥳",
    "👍", "👎", "👏", "🙏", "🤝", "💪", "✌️", "🤞",
    "❤️", "💔", "🎉", "🔥", "⭐", "☕", "🍕", "⚽",
];

const COLUMNS: usize = 8;

pub fn render(ui: &mut egui::Ui) -> Option<&'static str> {
    let mut picked = None;

    egui::Frame::group(ui.style()).show(ui, |ui| {
        egui::Grid::new("emoji_grid").show(ui, |ui| {
            for (index, emoji) in EMOJIS.iter().enumerate() {
                if ui.button(*emoji).clicked() {
                    picked = Some(*emoji);
                }
                if (index + 1) % COLUMNS == 0 {
                    ui.end_row();
                }
            }
        });
    });

    picked
}
