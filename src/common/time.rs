use chrono::{DateTime, FixedOffset, Utc};

/// Múi giờ hiển thị cố định (IST, UTC+5:30). Mọi nhãn giờ/ngày đều quy về
/// múi này, độc lập với timezone của máy đang chạy.
fn display_zone() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 30 * 60).expect("static +05:30 offset")
}

/// Giờ 12h kiểu `hh:mm am/pm` trong múi cố định.
pub fn format_clock(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&display_zone()).format("%I:%M %P").to_string()
}

/// Nhãn ngày cho date separator: "Today" / "Yesterday" / `DD/MM/YYYY`,
/// so sánh theo ngày lịch trong múi cố định. Thuần túy theo `(ts, now)`.
pub fn format_day(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let zone = display_zone();
    let date = ts.with_timezone(&zone).date_naive();
    let today = now.with_timezone(&zone).date_naive();

    if date == today {
        "Today".to_string()
    } else if Some(date) == today.pred_opt() {
        "Yesterday".to_string()
    } else {
        date.format("%d/%m/%Y").to_string()
    }
}
