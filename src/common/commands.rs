use crate::common::types::OutgoingMessage;

/// Lệnh UI gửi xuống tầng mạng.
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    /// Mở kết nối WebSocket và announce `user_online` (gọi khi user login).
    Connect { user_id: String },
    /// Đóng kết nối, quay về idle (logout).
    Disconnect,
    /// Khai báo hội thoại đang mở để backend route event về đúng client.
    JoinChat {
        sender_id: String,
        receiver_id: String,
    },
    SendMessage(OutgoingMessage),
    Typing {
        sender_id: String,
        receiver_id: String,
        is_typing: bool,
    },
}
