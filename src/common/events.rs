use crate::common::types::{ChatMessage, UploadedFile, User};

/// Sự kiện từ tầng mạng (socket + các task REST) gửi lên UI.
#[derive(Debug, Clone)]
pub enum NetworkEvent {
    Connected,
    Disconnected,
    /// Danh sách user id đang online, thay thế toàn bộ set cũ (không patch).
    OnlineUsers(Vec<String>),
    MessageReceived(ChatMessage),
    PeerTyping {
        sender_id: String,
        is_typing: bool,
    },
    /// Tin nhắn mới ngoài hội thoại đang mở, dùng cho badge chưa đọc.
    MessageNotification(ChatMessage),
    UsersFetched(Vec<User>),
    UsersFetchFailed(String),
    /// Kết quả fetch lịch sử, tag theo cặp (user, peer) tại thời điểm phát request
    /// để UI bỏ qua response trễ của một cặp đã đổi.
    HistoryFetched {
        user_id: String,
        peer_id: String,
        messages: Vec<ChatMessage>,
    },
    /// Phần trăm byte đã gửi của upload đang chạy.
    UploadProgress(u8),
    UploadFinished(UploadedFile),
    UploadFailed(String),
}
