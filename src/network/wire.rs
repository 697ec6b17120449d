use serde::{Deserialize, Serialize};

use crate::common::types::{ChatMessage, OutgoingMessage};

/// Frame JSON client phát lên backend, tag bằng tên event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientFrame {
    UserOnline {
        user_id: String,
    },
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

/// Frame JSON backend đẩy xuống client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerFrame {
    OnlineUsers { users: Vec<String> },
    ReceiveMessage(ChatMessage),
    UserTyping { sender_id: String, is_typing: bool },
    NewMessageNotification(ChatMessage),
}
