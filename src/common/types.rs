use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Người dùng do backend quản lý, client chỉ đọc.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub avatar: String,
}

/// Loại nội dung của một tin nhắn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
    Video,
    File,
}

/// Domain model đại diện một tin nhắn chat.
/// Field names khớp wire format của backend (camelCase, `type`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Tin nhắn có thuộc hội thoại giữa hai id này không (không phân biệt chiều).
    pub fn belongs_to_pair(&self, a: &str, b: &str) -> bool {
        (self.sender_id == a && self.receiver_id == b)
            || (self.sender_id == b && self.receiver_id == a)
    }
}

/// Payload phát qua event `send_message`. Backend cấp id và timestamp
/// rồi echo bản đầy đủ lại qua `receive_message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

/// Response của POST /api/upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub success: bool,
    pub url: String,
    pub file_type: MessageKind,
    pub file_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn message(sender: &str, receiver: &str) -> ChatMessage {
        ChatMessage {
            id: "m1".to_string(),
            sender_id: sender.to_string(),
            receiver_id: receiver.to_string(),
            content: "hi".to_string(),
            kind: MessageKind::Text,
            file_name: None,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn pair_match_ignores_direction() {
        assert!(message("alice", "bob").belongs_to_pair("alice", "bob"));
        assert!(message("bob", "alice").belongs_to_pair("alice", "bob"));
        assert!(!message("alice", "carol").belongs_to_pair("alice", "bob"));
        assert!(!message("carol", "dave").belongs_to_pair("alice", "bob"));
    }

    #[test]
    fn message_uses_backend_field_names() {
        let json = serde_json::to_value(message("alice", "bob")).unwrap();
        assert_eq!(json["senderId"], "alice");
        assert_eq!(json["receiverId"], "bob");
        assert_eq!(json["type"], "text");
        // fileName vắng mặt thay vì null khi không có
        assert!(json.get("fileName").is_none());
    }

    #[test]
    fn file_message_round_trips() {
        let raw = r#"{
            "id": "m9",
            "senderId": "bob",
            "receiverId": "alice",
            "content": "http://localhost:5000/uploads/report.pdf",
            "type": "file",
            "fileName": "report.pdf",
            "timestamp": "2024-03-10T06:30:00Z"
        }"#;
        let parsed: ChatMessage = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.kind, MessageKind::File);
        assert_eq!(parsed.file_name.as_deref(), Some("report.pdf"));
    }
}
