use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::common::NetworkCommand;
use crate::common::time;
use crate::common::types::{ChatMessage, MessageKind, OutgoingMessage, UploadedFile, User};

/// Khoảng lặng sau keystroke cuối trước khi phát typing=false.
pub const TYPING_IDLE: Duration = Duration::from_millis(1000);

/// Trạng thái upload cho nút đính kèm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    InProgress(u8),
}

/// Core của một phiên chat giữa `current_user` và `peer`: giữ message list,
/// composer và typing state; merge lịch sử fetch được với event stream
/// realtime. Bị drop và tạo mới mỗi khi cặp (user, peer) thay đổi.
pub struct ChatSession {
    pub current_user: User,
    pub peer: User,
    pub messages: Vec<ChatMessage>,
    pub input_text: String,
    pub peer_typing: bool,
    /// URL ảnh đang mở trong modal phóng to.
    pub selected_image: Option<String>,
    pub show_emoji_picker: bool,
    pub upload_state: UploadState,
    /// Lỗi upload chờ user bấm OK.
    pub upload_error: Option<String>,
    own_typing: bool,
    typing_deadline: Option<Instant>,
    command_sender: mpsc::Sender<NetworkCommand>,
}

impl ChatSession {
    pub fn new(current_user: User, peer: User, command_sender: mpsc::Sender<NetworkCommand>) -> Self {
        let session = Self {
            current_user,
            peer,
            messages: Vec::new(),
            input_text: String::new(),
            peer_typing: false,
            selected_image: None,
            show_emoji_picker: false,
            upload_state: UploadState::Idle,
            upload_error: None,
            own_typing: false,
            typing_deadline: None,
            command_sender,
        };
        // Khai báo hội thoại để backend route receive_message/user_typing về socket này
        session.send_command(NetworkCommand::JoinChat {
            sender_id: session.current_user.id.clone(),
            receiver_id: session.peer.id.clone(),
        });
        session
    }

    fn send_command(&self, command: NetworkCommand) {
        if let Err(err) = self.command_sender.try_send(command) {
            log::warn!("Failed to send command to network: {err}");
        }
    }

    /// Lịch sử fetch xong: thay toàn bộ list, nhưng chỉ khi tag (user, peer)
    /// của response vẫn khớp phiên hiện tại. Response trễ của cặp cũ bị bỏ.
    pub fn apply_history(&mut self, user_id: &str, peer_id: &str, messages: Vec<ChatMessage>) {
        if user_id != self.current_user.id || peer_id != self.peer.id {
            log::info!("Discarding stale history for pair ({user_id}, {peer_id})");
            return;
        }
        self.messages = messages;
    }

    /// Tin nhắn realtime: lọc đúng cặp hội thoại, dedup theo id rồi append.
    /// Backend echo cả tin mình gửi qua đường này nên nhận duplicate là chuyện
    /// bình thường, xử lý phải idempotent.
    pub fn handle_incoming(&mut self, message: ChatMessage) {
        if !message.belongs_to_pair(&self.current_user.id, &self.peer.id) {
            return;
        }
        if self.messages.iter().any(|existing| existing.id == message.id) {
            return;
        }
        self.messages.push(message);
    }

    /// Chỉ nhận trạng thái typing từ đúng peer đang mở.
    pub fn handle_peer_typing(&mut self, sender_id: &str, is_typing: bool) {
        if sender_id == self.peer.id {
            self.peer_typing = is_typing;
        }
    }

    /// Gọi mỗi khi text composer thay đổi (gõ phím hoặc chèn emoji).
    /// Phát typing=true đúng một lần ở cạnh lên, và dời deadline tắt.
    pub fn composer_changed(&mut self, now: Instant) {
        if !self.own_typing {
            self.own_typing = true;
            self.emit_typing(true);
        }
        self.typing_deadline = Some(now + TYPING_IDLE);
    }

    /// Poll mỗi frame: đủ 1s im lặng thì phát typing=false đúng một lần.
    pub fn poll_typing(&mut self, now: Instant) {
        if let Some(deadline) = self.typing_deadline {
            if now >= deadline {
                self.typing_deadline = None;
                self.own_typing = false;
                self.emit_typing(false);
            }
        }
    }

    fn emit_typing(&self, is_typing: bool) {
        self.send_command(NetworkCommand::Typing {
            sender_id: self.current_user.id.clone(),
            receiver_id: self.peer.id.clone(),
            is_typing,
        });
    }

    /// Gửi nội dung composer. Không append local: backend sẽ echo bản đầy đủ
    /// (có id + timestamp) qua receive_message, nên đường gửi và đường nhận
    /// đi chung một rule dedup.
    pub fn send_current_message(&mut self) {
        let content = self.input_text.trim().to_string();
        if content.is_empty() {
            return;
        }
        self.send_command(NetworkCommand::SendMessage(OutgoingMessage {
            sender_id: self.current_user.id.clone(),
            receiver_id: self.peer.id.clone(),
            content,
            kind: MessageKind::Text,
            file_name: None,
        }));
        self.input_text.clear();
        self.show_emoji_picker = false;
        self.stop_typing_now();
    }

    /// File đã upload xong: gửi descriptor qua cùng đường send_message,
    /// cũng không echo local.
    pub fn send_uploaded_file(&mut self, upload: UploadedFile) {
        self.upload_state = UploadState::Idle;
        self.send_command(NetworkCommand::SendMessage(OutgoingMessage {
            sender_id: self.current_user.id.clone(),
            receiver_id: self.peer.id.clone(),
            content: upload.url,
            kind: upload.file_type,
            file_name: Some(upload.file_name),
        }));
    }

    /// Chèn emoji vào composer, tính như một lần gõ phím.
    pub fn append_emoji(&mut self, emoji: &str, now: Instant) {
        self.input_text.push_str(emoji);
        self.composer_changed(now);
    }

    pub fn upload_progress(&mut self, percent: u8) {
        self.upload_state = UploadState::InProgress(percent);
    }

    pub fn upload_failed(&mut self, reason: String) {
        self.upload_state = UploadState::Idle;
        self.upload_error = Some(reason);
    }

    /// Hủy deadline đang chờ và phát typing=false ngay (đi kèm send).
    fn stop_typing_now(&mut self) {
        self.typing_deadline = None;
        self.own_typing = false;
        self.emit_typing(false);
    }

    /// Gom message theo nhãn ngày cho date separator. Một lượt duyệt ổn định:
    /// nhãn giữ thứ tự lần đầu gặp, tin nhắn trong nhóm giữ thứ tự arrival,
    /// không sort lại theo timestamp.
    pub fn grouped_messages(&self, now: DateTime<Utc>) -> Vec<(String, Vec<&ChatMessage>)> {
        let mut groups: Vec<(String, Vec<&ChatMessage>)> = Vec::new();
        for message in &self.messages {
            let label = time::format_day(message.timestamp, now);
            match groups.iter_mut().find(|(existing, _)| *existing == label) {
                Some((_, bucket)) => bucket.push(message),
                None => groups.push((label, vec![message])),
            }
        }
        groups
    }

    pub fn is_own(&self, message: &ChatMessage) -> bool {
        message.sender_id == self.current_user.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tokio::sync::mpsc::error::TryRecvError;

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            display_name: id.to_uppercase(),
            avatar: "🙂".to_string(),
        }
    }

    fn message(id: &str, sender: &str, receiver: &str, ts: DateTime<Utc>) -> ChatMessage {
        ChatMessage {
            id: id.to_string(),
            sender_id: sender.to_string(),
            receiver_id: receiver.to_string(),
            content: format!("content-{id}"),
            kind: MessageKind::Text,
            file_name: None,
            timestamp: ts,
        }
    }

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, h, m, 0).unwrap()
    }

    /// Fresh session with the construction-time join_chat already drained.
    fn session() -> (ChatSession, mpsc::Receiver<NetworkCommand>) {
        let (tx, mut rx) = mpsc::channel(16);
        let session = ChatSession::new(user("alice"), user("bob"), tx);
        match rx.try_recv() {
            Ok(NetworkCommand::JoinChat {
                sender_id,
                receiver_id,
            }) => {
                assert_eq!(sender_id, "alice");
                assert_eq!(receiver_id, "bob");
            }
            other => panic!("expected join_chat on creation, got {other:?}"),
        }
        (session, rx)
    }

    #[test]
    fn duplicate_message_id_is_ignored() {
        let (mut session, _rx) = session();
        session.handle_incoming(message("m1", "bob", "alice", ts(10, 0)));
        session.handle_incoming(message("m1", "bob", "alice", ts(10, 0)));
        assert_eq!(session.messages.len(), 1);
    }

    #[test]
    fn messages_for_other_pairs_are_filtered_out() {
        let (mut session, _rx) = session();
        session.handle_incoming(message("m1", "bob", "carol", ts(10, 0)));
        session.handle_incoming(message("m2", "carol", "alice", ts(10, 1)));
        assert!(session.messages.is_empty());

        // cả hai chiều của đúng cặp đều được nhận
        session.handle_incoming(message("m3", "alice", "bob", ts(10, 2)));
        session.handle_incoming(message("m4", "bob", "alice", ts(10, 3)));
        assert_eq!(session.messages.len(), 2);
    }

    #[test]
    fn typing_events_from_strangers_are_ignored() {
        let (mut session, _rx) = session();
        session.handle_peer_typing("carol", true);
        assert!(!session.peer_typing);
        session.handle_peer_typing("bob", true);
        assert!(session.peer_typing);
        session.handle_peer_typing("bob", false);
        assert!(!session.peer_typing);
    }

    #[test]
    fn history_replaces_list_only_for_matching_pair() {
        let (mut session, _rx) = session();
        session.handle_incoming(message("live", "bob", "alice", ts(10, 0)));

        // response trễ của một cặp khác không được đụng vào list
        session.apply_history("alice", "carol", vec![message("h1", "carol", "alice", ts(9, 0))]);
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].id, "live");

        session.apply_history(
            "alice",
            "bob",
            vec![
                message("h1", "alice", "bob", ts(8, 0)),
                message("h2", "bob", "alice", ts(8, 5)),
            ],
        );
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0].id, "h1");
    }

    #[test]
    fn rapid_typing_emits_one_start_and_one_debounced_stop() {
        let (mut session, mut rx) = session();
        let t0 = Instant::now();

        session.input_text.push('h');
        session.composer_changed(t0);
        session.input_text.push('e');
        session.composer_changed(t0 + Duration::from_millis(200));
        session.input_text.push('y');
        session.composer_changed(t0 + Duration::from_millis(400));

        match rx.try_recv() {
            Ok(NetworkCommand::Typing { is_typing, .. }) => assert!(is_typing),
            other => panic!("expected typing start, got {other:?}"),
        }
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

        // deadline tính từ keystroke cuối (t0+400ms), chưa tới thì chưa bắn
        session.poll_typing(t0 + Duration::from_millis(1399));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

        session.poll_typing(t0 + Duration::from_millis(1400));
        match rx.try_recv() {
            Ok(NetworkCommand::Typing { is_typing, .. }) => assert!(!is_typing),
            other => panic!("expected typing stop, got {other:?}"),
        }

        // poll tiếp không phát thêm gì
        session.poll_typing(t0 + Duration::from_millis(3000));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn typing_restarts_on_edge_after_stop() {
        let (mut session, mut rx) = session();
        let t0 = Instant::now();

        session.composer_changed(t0);
        session.poll_typing(t0 + Duration::from_millis(1000));
        // start + stop đã phát
        assert!(matches!(rx.try_recv(), Ok(NetworkCommand::Typing { is_typing: true, .. })));
        assert!(matches!(rx.try_recv(), Ok(NetworkCommand::Typing { is_typing: false, .. })));

        // burst mới lại phát start mới
        session.composer_changed(t0 + Duration::from_millis(2000));
        assert!(matches!(rx.try_recv(), Ok(NetworkCommand::Typing { is_typing: true, .. })));
    }

    #[test]
    fn send_emits_without_local_echo_and_clears_composer() {
        let (mut session, mut rx) = session();
        let t0 = Instant::now();
        session.input_text = "  hi there ".to_string();
        session.composer_changed(t0);
        session.show_emoji_picker = true;
        let _ = rx.try_recv(); // typing start

        session.send_current_message();

        match rx.try_recv() {
            Ok(NetworkCommand::SendMessage(outgoing)) => {
                assert_eq!(outgoing.content, "hi there");
                assert_eq!(outgoing.sender_id, "alice");
                assert_eq!(outgoing.receiver_id, "bob");
                assert_eq!(outgoing.kind, MessageKind::Text);
            }
            other => panic!("expected send_message, got {other:?}"),
        }
        // send kèm typing=false ngay, không chờ debounce
        assert!(matches!(rx.try_recv(), Ok(NetworkCommand::Typing { is_typing: false, .. })));

        assert!(session.messages.is_empty());
        assert!(session.input_text.is_empty());
        assert!(!session.show_emoji_picker);

        // timer cũ đã bị hủy, không còn stop thứ hai
        session.poll_typing(t0 + Duration::from_secs(5));
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

        // tin chỉ xuất hiện khi backend echo lại
        session.handle_incoming(message("m1", "alice", "bob", ts(10, 0)));
        assert_eq!(session.messages.len(), 1);
    }

    #[test]
    fn whitespace_only_send_is_a_noop() {
        let (mut session, mut rx) = session();
        session.input_text = "   ".to_string();
        session.send_current_message();
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(session.input_text, "   ");
    }

    #[test]
    fn uploaded_file_is_sent_through_the_message_path() {
        let (mut session, mut rx) = session();
        session.upload_state = UploadState::InProgress(100);
        session.send_uploaded_file(UploadedFile {
            success: true,
            url: "http://localhost:5000/uploads/cat.png".to_string(),
            file_type: MessageKind::Image,
            file_name: "cat.png".to_string(),
        });
        match rx.try_recv() {
            Ok(NetworkCommand::SendMessage(outgoing)) => {
                assert_eq!(outgoing.kind, MessageKind::Image);
                assert_eq!(outgoing.content, "http://localhost:5000/uploads/cat.png");
                assert_eq!(outgoing.file_name.as_deref(), Some("cat.png"));
            }
            other => panic!("expected send_message, got {other:?}"),
        }
        assert_eq!(session.upload_state, UploadState::Idle);
        assert!(session.messages.is_empty());
    }

    #[test]
    fn grouping_preserves_first_seen_label_order() {
        let (mut session, _rx) = session();
        let now = ts(12, 0);
        let yesterday = Utc.with_ymd_and_hms(2024, 3, 9, 10, 0, 0).unwrap();

        // arrival order: [hôm qua, hôm nay, hôm nay]
        session.handle_incoming(message("t3", "bob", "alice", yesterday));
        session.handle_incoming(message("t1", "alice", "bob", ts(9, 0)));
        session.handle_incoming(message("t2", "bob", "alice", ts(9, 30)));

        let groups = session.grouped_messages(now);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "Yesterday");
        assert_eq!(groups[0].1.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(), ["t3"]);
        assert_eq!(groups[1].0, "Today");
        assert_eq!(
            groups[1].1.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(),
            ["t1", "t2"]
        );
    }

    #[test]
    fn upload_failure_resets_state_and_keeps_reason() {
        let (mut session, _rx) = session();
        session.upload_progress(40);
        assert_eq!(session.upload_state, UploadState::InProgress(40));
        session.upload_failed("upload failed with status 500".to_string());
        assert_eq!(session.upload_state, UploadState::Idle);
        assert_eq!(
            session.upload_error.as_deref(),
            Some("upload failed with status 500")
        );
    }

    #[test]
    fn emoji_append_counts_as_typing() {
        let (mut session, mut rx) = session();
        session.input_text = "hello".to_string();
        session.append_emoji("😀", Instant::now());
        assert_eq!(session.input_text, "hello😀");
        assert!(matches!(rx.try_recv(), Ok(NetworkCommand::Typing { is_typing: true, .. })));
    }
}
