use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use chrono::Utc;
use eframe::egui;
use tokio::sync::mpsc;

use crate::api::Backend;
use crate::common::types::{ChatMessage, User};
use crate::common::{NetworkCommand, NetworkEvent};

use super::components::chat_area::{self, ChatAction};
use super::components::login::{self, LoginAction};
use super::components::{emoji_picker, image_modal, input_bar, sidebar};
use super::session::{ChatSession, UploadState};

/// Dưới ngưỡng này layout chuyển sang một pane (danh sách hoặc chat).
const MOBILE_WIDTH: f32 = 768.0;

/// Shell của app: login, vòng đời kết nối, chọn peer, presence và layout.
/// Logic hội thoại nằm trong ChatSession.
pub struct ChatApp {
    backend: Backend,
    runtime: tokio::runtime::Handle,
    command_sender: mpsc::Sender<NetworkCommand>,
    /// Clone cho các task REST/upload bắn kết quả về UI.
    event_sender: mpsc::Sender<NetworkEvent>,
    event_receiver: mpsc::Receiver<NetworkEvent>,

    users: Vec<User>,
    users_loading: bool,
    users_error: Option<String>,
    current_user: Option<User>,
    session: Option<ChatSession>,
    online_users: Vec<String>,
    unread: HashMap<String, u32>,
    connected: bool,
    /// Mobile layout: true = pane chat, false = pane danh sách.
    show_chat_pane: bool,
    attach_input: String,
    show_attach_popup: bool,
}

impl ChatApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        backend: Backend,
        runtime: tokio::runtime::Handle,
        command_sender: mpsc::Sender<NetworkCommand>,
        event_sender: mpsc::Sender<NetworkEvent>,
        event_receiver: mpsc::Receiver<NetworkEvent>,
    ) -> Self {
        let mut app = Self {
            backend,
            runtime,
            command_sender,
            event_sender,
            event_receiver,
            users: Vec::new(),
            users_loading: false,
            users_error: None,
            current_user: None,
            session: None,
            online_users: Vec::new(),
            unread: HashMap::new(),
            connected: false,
            show_chat_pane: false,
            attach_input: String::new(),
            show_attach_popup: false,
        };
        app.refresh_users();
        app
    }

    fn send_command(&self, command: NetworkCommand) {
        if let Err(err) = self.command_sender.try_send(command) {
            log::warn!("Failed to send command to network: {err}");
        }
    }

    fn refresh_users(&mut self) {
        self.users_loading = true;
        self.users_error = None;
        let backend = self.backend.clone();
        let events = self.event_sender.clone();
        self.runtime.spawn(async move {
            match backend.fetch_users().await {
                Ok(users) => {
                    let _ = events.send(NetworkEvent::UsersFetched(users)).await;
                }
                Err(err) => {
                    log::error!("Error fetching users: {err}");
                    let _ = events
                        .send(NetworkEvent::UsersFetchFailed(err.to_string()))
                        .await;
                }
            }
        });
    }

    fn log_in(&mut self, user: User) {
        log::info!("Logged in as {} ({})", user.display_name, user.id);
        self.send_command(NetworkCommand::Connect {
            user_id: user.id.clone(),
        });
        self.current_user = Some(user);
        self.select_peer();
        // Roster fetch lại mỗi lần login, như lần đầu mở app
        self.refresh_users();
    }

    fn log_out(&mut self) {
        self.send_command(NetworkCommand::Disconnect);
        self.session = None;
        self.current_user = None;
        self.online_users.clear();
        self.unread.clear();
        self.connected = false;
        self.show_chat_pane = false;
    }

    /// Deployment hai user: tự chọn "người còn lại" làm peer duy nhất.
    fn select_peer(&mut self) {
        let Some(current) = &self.current_user else {
            return;
        };
        let peer = self
            .users
            .iter()
            .find(|user| user.id != current.id)
            .cloned();
        if let Some(peer) = peer {
            self.open_session(peer);
        }
    }

    /// Tạo phiên mới cho peer này: session cũ bị drop (kèm subscription của
    /// nó), join_chat phát lại và lịch sử fetch lại từ đầu.
    fn open_session(&mut self, peer: User) {
        let Some(current) = self.current_user.clone() else {
            return;
        };
        self.unread.remove(&peer.id);
        self.spawn_history_fetch(current.id.clone(), peer.id.clone());
        self.session = Some(ChatSession::new(current, peer, self.command_sender.clone()));
        self.show_chat_pane = true;
    }

    fn spawn_history_fetch(&self, user_id: String, peer_id: String) {
        let backend = self.backend.clone();
        let events = self.event_sender.clone();
        self.runtime.spawn(async move {
            match backend.fetch_history(&user_id, &peer_id).await {
                Ok(messages) => {
                    let _ = events
                        .send(NetworkEvent::HistoryFetched {
                            user_id,
                            peer_id,
                            messages,
                        })
                        .await;
                }
                // Lỗi fetch không retry: hội thoại để trống
                Err(err) => log::error!("Error fetching messages: {err}"),
            }
        });
    }

    fn start_upload(&mut self, path: PathBuf) {
        let Some(session) = &mut self.session else {
            return;
        };
        // Một upload tại một thời điểm
        if session.upload_state != UploadState::Idle {
            log::warn!("Upload already in progress, ignoring {}", path.display());
            return;
        }
        session.upload_state = UploadState::InProgress(0);

        let backend = self.backend.clone();
        let events = self.event_sender.clone();
        self.runtime.spawn(async move {
            match backend.upload(&path, events.clone()).await {
                Ok(uploaded) => {
                    let _ = events.send(NetworkEvent::UploadFinished(uploaded)).await;
                }
                Err(err) => {
                    log::error!("Upload error: {err}");
                    let _ = events.send(NetworkEvent::UploadFailed(err.to_string())).await;
                }
            }
        });
    }

    fn handle_network_events(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            match event {
                NetworkEvent::Connected => {
                    log::info!("Connected to server");
                    self.connected = true;
                }
                NetworkEvent::Disconnected => self.connected = false,
                NetworkEvent::OnlineUsers(users) => self.online_users = users,
                NetworkEvent::UsersFetched(users) => {
                    self.users_loading = false;
                    self.users = users;
                    if self.current_user.is_some() && self.session.is_none() {
                        self.select_peer();
                    }
                }
                NetworkEvent::UsersFetchFailed(reason) => {
                    self.users_loading = false;
                    self.users_error = Some(reason);
                }
                NetworkEvent::MessageReceived(message) => {
                    if let Some(session) = &mut self.session {
                        session.handle_incoming(message);
                    }
                }
                NetworkEvent::PeerTyping {
                    sender_id,
                    is_typing,
                } => {
                    if let Some(session) = &mut self.session {
                        session.handle_peer_typing(&sender_id, is_typing);
                    }
                }
                NetworkEvent::MessageNotification(message) => self.note_unread(&message),
                NetworkEvent::HistoryFetched {
                    user_id,
                    peer_id,
                    messages,
                } => {
                    if let Some(session) = &mut self.session {
                        session.apply_history(&user_id, &peer_id, messages);
                    }
                }
                NetworkEvent::UploadProgress(percent) => {
                    if let Some(session) = &mut self.session {
                        session.upload_progress(percent);
                    }
                }
                NetworkEvent::UploadFinished(uploaded) => {
                    if let Some(session) = &mut self.session {
                        session.send_uploaded_file(uploaded);
                    }
                }
                NetworkEvent::UploadFailed(reason) => {
                    if let Some(session) = &mut self.session {
                        session.upload_failed(reason);
                    }
                }
            }
        }
    }

    fn note_unread(&mut self, message: &ChatMessage) {
        let own_id = self.current_user.as_ref().map(|user| user.id.as_str());
        let peer_id = self.session.as_ref().map(|session| session.peer.id.as_str());
        if should_count_unread(message, own_id, peer_id) {
            *self.unread.entry(message.sender_id.clone()).or_insert(0) += 1;
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped: Vec<PathBuf> = ctx.input(|input| {
            input
                .raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect()
        });
        for path in dropped {
            self.start_upload(path);
        }
    }

    fn render_login(&mut self, ctx: &egui::Context) {
        let mut action = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            action = login::render(
                ui,
                &self.users,
                self.users_loading,
                self.users_error.as_deref(),
            );
        });
        match action {
            Some(LoginAction::LoggedIn(user)) => self.log_in(user),
            Some(LoginAction::Retry) => self.refresh_users(),
            None => {}
        }
    }

    fn render_sidebar(&mut self, ui: &mut egui::Ui) {
        let Some(current) = self.current_user.clone() else {
            return;
        };
        let selected_peer_id = self
            .session
            .as_ref()
            .map(|session| session.peer.id.clone());
        let actions = sidebar::render(
            ui,
            &self.users,
            &current,
            selected_peer_id.as_deref(),
            &self.online_users,
            &self.unread,
            self.connected,
        );

        if actions.logout {
            self.log_out();
            return;
        }
        if let Some(user) = actions.selected {
            self.unread.remove(&user.id);
            if selected_peer_id.as_deref() != Some(user.id.as_str()) {
                self.open_session(user);
            } else {
                self.show_chat_pane = true;
            }
        }
    }

    fn render_conversation(&mut self, ui: &mut egui::Ui, show_back: bool) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let peer_online = self.online_users.iter().any(|id| id == &session.peer.id);
        let mut pending_upload: Option<PathBuf> = None;
        let mut back_pressed = false;

        let attach_input = &mut self.attach_input;
        let show_attach_popup = &mut self.show_attach_popup;
        egui::TopBottomPanel::bottom("composer")
            .resizable(false)
            .show_inside(ui, |ui| {
                if session.show_emoji_picker {
                    if let Some(emoji) = emoji_picker::render(ui) {
                        session.append_emoji(emoji, Instant::now());
                    }
                }
                let actions = input_bar::render(
                    ui,
                    &mut session.input_text,
                    attach_input,
                    show_attach_popup,
                    session.upload_state,
                );
                if actions.text_changed {
                    session.composer_changed(Instant::now());
                }
                if actions.toggle_emoji {
                    session.show_emoji_picker = !session.show_emoji_picker;
                }
                if actions.send {
                    session.send_current_message();
                }
                if let Some(path) = actions.attach_path {
                    pending_upload = Some(PathBuf::from(path));
                }
            });

        // Panel bottom đã chiếm chỗ, phần còn lại cho header + messages
        egui::CentralPanel::default().show_inside(ui, |ui| {
            match chat_area::render(ui, session, peer_online, show_back, Utc::now()) {
                Some(ChatAction::ImageClicked(url)) => session.selected_image = Some(url),
                Some(ChatAction::Back) => back_pressed = true,
                None => {}
            }
        });

        if back_pressed {
            self.show_chat_pane = false;
        }
        if let Some(path) = pending_upload {
            self.start_upload(path);
        }
    }

    fn render_chat(&mut self, ctx: &egui::Context) {
        let is_mobile = ctx.screen_rect().width() <= MOBILE_WIDTH;

        if is_mobile {
            if self.show_chat_pane && self.session.is_some() {
                egui::CentralPanel::default().show(ctx, |ui| {
                    self.render_conversation(ui, true);
                });
            } else {
                egui::CentralPanel::default().show(ctx, |ui| {
                    self.render_sidebar(ui);
                });
            }
        } else {
            egui::SidePanel::left("user_sidebar")
                .resizable(true)
                .default_width(220.0)
                .show(ctx, |ui| {
                    self.render_sidebar(ui);
                });
            egui::CentralPanel::default().show(ctx, |ui| {
                if self.session.is_some() {
                    self.render_conversation(ui, false);
                } else {
                    ui.centered_and_justified(|ui| {
                        ui.label("Loading chat...");
                    });
                }
            });
        }

        // Modal ảnh phóng to
        if let Some(url) = self
            .session
            .as_ref()
            .and_then(|session| session.selected_image.clone())
        {
            if image_modal::render(ctx, &url) {
                if let Some(session) = &mut self.session {
                    session.selected_image = None;
                }
            }
        }

        // Alert lỗi upload
        if let Some(reason) = self
            .session
            .as_ref()
            .and_then(|session| session.upload_error.clone())
        {
            egui::Window::new("Upload failed")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(reason);
                    if ui.button("OK").clicked() {
                        if let Some(session) = &mut self.session {
                            session.upload_error = None;
                        }
                    }
                });
        }
    }
}

/// Badge chưa đọc: chỉ đếm notification có sender không phải mình và không
/// phải peer của hội thoại đang mở.
fn should_count_unread(
    message: &ChatMessage,
    own_id: Option<&str>,
    open_peer_id: Option<&str>,
) -> bool {
    let sender = Some(message.sender_id.as_str());
    sender != own_id && sender != open_peer_id
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_network_events();
        if let Some(session) = &mut self.session {
            session.poll_typing(Instant::now());
        }
        self.handle_dropped_files(ctx);

        if self.current_user.is_none() {
            self.render_login(ctx);
        } else {
            self.render_chat(ctx);
        }

        ctx.request_repaint();
    }
}
