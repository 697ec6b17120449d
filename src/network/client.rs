use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::common::{NetworkCommand, NetworkEvent};

use super::wire::{ClientFrame, ServerFrame};

/// Thời gian chờ trước khi dial lại sau khi mất kết nối.
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, WsMessage>;
type WsSource = SplitStream<WsStream>;

/// Kết quả của một vòng kết nối, quyết định bước tiếp theo của vòng ngoài.
enum Drive {
    /// UI yêu cầu ngắt (logout), quay về idle chờ Connect mới.
    Logout,
    /// Socket đứt, dial lại sau RECONNECT_DELAY.
    Lost,
    /// Kênh lệnh đã đóng, app đang thoát.
    Shutdown,
}

/// Task sở hữu kết nối push tới backend. Idle tới khi UI gửi `Connect`,
/// sau đó tự dial lại khi rớt mạng; mỗi lần (re)connect đều announce
/// `user_online` lại để backend nhận diện socket này.
///
/// Không có replay: event phát ra trong lúc mất kết nối sẽ mất luôn.
pub struct SocketClient {
    ws_url: String,
    event_sender: mpsc::Sender<NetworkEvent>,
    command_receiver: mpsc::Receiver<NetworkCommand>,
}

impl SocketClient {
    pub fn new(
        backend_url: &str,
        event_sender: mpsc::Sender<NetworkEvent>,
        command_receiver: mpsc::Receiver<NetworkCommand>,
    ) -> Self {
        Self {
            ws_url: websocket_url(backend_url),
            event_sender,
            command_receiver,
        }
    }

    pub async fn run(mut self) {
        while let Some(command) = self.command_receiver.recv().await {
            match command {
                NetworkCommand::Connect { user_id } => {
                    if let Drive::Shutdown = self.run_connection(&user_id).await {
                        break;
                    }
                }
                NetworkCommand::Disconnect => {}
                other => {
                    // Chưa login thì chưa có socket, lệnh gửi đi bị bỏ.
                    log::warn!("Dropping {other:?}: not connected");
                }
            }
        }
        log::info!("Network task stopped");
    }

    /// Một phiên đăng nhập: dial, announce, bơm lệnh/frame cho tới khi
    /// logout hoặc app thoát. Rớt mạng thì lặp lại với delay cố định.
    async fn run_connection(&mut self, user_id: &str) -> Drive {
        loop {
            let stream = match connect_async(self.ws_url.as_str()).await {
                Ok((stream, _)) => stream,
                Err(err) => {
                    log::warn!("Connect to {} failed: {err}", self.ws_url);
                    tokio::time::sleep(RECONNECT_DELAY).await;
                    continue;
                }
            };
            log::info!("Connected to {}", self.ws_url);
            let (mut sink, mut source) = stream.split();

            // Backend map socket -> user qua user_online, nên phải gửi lại
            // sau mỗi lần reconnect.
            let announce = ClientFrame::UserOnline {
                user_id: user_id.to_string(),
            };
            if let Err(err) = send_frame(&mut sink, &announce).await {
                log::warn!("Failed to announce user_online: {err}");
                tokio::time::sleep(RECONNECT_DELAY).await;
                continue;
            }
            let _ = self.event_sender.send(NetworkEvent::Connected).await;

            match self.drive(&mut sink, &mut source).await {
                Drive::Lost => {
                    let _ = self.event_sender.send(NetworkEvent::Disconnected).await;
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
                ending => {
                    let _ = self.event_sender.send(NetworkEvent::Disconnected).await;
                    return ending;
                }
            }
        }
    }

    async fn drive(&mut self, sink: &mut WsSink, source: &mut WsSource) -> Drive {
        loop {
            tokio::select! {
                command = self.command_receiver.recv() => {
                    let Some(command) = command else {
                        return Drive::Shutdown;
                    };
                    match command {
                        NetworkCommand::Disconnect => {
                            let _ = sink.close().await;
                            return Drive::Logout;
                        }
                        NetworkCommand::Connect { .. } => {
                            log::debug!("Already connected, ignoring Connect");
                        }
                        command => {
                            if let Some(frame) = outbound_frame(command) {
                                if let Err(err) = send_frame(sink, &frame).await {
                                    log::warn!("WebSocket write failed: {err}");
                                    return Drive::Lost;
                                }
                            }
                        }
                    }
                }
                incoming = source.next() => {
                    let Some(incoming) = incoming else {
                        log::info!("Server closed the connection");
                        return Drive::Lost;
                    };
                    match incoming {
                        Ok(WsMessage::Text(text)) => self.handle_server_frame(text.as_str()).await,
                        Ok(WsMessage::Close(_)) => {
                            log::info!("Server sent close frame");
                            return Drive::Lost;
                        }
                        Ok(_) => {}
                        Err(err) => {
                            log::warn!("WebSocket read error: {err}");
                            return Drive::Lost;
                        }
                    }
                }
            }
        }
    }

    /// Payload lạ/hỏng chỉ bị log rồi bỏ qua, không được giết task mạng.
    async fn handle_server_frame(&mut self, raw: &str) {
        let frame = match serde_json::from_str::<ServerFrame>(raw) {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("Skipping unparseable server frame: {err}");
                return;
            }
        };
        let event = match frame {
            ServerFrame::OnlineUsers { users } => NetworkEvent::OnlineUsers(users),
            ServerFrame::ReceiveMessage(message) => NetworkEvent::MessageReceived(message),
            ServerFrame::UserTyping {
                sender_id,
                is_typing,
            } => NetworkEvent::PeerTyping {
                sender_id,
                is_typing,
            },
            ServerFrame::NewMessageNotification(message) => {
                NetworkEvent::MessageNotification(message)
            }
        };
        let _ = self.event_sender.send(event).await;
    }
}

fn outbound_frame(command: NetworkCommand) -> Option<ClientFrame> {
    match command {
        NetworkCommand::JoinChat {
            sender_id,
            receiver_id,
        } => Some(ClientFrame::JoinChat {
            sender_id,
            receiver_id,
        }),
        NetworkCommand::SendMessage(message) => Some(ClientFrame::SendMessage(message)),
        NetworkCommand::Typing {
            sender_id,
            receiver_id,
            is_typing,
        } => Some(ClientFrame::Typing {
            sender_id,
            receiver_id,
            is_typing,
        }),
        NetworkCommand::Connect { .. } | NetworkCommand::Disconnect => None,
    }
}

async fn send_frame(sink: &mut WsSink, frame: &ClientFrame) -> Result<(), WsError> {
    match serde_json::to_string(frame) {
        Ok(json) => sink.send(WsMessage::text(json)).await,
        Err(err) => {
            log::warn!("Failed to serialize outbound frame: {err}");
            Ok(())
        }
    }
}

/// Suy ra endpoint WebSocket từ backend base URL.
fn websocket_url(backend_url: &str) -> String {
    if let Some(rest) = backend_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = backend_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        format!("ws://{backend_url}")
    }
}
