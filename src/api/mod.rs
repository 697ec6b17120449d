use std::error::Error;
use std::path::Path;

use futures::stream;
use reqwest::multipart;
use tokio::sync::mpsc;

use crate::common::NetworkEvent;
use crate::common::types::{ChatMessage, UploadedFile, User};

/// Kích thước chunk khi stream body upload, đủ nhỏ để progress mượt.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

type UploadError = Box<dyn Error + Send + Sync>;

/// REST client cho backend chat. Clone rẻ (reqwest::Client share pool bên trong)
/// nên mỗi task fetch/upload giữ một bản riêng.
#[derive(Clone)]
pub struct Backend {
    http: reqwest::Client,
    base_url: String,
}

impl Backend {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub async fn fetch_users(&self) -> reqwest::Result<Vec<User>> {
        self.http
            .get(format!("{}/api/users", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    pub async fn fetch_history(
        &self,
        user_id: &str,
        peer_id: &str,
    ) -> reqwest::Result<Vec<ChatMessage>> {
        self.http
            .get(format!(
                "{}/api/messages/{user_id}/{peer_id}",
                self.base_url
            ))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    /// Upload một file qua multipart field `file`, báo tiến độ theo tỉ lệ
    /// byte đã gửi lên kênh event trong lúc body được stream đi.
    pub async fn upload(
        &self,
        path: &Path,
        events: mpsc::Sender<NetworkEvent>,
    ) -> Result<UploadedFile, UploadError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        let bytes = tokio::fs::read(path).await?;
        let total = bytes.len() as u64;

        let mut sent = 0u64;
        let chunks: Vec<Vec<u8>> = bytes.chunks(UPLOAD_CHUNK_SIZE).map(<[u8]>::to_vec).collect();
        let body = reqwest::Body::wrap_stream(stream::iter(chunks.into_iter().map(
            move |chunk| {
                sent += chunk.len() as u64;
                let percent = (sent * 100 / total.max(1)).min(100) as u8;
                // Kênh đầy thì bỏ tick progress, không chặn upload
                let _ = events.try_send(NetworkEvent::UploadProgress(percent));
                Ok::<Vec<u8>, std::io::Error>(chunk)
            },
        )));

        let part = multipart::Part::stream_with_length(body, total).file_name(file_name);
        let form = multipart::Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/api/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(format!("upload failed with status {}", response.status()).into());
        }

        let uploaded: UploadedFile = response.json().await?;
        if !uploaded.success {
            return Err("backend rejected the upload".into());
        }
        Ok(uploaded)
    }
}
