use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::recording::{MediaBlob, StreamKind};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upload rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("no upload endpoint configured for {0} recordings")]
    NoEndpoint(StreamKind),
}

/// Server acknowledgement of an upload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Identifier to poll for analysis results
    #[serde(default, alias = "video_id", alias = "id")]
    pub analysis_id: Option<String>,
}

/// Upload endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub audio_url: String,
    pub video_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            audio_url: "http://localhost:8000/interview/analyze-audio/".to_string(),
            video_url: Some("http://localhost:8000/interview/analyze-video/".to_string()),
            timeout_secs: 120,
        }
    }
}

/// Submits a finalized recording. One attempt, no retry.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, blob: &MediaBlob) -> Result<UploadReceipt, UploadError>;
}

/// Multipart upload with a bearer credential
pub struct HttpUploader {
    client: reqwest::Client,
    config: UploadConfig,
    token: String,
}

impl HttpUploader {
    pub fn new(config: UploadConfig, token: impl Into<String>) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            token: token.into(),
        })
    }

    fn endpoint(&self, kind: StreamKind) -> Option<&str> {
        match kind {
            StreamKind::Audio => Some(self.config.audio_url.as_str()),
            StreamKind::Video => self.config.video_url.as_deref(),
        }
        .filter(|url| !url.is_empty())
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn upload(&self, blob: &MediaBlob) -> Result<UploadReceipt, UploadError> {
        let url = self
            .endpoint(blob.kind)
            .ok_or(UploadError::NoEndpoint(blob.kind))?;

        info!(
            "Uploading {} recording {} ({} bytes) to {}",
            blob.kind,
            blob.file_name,
            blob.bytes.len(),
            url
        );

        let part = Part::bytes(blob.bytes.clone())
            .file_name(blob.file_name.clone())
            .mime_str(&blob.mime_type)?;
        let form = Form::new()
            .part("file", part)
            .text("session_id", blob.session_id.to_string());

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await;

        if !status.is_success() {
            let body = body.unwrap_or_else(|e| format!("<unreadable body: {}>", e));
            error!("Upload of {} rejected: {} {}", blob.kind, status, body);
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let receipt = match body {
            Ok(body) => read_receipt(&body),
            Err(e) => {
                warn!(
                    "Upload of {} accepted ({}) but the response could not be read: {}",
                    blob.kind, status, e
                );
                UploadReceipt::default()
            }
        };

        info!(
            "Uploaded {} recording for session {} (analysis id: {:?})",
            blob.kind, blob.session_id, receipt.analysis_id
        );

        Ok(receipt)
    }
}

/// Parse the acknowledgement body. An unrecognized body still counts as uploaded.
fn read_receipt(body: &str) -> UploadReceipt {
    if body.trim().is_empty() {
        return UploadReceipt::default();
    }

    serde_json::from_str(body).unwrap_or_else(|e| {
        warn!("Unrecognized upload receipt ({}): {}", e, body);
        UploadReceipt::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn blob(kind: StreamKind) -> MediaBlob {
        MediaBlob {
            kind,
            session_id: "conversation-1".into(),
            mime_type: "audio/wav".to_string(),
            file_name: "conversation-1.wav".to_string(),
            bytes: vec![1, 2, 3],
        }
    }

    /// Accept one multipart request, answer with `response` verbatim and hang up
    async fn serve_once(response: String) -> (UploadConfig, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = UploadConfig {
            audio_url: format!("http://{}/analyze-audio/", listener.local_addr().unwrap()),
            video_url: None,
            timeout_secs: 5,
        };

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            while !request.ends_with(b"--\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).to_lowercase()
        });

        (config, server)
    }

    fn http_response(status: &str, declared_len: usize, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status, declared_len, body
        )
    }

    #[test]
    fn receipt_accepts_id_aliases() {
        for body in [
            r#"{"analysis_id":"a1"}"#,
            r#"{"video_id":"a1"}"#,
            r#"{"id":"a1","status":"queued"}"#,
        ] {
            assert_eq!(read_receipt(body).analysis_id.as_deref(), Some("a1"));
        }

        assert_eq!(read_receipt("{}").analysis_id, None);
        assert_eq!(read_receipt("").analysis_id, None);
        assert_eq!(read_receipt("<html>ok</html>").analysis_id, None);
    }

    #[tokio::test]
    async fn uploads_multipart_with_bearer_and_session_id() {
        let body = r#"{"video_id":"analysis-7"}"#;
        let (config, server) = serve_once(http_response("200 OK", body.len(), body)).await;
        let uploader = HttpUploader::new(config, "secret").unwrap();

        let receipt = uploader.upload(&blob(StreamKind::Audio)).await.unwrap();

        assert_eq!(receipt.analysis_id.as_deref(), Some("analysis-7"));
        let request = server.await.unwrap();
        assert!(request.starts_with("post /analyze-audio/"));
        assert!(request.contains("authorization: bearer secret"));
        assert!(request.contains("name=\"file\"; filename=\"conversation-1.wav\""));
        assert!(request.contains("name=\"session_id\""));
        assert!(request.contains("conversation-1"));
    }

    #[tokio::test]
    async fn truncated_receipt_still_counts_as_uploaded() {
        let (config, server) =
            serve_once(http_response("200 OK", 64, r#"{"video_id":"#)).await;
        let uploader = HttpUploader::new(config, "secret").unwrap();

        let receipt = uploader.upload(&blob(StreamKind::Audio)).await.unwrap();

        assert_eq!(receipt.analysis_id, None);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn rejected_upload_carries_status_and_body() {
        let body = "storage offline";
        let (config, server) =
            serve_once(http_response("500 Internal Server Error", body.len(), body)).await;
        let uploader = HttpUploader::new(config, "secret").unwrap();

        match uploader.upload(&blob(StreamKind::Audio)).await {
            Err(UploadError::Rejected { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "storage offline");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn missing_video_endpoint_is_reported() {
        let config = UploadConfig {
            video_url: None,
            ..Default::default()
        };
        let uploader = HttpUploader::new(config, "secret").unwrap();

        assert!(matches!(
            uploader.upload(&blob(StreamKind::Video)).await,
            Err(UploadError::NoEndpoint(StreamKind::Video))
        ));
    }
}
