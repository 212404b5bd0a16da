use async_trait::async_trait;
use futures_util::stream::{BoxStream, StreamExt};
use reqwest::Client;
use serde::Serialize;

use crate::error::ChatError;

/// Response body as it arrives off the wire.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, ChatError>>;

/// Source of answer bytes for a question.
///
/// `ask` resolves once response headers are in; a non-2xx status is returned
/// as [`ChatError::Transport`] without touching the body.
#[async_trait]
pub trait AskTransport: Send + Sync {
    async fn ask(&self, question: &str) -> Result<ByteStream, ChatError>;
}

#[derive(Serialize)]
struct AskRequest<'a> {
    question: &'a str,
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, ask_path: &str) -> Self {
        Self {
            client: Client::new(),
            url: join_url(base_url, ask_path),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AskTransport for HttpTransport {
    async fn ask(&self, question: &str) -> Result<ByteStream, ChatError> {
        tracing::debug!(url = %self.url, "posting question");

        // .json() also sets `Content-Type: application/json`
        let response = self
            .client
            .post(&self.url)
            .json(&AskRequest { question })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "ask endpoint rejected the request");
            return Err(ChatError::Transport {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| ChatError::Stream(e.to_string()))
            })
            .boxed();

        Ok(body)
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
