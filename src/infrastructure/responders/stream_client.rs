#[cfg(test)]
#[path = "stream_client_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::StreamExt;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use tokio::sync::mpsc;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ChatRequest;
use crate::domain::models::Event;
use crate::domain::models::Responder;
use crate::domain::models::ResponderEvent;
use crate::domain::models::ResponderEventKind;

const GENERIC_FAILURE: &str = "Failed to get response";

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct QuestionRequest {
    question: String,
    stream: bool,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorResponse {
    detail: String,
}

/// Turns a byte stream into text without splitting multi-byte characters
/// that straddle chunk boundaries.
#[derive(Default)]
struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    fn decode(&mut self, bytes: &[u8]) -> Result<String> {
        self.pending.extend_from_slice(bytes);

        match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                let text = text.to_string();
                self.pending.clear();
                return Ok(text);
            }
            Err(err) => {
                if err.error_len().is_some() {
                    bail!("Response stream did not contain valid UTF-8");
                }

                let valid_up_to = err.valid_up_to();
                let rest = self.pending.split_off(valid_up_to);
                let text = String::from_utf8(std::mem::replace(&mut self.pending, rest))?;
                return Ok(text);
            }
        }
    }

    fn finish(&self) -> Result<()> {
        if !self.pending.is_empty() {
            bail!("Response stream ended in the middle of a character");
        }

        return Ok(());
    }
}

/// Client for the course assistant API. Answers arrive as a raw text stream.
pub struct StreamClient {
    url: String,
    timeout: String,
}

impl Default for StreamClient {
    fn default() -> StreamClient {
        return StreamClient::new(
            &Config::get(ConfigKey::ApiUrl),
            &Config::get(ConfigKey::HealthCheckTimeout),
        );
    }
}

impl StreamClient {
    pub fn new(url: &str, timeout: &str) -> StreamClient {
        return StreamClient {
            url: url.trim_end_matches('/').to_string(),
            timeout: timeout.to_string(),
        };
    }

    /// Same as `health_check`, but never fails.
    pub async fn check_health(&self) -> bool {
        return self.health_check().await.is_ok();
    }

    async fn error_detail(res: reqwest::Response) -> String {
        let status = res.status().as_u16();
        match res.json::<ErrorResponse>().await {
            Ok(body) if !body.detail.is_empty() => {
                tracing::error!(status, detail = %body.detail, "Course assistant request failed");
                return body.detail;
            }
            _ => {
                tracing::error!(status, "Course assistant request failed");
                return GENERIC_FAILURE.to_string();
            }
        }
    }

    /// Streams the answer for a question, returning `Err` with a readable
    /// message on any failure. Chunks already sent stay sent.
    async fn stream_answer(
        &self,
        request: &ChatRequest,
        tx: &mpsc::UnboundedSender<Event>,
    ) -> Result<Result<String, String>> {
        let req = QuestionRequest {
            question: request.question.to_string(),
            stream: true,
        };

        let res = reqwest::Client::new()
            .post(format!(
                "{url}{path}",
                url = self.url,
                path = request.chat_type.endpoint()
            ))
            .json(&req)
            .send()
            .await;

        let res = match res {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, "Course assistant is not reachable");
                return Ok(Err(err.to_string()));
            }
        };

        if !res.status().is_success() {
            return Ok(Err(StreamClient::error_detail(res).await));
        }

        let mut decoder = Utf8Decoder::default();
        let mut accumulated = "".to_string();
        let mut stream = Box::pin(res.bytes_stream());

        while let Some(item) = stream.next().await {
            let bytes = match item {
                Ok(bytes) => bytes,
                Err(err) => {
                    tracing::error!(error = ?err, "Course assistant stream failed");
                    return Ok(Err(err.to_string()));
                }
            };

            let chunk = match decoder.decode(&bytes) {
                Ok(chunk) => chunk,
                Err(err) => return Ok(Err(err.to_string())),
            };
            if chunk.is_empty() {
                continue;
            }

            accumulated += &chunk;
            tracing::debug!(chunk = %chunk, "Course assistant chunk");
            tx.send(Event::Responder(ResponderEvent::new(
                request,
                ResponderEventKind::Chunk {
                    chunk,
                    accumulated: accumulated.to_string(),
                },
            )))?;
        }

        if let Err(err) = decoder.finish() {
            return Ok(Err(err.to_string()));
        }

        return Ok(Ok(accumulated));
    }

    /// Re-indexes the course documents behind the assistant.
    pub async fn reindex(&self) -> Result<serde_json::Value> {
        let res = reqwest::Client::new()
            .post(format!("{url}/api/index", url = self.url))
            .send()
            .await?;

        if !res.status().is_success() {
            let detail = StreamClient::error_detail(res).await;
            bail!(detail);
        }

        return Ok(res.json::<serde_json::Value>().await?);
    }
}

#[async_trait]
impl Responder for StreamClient {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        let res = reqwest::Client::new()
            .get(format!("{url}/health", url = self.url))
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        let res = match res {
            Ok(res) => res,
            Err(err) => {
                tracing::warn!(error = ?err, "Course assistant is not running");
                bail!("Course assistant is not running");
            }
        };

        if !res.status().is_success() {
            tracing::warn!(status = res.status().as_u16(), "Course assistant health check failed");
            bail!("Course assistant health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn respond<'a>(
        &self,
        request: ChatRequest,
        tx: &'a mpsc::UnboundedSender<Event>,
    ) -> Result<()> {
        let kind = match self.stream_answer(&request, tx).await? {
            Ok(text) => ResponderEventKind::Complete(text),
            Err(message) => ResponderEventKind::Error(message),
        };

        tx.send(Event::Responder(ResponderEvent::new(&request, kind)))?;
        return Ok(());
    }
}
