#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::ChatDelta;
use crate::domain::models::ChatError;
use crate::domain::models::ContextMessage;

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

fn convert_err(err: reqwest::Error) -> std::io::Error {
    let err_msg = err.to_string();
    return std::io::Error::new(std::io::ErrorKind::Interrupted, err_msg);
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Model {
    id: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ModelListResponse {
    data: Vec<Model>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ContextMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionDeltaResponse {
    #[serde(default)]
    content: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionChoiceResponse {
    delta: CompletionDeltaResponse,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoiceResponse>,
}

/// Streaming client for OpenAI-compatible chat completion endpoints. Only the
/// `data: <json>` / `data: [DONE]` framing is supported; this is not a
/// general SSE implementation.
pub struct OpenAI {
    url: String,
    token: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout_ms: u64,
}

impl Default for OpenAI {
    fn default() -> OpenAI {
        return OpenAI {
            url: Config::get(ConfigKey::EndpointURL),
            token: Config::get(ConfigKey::ApiToken),
            model: Config::get(ConfigKey::Model),
            temperature: Config::get(ConfigKey::Temperature).parse().unwrap_or(0.7),
            max_tokens: Config::get(ConfigKey::MaxTokens).parse().unwrap_or(2048),
            timeout_ms: Config::get(ConfigKey::RequestTimeout)
                .parse()
                .unwrap_or(120_000),
        };
    }
}

#[async_trait]
impl Backend for OpenAI {
    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("Endpoint URL is not defined");
        }

        // The official API index returns odd statuses; don't bother probing.
        if self.url == "https://api.openai.com" {
            return Ok(());
        }

        let res = reqwest::Client::new()
            .get(&self.url)
            .timeout(Duration::from_millis(1000))
            .send()
            .await;

        if res.is_err() {
            tracing::error!(error = ?res.unwrap_err(), "endpoint is not reachable");
            bail!("Endpoint is not reachable");
        }

        let status = res.unwrap().status().as_u16();
        if status >= 500 {
            tracing::error!(status = status, "endpoint health check failed");
            bail!("Endpoint health check failed");
        }

        return Ok(());
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let res = reqwest::Client::new()
            .get(format!("{url}/v1/models", url = self.url))
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await?
            .json::<ModelListResponse>()
            .await?;

        let mut models = res
            .data
            .iter()
            .map(|model| return model.id.to_string())
            .collect::<Vec<String>>();

        models.sort();

        return Ok(models);
    }

    async fn stream_completion(
        &self,
        context: Vec<ContextMessage>,
        tx: &mpsc::UnboundedSender<ChatDelta>,
        cancel: CancellationToken,
    ) -> Result<String, ChatError> {
        let req = CompletionRequest {
            model: self.model.to_string(),
            messages: context,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: true,
        };

        let res = reqwest::Client::new()
            .post(format!("{url}/v1/chat/completions", url = self.url))
            .header("Authorization", format!("Bearer {}", self.token))
            .timeout(Duration::from_millis(self.timeout_ms))
            .json(&req)
            .send()
            .await
            .map_err(|err| {
                return ChatError::Interrupted {
                    partial: "".to_string(),
                    reason: err.to_string(),
                };
            })?;

        let status = res.status().as_u16();
        if !res.status().is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::error!(status = status, "completion request was rejected");
            return Err(ChatError::Http { status, body });
        }

        let stream = res.bytes_stream().map_err(convert_err);
        let mut lines_reader = StreamReader::new(stream).lines();

        let mut accumulated = String::new();
        loop {
            let line = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(ChatError::Canceled { partial: accumulated });
                }
                line = lines_reader.next_line() => line,
            };

            let line = match line {
                Ok(Some(line)) => line,
                // Transport close without the sentinel still counts as a
                // complete response.
                Ok(None) => break,
                Err(err) => {
                    return Err(ChatError::Interrupted {
                        partial: accumulated,
                        reason: err.to_string(),
                    });
                }
            };

            // Only data frames carry payload.
            let Some(payload) = line.trim().strip_prefix(DATA_PREFIX) else {
                continue;
            };
            let payload = payload.trim();
            if payload.is_empty() {
                continue;
            }
            if payload == DONE_SENTINEL {
                break;
            }

            let frame = match serde_json::from_str::<CompletionResponse>(payload) {
                Ok(frame) => frame,
                Err(err) => {
                    // One corrupt frame must not lose the rest of the
                    // response.
                    tracing::warn!(error = %err, "skipping malformed stream frame");
                    continue;
                }
            };

            let fragment = frame
                .choices
                .first()
                .map(|choice| return choice.delta.content.to_string())
                .unwrap_or_default();
            if fragment.is_empty() {
                continue;
            }

            accumulated += &fragment;
            let delta = ChatDelta {
                fragment,
                accumulated: accumulated.to_string(),
            };

            if tx.send(delta).is_err() {
                // Nobody is listening anymore.
                return Err(ChatError::Canceled {
                    partial: accumulated,
                });
            }
        }

        return Ok(accumulated);
    }
}
