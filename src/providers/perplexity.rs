use std::pin::Pin;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Settings;
use crate::model::Message;
use crate::providers::http_errors::api_request_error;

/// Ordered, finite sequence of response text fragments. Driving it to
/// completion is the caller's job; there is no restart.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A complete buffered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatCompletion {
    pub content: String,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Option<StreamDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

fn completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

fn to_wire_messages(messages: &[Message]) -> Vec<ChatMessage> {
    messages
        .iter()
        .map(|msg| ChatMessage {
            role: msg.role.as_str().to_string(),
            content: msg.content.clone(),
        })
        .collect()
}

async fn send_request(
    client: &Client,
    settings: &Settings,
    api_key: &str,
    model: &str,
    messages: &[Message],
    stream: bool,
) -> Result<reqwest::Response> {
    let api_url = completions_url(&settings.api_base_url);
    let body = ChatRequest {
        model: model.to_string(),
        messages: to_wire_messages(messages),
        stream,
    };
    debug!(
        api_url = %api_url,
        model = %model,
        message_count = messages.len(),
        stream,
        "sending chat completion request"
    );

    let mut request = client.post(&api_url).bearer_auth(api_key).json(&body);
    if !stream {
        // A whole-request timeout would cut long streams short; bound only
        // the buffered call.
        request = request.timeout(Duration::from_secs(settings.request_timeout_secs));
    }

    let response = request
        .send()
        .await
        .map_err(|err| {
            warn!(api_url = %api_url, model = %model, error = %err, "chat request failed");
            api_request_error(err, &api_url, settings.request_timeout_secs)
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let response_body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read response body>".to_string());
        warn!(
            api_url = %api_url,
            model = %model,
            status = %status,
            "chat request returned non-success status"
        );
        return Err(api_status_error(status, &response_body));
    }

    Ok(response)
}

fn api_status_error(status: reqwest::StatusCode, body: &str) -> anyhow::Error {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(parsed) => anyhow!("API request failed with status {}: {}", status, parsed.error.message),
        Err(_) => anyhow!("API request failed with status {}: {}", status, body),
    }
}

/// Buffered chat completion: one request, one complete answer.
pub async fn chat(
    client: &Client,
    settings: &Settings,
    api_key: &str,
    model: &str,
    messages: &[Message],
) -> Result<ChatCompletion> {
    let response = send_request(client, settings, api_key, model, messages, false).await?;

    let parsed: ChatResponse = response
        .json()
        .await
        .context("Failed to parse chat completion response")?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| anyhow!("API response contained no completion text"))?;

    debug!(response_len = content.len(), "received chat completion");
    Ok(ChatCompletion {
        content,
        usage: parsed.usage,
    })
}

/// Streaming chat completion: the response arrives as an ordered sequence of
/// text fragments, finished by the server's `[DONE]` marker.
pub async fn chat_stream(
    client: &Client,
    settings: &Settings,
    api_key: &str,
    model: &str,
    messages: &[Message],
) -> Result<TextStream> {
    let response = send_request(client, settings, api_key, model, messages, true).await?;
    Ok(parse_sse_text_stream(response.bytes_stream()))
}

struct SseState {
    bytes: Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>,
    buffer: String,
    done: bool,
}

/// Re-frame an SSE byte stream into text fragments. Fragments keep arrival
/// order; anything that is not a `data:` line carrying a content delta is
/// skipped.
fn parse_sse_text_stream(
    byte_stream: impl Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
) -> TextStream {
    let state = SseState {
        bytes: Box::pin(byte_stream),
        buffer: String::new(),
        done: false,
    };

    Box::pin(futures::stream::unfold(state, |mut state| async move {
        if state.done {
            return None;
        }

        loop {
            while let Some(line_end) = state.buffer.find('\n') {
                let line = state.buffer[..line_end].trim().to_string();
                state.buffer.drain(..=line_end);

                let Some(data) = line.strip_prefix("data: ") else {
                    continue;
                };
                if data == "[DONE]" {
                    state.done = true;
                    return None;
                }

                match serde_json::from_str::<StreamChunk>(data) {
                    Ok(chunk) => {
                        let content = chunk
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|choice| choice.delta)
                            .and_then(|delta| delta.content);
                        if let Some(content) = content
                            && !content.is_empty()
                        {
                            return Some((Ok(content), state));
                        }
                    }
                    Err(err) => {
                        debug!(error = %err, "skipping unparseable stream event");
                    }
                }
            }

            match state.bytes.next().await {
                Some(Ok(bytes)) => {
                    state.buffer.push_str(&String::from_utf8_lossy(&bytes));
                }
                Some(Err(err)) => {
                    state.done = true;
                    return Some((
                        Err(anyhow::Error::new(err).context("Failed to read response stream")),
                        state,
                    ));
                }
                None => return None,
            }
        }
    }))
}
