//! OpenAI-compatible chat-completions client (OpenRouter by default).
//!
//! Both operations hit `{base_url}/chat/completions`; `stream: true` switches
//! the response body to server-sent events. The body is framed into lines by
//! `LinesCodec` and each line is decoded by [`super::sse`].

use std::future::ready;
use std::io;
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tokio_util::io::StreamReader;
use tracing::debug;

use super::config::LlmConfig;
use super::sse::{self, SseEvent};
use super::types::{ChatMessage, ChatRequest, LlmChat, LlmError, TextStream};

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    /// Build a client with attribution headers and timeouts from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if a header value is invalid or the HTTP client fails to build.
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("http-referer"), header_value(&config.app_url)?);
        headers.insert(HeaderName::from_static("x-title"), header_value(&config.app_title)?);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| LlmError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, api_key: config.api_key.clone(), base_url: config.base_url.clone() })
    }

    async fn send(&self, request: &ChatRequest, stream: bool) -> Result<reqwest::Response, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = CcRequest {
            model: &request.model,
            messages: &request.messages,
            stream,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };
        debug!(model = %request.model, stream, messages = request.messages.len(), "llm: request");

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiResponse { status, body: text });
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl LlmChat for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let response = self.send(request, false).await?;
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;
        parse_chat_completion(&text)
    }

    async fn stream(&self, request: &ChatRequest) -> Result<TextStream, LlmError> {
        let response = self.send(request, true).await?;
        let bytes = response.bytes_stream().map(|r| r.map_err(io::Error::other));
        Ok(decode_event_stream(bytes))
    }
}

fn header_value(raw: &str) -> Result<HeaderValue, LlmError> {
    HeaderValue::from_str(raw).map_err(|e| LlmError::ConfigParse(format!("invalid header value '{raw}': {e}")))
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct CcRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

// =============================================================================
// RESPONSE PARSING
// =============================================================================

/// Extract `choices[0].message.content` from a non-streamed response.
pub(crate) fn parse_chat_completion(json_text: &str) -> Result<String, LlmError> {
    let root: Value = serde_json::from_str(json_text).map_err(|e| LlmError::ApiParse(e.to_string()))?;
    let Some(choice) = root
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
    else {
        return Err(LlmError::ApiParse("chat_completions: missing choices[0]".to_string()));
    };
    Ok(choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string())
}

/// Longest event line accepted from the provider.
const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Turn a raw byte stream into a stream of text deltas.
///
/// Yields deltas in receipt order, stops at `[DONE]` or end of body, and
/// ends after the first error.
pub(crate) fn decode_event_stream<S>(bytes: S) -> TextStream
where
    S: Stream<Item = io::Result<Bytes>> + Send + 'static,
{
    let lines = FramedRead::new(StreamReader::new(bytes), LinesCodec::new_with_max_length(MAX_LINE_BYTES));
    let deltas = lines.scan(false, |failed, line| {
        if *failed {
            return ready(None);
        }
        let item = match line.map_err(codec_error).and_then(|line| sse::parse_line(&line)) {
            Ok(Some(SseEvent::Delta(text))) => Some(Ok(text)),
            Ok(Some(SseEvent::Done)) => return ready(None),
            Ok(None) => None,
            Err(e) => {
                *failed = true;
                Some(Err(e))
            }
        };
        ready(Some(item))
    });
    Box::pin(deltas.filter_map(ready))
}

fn codec_error(err: LinesCodecError) -> LlmError {
    match err {
        LinesCodecError::MaxLineLengthExceeded => {
            LlmError::ApiParse(format!("event line longer than {MAX_LINE_BYTES} bytes"))
        }
        LinesCodecError::Io(e) if e.kind() == io::ErrorKind::InvalidData => LlmError::ApiParse(e.to_string()),
        LinesCodecError::Io(e) => LlmError::ApiRequest(e.to_string()),
    }
}

#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;
