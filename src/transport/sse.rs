//! Event-stream transport over HTTP.
//!
//! POSTs the chat request as JSON and reads the reply as `data:`-framed
//! lines, one JSON payload per frame, closed by a `data: [DONE]` sentinel:
//!
//! ```text
//! data: {"delta":"Rev","conversation_id":"c-42"}
//! data: {"delta":"enue is up 8%."}
//! data: [DONE]
//! ```
//!
//! A frame that is not valid JSON is stream-fatal: the error is forwarded
//! and the stream torn down, but the transport stays usable for the next
//! send.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{ChatRequest, ChatTransport, StreamChunk, StreamReceiver, TransportError};

const DONE_SENTINEL: &str = "[DONE]";
const CHUNK_CHANNEL_CAPACITY: usize = 64;

/// One parsed `data:` frame.
#[derive(Debug, Deserialize)]
struct StreamFrame {
    #[serde(default)]
    delta: String,
    #[serde(default)]
    conversation_id: Option<String>,
}

/// Streaming chat client for an event-stream backend.
#[derive(Clone)]
pub struct SseTransport {
    base_url: String,
    client: reqwest::Client,
}

impl SseTransport {
    /// Create a transport against `base_url` (e.g. `https://host/api`).
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn stream_url(&self) -> String {
        format!("{}/chat/stream", self.base_url)
    }
}

#[async_trait]
impl ChatTransport for SseTransport {
    async fn open_stream(&self, request: ChatRequest) -> Result<StreamReceiver, TransportError> {
        let url = self.stream_url();
        debug!(%url, conversation_id = ?request.conversation_id, "opening chat stream");

        let response = self
            .client
            .post(&url)
            .bearer_auth(request.access_token.secret())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(status, "chat backend rejected stream request");
            return Err(TransportError::Status { status, body });
        }

        let (tx, rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
        let mut body = response.bytes_stream();

        tokio::spawn(async move {
            let mut buffer = String::new();
            let mut conversation_id: Option<String> = None;

            while let Some(chunk) = body.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = tx.send(Err(TransportError::Http(e))).await;
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&bytes));

                while let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].trim().to_string();
                    buffer.drain(..=pos);

                    let Some(payload) = line.strip_prefix("data:") else {
                        // Blank keep-alives and comment lines are skipped.
                        continue;
                    };
                    let payload = payload.trim();

                    if payload == DONE_SENTINEL {
                        let _ = tx
                            .send(Ok(StreamChunk::Done {
                                conversation_id: conversation_id.take(),
                            }))
                            .await;
                        return;
                    }

                    let frame: StreamFrame = match serde_json::from_str(payload) {
                        Ok(frame) => frame,
                        Err(e) => {
                            warn!(error = %e, "malformed stream frame");
                            let _ = tx
                                .send(Err(TransportError::Framing(e.to_string())))
                                .await;
                            return;
                        }
                    };

                    if let Some(id) = frame.conversation_id {
                        conversation_id = Some(id);
                    }
                    if !frame.delta.is_empty()
                        && tx.send(Ok(StreamChunk::Delta(frame.delta))).await.is_err()
                    {
                        // Receiver dropped: the stream was aborted.
                        debug!("stream receiver dropped, stopping");
                        return;
                    }
                }
            }

            // The connection closed without a sentinel; closure itself is a
            // terminal signal.
            debug!("stream closed without sentinel");
            let _ = tx
                .send(Ok(StreamChunk::Done {
                    conversation_id: conversation_id.take(),
                }))
                .await;
        });

        Ok(StreamReceiver::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let transport = SseTransport::new("https://host/api/").unwrap();
        assert_eq!(transport.stream_url(), "https://host/api/chat/stream");

        let transport = SseTransport::new("https://host/api").unwrap();
        assert_eq!(transport.stream_url(), "https://host/api/chat/stream");
    }

    #[test]
    fn frame_parses_delta_and_conversation() {
        let frame: StreamFrame =
            serde_json::from_str(r#"{"delta":"Rev","conversation_id":"c-42"}"#).unwrap();
        assert_eq!(frame.delta, "Rev");
        assert_eq!(frame.conversation_id.as_deref(), Some("c-42"));
    }

    #[test]
    fn frame_fields_are_optional() {
        let frame: StreamFrame = serde_json::from_str("{}").unwrap();
        assert!(frame.delta.is_empty());
        assert!(frame.conversation_id.is_none());
    }

    #[test]
    fn malformed_frame_is_an_error() {
        let result: Result<StreamFrame, _> = serde_json::from_str("data without braces");
        assert!(result.is_err());
    }
}
