//! Transport seam between the orchestration core and the chat backend.
//!
//! The core only requires three things from a transport: ordered chunk
//! delivery, a distinguishable terminal signal, and abortability (dropping
//! the [`StreamReceiver`] tears the stream down). The concrete framing
//! lives behind the [`ChatTransport`] trait so it stays swappable.

pub mod sse;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::auth::AccessToken;
use crate::chat::AttachmentRef;

pub use sse::SseTransport;

/// One outbound send to the chat backend.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
    /// `None` asks the backend to open a new conversation.
    pub conversation_id: Option<String>,
    pub attachments: Vec<AttachmentRef>,
    /// Travels as a bearer header, never in the body.
    #[serde(skip)]
    pub access_token: AccessToken,
}

/// One increment of an open stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChunk {
    /// A fragment of assistant text.
    Delta(String),
    /// Terminal signal; carries the conversation id the backend settled on.
    Done { conversation_id: Option<String> },
}

/// Transport-level failures.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Malformed stream frame: {0}")]
    Framing(String),
}

/// Receiver for chunks of one open stream.
///
/// Wraps an mpsc receiver; the sending task stops as soon as this half is
/// dropped, so dropping the receiver aborts the stream.
pub struct StreamReceiver {
    rx: mpsc::Receiver<Result<StreamChunk, TransportError>>,
}

impl StreamReceiver {
    pub fn new(rx: mpsc::Receiver<Result<StreamChunk, TransportError>>) -> Self {
        Self { rx }
    }

    /// Receive the next chunk. `None` means the stream closed.
    pub async fn recv(&mut self) -> Option<Result<StreamChunk, TransportError>> {
        self.rx.recv().await
    }
}

/// An abortable streaming chat backend.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Issue the outbound request and open the response stream.
    async fn open_stream(&self, request: ChatRequest) -> Result<StreamReceiver, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stream_receiver_yields_then_closes() {
        let (tx, rx) = mpsc::channel(4);
        let mut receiver = StreamReceiver::new(rx);

        tx.send(Ok(StreamChunk::Delta("hi".into()))).await.unwrap();
        tx.send(Ok(StreamChunk::Done {
            conversation_id: Some("conv-1".into()),
        }))
        .await
        .unwrap();
        drop(tx);

        assert_eq!(
            receiver.recv().await.unwrap().unwrap(),
            StreamChunk::Delta("hi".into())
        );
        assert_eq!(
            receiver.recv().await.unwrap().unwrap(),
            StreamChunk::Done {
                conversation_id: Some("conv-1".into())
            }
        );
        assert!(receiver.recv().await.is_none());
    }

    #[test]
    fn request_body_omits_the_token() {
        let request = ChatRequest {
            message: "Revenue trend?".into(),
            conversation_id: None,
            attachments: vec![],
            access_token: AccessToken::new("secret-token"),
        };
        let body = serde_json::to_string(&request).unwrap();
        assert!(body.contains("Revenue trend?"));
        assert!(!body.contains("secret-token"));
    }

    #[test]
    fn transport_error_display() {
        let err = TransportError::Status {
            status: 429,
            body: "rate limited".into(),
        };
        assert_eq!(err.to_string(), "Backend returned 429: rate limited");

        let err = TransportError::Framing("unexpected frame".into());
        assert_eq!(err.to_string(), "Malformed stream frame: unexpected frame");
    }
}
