//! Errors surfaced by the chat orchestration service.

use thiserror::Error;

/// Errors from chat operations.
///
/// Only `EmptyMessage` and `StreamInFlight` are returned to callers of
/// `send_message`; auth and stream failures are recovered into chat state
/// (an error-status message plus `ChatState::error`) and never escape.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Send with no text and no attachments.
    #[error("Message is empty")]
    EmptyMessage,
    /// Send while another response is still in flight.
    #[error("A response is already in progress")]
    StreamInFlight,
    /// Credential acquisition failed before any network call.
    #[error("Authentication error: {0}")]
    Auth(String),
    /// Network or framing failure on an open stream.
    #[error("Stream error: {0}")]
    Stream(String),
}
