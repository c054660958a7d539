//! Conversation state and the closed set of update operations.
//!
//! `ChatState` is the single source of truth for one conversation. It is
//! only ever mutated through [`ChatUpdate`] operations, applied by the
//! store; `apply` enforces the forward-only message lifecycle and keeps
//! `streaming_message_id` consistent with message statuses.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::message::{ChatMessage, MessageStatus};

/// Overall send/stream status of the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatStatus {
    #[default]
    Idle,
    /// Request issued, no chunk received yet.
    Sending,
    /// At least one chunk received, stream still open.
    Streaming,
    Error,
}

impl ChatStatus {
    /// A stream is in flight while sending or streaming.
    pub fn is_busy(self) -> bool {
        matches!(self, ChatStatus::Sending | ChatStatus::Streaming)
    }
}

/// Snapshot of the current conversation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatState {
    /// Backend conversation identifier; `None` until the first exchange names one.
    pub conversation_id: Option<String>,
    /// Insertion-ordered, never reordered.
    pub messages: Vec<ChatMessage>,
    pub status: ChatStatus,
    /// Id of the message currently receiving chunks, if any.
    pub streaming_message_id: Option<String>,
    pub error: Option<String>,
}

/// The only operations that may mutate [`ChatState`].
#[derive(Debug, Clone)]
pub enum ChatUpdate {
    AppendMessage(ChatMessage),
    /// Append a chunk of text to a message's content, in arrival order.
    AppendChunk { message_id: String, text: String },
    /// Advance a message's status. Backward transitions are ignored.
    SetMessageStatus { message_id: String, status: MessageStatus },
    SetStatus(ChatStatus),
    /// Set or clear which message is receiving chunks.
    SetStreamingMessage(Option<String>),
    SetConversationId(Option<String>),
    SetError(Option<String>),
    /// Reset to the empty initial state.
    Reset,
}

impl ChatState {
    /// Apply a single update operation.
    ///
    /// Invalid operations (unknown message id, backward status transition)
    /// are logged and dropped rather than tearing the state.
    pub fn apply(&mut self, update: ChatUpdate) {
        match update {
            ChatUpdate::AppendMessage(message) => {
                self.messages.push(message);
            }
            ChatUpdate::AppendChunk { message_id, text } => {
                match self.message_mut(&message_id) {
                    Some(msg) => msg.append_content(&text),
                    None => warn!(%message_id, "chunk for unknown message dropped"),
                }
            }
            ChatUpdate::SetMessageStatus { message_id, status } => {
                let Some(msg) = self.message_mut(&message_id) else {
                    warn!(%message_id, "status update for unknown message dropped");
                    return;
                };
                if !msg.status.can_advance_to(status) {
                    warn!(
                        %message_id,
                        from = ?msg.status,
                        to = ?status,
                        "backward message transition dropped"
                    );
                    return;
                }
                msg.status = status;
                // A message that stops streaming is no longer the chunk target.
                if status != MessageStatus::Streaming
                    && self.streaming_message_id.as_deref() == Some(message_id.as_str())
                {
                    self.streaming_message_id = None;
                }
            }
            ChatUpdate::SetStatus(status) => {
                self.status = status;
                if status != ChatStatus::Error {
                    self.error = None;
                }
            }
            ChatUpdate::SetStreamingMessage(id) => {
                self.streaming_message_id = id;
            }
            ChatUpdate::SetConversationId(id) => {
                self.conversation_id = id;
            }
            ChatUpdate::SetError(error) => {
                self.error = error;
            }
            ChatUpdate::Reset => {
                *self = ChatState::default();
            }
        }
    }

    /// Look up a message by id.
    pub fn message(&self, id: &str) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    fn message_mut(&mut self, id: &str) -> Option<&mut ChatMessage> {
        self.messages.iter_mut().find(|m| m.id == id)
    }
}
