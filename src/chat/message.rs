//! Chat message types and status transitions.
//!
//! Defines the core message structure for a conversation: roles,
//! attachment references, and the forward-only status lifecycle
//! (pending → streaming → complete | error | canceled).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// Lifecycle status of a single message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Appended but not yet acknowledged by the backend.
    Pending,
    /// Currently receiving chunks.
    Streaming,
    /// Settled normally; content is immutable from here on.
    Complete,
    /// Settled with a failure.
    Error,
    /// Aborted by the user; partial content is retained.
    Canceled,
}

impl MessageStatus {
    /// Whether a transition from `self` to `next` moves the lifecycle forward.
    ///
    /// Settled statuses (complete, error, canceled) accept no further
    /// transitions; pending may only advance, never be re-entered.
    pub fn can_advance_to(self, next: MessageStatus) -> bool {
        match self {
            MessageStatus::Pending => next != MessageStatus::Pending,
            MessageStatus::Streaming => !matches!(
                next,
                MessageStatus::Pending | MessageStatus::Streaming
            ),
            MessageStatus::Complete | MessageStatus::Error | MessageStatus::Canceled => false,
        }
    }

    /// Whether the message has settled and its content is immutable.
    pub fn is_settled(self) -> bool {
        matches!(
            self,
            MessageStatus::Complete | MessageStatus::Error | MessageStatus::Canceled
        )
    }
}

/// Reference to a file attached to a user message.
///
/// Carries identity and metadata only; the payload itself travels on the
/// outbound request, not through chat state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub id: String,
    pub name: String,
    pub media_type: String,
}

impl AttachmentRef {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            media_type: media_type.into(),
        }
    }
}

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    /// Mutable while streaming, immutable once settled.
    pub content: String,
    pub attachments: Vec<AttachmentRef>,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a pending user message.
    pub fn user(content: impl Into<String>, attachments: Vec<AttachmentRef>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: MessageRole::User,
            content: content.into(),
            attachments,
            status: MessageStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Create an empty pending assistant message, ready to receive chunks.
    pub fn assistant() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: MessageRole::Assistant,
            content: String::new(),
            attachments: vec![],
            status: MessageStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Append a chunk of text. No-op once the message has settled.
    pub fn append_content(&mut self, text: &str) {
        if self.status.is_settled() {
            return;
        }
        self.content.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_starts_pending() {
        let msg = ChatMessage::user("Revenue trend?", vec![]);
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.status, MessageStatus::Pending);
        assert_eq!(msg.content, "Revenue trend?");
        assert!(msg.attachments.is_empty());
        assert!(!msg.id.is_empty());
    }

    #[test]
    fn assistant_message_starts_empty() {
        let msg = ChatMessage::assistant();
        assert_eq!(msg.role, MessageRole::Assistant);
        assert_eq!(msg.status, MessageStatus::Pending);
        assert!(msg.content.is_empty());
    }

    #[test]
    fn append_accumulates_in_order() {
        let mut msg = ChatMessage::assistant();
        msg.status = MessageStatus::Streaming;
        msg.append_content("Rev");
        msg.append_content("enue is up");
        msg.append_content(" 8%.");
        assert_eq!(msg.content, "Revenue is up 8%.");
    }

    #[test]
    fn append_ignored_after_settling() {
        let mut msg = ChatMessage::assistant();
        msg.status = MessageStatus::Streaming;
        msg.append_content("partial");
        msg.status = MessageStatus::Canceled;
        msg.append_content(" late chunk");
        assert_eq!(msg.content, "partial");
    }

    #[test]
    fn status_transitions_are_forward_only() {
        use MessageStatus::*;

        assert!(Pending.can_advance_to(Streaming));
        assert!(Pending.can_advance_to(Error));
        assert!(Pending.can_advance_to(Canceled));
        assert!(Streaming.can_advance_to(Complete));
        assert!(Streaming.can_advance_to(Error));
        assert!(Streaming.can_advance_to(Canceled));

        assert!(!Streaming.can_advance_to(Pending));
        assert!(!Complete.can_advance_to(Streaming));
        assert!(!Error.can_advance_to(Pending));
        assert!(!Canceled.can_advance_to(Complete));
        assert!(!Pending.can_advance_to(Pending));
    }

    #[test]
    fn settled_statuses() {
        assert!(!MessageStatus::Pending.is_settled());
        assert!(!MessageStatus::Streaming.is_settled());
        assert!(MessageStatus::Complete.is_settled());
        assert!(MessageStatus::Error.is_settled());
        assert!(MessageStatus::Canceled.is_settled());
    }

    #[test]
    fn attachment_ref_gets_unique_id() {
        let a = AttachmentRef::new("q1.csv", "text/csv");
        let b = AttachmentRef::new("q1.csv", "text/csv");
        assert_ne!(a.id, b.id);
        assert_eq!(a.name, "q1.csv");
        assert_eq!(a.media_type, "text/csv");
    }
}
