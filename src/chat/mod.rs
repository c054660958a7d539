//! Chat session orchestration core.
//!
//! The state machine that governs sending a user message, streaming the
//! assistant reply incrementally, cancelling an in-flight reply, and
//! recovering from errors, with at most one active network stream per
//! conversation at any time.
//!
//! - [`message`] - message data model and forward-only status lifecycle
//! - [`state`] - `ChatState` and the closed set of update operations
//! - [`store`] - single-writer store with mutate-then-notify subscription
//! - [`service`] - orchestration of send/cancel/clear and the stream handle
//! - [`error`] - the `ChatError` taxonomy

pub mod error;
pub mod message;
pub mod service;
pub mod state;
pub mod store;

pub use error::ChatError;
pub use message::{AttachmentRef, ChatMessage, MessageRole, MessageStatus};
pub use service::ChatService;
pub use state::{ChatState, ChatStatus, ChatUpdate};
pub use store::{ChatStore, StateReceiver, StoreError};
