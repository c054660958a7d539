//! Finch Library
//!
//! Embedded "agent preview" surface: a static financial dashboard next to a
//! conversational assistant, driven by a chat session orchestration core.
//!
//! ## Main Components
//!
//! - [`chat`] - Chat core (state store, orchestration service, errors)
//! - [`transport`] - Streaming transport seam and the SSE implementation
//! - [`auth`] - Access-token acquisition capability
//! - [`view`] - View coordination (dashboard/chat pages, settings flag)
//! - [`dashboard`] - Static P&L dashboard dataset
//! - [`config`] - Environment-derived settings
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use finch::{ChatService, ChatStore, EnvTokenProvider, SseTransport};
//!
//! let store = Arc::new(ChatStore::new());
//! let auth = Arc::new(EnvTokenProvider::new("FINCH_API_TOKEN"));
//! let transport = Arc::new(SseTransport::new("http://localhost:8080/api")?);
//! let service = ChatService::new(store, auth, transport);
//! service.send_message("Revenue trend?", None, vec![]).await?;
//! ```

pub mod auth;
pub mod chat;
pub mod config;
pub mod dashboard;
pub mod transport;
pub mod view;

// Re-export commonly used types
pub use auth::{AccessToken, AuthError, EnvTokenProvider, StaticTokenProvider, TokenProvider};
pub use chat::{
    AttachmentRef, ChatError, ChatMessage, ChatService, ChatState, ChatStatus, ChatStore,
    ChatUpdate, MessageRole, MessageStatus, StateReceiver, StoreError,
};
pub use config::Settings;
pub use dashboard::DashboardData;
pub use transport::{
    ChatRequest, ChatTransport, SseTransport, StreamChunk, StreamReceiver, TransportError,
};
pub use view::{AgentIdentity, AppPage, ViewCoordinator};
