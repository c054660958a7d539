//! Top-level view coordination for the agent preview surface.
//!
//! Switches between the static dashboard and the chat page, tracks the
//! settings modal, and forwards chat intents verbatim to the orchestration
//! service. Holds no chat-domain state of its own; anything derived from
//! chat state (like input disabling) is computed from a store snapshot.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::chat::{AttachmentRef, ChatError, ChatService, ChatStore};

/// The two pages of the preview surface. Navigation is unrestricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppPage {
    #[default]
    Dashboard,
    Chat,
}

/// Pure page transition: any page can be reached from any page.
pub fn navigate(_current: AppPage, target: AppPage) -> AppPage {
    target
}

/// Identity of the agent shown on the chat page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentIdentity {
    pub name: String,
    pub description: Option<String>,
    pub logo: Option<String>,
}

/// Presentation state plus intent forwarding.
pub struct ViewCoordinator {
    page: AppPage,
    settings_open: bool,
    agent: AgentIdentity,
    service: Arc<ChatService>,
}

impl ViewCoordinator {
    pub fn new(service: Arc<ChatService>, agent: AgentIdentity) -> Self {
        Self {
            page: AppPage::default(),
            settings_open: false,
            agent,
            service,
        }
    }

    pub fn page(&self) -> AppPage {
        self.page
    }

    pub fn show(&mut self, page: AppPage) {
        self.page = navigate(self.page, page);
    }

    pub fn settings_open(&self) -> bool {
        self.settings_open
    }

    pub fn set_settings_open(&mut self, open: bool) {
        self.settings_open = open;
    }

    pub fn agent(&self) -> &AgentIdentity {
        &self.agent
    }

    /// The store backing the chat page, for read-only subscription.
    pub fn store(&self) -> &Arc<ChatStore> {
        self.service.store()
    }

    /// Derived, never stored: input is disabled while a stream is in flight.
    pub fn input_disabled(&self) -> bool {
        self.service.store().snapshot().status.is_busy()
    }

    /// Send a message in the current conversation.
    pub async fn send_message(
        &self,
        text: &str,
        attachments: Vec<AttachmentRef>,
    ) -> Result<(), ChatError> {
        let conversation_id = self.service.store().snapshot().conversation_id;
        self.service
            .send_message(text, conversation_id, attachments)
            .await
    }

    pub async fn cancel_stream(&self) {
        self.service.cancel_stream().await;
    }

    pub async fn new_chat(&self) {
        self.service.clear_chat().await;
    }

    pub fn clear_error(&self) {
        self.service.clear_error();
    }
}
