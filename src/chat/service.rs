//! Chat orchestration service.
//!
//! Converts user intents (send, cancel, clear, clear-error) into store
//! mutations and network operations, and owns the lifecycle of the single
//! active stream. At most one stream is open per conversation at any time;
//! the handle exists exactly while the overall status is sending or
//! streaming.
//!
//! Stale-chunk suppression: every stream carries a generation tag issued by
//! the store. The pump task applies chunks through
//! [`ChatStore::apply_if_current`], and cancellation invalidates the
//! generation before aborting the pump, so a chunk that was already in
//! flight when the user hit cancel can never reach the store.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::auth::TokenProvider;
use crate::transport::{ChatRequest, ChatTransport, StreamChunk, StreamReceiver};

use super::error::ChatError;
use super::message::{AttachmentRef, ChatMessage, MessageStatus};
use super::state::{ChatStatus, ChatUpdate};
use super::store::ChatStore;

/// The one outstanding stream, owned exclusively by the service.
struct StreamHandle {
    generation: u64,
    /// Assistant message receiving this stream's chunks.
    message_id: String,
    task: JoinHandle<()>,
}

type ActiveSlot = Arc<Mutex<Option<StreamHandle>>>;

/// Orchestrates the request/response lifecycle of one conversation.
///
/// Constructed once per session with its collaborators passed in.
pub struct ChatService {
    store: Arc<ChatStore>,
    auth: Arc<dyn TokenProvider>,
    transport: Arc<dyn ChatTransport>,
    active: ActiveSlot,
}

impl ChatService {
    pub fn new(
        store: Arc<ChatStore>,
        auth: Arc<dyn TokenProvider>,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            store,
            auth,
            transport,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// The store this service writes to.
    pub fn store(&self) -> &Arc<ChatStore> {
        &self.store
    }

    /// Send a user message and stream the assistant reply into the store.
    ///
    /// Rejects synchronously with [`ChatError::EmptyMessage`] or
    /// [`ChatError::StreamInFlight`]; credential and stream failures are
    /// folded into chat state and reported as `Ok(())`.
    pub async fn send_message(
        &self,
        text: &str,
        conversation_id: Option<String>,
        attachments: Vec<AttachmentRef>,
    ) -> Result<(), ChatError> {
        if text.trim().is_empty() && attachments.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        // Held for the whole setup so no second stream can slip in between
        // the status check and handle insertion.
        let mut active = self.active.lock().await;
        if active.is_some() || self.store.snapshot().status.is_busy() {
            return Err(ChatError::StreamInFlight);
        }

        let user = ChatMessage::user(text, attachments.clone());
        let user_id = user.id.clone();
        self.store.apply_all([
            ChatUpdate::SetConversationId(conversation_id.clone()),
            ChatUpdate::AppendMessage(user),
        ]);

        // Credential comes first; failure short-circuits before any network
        // call and before the assistant placeholder exists.
        let token = match self.auth.access_token().await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "credential acquisition failed");
                self.store.apply_all([
                    ChatUpdate::SetMessageStatus {
                        message_id: user_id,
                        status: MessageStatus::Error,
                    },
                    ChatUpdate::SetError(Some(e.to_string())),
                    ChatUpdate::SetStatus(ChatStatus::Error),
                ]);
                return Ok(());
            }
        };

        let assistant = ChatMessage::assistant();
        let assistant_id = assistant.id.clone();
        self.store.apply_all([
            ChatUpdate::AppendMessage(assistant),
            // Entering Sending clears any stale error from a prior failure.
            ChatUpdate::SetStatus(ChatStatus::Sending),
        ]);

        let generation = self.store.next_generation();
        let request = ChatRequest {
            message: text.to_string(),
            conversation_id,
            attachments,
            access_token: token,
        };

        let stream = match self.transport.open_stream(request).await {
            Ok(stream) => stream,
            Err(e) => {
                error!(error = %e, "failed to open chat stream");
                self.store.invalidate_generation();
                self.store.apply_all([
                    ChatUpdate::SetMessageStatus {
                        message_id: assistant_id,
                        status: MessageStatus::Error,
                    },
                    ChatUpdate::SetError(Some(e.to_string())),
                    ChatUpdate::SetStatus(ChatStatus::Error),
                ]);
                return Ok(());
            }
        };

        // The request is on the wire; the user's message has settled.
        self.store.apply(ChatUpdate::SetMessageStatus {
            message_id: user_id,
            status: MessageStatus::Complete,
        });

        debug!(generation, "chat stream opened");
        let task = tokio::spawn(pump_stream(
            Arc::clone(&self.store),
            Arc::clone(&self.active),
            generation,
            assistant_id.clone(),
            stream,
        ));
        *active = Some(StreamHandle {
            generation,
            message_id: assistant_id,
            task,
        });

        Ok(())
    }

    /// Abort the active stream, if any. Idempotent.
    ///
    /// The partial assistant content is kept; the message settles as
    /// canceled and no further chunk from the aborted stream can land.
    pub async fn cancel_stream(&self) {
        let mut active = self.active.lock().await;
        let Some(handle) = active.take() else {
            return;
        };

        // Invalidate before aborting: an in-flight chunk that already passed
        // the pump's recv still fails the generation check.
        self.store.invalidate_generation();
        handle.task.abort();

        info!(generation = handle.generation, "stream canceled");
        self.store.apply_all([
            ChatUpdate::SetMessageStatus {
                message_id: handle.message_id,
                status: MessageStatus::Canceled,
            },
            ChatUpdate::SetStreamingMessage(None),
            ChatUpdate::SetStatus(ChatStatus::Idle),
        ]);
    }

    /// Clear only the error field; messages and status stay untouched.
    pub fn clear_error(&self) {
        self.store.apply(ChatUpdate::SetError(None));
    }

    /// Reset the conversation to its empty initial state.
    ///
    /// An active stream is canceled first so the handle cannot leak.
    pub async fn clear_chat(&self) {
        self.cancel_stream().await;
        self.store.apply(ChatUpdate::Reset);
    }
}

/// Forward chunks from an open stream into the store.
///
/// Every apply is generation-tagged; the first failed check means the
/// stream was canceled or superseded and the pump stops.
async fn pump_stream(
    store: Arc<ChatStore>,
    active: ActiveSlot,
    generation: u64,
    message_id: String,
    mut stream: StreamReceiver,
) {
    let mut first_chunk = true;

    while let Some(item) = stream.recv().await {
        match item {
            Ok(StreamChunk::Delta(text)) => {
                let mut updates = Vec::with_capacity(4);
                if first_chunk {
                    first_chunk = false;
                    updates.push(ChatUpdate::SetMessageStatus {
                        message_id: message_id.clone(),
                        status: MessageStatus::Streaming,
                    });
                    updates.push(ChatUpdate::SetStreamingMessage(Some(message_id.clone())));
                    updates.push(ChatUpdate::SetStatus(ChatStatus::Streaming));
                }
                updates.push(ChatUpdate::AppendChunk {
                    message_id: message_id.clone(),
                    text,
                });
                if !store.apply_if_current(generation, updates) {
                    debug!(generation, "stale chunk suppressed");
                    return;
                }
            }
            Ok(StreamChunk::Done { conversation_id }) => {
                finish_stream(&store, &active, generation, &message_id, conversation_id).await;
                return;
            }
            Err(e) => {
                error!(error = %e, "stream failed");
                let applied = store.apply_if_current(
                    generation,
                    [
                        ChatUpdate::SetMessageStatus {
                            message_id: message_id.clone(),
                            status: MessageStatus::Error,
                        },
                        ChatUpdate::SetStreamingMessage(None),
                        ChatUpdate::SetError(Some(e.to_string())),
                        ChatUpdate::SetStatus(ChatStatus::Error),
                    ],
                );
                if applied {
                    release_handle(&active, generation).await;
                }
                return;
            }
        }
    }

    // Channel closed without a terminal chunk; closure signals completion.
    finish_stream(&store, &active, generation, &message_id, None).await;
}

async fn finish_stream(
    store: &Arc<ChatStore>,
    active: &ActiveSlot,
    generation: u64,
    message_id: &str,
    conversation_id: Option<String>,
) {
    let mut updates = Vec::with_capacity(4);
    if let Some(id) = conversation_id {
        updates.push(ChatUpdate::SetConversationId(Some(id)));
    }
    updates.extend([
        ChatUpdate::SetMessageStatus {
            message_id: message_id.to_string(),
            status: MessageStatus::Complete,
        },
        ChatUpdate::SetStreamingMessage(None),
        ChatUpdate::SetStatus(ChatStatus::Idle),
    ]);
    if store.apply_if_current(generation, updates) {
        debug!(generation, "stream complete");
        release_handle(active, generation).await;
    }
}

/// Drop the stream handle if it still belongs to `generation`.
async fn release_handle(active: &ActiveSlot, generation: u64) {
    let mut slot = active.lock().await;
    if slot.as_ref().map(|h| h.generation) == Some(generation) {
        *slot = None;
    }
}
