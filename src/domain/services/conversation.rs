#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use anyhow::Result;
use tokio::sync::mpsc;

use super::SessionStore;
use crate::domain::models::create_session_id;
use crate::domain::models::Action;
use crate::domain::models::ChatRequest;
use crate::domain::models::ChatType;
use crate::domain::models::Message;
use crate::domain::models::ResponderEvent;
use crate::domain::models::ResponderEventKind;
use crate::domain::models::Role;
use crate::domain::models::SessionIndexEntry;

/// The question currently being answered, and where its answer goes.
struct PendingResponse {
    session_id: String,
    request_id: u64,
    placeholder_id: Option<i64>,
}

/// Conversation state for one chat type.
///
/// A conversation is idle, processing (question sent, nothing received yet)
/// or streaming (answer text arriving). Answers are tagged with the session
/// and request they belong to. Anything that isn't for the question currently
/// being answered in the active session is dropped, including answers to an
/// earlier question asked before switching away and back.
pub struct Conversation {
    chat_type: ChatType,
    store: SessionStore,
    current_session_id: Option<String>,
    messages: Vec<Message>,
    sessions: Vec<SessionIndexEntry>,
    is_processing: bool,
    is_streaming: bool,
    streamed_text: String,
    processing_stage: String,
    backend_available: bool,
    pending: Option<PendingResponse>,
    request_count: u64,
}

impl Conversation {
    pub fn new(chat_type: ChatType, store: SessionStore, backend_available: bool) -> Conversation {
        return Conversation {
            chat_type,
            store,
            current_session_id: None,
            messages: vec![chat_type.welcome_message()],
            sessions: vec![],
            is_processing: false,
            is_streaming: false,
            streamed_text: "".to_string(),
            processing_stage: "".to_string(),
            backend_available,
            pending: None,
            request_count: 0,
        };
    }

    pub fn chat_type(&self) -> ChatType {
        return self.chat_type;
    }

    pub fn current_session_id(&self) -> Option<&str> {
        return self.current_session_id.as_deref();
    }

    pub fn messages(&self) -> &[Message] {
        return &self.messages;
    }

    pub fn sessions(&self) -> &[SessionIndexEntry] {
        return &self.sessions;
    }

    pub fn is_processing(&self) -> bool {
        return self.is_processing;
    }

    pub fn is_streaming(&self) -> bool {
        return self.is_streaming;
    }

    pub fn is_busy(&self) -> bool {
        return self.is_processing || self.is_streaming;
    }

    pub fn streamed_text(&self) -> &str {
        return &self.streamed_text;
    }

    pub fn processing_stage(&self) -> &str {
        return &self.processing_stage;
    }

    pub fn backend_available(&self) -> bool {
        return self.backend_available;
    }

    /// Text to show for a message. The in-flight placeholder shows whatever
    /// has streamed in so far.
    pub fn rendered_content<'a>(&'a self, message: &'a Message) -> &'a str {
        if self.is_streaming && Some(message.id) == self.placeholder_id() {
            return &self.streamed_text;
        }

        return &message.content;
    }

    fn placeholder_id(&self) -> Option<i64> {
        return self.pending.as_ref().and_then(|pending| {
            return pending.placeholder_id;
        });
    }

    /// Reopens the most recently updated session, if it has anything in it.
    pub async fn restore(&mut self) {
        self.refresh_sessions().await;

        if let Some(session_id) = self.store.most_recent_session_id(self.chat_type).await {
            let messages = self.store.load_session(&session_id, self.chat_type).await;
            if !messages.is_empty() {
                tracing::debug!(session_id, chat_type = %self.chat_type, "Restored session");
                self.messages = messages;
                self.current_session_id = Some(session_id);
            }
        }
    }

    pub async fn refresh_sessions(&mut self) {
        self.sessions = self.store.list_sessions(self.chat_type).await;
    }

    async fn persist(&mut self) {
        // A session holding only the welcome message is never saved.
        if self.messages.len() < 2 {
            return;
        }

        if let Some(session_id) = &self.current_session_id {
            self.store
                .save_session(session_id, &self.messages, self.chat_type)
                .await;
            self.refresh_sessions().await;
        }
    }

    fn reset_response_state(&mut self) {
        self.pending = None;
        self.is_processing = false;
        self.is_streaming = false;
        self.streamed_text.clear();
        self.processing_stage.clear();
    }

    /// Sends a question on its way. Returns false without doing anything when
    /// the question is blank or another one is still being answered.
    pub async fn submit(&mut self, question: &str, tx: &mpsc::UnboundedSender<Action>) -> Result<bool> {
        if question.trim().is_empty() || self.is_busy() {
            return Ok(false);
        }

        let session_id = match &self.current_session_id {
            Some(session_id) => session_id.to_string(),
            None => {
                let session_id = create_session_id();
                self.current_session_id = Some(session_id.to_string());
                session_id
            }
        };

        let id = Message::next_id(&self.messages);
        self.messages.push(Message::new(id, Role::User, question));
        self.streamed_text.clear();
        self.processing_stage.clear();
        self.is_processing = true;
        self.request_count += 1;
        let request_id = self.request_count;
        self.pending = Some(PendingResponse {
            session_id: session_id.to_string(),
            request_id,
            placeholder_id: None,
        });
        self.persist().await;

        tracing::debug!(session_id, request_id, backend_available = self.backend_available, "Submitting question");
        tx.send(Action::ResponderRequest(ChatRequest {
            session_id,
            request_id,
            chat_type: self.chat_type,
            question: question.to_string(),
            backend_available: self.backend_available,
        }))?;

        return Ok(true);
    }

    fn accepts(&self, event: &ResponderEvent) -> bool {
        let pending_matches = self
            .pending
            .as_ref()
            .map(|pending| {
                return pending.session_id == event.session_id
                    && pending.request_id == event.request_id;
            })
            .unwrap_or(false);

        return pending_matches && self.current_session_id.as_deref() == Some(&event.session_id);
    }

    /// Adds the empty assistant message the answer will land in. Returns
    /// whether one was added.
    fn ensure_placeholder(&mut self) -> bool {
        if self.placeholder_id().is_some() {
            return false;
        }

        let id = Message::next_id(&self.messages);
        self.messages.push(Message::placeholder(id));
        if let Some(pending) = self.pending.as_mut() {
            pending.placeholder_id = Some(id);
        }

        return true;
    }

    async fn begin_streaming(&mut self) {
        let added = self.ensure_placeholder();
        self.is_processing = false;
        self.is_streaming = true;
        self.processing_stage.clear();

        if added {
            self.persist().await;
        }
    }

    async fn finalize(&mut self, content: String) {
        self.ensure_placeholder();

        let placeholder_id = self.placeholder_id();
        if let Some(message) = self.messages.iter_mut().find(|message| {
            return Some(message.id) == placeholder_id;
        }) {
            message.content = content;
        }

        self.reset_response_state();
        self.persist().await;
    }

    pub async fn handle_responder_event(&mut self, event: ResponderEvent) {
        if !self.accepts(&event) {
            tracing::debug!(
                session_id = event.session_id,
                request_id = event.request_id,
                current_session_id = ?self.current_session_id,
                "Dropping response for a question no longer being answered"
            );
            return;
        }

        match event.kind {
            ResponderEventKind::Stage(stage) => {
                self.processing_stage = stage;
            }
            ResponderEventKind::Started => {
                self.begin_streaming().await;
            }
            ResponderEventKind::Chunk { accumulated, .. } => {
                self.begin_streaming().await;
                self.streamed_text = accumulated;
            }
            ResponderEventKind::Complete(text) => {
                self.finalize(text).await;
            }
            ResponderEventKind::Error(detail) => {
                tracing::warn!(detail, "Question failed");
                self.finalize(format!(
                    "Sorry, I encountered an error: {detail}. Please try again."
                ))
                .await;
            }
        }
    }

    /// Starts over with a fresh session. Anything unsaved is dropped, and an
    /// answer still in flight will be ignored when it arrives.
    pub fn start_new_chat(&mut self) {
        self.current_session_id = Some(create_session_id());
        self.messages = vec![self.chat_type.welcome_message()];
        self.reset_response_state();
    }

    /// Switches to a stored session. A session whose transcript can't be
    /// found opens as an empty conversation.
    pub async fn load_chat_session(&mut self, session_id: &str) {
        let messages = self.store.load_session(session_id, self.chat_type).await;
        if messages.is_empty() {
            tracing::warn!(session_id, chat_type = %self.chat_type, "Session has no transcript");
            self.messages = vec![self.chat_type.welcome_message()];
        } else {
            self.messages = messages;
        }

        self.current_session_id = Some(session_id.to_string());
        self.reset_response_state();
    }

    pub async fn delete_chat_session(&mut self, session_id: &str) -> bool {
        let deleted = self.store.delete_session(session_id, self.chat_type).await;
        self.refresh_sessions().await;

        if self.current_session_id.as_deref() == Some(session_id) {
            self.start_new_chat();
        }

        return deleted;
    }
}
