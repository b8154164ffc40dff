use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use super::ChatType;
use super::Event;

/// A single question on its way to a responder, tagged with the session it was
/// asked in and a per conversation request number so late answers can be told
/// apart from current ones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatRequest {
    pub session_id: String,
    pub request_id: u64,
    pub chat_type: ChatType,
    pub question: String,
    pub backend_available: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponderEventKind {
    /// Progress notice shown while no text has arrived yet.
    Stage(String),
    /// Text is about to arrive. Only the simulator announces this.
    Started,
    Chunk { chunk: String, accumulated: String },
    Complete(String),
    Error(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponderEvent {
    pub session_id: String,
    pub request_id: u64,
    pub kind: ResponderEventKind,
}

impl ResponderEvent {
    pub fn new(request: &ChatRequest, kind: ResponderEventKind) -> ResponderEvent {
        return ResponderEvent {
            session_id: request.session_id.to_string(),
            request_id: request.request_id,
            kind,
        };
    }

    pub fn is_final(&self) -> bool {
        return matches!(
            self.kind,
            ResponderEventKind::Complete(_) | ResponderEventKind::Error(_)
        );
    }
}

#[async_trait]
pub trait Responder {
    /// Used at startup to decide whether this responder can serve the
    /// conversation.
    async fn health_check(&self) -> Result<()>;

    /// Answers a question, sending `Chunk` events as text becomes available.
    ///
    /// Exactly one `Complete` or `Error` event is sent last. Failures to reach
    /// the remote end are reported as an `Error` event rather than returned;
    /// an `Err` here means the event channel itself is gone.
    async fn respond<'a>(
        &self,
        request: ChatRequest,
        tx: &'a mpsc::UnboundedSender<Event>,
    ) -> Result<()>;
}

pub type ResponderBox = Box<dyn Responder + Send + Sync>;
