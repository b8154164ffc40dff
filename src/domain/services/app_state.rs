#[cfg(test)]
#[path = "app_state_test.rs"]
mod tests;

use anyhow::Result;
use ratatui::prelude::Rect;
use tokio::sync::mpsc;

use super::Conversation;
use super::Scroll;
use super::SessionStore;
use crate::domain::models::Action;
use crate::domain::models::ChatType;
use crate::domain::models::ResponderEvent;
use crate::domain::models::Role;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    Header(Role),
    Body,
    Blank,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptLine {
    pub kind: LineKind,
    pub text: String,
}

impl TranscriptLine {
    fn new(kind: LineKind, text: &str) -> TranscriptLine {
        return TranscriptLine {
            kind,
            text: text.to_string(),
        };
    }
}

/// Greedy word wrap. Words longer than the width are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = vec![];

    for paragraph in text.split('\n') {
        let mut line = "".to_string();
        let mut line_len = 0;

        for word in paragraph.split(' ') {
            let mut word = word.to_string();
            let mut word_len = word.chars().count();

            if line_len > 0 && line_len + 1 + word_len > width {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }

            while word_len > width {
                let head = word.chars().take(width).collect::<String>();
                word = word.chars().skip(width).collect::<String>();
                word_len -= width;
                if line_len > 0 {
                    lines.push(std::mem::take(&mut line));
                    line_len = 0;
                }
                lines.push(head);
            }

            if line_len > 0 {
                line.push(' ');
                line_len += 1;
            }
            line += &word;
            line_len += word_len;
        }

        lines.push(line);
    }

    return lines;
}

pub struct AppState {
    pub conversation: Conversation,
    pub scroll: Scroll,
    pub selected_session: usize,
    pub last_known_height: u16,
    pub last_known_width: u16,
}

impl AppState {
    /// Opens `session_id` when given, otherwise picks up where the last run
    /// left off.
    pub async fn new(
        chat_type: ChatType,
        store: SessionStore,
        backend_available: bool,
        session_id: &str,
    ) -> AppState {
        let mut conversation = Conversation::new(chat_type, store, backend_available);
        conversation.restore().await;
        if !session_id.is_empty() {
            conversation.load_chat_session(session_id).await;
        }

        let mut app_state = AppState {
            conversation,
            scroll: Scroll::default(),
            selected_session: 0,
            last_known_height: 0,
            last_known_width: 0,
        };
        app_state.select_current();
        app_state.scroll.last();

        return app_state;
    }

    pub fn transcript(&self) -> Vec<TranscriptLine> {
        // Borders and padding.
        let width = usize::from(self.last_known_width.saturating_sub(4)).max(1);
        let conversation = &self.conversation;
        let mut lines = vec![];

        for message in conversation.messages() {
            let header = match message.role {
                Role::User => "You",
                Role::Assistant => conversation.chat_type().display_name(),
            };
            lines.push(TranscriptLine::new(LineKind::Header(message.role), header));

            let content = conversation.rendered_content(message);
            for line in wrap_text(content, width) {
                lines.push(TranscriptLine::new(LineKind::Body, &line));
            }

            lines.push(TranscriptLine::new(LineKind::Blank, ""));
        }

        return lines;
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.last_known_width = rect.width;
        self.last_known_height = rect.height;
        self.sync_dependants();
    }

    fn sync_dependants(&mut self) {
        let length = u16::try_from(self.transcript().len()).unwrap_or(u16::MAX);
        self.scroll
            .set_state(length, self.last_known_height.saturating_sub(2));
    }

    fn select_current(&mut self) {
        let current = self.conversation.current_session_id();
        self.selected_session = self
            .conversation
            .sessions()
            .iter()
            .position(|session| {
                return Some(session.id.as_str()) == current;
            })
            .unwrap_or(0);
    }

    pub fn selected_session_id(&self) -> Option<String> {
        return self
            .conversation
            .sessions()
            .get(self.selected_session)
            .map(|session| {
                return session.id.to_string();
            });
    }

    pub fn select_next(&mut self) {
        let count = self.conversation.sessions().len();
        if count == 0 {
            return;
        }

        self.selected_session = (self.selected_session + 1) % count;
    }

    pub fn select_previous(&mut self) {
        let count = self.conversation.sessions().len();
        if count == 0 {
            return;
        }

        self.selected_session = (self.selected_session + count - 1) % count;
    }

    pub async fn submit(&mut self, text: &str, tx: &mpsc::UnboundedSender<Action>) -> Result<bool> {
        let submitted = self.conversation.submit(text, tx).await?;
        if submitted {
            self.select_current();
            self.scroll.last();
            self.sync_dependants();
        }

        return Ok(submitted);
    }

    pub async fn handle_responder_event(&mut self, event: ResponderEvent) {
        self.conversation.handle_responder_event(event).await;
        self.sync_dependants();
    }

    pub fn new_chat(&mut self) {
        self.conversation.start_new_chat();
        self.select_current();
        self.scroll.last();
        self.sync_dependants();
    }

    pub async fn open_selected(&mut self) {
        if let Some(session_id) = self.selected_session_id() {
            self.conversation.load_chat_session(&session_id).await;
            self.scroll.last();
            self.sync_dependants();
        }
    }

    pub async fn delete_selected(&mut self) -> bool {
        let session_id = match self.selected_session_id() {
            Some(session_id) => session_id,
            None => return false,
        };

        let deleted = self.conversation.delete_chat_session(&session_id).await;
        let count = self.conversation.sessions().len();
        self.selected_session = self.selected_session.min(count.saturating_sub(1));
        self.sync_dependants();

        return deleted;
    }
}
