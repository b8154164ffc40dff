#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use chrono::DateTime;
use chrono::FixedOffset;
use chrono::Local;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use uuid::Uuid;

use super::now_timestamp;
use super::ChatType;
use super::Message;

pub const TITLE_MAX_CHARS: usize = 50;
pub const UNTITLED_SESSION: &str = "New conversation";

/// Metadata projection of a session, kept in a per chat type index so listing
/// never has to load transcripts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIndexEntry {
    pub id: String,
    pub title: String,
    pub message_count: usize,
    pub created_at: String,
    pub updated_at: String,
}

impl SessionIndexEntry {
    pub fn from_messages(id: &str, messages: &[Message]) -> SessionIndexEntry {
        let updated_at = now_timestamp();
        let created_at = messages
            .first()
            .map(|message| {
                return message.timestamp.to_string();
            })
            .unwrap_or_else(|| {
                return updated_at.to_string();
            });

        return SessionIndexEntry {
            id: id.to_string(),
            title: session_title(messages),
            message_count: messages.len(),
            created_at,
            updated_at,
        };
    }
}

impl SessionIndexEntry {
    /// Short relative age of the last update, e.g. `5m ago`. Older than a
    /// week falls back to the date.
    pub fn updated_ago(&self, now: DateTime<FixedOffset>) -> String {
        let updated_at = match DateTime::parse_from_rfc3339(&self.updated_at) {
            Ok(updated_at) => updated_at,
            Err(_) => return "".to_string(),
        };

        let elapsed = now.signed_duration_since(updated_at);
        if elapsed.num_minutes() < 1 {
            return "Just now".to_string();
        }
        if elapsed.num_minutes() < 60 {
            return format!("{}m ago", elapsed.num_minutes());
        }
        if elapsed.num_hours() < 24 {
            return format!("{}h ago", elapsed.num_hours());
        }
        if elapsed.num_days() < 7 {
            return format!("{}d ago", elapsed.num_days());
        }

        return updated_at.format("%b %-d, %Y").to_string();
    }
}

/// Produces `session_<unix millis>_<9 random chars>`.
pub fn create_session_id() -> String {
    let random = Uuid::new_v4().simple().to_string();
    return format!(
        "session_{}_{}",
        Local::now().timestamp_millis(),
        &random[..9]
    );
}

/// First 50 characters of the first user message, with `...` when cut.
pub fn session_title(messages: &[Message]) -> String {
    let first_user_message = messages.iter().find(|message| {
        return message.is_user();
    });

    if let Some(message) = first_user_message {
        let mut title = message
            .content
            .chars()
            .take(TITLE_MAX_CHARS)
            .collect::<String>();
        if message.content.chars().count() > TITLE_MAX_CHARS {
            title += "...";
        }

        return title;
    }

    return UNTITLED_SESSION.to_string();
}

pub fn index_key(chat_type: ChatType) -> String {
    return format!("sessions-index:{chat_type}");
}

pub fn transcript_key(chat_type: ChatType, session_id: &str) -> String {
    return format!("chat:{chat_type}:{session_id}");
}
