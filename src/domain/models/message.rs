#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use chrono::Local;
use chrono::SecondsFormat;
use serde_derive::Deserialize;
use serde_derive::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub role: Role,
    pub content: String,
    pub timestamp: String,
}

pub fn now_timestamp() -> String {
    return Local::now().to_rfc3339_opts(SecondsFormat::Millis, false);
}

impl Message {
    pub fn new(id: i64, role: Role, content: &str) -> Message {
        return Message {
            id,
            role,
            content: content.to_string(),
            timestamp: now_timestamp(),
        };
    }

    /// Empty assistant message that holds the slot for a streamed answer until
    /// it is finalized.
    pub fn placeholder(id: i64) -> Message {
        return Message::new(id, Role::Assistant, "");
    }

    /// Ids are derived from the wall clock in milliseconds, but never go
    /// backwards or repeat within a message list.
    pub fn next_id(messages: &[Message]) -> i64 {
        let now = Local::now().timestamp_millis();
        let last = messages
            .iter()
            .map(|message| {
                return message.id;
            })
            .max()
            .unwrap_or(0);

        return now.max(last + 1);
    }

    pub fn is_user(&self) -> bool {
        return self.role == Role::User;
    }
}
