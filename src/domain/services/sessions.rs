#[cfg(test)]
#[path = "sessions_test.rs"]
mod tests;

use anyhow::Result;
use chrono::DateTime;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::index_key;
use crate::domain::models::transcript_key;
use crate::domain::models::ChatType;
use crate::domain::models::Message;
use crate::domain::models::SessionIndexEntry;
use crate::domain::models::SharedKeyValueStore;
use crate::infrastructure::storage::StorageManager;

pub const MAX_INDEXED_SESSIONS: usize = 50;

/// Persists transcripts and the per chat type session index.
///
/// Every public operation degrades to an empty or negative result when the
/// underlying storage fails, so callers can keep a conversation going without
/// persistence. Failures are logged.
#[derive(Clone)]
pub struct SessionStore {
    store: SharedKeyValueStore,
}

fn sort_by_updated_at(sessions: &mut [SessionIndexEntry]) {
    sessions.sort_by_cached_key(|session| {
        return std::cmp::Reverse(DateTime::parse_from_rfc3339(&session.updated_at).ok());
    });
}

/// Puts `entry` at the front of the index, replacing any entry with the same
/// id. The sort is stable, so the newest write wins timestamp ties.
fn upsert_entry(sessions: &mut Vec<SessionIndexEntry>, entry: SessionIndexEntry) {
    sessions.retain(|session| {
        return session.id != entry.id;
    });
    sessions.insert(0, entry);

    sort_by_updated_at(sessions);
    sessions.truncate(MAX_INDEXED_SESSIONS);
}

impl SessionStore {
    pub fn new(store: SharedKeyValueStore) -> SessionStore {
        return SessionStore { store };
    }

    /// Backed by whichever storage the `storage` config key names.
    pub fn from_config() -> Result<SessionStore> {
        let store = StorageManager::get(&Config::get(ConfigKey::Storage))?;
        return Ok(SessionStore::new(store));
    }

    async fn read_index(&self, chat_type: ChatType) -> Result<Vec<SessionIndexEntry>> {
        let payload = self.store.get(&index_key(chat_type)).await?;
        if let Some(payload) = payload {
            return Ok(serde_json::from_str(&payload)?);
        }

        return Ok(vec![]);
    }

    async fn write_index(&self, chat_type: ChatType, sessions: &[SessionIndexEntry]) -> Result<()> {
        let payload = serde_json::to_string(sessions)?;
        self.store.set(&index_key(chat_type), &payload).await?;
        return Ok(());
    }

    /// Index entries sorted by most recently updated first.
    pub async fn list_sessions(&self, chat_type: ChatType) -> Vec<SessionIndexEntry> {
        match self.read_index(chat_type).await {
            Ok(mut sessions) => {
                sort_by_updated_at(&mut sessions);
                return sessions;
            }
            Err(err) => {
                tracing::error!(error = ?err, chat_type = %chat_type, "Failed to load sessions index");
                return vec![];
            }
        }
    }

    async fn try_save_session(
        &self,
        session_id: &str,
        messages: &[Message],
        chat_type: ChatType,
    ) -> Result<SessionIndexEntry> {
        // Transcript first, so a failure in between leaves an orphaned
        // transcript rather than an index entry without data.
        let payload = serde_json::to_string(messages)?;
        self.store
            .set(&transcript_key(chat_type, session_id), &payload)
            .await?;

        let entry = SessionIndexEntry::from_messages(session_id, messages);
        let mut sessions = self.list_sessions(chat_type).await;
        upsert_entry(&mut sessions, entry.clone());
        self.write_index(chat_type, &sessions).await?;

        return Ok(entry);
    }

    pub async fn save_session(
        &self,
        session_id: &str,
        messages: &[Message],
        chat_type: ChatType,
    ) -> Option<SessionIndexEntry> {
        match self.try_save_session(session_id, messages, chat_type).await {
            Ok(entry) => {
                tracing::debug!(session_id, chat_type = %chat_type, count = entry.message_count, "Saved session");
                return Some(entry);
            }
            Err(err) => {
                tracing::error!(error = ?err, session_id, chat_type = %chat_type, "Failed to save session");
                return None;
            }
        }
    }

    async fn try_load_session(&self, session_id: &str, chat_type: ChatType) -> Result<Vec<Message>> {
        let payload = self
            .store
            .get(&transcript_key(chat_type, session_id))
            .await?;
        if let Some(payload) = payload {
            return Ok(serde_json::from_str(&payload)?);
        }

        return Ok(vec![]);
    }

    /// Empty when the session doesn't exist or can't be read.
    pub async fn load_session(&self, session_id: &str, chat_type: ChatType) -> Vec<Message> {
        match self.try_load_session(session_id, chat_type).await {
            Ok(messages) => return messages,
            Err(err) => {
                tracing::error!(error = ?err, session_id, chat_type = %chat_type, "Failed to load session");
                return vec![];
            }
        }
    }

    async fn try_delete_session(&self, session_id: &str, chat_type: ChatType) -> Result<()> {
        self.store
            .remove(&transcript_key(chat_type, session_id))
            .await?;

        let sessions = self
            .read_index(chat_type)
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|session| {
                return session.id != session_id;
            })
            .collect::<Vec<SessionIndexEntry>>();
        self.write_index(chat_type, &sessions).await?;

        return Ok(());
    }

    /// Succeeds for sessions that never existed.
    pub async fn delete_session(&self, session_id: &str, chat_type: ChatType) -> bool {
        if let Err(err) = self.try_delete_session(session_id, chat_type).await {
            tracing::error!(error = ?err, session_id, chat_type = %chat_type, "Failed to delete session");
            return false;
        }

        return true;
    }

    pub async fn most_recent_session_id(&self, chat_type: ChatType) -> Option<String> {
        return self
            .list_sessions(chat_type)
            .await
            .first()
            .map(|session| {
                return session.id.to_string();
            });
    }

    async fn try_clear_all_sessions(&self, chat_type: ChatType) -> Result<()> {
        for session in self.list_sessions(chat_type).await {
            self.store
                .remove(&transcript_key(chat_type, &session.id))
                .await?;
        }

        self.store.remove(&index_key(chat_type)).await?;
        return Ok(());
    }

    pub async fn clear_all_sessions(&self, chat_type: ChatType) -> bool {
        if let Err(err) = self.try_clear_all_sessions(chat_type).await {
            tracing::error!(error = ?err, chat_type = %chat_type, "Failed to clear sessions");
            return false;
        }

        return true;
    }
}
