//! Session persistence between turns
//!
//! The orchestrator treats conversation state as a value; this crate is
//! the caller-side owner that keeps it (plus the active agent) on disk
//! between turns. Truncation happens only at turn boundaries so a stored
//! session can always be replayed into the next `run_turn`.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use wei_agent::ConversationState;

/// Default maximum number of messages kept per session
pub const DEFAULT_MAX_MESSAGES: usize = 100;

/// One persisted conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session key chosen by the caller.
    pub key: String,
    /// The agent the next turn starts with.
    pub active_agent: String,
    /// Conversation history, replayable into the next turn.
    pub state: ConversationState,
    pub created_at: DateTime<Local>,
    pub updated_at: DateTime<Local>,
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

fn default_max_messages() -> usize {
    DEFAULT_MAX_MESSAGES
}

impl Session {
    pub fn new(key: impl Into<String>, active_agent: impl Into<String>) -> Self {
        Self::with_max_messages(key, active_agent, DEFAULT_MAX_MESSAGES)
    }

    pub fn with_max_messages(
        key: impl Into<String>,
        active_agent: impl Into<String>,
        max_messages: usize,
    ) -> Self {
        let now = Local::now();
        Self {
            key: key.into(),
            active_agent: active_agent.into(),
            state: ConversationState::new(),
            created_at: now,
            updated_at: now,
            max_messages,
        }
    }

    /// Record the outcome of a finished turn: the updated state and
    /// whichever agent is active now.
    pub fn record_turn(&mut self, state: ConversationState, active_agent: impl Into<String>) {
        self.state = state;
        self.active_agent = active_agent.into();
        self.updated_at = Local::now();

        let removed = self.state.trim_to_recent_turns(self.max_messages);
        if removed > 0 {
            debug!("session {} trimmed {} old messages", self.key, removed);
        }
    }

    /// Hand the state to a new turn, leaving an empty slot behind.
    pub fn take_state(&mut self) -> ConversationState {
        std::mem::take(&mut self.state)
    }

    pub fn clear(&mut self) {
        self.state = ConversationState::new();
        self.updated_at = Local::now();
    }
}

/// File-backed session manager with an in-memory cache.
pub struct SessionManager {
    sessions_dir: PathBuf,
    cache: HashMap<String, Session>,
    max_messages: usize,
}

impl SessionManager {
    pub fn new(sessions_dir: impl AsRef<Path>) -> Self {
        Self::with_max_messages(sessions_dir, DEFAULT_MAX_MESSAGES)
    }

    pub fn with_max_messages(sessions_dir: impl AsRef<Path>, max_messages: usize) -> Self {
        let sessions_dir = sessions_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&sessions_dir).ok();

        Self {
            sessions_dir,
            cache: HashMap::new(),
            max_messages,
        }
    }

    /// Get or create a session, starting fresh ones with `default_agent`.
    pub async fn get_or_create(&mut self, key: &str, default_agent: &str) -> &mut Session {
        if !self.cache.contains_key(key) {
            let session = self.load(key).await.unwrap_or_else(|| {
                Session::with_max_messages(key, default_agent, self.max_messages)
            });
            self.cache.insert(key.to_string(), session);
        }
        self.cache.get_mut(key).unwrap()
    }

    pub async fn save(&self, session: &Session) -> std::io::Result<()> {
        let path = self.session_path(&session.key);
        let content = serde_json::to_string_pretty(session)?;
        tokio::fs::write(path, content).await?;
        debug!("saved session {}", session.key);
        Ok(())
    }

    async fn load(&self, key: &str) -> Option<Session> {
        let path = self.session_path(key);
        if !path.exists() {
            return None;
        }

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<Session>(&content) {
                Ok(mut session) => {
                    if session.max_messages != self.max_messages {
                        session.max_messages = self.max_messages;
                        session.state.trim_to_recent_turns(self.max_messages);
                    }
                    debug!("loaded session {key}");
                    Some(session)
                }
                Err(e) => {
                    warn!("failed to parse session {key}: {e}");
                    None
                }
            },
            Err(e) => {
                warn!("failed to read session {key}: {e}");
                None
            }
        }
    }

    fn session_path(&self, key: &str) -> PathBuf {
        let safe_key = key.replace([':', '/'], "_");
        self.sessions_dir.join(format!("{safe_key}.json"))
    }

    pub async fn delete(&mut self, key: &str) -> std::io::Result<bool> {
        self.cache.remove(key);
        let path = self.session_path(key);
        if path.exists() {
            tokio::fs::remove_file(path).await?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub async fn list(&self) -> Vec<String> {
        let mut keys = Vec::new();

        if let Ok(mut entries) = tokio::fs::read_dir(&self.sessions_dir).await {
            while let Ok(Some(entry)) = entries.next_entry().await {
                if let Some(name) = entry.file_name().to_str() {
                    if let Some(stripped) = name.strip_suffix(".json") {
                        keys.push(stripped.to_string());
                    }
                }
            }
        }

        keys
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }
}
