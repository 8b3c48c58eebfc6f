// src/chat/types.rs

use serde_json::Value;
use uuid::Uuid;

use crate::api::types::{SessionInfo, WireMessage, WordTranslation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    /// Present in raw API data but filtered from the rendered timeline.
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// One turn in a conversation. `local_id` is the client-side correlation id
/// assigned at append time; post-send reconciliation matches on it, never on
/// array position, so overlapping sends patch the right entry.
#[derive(Debug, Clone)]
pub struct Message {
    pub local_id: Uuid,
    /// Server-assigned id, absent while a send is in flight.
    pub id: Option<i64>,
    pub role: Role,
    pub content: String,
    pub raw_request: Option<Value>,
    pub raw_response: Option<Value>,
    // Lazy enrichment, populated by the translation overlay.
    pub translation: Option<String>,
    pub word_translations: Option<Vec<WordTranslation>>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            local_id: Uuid::new_v4(),
            id: None,
            role,
            content: content.into(),
            raw_request: None,
            raw_response: None,
            translation: None,
            word_translations: None,
        }
    }

    /// Optimistic local user message, created at send time before the
    /// network call is issued.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn is_visible(&self) -> bool {
        self.role != Role::System
    }
}

impl From<WireMessage> for Message {
    fn from(wire: WireMessage) -> Self {
        // Roles the contract does not know about are treated as system
        // noise and kept out of the rendered view.
        let role = wire.role.parse().unwrap_or(Role::System);
        Self {
            local_id: Uuid::new_v4(),
            id: wire.id,
            role,
            content: wire.content,
            raw_request: wire.raw_request,
            raw_response: wire.raw_response,
            translation: wire.translation,
            word_translations: wire.word_translations,
        }
    }
}

/// One conversation thread belonging to a bot.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: i64,
    pub name: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<SessionInfo> for Session {
    fn from(info: SessionInfo) -> Self {
        Self {
            id: info.id,
            name: info.session_name,
            created_at: info.created_at,
        }
    }
}
