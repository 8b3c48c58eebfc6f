// src/api/types.rs
// Serde mirrors of the backend JSON contracts. Field names reproduce the
// wire exactly, including its mixed camelCase/snake_case (`sessionId` vs
// `session_name`) — do not "fix" the casing here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─── Chat ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotInfo {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: i64,
    #[serde(default)]
    pub session_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    #[serde(default)]
    pub id: Option<i64>,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub raw_request: Option<Value>,
    #[serde(default)]
    pub raw_response: Option<Value>,
    #[serde(default)]
    pub translation: Option<String>,
    #[serde(default)]
    pub word_translations: Option<Vec<WordTranslation>>,
}

/// `GET /chat/{botId}?sessionId={id}`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatHistoryResponse {
    pub bot: BotInfo,
    #[serde(default)]
    pub session: Option<SessionInfo>,
    pub messages: Vec<WireMessage>,
}

/// `POST /chat/{botId}` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<i64>,
}

/// `POST /chat/{botId}` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub response: String,
    #[serde(default)]
    pub raw_request: Option<Value>,
    #[serde(default)]
    pub raw_response: Option<Value>,
    pub session: SessionInfo,
    pub user_message_id: i64,
    pub assistant_message_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenameSessionRequest {
    pub session_name: String,
}

// ─── Translation ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WordTranslation {
    pub word: String,
    pub translation: String,
}

/// Returned by both translation endpoints; the full-text-only endpoint
/// leaves `wordTranslations` absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationPayload {
    pub translation: String,
    #[serde(default)]
    pub word_translations: Option<Vec<WordTranslation>>,
}

// ─── Admin ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

/// Create/update payload for users (id is server-assigned).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub is_admin: bool,
}

/// A reusable persona template; agents instantiate one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Archetype {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub system_prompt: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchetypeDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub system_prompt: String,
}

/// A live agent instance backed by an archetype.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentInstance {
    pub id: i64,
    pub name: String,
    pub archetype_id: i64,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDraft {
    pub name: String,
    pub archetype_id: i64,
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// One row of the AI provider request audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestLogEntry {
    pub id: i64,
    #[serde(default)]
    pub agent_id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestLogPage {
    pub items: Vec<RequestLogEntry>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "asc",
            OrderDirection::Desc => "desc",
        }
    }
}

impl std::str::FromStr for OrderDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(OrderDirection::Asc),
            "desc" => Ok(OrderDirection::Desc),
            other => Err(format!("invalid order direction '{other}'")),
        }
    }
}

/// Typed builder for the request-log query string so callers cannot produce
/// malformed `orderBy`/`orderDirection`/`page`/`pageSize` combinations.
#[derive(Debug, Clone)]
pub struct RequestLogQuery {
    pub order_by: String,
    pub order_direction: OrderDirection,
    pub page: u32,
    pub page_size: u32,
}

impl Default for RequestLogQuery {
    fn default() -> Self {
        Self {
            order_by: "createdAt".to_string(),
            order_direction: OrderDirection::Desc,
            page: 1,
            page_size: 20,
        }
    }
}

impl RequestLogQuery {
    pub fn newest_first() -> Self {
        Self::default()
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: OrderDirection) -> Self {
        self.order_by = column.into();
        self.order_direction = direction;
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, 200);
        self
    }

    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("orderBy", self.order_by.clone()),
            ("orderDirection", self.order_direction.as_str().to_string()),
            ("page", self.page.to_string()),
            ("pageSize", self.page_size.to_string()),
        ]
    }
}

/// Per-agent-type behavior rules and system prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorRules {
    pub system_prompt: String,
    #[serde(default)]
    pub rules: Vec<String>,
}
