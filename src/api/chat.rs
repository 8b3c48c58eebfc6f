// src/api/chat.rs
// Chat and session endpoints behind a trait seam so the core can run against
// an in-process backend in tests.

use async_trait::async_trait;

use crate::api::client::HttpClient;
use crate::api::error::ApiResult;
use crate::api::types::{
    ChatHistoryResponse, CreateSessionRequest, RenameSessionRequest, SendMessageRequest,
    SendMessageResponse, SessionInfo,
};

#[async_trait]
pub trait ChatApi: Send + Sync {
    /// `GET /chat/{botId}?sessionId={id}`. Omitting the session id asks the
    /// backend for the bot envelope with no transcript.
    async fn fetch_history(
        &self,
        bot_id: i64,
        session_id: Option<i64>,
    ) -> ApiResult<ChatHistoryResponse>;

    /// `POST /chat/{botId}`.
    async fn send_message(
        &self,
        bot_id: i64,
        request: &SendMessageRequest,
    ) -> ApiResult<SendMessageResponse>;

    /// `GET /chat/{botId}/sessions`, ordered newest first by the backend.
    async fn list_sessions(&self, bot_id: i64) -> ApiResult<Vec<SessionInfo>>;

    async fn create_session(&self, bot_id: i64, name: Option<&str>) -> ApiResult<SessionInfo>;

    async fn rename_session(
        &self,
        bot_id: i64,
        session_id: i64,
        name: &str,
    ) -> ApiResult<SessionInfo>;

    async fn delete_session(&self, bot_id: i64, session_id: i64) -> ApiResult<()>;
}

#[async_trait]
impl ChatApi for HttpClient {
    async fn fetch_history(
        &self,
        bot_id: i64,
        session_id: Option<i64>,
    ) -> ApiResult<ChatHistoryResponse> {
        let mut query = Vec::new();
        if let Some(id) = session_id {
            query.push(("sessionId", id.to_string()));
        }
        self.get_json_with_retry(&format!("chat/{bot_id}"), &query)
            .await
    }

    async fn send_message(
        &self,
        bot_id: i64,
        request: &SendMessageRequest,
    ) -> ApiResult<SendMessageResponse> {
        self.post_json(&format!("chat/{bot_id}"), request).await
    }

    async fn list_sessions(&self, bot_id: i64) -> ApiResult<Vec<SessionInfo>> {
        self.get_json_with_retry(&format!("chat/{bot_id}/sessions"), &[])
            .await
    }

    async fn create_session(&self, bot_id: i64, name: Option<&str>) -> ApiResult<SessionInfo> {
        let body = CreateSessionRequest {
            session_name: name.map(str::to_string),
        };
        self.post_json(&format!("chat/{bot_id}/sessions"), &body)
            .await
    }

    async fn rename_session(
        &self,
        bot_id: i64,
        session_id: i64,
        name: &str,
    ) -> ApiResult<SessionInfo> {
        let body = RenameSessionRequest {
            session_name: name.to_string(),
        };
        self.put_json(&format!("chat/{bot_id}/sessions/{session_id}"), &body)
            .await
    }

    async fn delete_session(&self, bot_id: i64, session_id: i64) -> ApiResult<()> {
        self.delete(&format!("chat/{bot_id}/sessions/{session_id}"))
            .await
    }
}
