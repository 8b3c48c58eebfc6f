//! Message timeline: the in-memory transcript for the session being viewed,
//! kept consistent with the backend through the transcript cache.
//!
//! Sends are optimistic: the user's message is appended synchronously before
//! the network call goes out, then patched with its server id (matched by
//! correlation id, so overlapping sends cannot patch each other's entries)
//! or rolled back if the send fails.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::chat::ChatApi;
use crate::api::error::{ApiError, ApiResult};
use crate::api::types::SendMessageRequest;
use crate::chat::cache::{CacheEntry, TranscriptCache};
use crate::chat::types::{Message, Session};

/// What a resolved send tells the composing client: which session the
/// backend actually put the messages in, and the assistant message id the
/// translation poll needs.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub session: Session,
    pub user_message_id: i64,
    pub assistant_message_id: i64,
}

pub struct Timeline {
    api: Arc<dyn ChatApi>,
    messages: Vec<Message>,
    bot_name: Option<String>,
    // Change-detection markers: the (bot, session) pair the current
    // in-memory state belongs to.
    loaded_bot_id: Option<i64>,
    loaded_session_id: Option<i64>,
}

impl Timeline {
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        Self {
            api,
            messages: Vec::new(),
            bot_name: None,
            loaded_bot_id: None,
            loaded_session_id: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The rendered transcript: system-role messages stay in the data but
    /// never in the view.
    pub fn visible_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.is_visible())
    }

    pub fn bot_name(&self) -> Option<&str> {
        self.bot_name.as_deref()
    }

    pub fn loaded_session_id(&self) -> Option<i64> {
        self.loaded_session_id
    }

    pub fn message_by_local_id_mut(&mut self, local_id: uuid::Uuid) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.local_id == local_id)
    }

    pub fn message_by_server_id_mut(&mut self, id: i64) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == Some(id))
    }

    /// Drop all local state, e.g. when the active bot changes.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.bot_name = None;
        self.loaded_bot_id = None;
        self.loaded_session_id = None;
    }

    /// Load the transcript for (bot, session). Unless forced, a fresh cache
    /// entry is served synchronously with no network call; otherwise the
    /// backend is fetched and the cache updated for the session id the
    /// response names.
    pub async fn load_history(
        &mut self,
        cache: &mut TranscriptCache,
        bot_id: i64,
        session_id: Option<i64>,
        force: bool,
    ) -> ApiResult<()> {
        if !force {
            if let Some(sid) = session_id {
                if let Some(entry) = cache.get(bot_id, sid) {
                    let unchanged = self.loaded_bot_id == Some(bot_id)
                        && self.loaded_session_id == Some(sid);
                    if unchanged {
                        debug!("transcript for bot {} session {} already current", bot_id, sid);
                    } else {
                        debug!("serving transcript for bot {} session {} from cache", bot_id, sid);
                        self.messages = entry.messages.clone();
                        self.bot_name = Some(entry.bot_name.clone());
                        self.loaded_bot_id = Some(bot_id);
                        self.loaded_session_id = Some(sid);
                    }
                    return Ok(());
                }
            }
        }

        let history = self.api.fetch_history(bot_id, session_id).await?;
        self.messages = history.messages.into_iter().map(Message::from).collect();
        self.bot_name = Some(history.bot.name.clone());
        self.loaded_bot_id = Some(bot_id);
        self.loaded_session_id = history.session.as_ref().map(|s| s.id);
        if let Some(sid) = self.loaded_session_id {
            cache.insert(
                bot_id,
                sid,
                CacheEntry::new(self.messages.clone(), history.bot.name),
            );
        }
        Ok(())
    }

    /// Send a message into (bot, session). Rejects no-op sends locally;
    /// appends the optimistic user message before the network call, then on
    /// success patches it by correlation id, appends the assistant reply,
    /// and refreshes the cache entry for the session the backend resolved.
    /// On failure the optimistic message is removed and the error re-raised.
    pub async fn send(
        &mut self,
        cache: &mut TranscriptCache,
        bot_id: Option<i64>,
        session_id: Option<i64>,
        text: &str,
    ) -> ApiResult<SendOutcome> {
        let bot_id = bot_id.ok_or_else(|| ApiError::InvalidInput("no active bot".into()))?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ApiError::InvalidInput("message is empty".into()));
        }

        let optimistic = Message::user(text);
        let local_id = optimistic.local_id;
        self.messages.push(optimistic);

        let request = SendMessageRequest {
            message: text.to_string(),
            session_id,
        };
        match self.api.send_message(bot_id, &request).await {
            Ok(resp) => {
                if let Some(user_msg) = self.message_by_local_id_mut(local_id) {
                    user_msg.id = Some(resp.user_message_id);
                    user_msg.raw_request = resp.raw_request.clone();
                }

                let mut assistant = Message::assistant(resp.response.clone());
                assistant.id = Some(resp.assistant_message_id);
                assistant.raw_response = resp.raw_response.clone();
                self.messages.push(assistant);

                let resolved = resp.session.id;
                self.loaded_bot_id = Some(bot_id);
                self.loaded_session_id = Some(resolved);
                cache.insert(
                    bot_id,
                    resolved,
                    CacheEntry::new(
                        self.messages.clone(),
                        self.bot_name.clone().unwrap_or_default(),
                    ),
                );

                Ok(SendOutcome {
                    session: resp.session.into(),
                    user_message_id: resp.user_message_id,
                    assistant_message_id: resp.assistant_message_id,
                })
            }
            Err(err) => {
                warn!("send failed, rolling back optimistic message: {}", err);
                self.messages.retain(|m| m.local_id != local_id);
                Err(err)
            }
        }
    }
}
