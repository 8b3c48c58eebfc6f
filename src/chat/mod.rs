//! Chat client core: session directory + message timeline + transcript
//! cache + translation overlay, composed behind one coordinator.
//!
//! `ChatClient` owns the injected cache and enforces the cross-component
//! rules: cache invalidation on bot switch, explicit session creation before
//! a first send, directory signaling when a send resolves into a different
//! session, and the lifetime of the word-translation poll task.

mod cache;
mod directory;
mod timeline;
pub mod translation;
mod types;

pub use cache::{CacheEntry, TranscriptCache};
pub use directory::SessionDirectory;
pub use timeline::{SendOutcome, Timeline};
pub use translation::{PollPolicy, TranslationOverlay};
pub use types::{Message, Role, Session};

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::api::chat::ChatApi;
use crate::api::error::{ApiError, ApiResult};
use crate::api::translation::TranslationApi;
use crate::api::types::TranslationPayload;

struct WordPoll {
    message_id: i64,
    handle: JoinHandle<Option<TranslationPayload>>,
    cancel: CancellationToken,
}

/// What the directory should do once a send has resolved into a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SendAdoption {
    /// The resolved session is already current; nothing to adopt.
    AlreadyCurrent,
    /// The user has not moved since the send went out; follow the backend.
    Adopt,
    /// The user explicitly switched sessions mid-flight; their choice wins.
    KeepUserChoice,
}

fn adoption_for(
    session_at_send: Option<i64>,
    current: Option<i64>,
    resolved: i64,
) -> SendAdoption {
    if current == Some(resolved) {
        SendAdoption::AlreadyCurrent
    } else if current == session_at_send {
        SendAdoption::Adopt
    } else {
        SendAdoption::KeepUserChoice
    }
}

pub struct ChatClient {
    translation_api: Arc<dyn TranslationApi>,
    directory: SessionDirectory,
    timeline: Timeline,
    cache: TranscriptCache,
    overlay: TranslationOverlay,
    poll_policy: PollPolicy,
    word_poll: Option<WordPoll>,
}

impl ChatClient {
    pub fn new(
        chat_api: Arc<dyn ChatApi>,
        translation_api: Arc<dyn TranslationApi>,
        cache: TranscriptCache,
    ) -> Self {
        Self {
            directory: SessionDirectory::new(chat_api.clone()),
            timeline: Timeline::new(chat_api),
            overlay: TranslationOverlay::new(translation_api.clone()),
            translation_api,
            cache,
            poll_policy: PollPolicy::default(),
            word_poll: None,
        }
    }

    pub fn set_poll_policy(&mut self, policy: PollPolicy) {
        self.poll_policy = policy;
    }

    // ── Read access ──────────────────────────────────────────────────────

    pub fn directory(&self) -> &SessionDirectory {
        &self.directory
    }

    pub fn sessions(&self) -> &[Session] {
        self.directory.sessions()
    }

    pub fn current_session_id(&self) -> Option<i64> {
        self.directory.current_session_id()
    }

    pub fn bot_name(&self) -> Option<&str> {
        self.timeline.bot_name()
    }

    pub fn messages(&self) -> &[Message] {
        self.timeline.messages()
    }

    pub fn visible_messages(&self) -> impl Iterator<Item = &Message> {
        self.timeline.visible_messages()
    }

    pub fn translation_visible(&self, local_id: Uuid) -> bool {
        self.timeline
            .messages()
            .iter()
            .find(|m| m.local_id == local_id)
            .is_some_and(|m| self.overlay.is_visible(m))
    }

    // ── Bot and session lifecycle ────────────────────────────────────────

    /// Activate a bot: drop the previous bot's cache entries (session ids
    /// may collide numerically across bots), refresh its session list, and
    /// load the transcript of whichever session ends up current.
    pub async fn select_bot(&mut self, bot_id: i64) -> ApiResult<()> {
        if self.directory.bot_id() == Some(bot_id) {
            return Ok(());
        }
        if let Some(old) = self.directory.bot_id() {
            self.cache.invalidate_bot(old);
        }
        self.cancel_word_poll();
        self.timeline.reset();
        self.directory.set_bot(Some(bot_id));
        self.directory.refresh().await?;
        self.timeline
            .load_history(
                &mut self.cache,
                bot_id,
                self.directory.current_session_id(),
                false,
            )
            .await
    }

    /// Move to another session of the active bot and load its transcript
    /// (from cache when fresh). No-op when it is already current.
    pub async fn select_session(&mut self, session_id: i64) -> ApiResult<()> {
        let bot_id = self
            .directory
            .bot_id()
            .ok_or_else(|| ApiError::InvalidInput("no active bot".into()))?;
        if !self.directory.select(session_id) {
            return Ok(());
        }
        self.cancel_word_poll();
        self.timeline
            .load_history(&mut self.cache, bot_id, Some(session_id), false)
            .await
    }

    /// Refetch the current transcript, bypassing the cache.
    pub async fn reload(&mut self) -> ApiResult<()> {
        let bot_id = self
            .directory
            .bot_id()
            .ok_or_else(|| ApiError::InvalidInput("no active bot".into()))?;
        self.timeline
            .load_history(
                &mut self.cache,
                bot_id,
                self.directory.current_session_id(),
                true,
            )
            .await
    }

    /// Explicit "new session" action: create, select optimistically, load
    /// the (empty) transcript, and refresh the list so the pending marker
    /// can reconcile.
    pub async fn new_session(&mut self, name: Option<&str>) -> ApiResult<Session> {
        let session = self.directory.create(name).await?;
        self.cancel_word_poll();
        if let Some(bot_id) = self.directory.bot_id() {
            self.timeline
                .load_history(&mut self.cache, bot_id, Some(session.id), false)
                .await?;
        }
        self.directory.refresh().await?;
        Ok(session)
    }

    pub async fn delete_session(&mut self, session_id: i64) -> ApiResult<bool> {
        self.delete_session_with_confirmation(session_id, std::future::ready(true))
            .await
    }

    /// Delete after the confirmation future resolves true. Invalidates the
    /// session's cache entry and, when the current session was deleted,
    /// loads whichever session the directory fell back to.
    pub async fn delete_session_with_confirmation<Fut>(
        &mut self,
        session_id: i64,
        confirm: Fut,
    ) -> ApiResult<bool>
    where
        Fut: std::future::Future<Output = bool>,
    {
        let bot_id = self
            .directory
            .bot_id()
            .ok_or_else(|| ApiError::InvalidInput("no active bot".into()))?;
        let was_current = self.directory.current_session_id() == Some(session_id);
        if !self
            .directory
            .delete_with_confirmation(session_id, confirm)
            .await?
        {
            return Ok(false);
        }
        self.cache.invalidate_session(bot_id, session_id);
        if was_current {
            self.cancel_word_poll();
            match self.directory.current_session_id() {
                Some(next) => {
                    self.timeline
                        .load_history(&mut self.cache, bot_id, Some(next), false)
                        .await?;
                }
                None => self.timeline.reset(),
            }
        }
        Ok(true)
    }

    pub async fn rename_session(&mut self, session_id: i64, name: &str) -> ApiResult<Session> {
        self.directory.rename(session_id, name).await
    }

    // ── Sending ──────────────────────────────────────────────────────────

    /// Send a message into the current session. When no session exists yet,
    /// one is created explicitly first (session creation is a precondition,
    /// not something inferred from the response). If the backend still
    /// resolves the send into a different session, the directory adopts it —
    /// unless the user has explicitly switched sessions in the interim, in
    /// which case the explicit choice wins and only the cache entry for the
    /// resolved session is kept.
    pub async fn send(&mut self, text: &str) -> ApiResult<SendOutcome> {
        let bot_id = self
            .directory
            .bot_id()
            .ok_or_else(|| ApiError::InvalidInput("no active bot".into()))?;
        if text.trim().is_empty() {
            return Err(ApiError::InvalidInput("message is empty".into()));
        }

        let mut created_now = false;
        if self.directory.current_session_id().is_none() {
            self.directory.create(None).await?;
            created_now = true;
        }
        let session_at_send = self.directory.current_session_id();

        let outcome = self
            .timeline
            .send(&mut self.cache, Some(bot_id), session_at_send, text)
            .await?;

        let resolved = outcome.session.id;
        match adoption_for(
            session_at_send,
            self.directory.current_session_id(),
            resolved,
        ) {
            SendAdoption::AlreadyCurrent => {
                if created_now {
                    // The send landed in a session the list has not confirmed
                    // yet; refresh so the pending marker can reconcile.
                    self.directory.refresh().await?;
                }
            }
            SendAdoption::Adopt => {
                debug!("send resolved into session {}, adopting", resolved);
                self.directory.adopt(resolved);
                self.directory.refresh().await?;
            }
            SendAdoption::KeepUserChoice => {
                debug!(
                    "send resolved into session {} but the user switched to {:?}; not adopting",
                    resolved,
                    self.directory.current_session_id()
                );
            }
        }

        self.cancel_word_poll();
        let cancel = CancellationToken::new();
        let handle = translation::spawn_word_poll(
            self.translation_api.clone(),
            outcome.assistant_message_id,
            self.poll_policy,
            cancel.clone(),
        );
        self.word_poll = Some(WordPoll {
            message_id: outcome.assistant_message_id,
            handle,
            cancel,
        });

        Ok(outcome)
    }

    // ── Translation overlay ──────────────────────────────────────────────

    /// Toggle the translation overlay for a message (fetching it once).
    pub async fn toggle_translation(&mut self, local_id: Uuid) {
        if let Some(message) = self.timeline.message_by_local_id_mut(local_id) {
            self.overlay.toggle(message).await;
        }
    }

    /// Best-effort probe for an already-computed translation on an
    /// assistant message entering the view.
    pub async fn prefetch_translation(&mut self, local_id: Uuid) {
        if let Some(message) = self.timeline.message_by_local_id_mut(local_id) {
            self.overlay.prefetch(message).await;
        }
    }

    /// Await the background word-translation poll (if any) and mirror its
    /// result onto the assistant message. Returns true when a translation
    /// landed.
    pub async fn finish_word_poll(&mut self) -> bool {
        let Some(poll) = self.word_poll.take() else {
            return false;
        };
        let payload = match poll.handle.await {
            Ok(Some(payload)) => payload,
            _ => return false,
        };
        if let Some(message) = self.timeline.message_by_server_id_mut(poll.message_id) {
            message.translation = Some(payload.translation);
            message.word_translations = payload.word_translations;
            return true;
        }
        false
    }

    fn cancel_word_poll(&mut self) {
        if let Some(poll) = self.word_poll.take() {
            poll.cancel.cancel();
            poll.handle.abort();
        }
    }
}

impl Drop for ChatClient {
    fn drop(&mut self) {
        self.cancel_word_poll();
    }
}
