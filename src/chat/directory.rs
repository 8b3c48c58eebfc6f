//! Session directory: the list of conversation sessions for the active bot
//! and the "current session" pointer, kept valid as the list changes.
//!
//! The backend returns sessions newest first. On first load for a bot, or
//! whenever the pointer stops referencing a listed session, the directory
//! falls back to the most recent session (or none). A freshly created
//! session is selected optimistically and carried as "pending" until a list
//! refresh confirms it exists server-side.

use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::chat::ChatApi;
use crate::api::error::{ApiError, ApiResult};
use crate::chat::types::Session;

pub struct SessionDirectory {
    api: Arc<dyn ChatApi>,
    bot_id: Option<i64>,
    sessions: Vec<Session>,
    current_session_id: Option<i64>,
    pending_session_id: Option<i64>,
    initialized: bool,
}

impl SessionDirectory {
    pub fn new(api: Arc<dyn ChatApi>) -> Self {
        Self {
            api,
            bot_id: None,
            sessions: Vec::new(),
            current_session_id: None,
            pending_session_id: None,
            initialized: false,
        }
    }

    pub fn bot_id(&self) -> Option<i64> {
        self.bot_id
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn current_session_id(&self) -> Option<i64> {
        self.current_session_id
    }

    pub fn pending_session_id(&self) -> Option<i64> {
        self.pending_session_id
    }

    /// Switch the active bot. Resets the session list, the current pointer,
    /// any pending new-session marker, and the initialized flag.
    pub fn set_bot(&mut self, bot_id: Option<i64>) {
        if self.bot_id == bot_id {
            return;
        }
        self.bot_id = bot_id;
        self.sessions.clear();
        self.current_session_id = None;
        self.pending_session_id = None;
        self.initialized = false;
    }

    fn require_bot(&self) -> ApiResult<i64> {
        self.bot_id
            .ok_or_else(|| ApiError::InvalidInput("no active bot".into()))
    }

    /// Fetch the session list for the active bot and reconcile the current
    /// pointer against it. List-fetch errors propagate to the caller.
    pub async fn refresh(&mut self) -> ApiResult<()> {
        let bot_id = self.require_bot()?;
        let list = self.api.list_sessions(bot_id).await?;
        self.sessions = list.into_iter().map(Session::from).collect();

        // A pending id that now appears in the list is confirmed current.
        if let Some(pending) = self.pending_session_id {
            if self.sessions.iter().any(|s| s.id == pending) {
                debug!("pending session {} confirmed by list refresh", pending);
                self.current_session_id = Some(pending);
                self.pending_session_id = None;
            }
        }

        // The current pointer is valid if it references a listed session, or
        // a still-pending one the list has not caught up with yet. Anything
        // else is dangling and falls back to the newest session.
        let current_valid = match self.current_session_id {
            Some(id) => {
                self.sessions.iter().any(|s| s.id == id) || self.pending_session_id == Some(id)
            }
            None => false,
        };
        if !self.initialized || !current_valid {
            self.current_session_id = self.sessions.first().map(|s| s.id);
        }
        self.initialized = true;
        Ok(())
    }

    /// Optimistically move the current pointer. Returns false (no-op) when
    /// the session is already current or no bot is active; the caller only
    /// needs to fetch a transcript when this returns true.
    pub fn select(&mut self, session_id: i64) -> bool {
        if self.bot_id.is_none() || self.current_session_id == Some(session_id) {
            return false;
        }
        self.current_session_id = Some(session_id);
        true
    }

    /// Adopt a session id the backend resolved a send into (implicit
    /// creation). Carried as pending until the next list refresh, exactly
    /// like an explicit create.
    pub fn adopt(&mut self, session_id: i64) {
        self.current_session_id = Some(session_id);
        self.pending_session_id = Some(session_id);
    }

    /// Create a session for the active bot and select it immediately. The
    /// id stays marked pending until a list refresh confirms it.
    pub async fn create(&mut self, name: Option<&str>) -> ApiResult<Session> {
        let bot_id = self.require_bot()?;
        let info = self.api.create_session(bot_id, name).await?;
        let session = Session::from(info);
        info!("created session {} for bot {}", session.id, bot_id);
        self.pending_session_id = Some(session.id);
        self.current_session_id = Some(session.id);
        Ok(session)
    }

    /// Delete after awaiting the confirmation future; resolves to false when
    /// the user declined and nothing was deleted. When the deleted session
    /// was current, the first remaining session takes over (or none).
    pub async fn delete_with_confirmation<Fut>(
        &mut self,
        session_id: i64,
        confirm: Fut,
    ) -> ApiResult<bool>
    where
        Fut: Future<Output = bool>,
    {
        let bot_id = self.require_bot()?;
        if !confirm.await {
            return Ok(false);
        }
        self.api.delete_session(bot_id, session_id).await?;
        self.sessions.retain(|s| s.id != session_id);
        if self.pending_session_id == Some(session_id) {
            self.pending_session_id = None;
        }
        if self.current_session_id == Some(session_id) {
            self.current_session_id = self.sessions.first().map(|s| s.id);
            debug!(
                "deleted current session {}, falling back to {:?}",
                session_id, self.current_session_id
            );
        }
        Ok(true)
    }

    pub async fn delete(&mut self, session_id: i64) -> ApiResult<bool> {
        self.delete_with_confirmation(session_id, std::future::ready(true))
            .await
    }

    /// Rename a session and patch the local list on success.
    pub async fn rename(&mut self, session_id: i64, name: &str) -> ApiResult<Session> {
        let bot_id = self.require_bot()?;
        let info = self.api.rename_session(bot_id, session_id, name).await?;
        let session = Session::from(info);
        if let Some(local) = self.sessions.iter_mut().find(|s| s.id == session_id) {
            local.name = session.name.clone();
        }
        Ok(session)
    }
}
