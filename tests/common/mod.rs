// tests/common/mod.rs
// In-process backend standing in for the REST service: scriptable state,
// per-endpoint call counters, and switchable failure modes.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::json;

use tandem::api::error::{ApiError, ApiResult};
use tandem::api::types::{
    AdminUser, AgentDraft, AgentInstance, Archetype, ArchetypeDraft, BehaviorRules, BotInfo,
    ChatHistoryResponse, RequestLogEntry, RequestLogPage, RequestLogQuery, SendMessageRequest,
    SendMessageResponse, SessionInfo, TranslationPayload, UserDraft, WireMessage, WordTranslation,
};
use tandem::api::{AdminApi, ChatApi, TranslationApi};

#[derive(Default)]
pub struct Counters {
    pub history: AtomicUsize,
    pub send: AtomicUsize,
    pub session_list: AtomicUsize,
    pub session_create: AtomicUsize,
    pub session_delete: AtomicUsize,
    pub translation: AtomicUsize,
    pub word_translation: AtomicUsize,
}

impl Counters {
    pub fn history(&self) -> usize {
        self.history.load(Ordering::SeqCst)
    }
    pub fn send(&self) -> usize {
        self.send.load(Ordering::SeqCst)
    }
    pub fn session_list(&self) -> usize {
        self.session_list.load(Ordering::SeqCst)
    }
    pub fn translation(&self) -> usize {
        self.translation.load(Ordering::SeqCst)
    }
    pub fn word_translation(&self) -> usize {
        self.word_translation.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct State {
    bots: HashMap<i64, BotInfo>,
    /// Newest-first, as the real backend returns them.
    sessions: HashMap<i64, Vec<SessionInfo>>,
    transcripts: HashMap<(i64, i64), Vec<WireMessage>>,
    next_session_id: i64,
    next_message_id: i64,
    /// Created sessions held back from the list until published, to model
    /// the gap between create and list-refresh consistency.
    defer_new_sessions: bool,
    deferred: Vec<(i64, SessionInfo)>,
    reply_with: String,
    fail_next_send: bool,
    /// Force sends to resolve into this session regardless of the request.
    resolve_send_into: Option<i64>,

    translations: HashMap<i64, TranslationPayload>,
    word_translations: HashMap<i64, TranslationPayload>,
    /// Attempts that must fail with "not ready" before the word translation
    /// for a message id becomes available.
    word_ready_after: HashMap<i64, usize>,
    fail_translations: bool,

    users: Vec<AdminUser>,
    agents: Vec<AgentInstance>,
    archetypes: Vec<Archetype>,
    request_log: Vec<RequestLogEntry>,
    rules: HashMap<i64, BehaviorRules>,
    next_admin_id: i64,
    last_log_query: Option<RequestLogQuery>,
}

pub struct MockBackend {
    state: Mutex<State>,
    pub calls: Counters,
}

impl MockBackend {
    pub fn new() -> Self {
        let state = State {
            next_session_id: 100,
            next_message_id: 1000,
            next_admin_id: 1,
            reply_with: "mock reply".to_string(),
            ..State::default()
        };
        Self {
            state: Mutex::new(state),
            calls: Counters::default(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("mock state poisoned")
    }

    pub fn add_bot(&self, id: i64, name: &str) {
        self.lock().bots.insert(
            id,
            BotInfo {
                id,
                name: name.to_string(),
                description: None,
            },
        );
    }

    /// Install a session list for a bot, newest first.
    pub fn set_sessions(&self, bot_id: i64, ids: &[i64]) {
        let sessions = ids
            .iter()
            .enumerate()
            .map(|(age, &id)| SessionInfo {
                id,
                session_name: Some(format!("session {id}")),
                created_at: Some(Utc::now() - Duration::minutes(age as i64)),
            })
            .collect();
        self.lock().sessions.insert(bot_id, sessions);
    }

    pub fn set_transcript(&self, bot_id: i64, session_id: i64, turns: &[(&str, &str)]) {
        let mut state = self.lock();
        let messages = turns
            .iter()
            .map(|(role, content)| {
                state.next_message_id += 1;
                WireMessage {
                    id: Some(state.next_message_id),
                    role: role.to_string(),
                    content: content.to_string(),
                    raw_request: None,
                    raw_response: None,
                    translation: None,
                    word_translations: None,
                }
            })
            .collect();
        state.transcripts.insert((bot_id, session_id), messages);
    }

    pub fn set_reply(&self, reply: &str) {
        self.lock().reply_with = reply.to_string();
    }

    pub fn fail_next_send(&self) {
        self.lock().fail_next_send = true;
    }

    pub fn resolve_send_into(&self, session_id: i64) {
        self.lock().resolve_send_into = Some(session_id);
    }

    pub fn defer_new_sessions(&self, defer: bool) {
        self.lock().defer_new_sessions = defer;
    }

    /// Make deferred sessions visible to the next list fetch.
    pub fn publish_deferred_sessions(&self) {
        let mut state = self.lock();
        let deferred = std::mem::take(&mut state.deferred);
        for (bot_id, info) in deferred {
            state.sessions.entry(bot_id).or_default().insert(0, info);
        }
    }

    pub fn set_translation(&self, message_id: i64, text: &str) {
        self.lock().translations.insert(
            message_id,
            TranslationPayload {
                translation: text.to_string(),
                word_translations: None,
            },
        );
    }

    pub fn set_word_translation(&self, message_id: i64, text: &str, words: &[(&str, &str)]) {
        self.lock().word_translations.insert(
            message_id,
            TranslationPayload {
                translation: text.to_string(),
                word_translations: Some(
                    words
                        .iter()
                        .map(|(word, translation)| WordTranslation {
                            word: word.to_string(),
                            translation: translation.to_string(),
                        })
                        .collect(),
                ),
            },
        );
    }

    /// The word translation for `message_id` only becomes available after
    /// this many "not ready" poll attempts.
    pub fn word_ready_after(&self, message_id: i64, attempts: usize) {
        self.lock().word_ready_after.insert(message_id, attempts);
    }

    pub fn fail_translations(&self, fail: bool) {
        self.lock().fail_translations = fail;
    }

    pub fn seed_users(&self, emails: &[&str]) {
        let mut state = self.lock();
        for email in emails {
            state.next_admin_id += 1;
            let user = AdminUser {
                id: state.next_admin_id,
                email: email.to_string(),
                display_name: None,
                is_admin: false,
            };
            state.users.push(user);
        }
    }

    pub fn seed_request_log(&self, count: usize) {
        let mut state = self.lock();
        for n in 0..count {
            let entry = RequestLogEntry {
                id: n as i64 + 1,
                agent_id: Some(1),
                user_id: Some(1),
                provider: Some("mockai".to_string()),
                model: Some("mock-1".to_string()),
                status: Some("ok".to_string()),
                created_at: Utc::now() - Duration::seconds(n as i64),
            };
            state.request_log.push(entry);
        }
    }

    pub fn set_rules(&self, agent_type_id: i64, prompt: &str, rules: &[&str]) {
        self.lock().rules.insert(
            agent_type_id,
            BehaviorRules {
                system_prompt: prompt.to_string(),
                rules: rules.iter().map(|r| r.to_string()).collect(),
            },
        );
    }

    pub fn last_log_query(&self) -> Option<RequestLogQuery> {
        self.lock().last_log_query.clone()
    }

    pub fn session_ids(&self, bot_id: i64) -> Vec<i64> {
        self.lock()
            .sessions
            .get(&bot_id)
            .map(|s| s.iter().map(|s| s.id).collect())
            .unwrap_or_default()
    }

    fn not_found(what: &str) -> ApiError {
        ApiError::Http {
            status: 404,
            message: format!("{what} not found"),
        }
    }
}

#[async_trait]
impl ChatApi for MockBackend {
    async fn fetch_history(
        &self,
        bot_id: i64,
        session_id: Option<i64>,
    ) -> ApiResult<ChatHistoryResponse> {
        self.calls.history.fetch_add(1, Ordering::SeqCst);
        let state = self.lock();
        let bot = state
            .bots
            .get(&bot_id)
            .cloned()
            .ok_or_else(|| Self::not_found("bot"))?;
        let (session, messages) = match session_id {
            Some(sid) => {
                let info = state
                    .sessions
                    .get(&bot_id)
                    .and_then(|list| list.iter().find(|s| s.id == sid))
                    .cloned()
                    .or_else(|| {
                        state
                            .deferred
                            .iter()
                            .find(|(b, s)| *b == bot_id && s.id == sid)
                            .map(|(_, s)| s.clone())
                    });
                let messages = state
                    .transcripts
                    .get(&(bot_id, sid))
                    .cloned()
                    .unwrap_or_default();
                (info, messages)
            }
            None => (None, Vec::new()),
        };
        Ok(ChatHistoryResponse {
            bot,
            session,
            messages,
        })
    }

    async fn send_message(
        &self,
        bot_id: i64,
        request: &SendMessageRequest,
    ) -> ApiResult<SendMessageResponse> {
        self.calls.send.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        if state.fail_next_send {
            state.fail_next_send = false;
            return Err(ApiError::Http {
                status: 500,
                message: "provider unavailable".into(),
            });
        }

        let resolved = state
            .resolve_send_into
            .or(request.session_id)
            .unwrap_or_else(|| {
                state.next_session_id += 1;
                let id = state.next_session_id;
                let info = SessionInfo {
                    id,
                    session_name: None,
                    created_at: Some(Utc::now()),
                };
                state.sessions.entry(bot_id).or_default().insert(0, info);
                id
            });

        state.next_message_id += 1;
        let user_message_id = state.next_message_id;
        state.next_message_id += 1;
        let assistant_message_id = state.next_message_id;

        let reply = state.reply_with.clone();
        let raw_request = json!({"prompt": request.message});
        let raw_response = json!({"completion": reply});

        let transcript = state.transcripts.entry((bot_id, resolved)).or_default();
        transcript.push(WireMessage {
            id: Some(user_message_id),
            role: "user".into(),
            content: request.message.clone(),
            raw_request: Some(raw_request.clone()),
            raw_response: None,
            translation: None,
            word_translations: None,
        });
        transcript.push(WireMessage {
            id: Some(assistant_message_id),
            role: "assistant".into(),
            content: reply.clone(),
            raw_request: None,
            raw_response: Some(raw_response.clone()),
            translation: None,
            word_translations: None,
        });

        let session = state
            .sessions
            .get(&bot_id)
            .and_then(|list| list.iter().find(|s| s.id == resolved))
            .cloned()
            .or_else(|| {
                state
                    .deferred
                    .iter()
                    .find(|(b, s)| *b == bot_id && s.id == resolved)
                    .map(|(_, s)| s.clone())
            })
            .unwrap_or(SessionInfo {
                id: resolved,
                session_name: None,
                created_at: Some(Utc::now()),
            });

        Ok(SendMessageResponse {
            response: reply,
            raw_request: Some(raw_request),
            raw_response: Some(raw_response),
            session,
            user_message_id,
            assistant_message_id,
        })
    }

    async fn list_sessions(&self, bot_id: i64) -> ApiResult<Vec<SessionInfo>> {
        self.calls.session_list.fetch_add(1, Ordering::SeqCst);
        Ok(self.lock().sessions.get(&bot_id).cloned().unwrap_or_default())
    }

    async fn create_session(&self, bot_id: i64, name: Option<&str>) -> ApiResult<SessionInfo> {
        self.calls.session_create.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        state.next_session_id += 1;
        let info = SessionInfo {
            id: state.next_session_id,
            session_name: name.map(str::to_string),
            created_at: Some(Utc::now()),
        };
        if state.defer_new_sessions {
            state.deferred.push((bot_id, info.clone()));
        } else {
            state
                .sessions
                .entry(bot_id)
                .or_default()
                .insert(0, info.clone());
        }
        Ok(info)
    }

    async fn rename_session(
        &self,
        bot_id: i64,
        session_id: i64,
        name: &str,
    ) -> ApiResult<SessionInfo> {
        let mut state = self.lock();
        let session = state
            .sessions
            .get_mut(&bot_id)
            .and_then(|list| list.iter_mut().find(|s| s.id == session_id))
            .ok_or_else(|| Self::not_found("session"))?;
        session.session_name = Some(name.to_string());
        Ok(session.clone())
    }

    async fn delete_session(&self, bot_id: i64, session_id: i64) -> ApiResult<()> {
        self.calls.session_delete.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        if let Some(list) = state.sessions.get_mut(&bot_id) {
            list.retain(|s| s.id != session_id);
        }
        state.transcripts.remove(&(bot_id, session_id));
        Ok(())
    }
}

#[async_trait]
impl TranslationApi for MockBackend {
    async fn fetch_translation(&self, message_id: i64) -> ApiResult<Option<TranslationPayload>> {
        self.calls.translation.fetch_add(1, Ordering::SeqCst);
        let state = self.lock();
        if state.fail_translations {
            return Err(ApiError::Http {
                status: 502,
                message: "translator down".into(),
            });
        }
        Ok(state.translations.get(&message_id).cloned())
    }

    async fn fetch_word_translation(
        &self,
        message_id: i64,
    ) -> ApiResult<Option<TranslationPayload>> {
        self.calls.word_translation.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        if state.fail_translations {
            return Err(ApiError::Http {
                status: 502,
                message: "translator down".into(),
            });
        }
        if let Some(remaining) = state.word_ready_after.get_mut(&message_id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(None);
            }
        }
        Ok(state.word_translations.get(&message_id).cloned())
    }
}

#[async_trait]
impl AdminApi for MockBackend {
    async fn list_users(&self) -> ApiResult<Vec<AdminUser>> {
        Ok(self.lock().users.clone())
    }

    async fn create_user(&self, draft: &UserDraft) -> ApiResult<AdminUser> {
        let mut state = self.lock();
        state.next_admin_id += 1;
        let user = AdminUser {
            id: state.next_admin_id,
            email: draft.email.clone(),
            display_name: draft.display_name.clone(),
            is_admin: draft.is_admin,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: i64, draft: &UserDraft) -> ApiResult<AdminUser> {
        let mut state = self.lock();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| Self::not_found("user"))?;
        user.email = draft.email.clone();
        user.display_name = draft.display_name.clone();
        user.is_admin = draft.is_admin;
        Ok(user.clone())
    }

    async fn delete_user(&self, id: i64) -> ApiResult<()> {
        self.lock().users.retain(|u| u.id != id);
        Ok(())
    }

    async fn list_agents(&self) -> ApiResult<Vec<AgentInstance>> {
        Ok(self.lock().agents.clone())
    }

    async fn create_agent(&self, draft: &AgentDraft) -> ApiResult<AgentInstance> {
        let mut state = self.lock();
        state.next_admin_id += 1;
        let agent = AgentInstance {
            id: state.next_admin_id,
            name: draft.name.clone(),
            archetype_id: draft.archetype_id,
            active: draft.active,
        };
        state.agents.push(agent.clone());
        Ok(agent)
    }

    async fn update_agent(&self, id: i64, draft: &AgentDraft) -> ApiResult<AgentInstance> {
        let mut state = self.lock();
        let agent = state
            .agents
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Self::not_found("agent"))?;
        agent.name = draft.name.clone();
        agent.archetype_id = draft.archetype_id;
        agent.active = draft.active;
        Ok(agent.clone())
    }

    async fn delete_agent(&self, id: i64) -> ApiResult<()> {
        self.lock().agents.retain(|a| a.id != id);
        Ok(())
    }

    async fn list_archetypes(&self) -> ApiResult<Vec<Archetype>> {
        Ok(self.lock().archetypes.clone())
    }

    async fn create_archetype(&self, draft: &ArchetypeDraft) -> ApiResult<Archetype> {
        let mut state = self.lock();
        state.next_admin_id += 1;
        let archetype = Archetype {
            id: state.next_admin_id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            system_prompt: draft.system_prompt.clone(),
        };
        state.archetypes.push(archetype.clone());
        Ok(archetype)
    }

    async fn update_archetype(&self, id: i64, draft: &ArchetypeDraft) -> ApiResult<Archetype> {
        let mut state = self.lock();
        let archetype = state
            .archetypes
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Self::not_found("archetype"))?;
        archetype.name = draft.name.clone();
        archetype.description = draft.description.clone();
        archetype.system_prompt = draft.system_prompt.clone();
        Ok(archetype.clone())
    }

    async fn delete_archetype(&self, id: i64) -> ApiResult<()> {
        self.lock().archetypes.retain(|a| a.id != id);
        Ok(())
    }

    async fn request_log(&self, query: &RequestLogQuery) -> ApiResult<RequestLogPage> {
        let mut state = self.lock();
        state.last_log_query = Some(query.clone());
        let total = state.request_log.len() as i64;
        let start = ((query.page - 1) * query.page_size) as usize;
        let items = state
            .request_log
            .iter()
            .skip(start)
            .take(query.page_size as usize)
            .cloned()
            .collect();
        Ok(RequestLogPage {
            items,
            total,
            page: query.page,
            page_size: query.page_size,
        })
    }

    async fn behavior_rules(&self, agent_type_id: i64) -> ApiResult<Option<BehaviorRules>> {
        Ok(self.lock().rules.get(&agent_type_id).cloned())
    }

    async fn put_behavior_rules(
        &self,
        agent_type_id: i64,
        rules: &BehaviorRules,
    ) -> ApiResult<BehaviorRules> {
        self.lock().rules.insert(agent_type_id, rules.clone());
        Ok(rules.clone())
    }
}
