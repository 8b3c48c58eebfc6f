// src/chat/cache.rs
// Per (bot, session) transcript cache. An explicit, constructor-injected
// object: the owner decides the TTL and when to invalidate, and tests get a
// fresh instance each.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::chat::types::Message;
use crate::config::CONFIG;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub messages: Vec<Message>,
    pub bot_name: String,
    stored_at: Instant,
}

impl CacheEntry {
    pub fn new(messages: Vec<Message>, bot_name: impl Into<String>) -> Self {
        Self {
            messages,
            bot_name: bot_name.into(),
            stored_at: Instant::now(),
        }
    }
}

#[derive(Debug)]
pub struct TranscriptCache {
    entries: HashMap<(i64, i64), CacheEntry>,
    ttl: Duration,
}

impl TranscriptCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    pub fn with_default_ttl() -> Self {
        Self::new(CONFIG.transcript_ttl())
    }

    /// An expired entry is treated as absent; the caller must refetch.
    pub fn get(&self, bot_id: i64, session_id: i64) -> Option<&CacheEntry> {
        let entry = self.entries.get(&(bot_id, session_id))?;
        if entry.stored_at.elapsed() > self.ttl {
            debug!("transcript cache expired for bot {} session {}", bot_id, session_id);
            return None;
        }
        Some(entry)
    }

    /// Stores or overwrites the entry, stamping the current time.
    pub fn insert(&mut self, bot_id: i64, session_id: i64, entry: CacheEntry) {
        self.entries.insert((bot_id, session_id), entry);
    }

    pub fn invalidate_session(&mut self, bot_id: i64, session_id: i64) {
        self.entries.remove(&(bot_id, session_id));
    }

    /// Drops every entry for the bot. Used when switching away from a bot:
    /// its transcripts are stale relative to the next bot's state, and
    /// session ids may collide numerically across bots.
    pub fn invalidate_bot(&mut self, bot_id: i64) {
        self.entries.retain(|(b, _), _| *b != bot_id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
