//! Translation overlay: best-effort, on-demand enrichment of a rendered
//! message, fully decoupled from the send/receive path. Nothing here is ever
//! required for transcript correctness; failures log at debug and stop.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use crate::api::translation::TranslationApi;
use crate::api::types::TranslationPayload;
use crate::chat::types::{Message, Role};
use crate::config::CONFIG;

/// Bounded-retry schedule for the word-translation availability poll.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub attempts: u32,
    pub initial: Duration,
    /// Interval multiplier per attempt; the interval never exceeds `max`.
    pub backoff: f64,
    pub max: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            attempts: CONFIG.translation_poll_attempts,
            initial: Duration::from_millis(CONFIG.translation_poll_initial_ms),
            backoff: CONFIG.translation_poll_backoff,
            max: Duration::from_millis(CONFIG.translation_poll_max_ms),
        }
    }
}

pub struct TranslationOverlay {
    api: Arc<dyn TranslationApi>,
    visible: HashSet<Uuid>,
}

impl TranslationOverlay {
    pub fn new(api: Arc<dyn TranslationApi>) -> Self {
        Self {
            api,
            visible: HashSet::new(),
        }
    }

    pub fn is_visible(&self, message: &Message) -> bool {
        self.visible.contains(&message.local_id)
    }

    /// Show or hide the translation for a message. A translation already
    /// held on the message only flips visibility; otherwise one fetch is
    /// made — combined full-text + word-level for assistant messages,
    /// full-text only for user messages — and the result is mirrored onto
    /// the shared message so other views see it without a duplicate fetch.
    pub async fn toggle(&mut self, message: &mut Message) {
        if message.translation.is_some() {
            if !self.visible.remove(&message.local_id) {
                self.visible.insert(message.local_id);
            }
            return;
        }

        let Some(id) = message.id else {
            debug!("cannot translate a message without a server id yet");
            return;
        };
        let fetched = match message.role {
            Role::Assistant => self.api.fetch_word_translation(id).await,
            _ => self.api.fetch_translation(id).await,
        };
        match fetched {
            Ok(Some(payload)) => {
                apply_payload(message, payload);
                self.visible.insert(message.local_id);
            }
            Ok(None) => debug!("translation for message {} not ready yet", id),
            Err(err) => debug!("translation fetch for message {} failed: {}", id, err),
        }
    }

    /// One best-effort probe for an already-computed translation, for
    /// assistant messages entering the view. Absence is the expected "not
    /// ready yet" condition; errors are swallowed. Does not change
    /// visibility.
    pub async fn prefetch(&self, message: &mut Message) {
        if message.role != Role::Assistant || message.translation.is_some() {
            return;
        }
        let Some(id) = message.id else { return };
        match self.api.fetch_word_translation(id).await {
            Ok(Some(payload)) => apply_payload(message, payload),
            Ok(None) => {}
            Err(err) => debug!("translation prefetch for message {} failed: {}", id, err),
        }
    }
}

fn apply_payload(message: &mut Message, payload: TranslationPayload) {
    message.translation = Some(payload.translation);
    if payload.word_translations.is_some() {
        message.word_translations = payload.word_translations;
    }
}

/// Poll for the backend to finish computing word-level translations for a
/// just-created assistant message. Stops on the first non-empty result, when
/// the attempt budget runs out, or when the token is cancelled (view torn
/// down, session switched). Failures are swallowed: translations are an
/// enhancement, never required.
pub fn spawn_word_poll(
    api: Arc<dyn TranslationApi>,
    message_id: i64,
    policy: PollPolicy,
    cancel: CancellationToken,
) -> JoinHandle<Option<TranslationPayload>> {
    tokio::spawn(async move {
        let mut delay = policy.initial;
        for attempt in 1..=policy.attempts {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("word translation poll for message {} cancelled", message_id);
                    return None;
                }
                _ = tokio::time::sleep(delay) => {}
            }
            match api.fetch_word_translation(message_id).await {
                Ok(Some(payload))
                    if payload
                        .word_translations
                        .as_ref()
                        .is_some_and(|w| !w.is_empty()) =>
                {
                    debug!(
                        "word translations for message {} ready after {} attempt(s)",
                        message_id, attempt
                    );
                    return Some(payload);
                }
                Ok(_) => debug!(
                    "word translations for message {} not ready (attempt {}/{})",
                    message_id, attempt, policy.attempts
                ),
                Err(err) => debug!(
                    "word translation poll for message {} failed (attempt {}/{}): {}",
                    message_id, attempt, policy.attempts, err
                ),
            }
            delay = delay.mul_f64(policy.backoff).min(policy.max);
        }
        None
    })
}
