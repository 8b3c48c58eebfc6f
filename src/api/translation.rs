// src/api/translation.rs

use async_trait::async_trait;

use crate::api::client::HttpClient;
use crate::api::error::{ApiError, ApiResult};
use crate::api::types::TranslationPayload;

/// Translation endpoints, keyed by server message id. Both map a 404 to
/// `Ok(None)`: the backend computes translations asynchronously and "not
/// ready yet" is an expected condition, not a failure.
#[async_trait]
pub trait TranslationApi: Send + Sync {
    /// Full-text translation only (`GET /messages/{id}/translation`).
    async fn fetch_translation(&self, message_id: i64) -> ApiResult<Option<TranslationPayload>>;

    /// Full text plus word-level gloss
    /// (`GET /messages/{id}/translation/words`).
    async fn fetch_word_translation(
        &self,
        message_id: i64,
    ) -> ApiResult<Option<TranslationPayload>>;
}

fn absent_on_not_found(
    result: ApiResult<TranslationPayload>,
) -> ApiResult<Option<TranslationPayload>> {
    match result {
        Ok(payload) => Ok(Some(payload)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

#[async_trait]
impl TranslationApi for HttpClient {
    async fn fetch_translation(&self, message_id: i64) -> ApiResult<Option<TranslationPayload>> {
        absent_on_not_found(
            self.get_json(&format!("messages/{message_id}/translation"), &[])
                .await,
        )
    }

    async fn fetch_word_translation(
        &self,
        message_id: i64,
    ) -> ApiResult<Option<TranslationPayload>> {
        absent_on_not_found(
            self.get_json(&format!("messages/{message_id}/translation/words"), &[])
                .await,
        )
    }
}
