// src/api/client.rs
// Shared reqwest transport for every backend endpoint: base URL handling,
// bearer token attachment, JSON decode, and error normalization.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::CONFIG;

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    list_retries: u32,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(CONFIG.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            token,
            list_retries: CONFIG.list_retries,
        })
    }

    pub fn from_config() -> ApiResult<Self> {
        Self::new(
            CONFIG.backend_base_url.clone(),
            CONFIG.token().map(str::to_string),
        )
    }

    /// Universal request builder for all backend JSON endpoints.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/'),
        );
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.header("Authorization", format!("Bearer {token}")),
            None => builder,
        }
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let resp = self
            .request(Method::GET, path)
            .query(query)
            .send()
            .await?;
        decode_json(resp).await
    }

    /// GET with the bounded retry the list/history queries get. Transient
    /// failures (network, 5xx) retry up to the configured budget; a 404 or
    /// any other client error returns immediately.
    pub async fn get_json_with_retry<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let mut attempt = 0u32;
        loop {
            match self.get_json(path, query).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.list_retries => {
                    attempt += 1;
                    warn!("GET {} failed ({}), retry {}/{}", path, err, attempt, self.list_retries);
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let resp = self.request(Method::POST, path).json(body).send().await?;
        decode_json(resp).await
    }

    pub async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let resp = self.request(Method::PUT, path).json(body).send().await?;
        decode_json(resp).await
    }

    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        let resp = self.request(Method::DELETE, path).send().await?;
        check_status(resp).await.map(|_| ())
    }
}

/// Reject non-2xx responses, pulling the backend's `message` field out of the
/// error body when it has one.
async fn check_status(resp: Response) -> ApiResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| {
            if body.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body
            }
        });
    if status == StatusCode::NOT_FOUND {
        debug!("404 from backend: {}", message);
    }
    Err(ApiError::Http {
        status: status.as_u16(),
        message,
    })
}

async fn decode_json<T: DeserializeOwned>(resp: Response) -> ApiResult<T> {
    let resp = check_status(resp).await?;
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
}
