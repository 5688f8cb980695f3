use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::AppError;

/// Pinboard v1 API methods used by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    PostsUpdate,
    PostsAll,
    PostsGet,
    PostsSuggest,
    PostsAdd,
    PostsDelete,
    TagsGet,
    TagsRename,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::PostsUpdate => "posts/update",
            Endpoint::PostsAll => "posts/all",
            Endpoint::PostsGet => "posts/get",
            Endpoint::PostsSuggest => "posts/suggest",
            Endpoint::PostsAdd => "posts/add",
            Endpoint::PostsDelete => "posts/delete",
            Endpoint::TagsGet => "tags/get",
            Endpoint::TagsRename => "tags/rename",
        }
    }

    pub fn is_write(self) -> bool {
        matches!(
            self,
            Endpoint::PostsAdd | Endpoint::PostsDelete | Endpoint::TagsRename
        )
    }
}

pub type QueryParams = Vec<(&'static str, String)>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<TransportError> for AppError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Status { status: 401 | 403, .. } => {
                AppError::Authentication("Pinboard rejected the API token".to_string())
            }
            TransportError::Status { status: 429, .. } => {
                AppError::Upstream("Pinboard rate limit hit (HTTP 429)".to_string())
            }
            TransportError::Status { status, .. } => {
                AppError::Upstream(format!("Pinboard returned HTTP {}", status))
            }
            TransportError::Timeout => AppError::Network("request timed out".to_string()),
            TransportError::Connect(msg) => AppError::Network(msg),
            TransportError::Decode(msg) => {
                AppError::Upstream(format!("malformed response: {}", msg))
            }
        }
    }
}

/// Authenticated GET capability against the bookmark service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        endpoint: Endpoint,
        params: QueryParams,
    ) -> std::result::Result<Value, TransportError>;
}

/// reqwest-backed transport; the token travels as the `auth_token` query parameter.
#[derive(Clone)]
pub struct HttpTransport {
    http_client: Client,
    base_url: String,
    auth_token: String,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

const MAX_ERROR_BODY: usize = 200;

impl HttpTransport {
    pub fn new(base_url: &str, auth_token: &str, timeout: Duration) -> Result<Self, AppError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pinboard-bridge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: auth_token.to_string(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        endpoint: Endpoint,
        mut params: QueryParams,
    ) -> std::result::Result<Value, TransportError> {
        let url = format!("{}/{}", self.base_url, endpoint.path());
        params.push(("auth_token", self.auth_token.clone()));
        params.push(("format", "json".to_string()));

        let response = self
            .http_client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                // the URL carries the token, never let it reach a message
                let e = e.without_url();
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Connect(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            let e = e.without_url();
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Connect(e.to_string())
            }
        })?;

        if !status.is_success() {
            warn!("Pinboard {} returned status {}", endpoint.path(), status);
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        if body.trim().is_empty() {
            return Err(TransportError::Decode("empty body".to_string()));
        }

        debug!("Pinboard {} answered with {} bytes", endpoint.path(), body.len());
        serde_json::from_str(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}
