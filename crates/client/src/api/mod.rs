//! HTTP layer for the storefront REST backend.
//!
//! [`ApiClient`] builds endpoint URLs from the configured base, attaches the
//! bearer token, and turns responses into typed values. It holds no session
//! state; [`crate::Store`] decides which token to send and what to do with
//! the answer.

mod responses;

pub use responses::{
    CartEnvelope, MessageEnvelope, OrderEnvelope, ProductEnvelope, ReviewEnvelope, SignInResponse,
};

use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use crate::config::ClientConfig;
use crate::error::ClientError;

/// Longest slice of an error body that is written to the log.
const LOGGED_BODY_CHARS: usize = 500;

/// Low-level client for the storefront backend.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base: Url,
}

impl ApiClient {
    /// Create a client for the backend at `config.api_url`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("cartwheel/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base: config.api_url.clone(),
        })
    }

    /// Base URL every endpoint is resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve an endpoint from path segments. Each segment is
    /// percent-encoded, so IDs can never inject extra path components.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidUrl` if the base URL cannot carry a path.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start a request, attaching `Authorization: Bearer` when a token is given.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidUrl` if the endpoint cannot be built.
    pub fn request(
        &self,
        method: Method,
        segments: &[&str],
        token: Option<&SecretString>,
    ) -> Result<RequestBuilder, ClientError> {
        let url = self.endpoint(segments)?;
        let builder = self.client.request(method, url);
        Ok(match token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        })
    }

    /// Send a request and decode the JSON body.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::RequestFailed` with the fixed `action` message on
    /// any non-success status, `ClientError::Http` on transport failure, and
    /// `ClientError::Decode` if the body does not match `T`.
    #[instrument(skip(self, request), level = "debug")]
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        action: &'static str,
    ) -> Result<T, ClientError> {
        let response = self.send_ok(request, action).await?;
        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|source| {
            tracing::error!(
                error = %source,
                body = %truncate(&body),
                "Failed to decode backend response"
            );
            ClientError::Decode { action, source }
        })
    }

    /// Send a request and return the raw body with its content type.
    ///
    /// # Errors
    ///
    /// Same as [`Self::send_json`], minus decoding.
    #[instrument(skip(self, request), level = "debug")]
    pub async fn send_bytes(
        &self,
        request: RequestBuilder,
        action: &'static str,
    ) -> Result<(Vec<u8>, Option<String>), ClientError> {
        let response = self.send_ok(request, action).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let bytes = response.bytes().await?;
        Ok((bytes.to_vec(), content_type))
    }

    /// Send a request and fail on any non-success status.
    async fn send_ok(
        &self,
        request: RequestBuilder,
        action: &'static str,
    ) -> Result<Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(
            status = %status,
            body = %truncate(&body),
            "{action}"
        );
        Err(ClientError::RequestFailed {
            action,
            status: status.as_u16(),
        })
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.base.as_str())
            .finish_non_exhaustive()
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(LOGGED_BODY_CHARS).collect()
}
