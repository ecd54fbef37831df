//! HTTP fallback transport.
//!
//! Used only when the persistent channel is not connected or refuses a
//! payload.  Each input is one `POST {http_base_url}/sessions/{id}/input`
//! whose body is the exact wire payload.  The response status and body are
//! handed back untouched; classifying them is the delivery layer's job.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Url};
use termlink_core::SessionId;
use thiserror::Error;
use tracing::debug;

use crate::application::delivery::{FallbackResponse, FallbackTransport, TransportError};
use crate::domain::config::EndpointConfig;
use crate::infrastructure::auth::AuthHeaderProvider;
use crate::infrastructure::endpoint::{session_endpoint, EndpointError};

#[derive(Debug, Error)]
pub enum HttpFallbackError {
    #[error("could not build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error(transparent)]
    Endpoint(#[from] EndpointError),
}

pub struct HttpFallback {
    client: Client,
    base_url: String,
    auth: Arc<dyn AuthHeaderProvider>,
}

impl HttpFallback {
    /// Builds a client whose every request is bounded by
    /// `config.fallback_timeout()`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpFallbackError::Endpoint`] if the base URL is unusable,
    /// or [`HttpFallbackError::Client`] if the TLS backend fails to load.
    pub fn new(
        config: &EndpointConfig,
        auth: Arc<dyn AuthHeaderProvider>,
    ) -> Result<Self, HttpFallbackError> {
        // Fail at startup rather than on the first fallback call.
        session_endpoint(&config.http_base_url, &SessionId::new("startup-check"), "input")?;

        let client = Client::builder()
            .timeout(config.fallback_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: config.http_base_url.clone(),
            auth,
        })
    }

    fn input_url(&self, session: &SessionId) -> Result<Url, TransportError> {
        session_endpoint(&self.base_url, session, "input")
            .map_err(|e| TransportError::Request(e.to_string()))
    }
}

#[async_trait]
impl FallbackTransport for HttpFallback {
    async fn post_input(
        &self,
        session: &SessionId,
        payload: &str,
    ) -> Result<FallbackResponse, TransportError> {
        let url = self.input_url(session)?;
        debug!(%url, bytes = payload.len(), "posting input to fallback endpoint");

        let mut request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload.to_owned());
        if let Some(value) = self.auth.authorization() {
            request = request.header(AUTHORIZATION, value);
        }

        let res = request.send().await.map_err(transport_error)?;
        let status = res.status().as_u16();
        let body = res.text().await.map_err(transport_error)?;
        Ok(FallbackResponse { status, body })
    }
}

fn transport_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Request(e.to_string())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
