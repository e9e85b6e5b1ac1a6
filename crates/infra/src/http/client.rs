use std::time::Duration;

use mentorbook_domain::{BookingError, Result};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::debug;

use crate::errors::InfraError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_ATTEMPTS: usize = 3;
const BASE_BACKOFF: Duration = Duration::from_millis(200);

/// Shared outbound HTTP client with timeouts and bounded retries.
///
/// Retries cover transient failures only: connect/timeout errors and 5xx
/// responses. 4xx responses are returned to the caller as-is so each
/// integration can map them into its own semantics.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    base_backoff: Duration,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_attempts(timeout, DEFAULT_ATTEMPTS)
    }

    pub fn with_attempts(timeout: Duration, max_attempts: usize) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .user_agent(concat!("mentorbook/", env!("CARGO_PKG_VERSION")))
            .no_proxy()
            .build()
            .map_err(InfraError::from)?;

        Ok(Self {
            client,
            max_attempts: max_attempts.max(1),
            base_backoff: BASE_BACKOFF,
        })
    }

    /// Test hook: shrink backoff so retry tests run fast.
    #[cfg(test)]
    fn with_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn request<U: reqwest::IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Send a request, retrying transient failures with exponential backoff.
    ///
    /// The builder must have a clonable body. Streaming bodies are not used
    /// anywhere in this crate.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let mut last_err: Option<BookingError> = None;

        for attempt in 1..=self.max_attempts {
            let request = builder
                .try_clone()
                .ok_or_else(|| {
                    BookingError::Internal("non-clonable request body, cannot retry".into())
                })?
                .build()
                .map_err(InfraError::from)?;

            let method = request.method().clone();
            let url = request.url().clone();
            debug!(attempt, %method, %url, "sending request");

            match self.client.execute(request).await {
                Ok(response) if response.status().is_server_error() && attempt < self.max_attempts => {
                    debug!(attempt, %url, status = %response.status(), "server error, will retry");
                    self.backoff(attempt).await;
                }
                Ok(response) => return Ok(response),
                Err(err) if is_transient(&err) && attempt < self.max_attempts => {
                    debug!(attempt, %url, error = %err, "transient failure, will retry");
                    last_err = Some(InfraError::from(err).into());
                    self.backoff(attempt).await;
                }
                Err(err) => return Err(InfraError::from(err).into()),
            }
        }

        Err(last_err
            .unwrap_or_else(|| BookingError::Network("request retries exhausted".into())))
    }

    async fn backoff(&self, attempt: usize) {
        let factor = 1u32 << (attempt - 1).min(6) as u32;
        let delay = self.base_backoff.saturating_mul(factor);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
