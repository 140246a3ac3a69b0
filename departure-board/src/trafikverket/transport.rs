//! One request/response cycle against the data endpoint.
//!
//! The network side lives behind [`Backend`] so the transport logic (credential
//! check, deadline, outcome classification) is the same for the real HTTP
//! backend and the scripted one used in tests.

use std::future::Future;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::TrafikverketError;
use super::query::{Query, WireFormat};

/// An encoded request body ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRequest {
    pub content_type: &'static str,
    pub body: String,
}

/// A completed HTTP exchange, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    /// `None` when the body could not be read.
    pub body: Option<String>,
}

impl RawResponse {
    /// A response with a readable body.
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            body: Some(body.into()),
        }
    }
}

/// Something that can POST a request body and hand back the raw response.
///
/// Dropping the returned future must abandon the request.
pub trait Backend: Send + Sync {
    fn post(
        &self,
        request: WireRequest,
    ) -> impl Future<Output = Result<RawResponse, TrafikverketError>> + Send;
}

/// reqwest-backed [`Backend`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    url: String,
}

impl HttpBackend {
    /// Create a backend posting to `url`.
    pub fn new(url: impl Into<String>) -> Result<Self, TrafikverketError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

impl Backend for HttpBackend {
    async fn post(&self, request: WireRequest) -> Result<RawResponse, TrafikverketError> {
        let response = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, request.content_type)
            .body(request.body)
            .send()
            .await?;

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(status = status.as_u16(), error = %e, "failed to read response body");
                None
            }
        };

        Ok(RawResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

/// Sends queries with the credential attached and interprets the outcome.
#[derive(Debug, Clone)]
pub struct Transport<B> {
    backend: B,
    api_key: String,
    format: WireFormat,
    timeout: Duration,
}

impl<B: Backend> Transport<B> {
    pub fn new(backend: B, api_key: impl Into<String>, format: WireFormat, timeout: Duration) -> Self {
        Self {
            backend,
            api_key: api_key.into(),
            format,
            timeout,
        }
    }

    /// The backend, mostly for inspection in tests.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Send one query and return the parsed JSON response.
    ///
    /// Fails with `Configuration` before touching the network when no
    /// credential is set, and with `Timeout` if the backend hasn't finished
    /// within the deadline (the in-flight request is dropped).
    pub async fn send(&self, query: &Query) -> Result<Value, TrafikverketError> {
        if self.api_key.trim().is_empty() {
            return Err(TrafikverketError::Configuration(
                "API_KEY is missing; set it in the environment or .env".to_string(),
            ));
        }

        let request = WireRequest {
            content_type: self.format.content_type(),
            body: self.format.encode(query, &self.api_key),
        };

        debug!(
            object_type = query.object_type,
            format = ?self.format,
            "sending query"
        );

        let raw = tokio::time::timeout(self.timeout, self.backend.post(request))
            .await
            .map_err(|_| TrafikverketError::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            })??;

        classify(raw)
    }
}

/// Turn a completed exchange into a parsed document or a typed error.
fn classify(raw: RawResponse) -> Result<Value, TrafikverketError> {
    let RawResponse {
        status,
        status_text,
        body,
    } = raw;

    if !(200..300).contains(&status) {
        return Err(TrafikverketError::Remote {
            status,
            status_text,
            body: body.unwrap_or_default(),
        });
    }

    let Some(body) = body else {
        return Err(TrafikverketError::ResponseFormat {
            message: "response body could not be read".to_string(),
            body: String::new(),
        });
    };

    let value: Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(e) => {
            return Err(TrafikverketError::ResponseFormat {
                message: e.to_string(),
                body,
            });
        }
    };

    // The API sometimes reports query errors inside a 200 document.
    let embedded = value.pointer("/RESPONSE/ERROR").is_some()
        || value.pointer("/RESPONSE/RESULT/0/ERROR").is_some();
    if embedded {
        return Err(TrafikverketError::Remote {
            status,
            status_text,
            body,
        });
    }

    Ok(value)
}
