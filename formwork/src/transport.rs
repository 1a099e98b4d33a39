//! Request capability consumed by API-backed validation.
//!
//! The engine never talks to the network directly; it goes through the
//! [`Transport`] trait and interprets the `{payload, code, message}` response
//! envelope, where a falsy `code` means success. [`HttpTransport`] is the
//! default reqwest-backed implementation; tests substitute their own.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::value;

/// Response envelope for API calls.
///
/// Missing fields default, so `{}` decodes to a successful empty response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResponse {
    /// Response payload.
    #[serde(default)]
    pub payload: Value,
    /// Error code; falsy (null, `0`, `""`, `false`, absent) means success.
    #[serde(default)]
    pub code: Value,
    /// Human-readable message accompanying the code.
    #[serde(default)]
    pub message: String,
}

impl ApiResponse {
    /// `true` when the response code is falsy.
    pub fn is_success(&self) -> bool {
        value::is_falsy(&self.code)
    }
}

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Method {
    /// GET request (default).
    #[default]
    Get,
    /// POST request with an optional JSON body.
    Post,
}

/// Options for a single request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// HTTP method.
    pub method: Method,
    /// JSON body, sent for POST requests.
    pub body: Option<Value>,
}

/// Errors that can occur while performing a request.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Network-level failure.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body, if any.
        body: String,
    },

    /// The response body was not a valid envelope.
    #[error("response decode error: {0}")]
    Decode(String),
}

/// Asynchronous request capability.
///
/// # Example
///
/// ```ignore
/// struct AlwaysTaken;
///
/// #[async_trait]
/// impl Transport for AlwaysTaken {
///     async fn request(&self, _url: &str, _options: RequestOptions) -> Result<ApiResponse, TransportError> {
///         Ok(ApiResponse {
///             payload: Value::Null,
///             code: serde_json::json!(1),
///             message: "Name is taken".into(),
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform a request and decode the response envelope.
    async fn request(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, TransportError>;
}

/// Default [`Transport`] backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a fresh client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport reusing an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, TransportError> {
        let request = match options.method {
            Method::Get => self.client.get(url),
            Method::Post => {
                let request = self.client.post(url);
                match &options.body {
                    Some(body) => request.json(body),
                    None => request,
                }
            }
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        response
            .json()
            .await
            .map_err(|err| TransportError::Decode(err.to_string()))
    }
}
