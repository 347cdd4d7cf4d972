//! HTTP transport for the portal backend: JSON requests, multipart uploads,
//! and multipart uploads answered with a server-sent event stream.

use std::future::Future;
use std::time::Duration;

use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tnportal_core::PortalConfig;
use tracing::{debug, info};

use crate::sse::SseDecoder;

pub use reqwest::multipart::{Form, Part};

const USER_AGENT: &str = concat!("tnportal/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request timed out after {} ms", .0.as_millis())]
    Timeout(Duration),
    #[error("{message}")]
    Status { status_code: u16, message: String },
    #[error("response is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),
}

impl TransportError {
    /// HTTP status of a rejected request, if that is what this is.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransportError::Status { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

fn status_message(status_code: u16) -> String {
    format!("HTTP error! status: {status_code}")
}

/// One SSE frame whose data parsed as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    pub event: String,
    pub data: Value,
}

/// HTTP client for the portal API.
///
/// Every call runs under a single deadline covering connect, status, and the
/// full body (including an SSE stream). When it elapses the in-flight request
/// is dropped, which closes the connection.
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    debug: bool,
}

impl ApiClient {
    pub fn new(config: &PortalConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(TransportError::Network)?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            timeout: config.api_timeout,
            debug: config.debug,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        self.request::<T, ()>(Method::GET, path, None).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, TransportError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, TransportError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, TransportError> {
        self.request::<T, ()>(Method::DELETE, path, None).await
    }

    async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, TransportError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        info!(method = %method, url = %url, "API request");

        let mut builder = self
            .client
            .request(method, &url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.send_json(builder).await
    }

    /// POST a multipart form and decode the JSON response.
    ///
    /// No `Content-Type` is set here; reqwest adds the multipart boundary.
    pub async fn post_form_data<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, TransportError> {
        let url = self.url(path);
        info!(url = %url, "API request (multipart)");
        self.send_json(self.client.post(&url).multipart(form)).await
    }

    /// POST a multipart form and read the response as an SSE stream.
    ///
    /// Frames whose data is JSON are handed to `on_event` in arrival order;
    /// other frames (heartbeats, plain text) are dropped. Resolves with the
    /// last JSON payload seen once the server closes the stream, or JSON
    /// `null` when there was none.
    pub async fn post_form_data_with_events<T, F>(
        &self,
        path: &str,
        form: Form,
        mut on_event: F,
    ) -> Result<T, TransportError>
    where
        T: DeserializeOwned,
        F: FnMut(&SseEvent),
    {
        let url = self.url(path);
        info!(url = %url, "API request (multipart, event stream)");
        let debug = self.debug;

        let last_payload = self
            .with_deadline(async {
                let resp = self
                    .client
                    .post(&url)
                    .header(ACCEPT, "text/event-stream")
                    .multipart(form)
                    .send()
                    .await?;
                let resp = check_status(resp).await?;

                let mut body = resp.bytes_stream();
                let mut decoder = SseDecoder::new();
                let mut last_payload = Value::Null;
                let mut dispatched = 0usize;

                while let Some(chunk) = body.next().await {
                    let chunk = chunk?;
                    for frame in decoder.feed(&chunk) {
                        match serde_json::from_str::<Value>(&frame.data) {
                            Ok(data) => {
                                if debug {
                                    debug!(event = %frame.event, data = %data, "SSE event");
                                }
                                let event = SseEvent {
                                    event: frame.event,
                                    data,
                                };
                                on_event(&event);
                                last_payload = event.data;
                                dispatched += 1;
                            }
                            Err(_) => {
                                if debug {
                                    debug!(event = %frame.event, data = %frame.data, "SSE non-JSON data");
                                }
                            }
                        }
                    }
                }
                decoder.finish();
                info!(events = dispatched, "event stream closed");
                Ok::<_, TransportError>(last_payload)
            })
            .await?;

        serde_json::from_value(last_payload).map_err(TransportError::Decode)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, TransportError> {
        let debug = self.debug;
        self.with_deadline(async {
            let resp = check_status(builder.send().await?).await?;
            let bytes = resp.bytes().await?;
            if debug {
                debug!(body = %String::from_utf8_lossy(&bytes), "API response");
            }
            serde_json::from_slice(&bytes).map_err(TransportError::Decode)
        })
        .await
    }

    async fn with_deadline<T>(
        &self,
        fut: impl Future<Output = Result<T, TransportError>>,
    ) -> Result<T, TransportError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                info!(timeout_ms = self.timeout.as_millis() as u64, "API request aborted");
                Err(TransportError::Timeout(self.timeout))
            }
        }
    }
}

async fn check_status(resp: Response) -> Result<Response, TransportError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let status_code = status.as_u16();
    let body = resp.text().await.unwrap_or_default();
    debug!(status = status_code, body = %body, "API error response");
    Err(TransportError::Status {
        status_code,
        message: status_message(status_code),
    })
}
