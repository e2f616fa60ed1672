//! Pluggable HTTP transport.
//!
//! [`Transport`] is the seam between request assembly and the network. The
//! default [`UreqTransport`] talks to a weles server over blocking HTTP; tests
//! substitute recording or failing implementations.

use log::{debug, info};
use serde::de::DeserializeOwned;
use std::io::Read;
use std::time::Duration;
use url::Url;

use crate::error::{WelesError, WelesResult};
use crate::multipart::MultipartBody;
use crate::request::{Method, OutboundRequest};

/// Executes assembled requests against a weles server.
pub trait Transport: Send + Sync {
    /// Send `request` and return the raw response, whatever its status.
    fn execute(&self, request: &OutboundRequest) -> WelesResult<HttpResponse>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: &OutboundRequest) -> WelesResult<HttpResponse> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn execute(&self, request: &OutboundRequest) -> WelesResult<HttpResponse> {
        (**self).execute(request)
    }
}

/// A response with its body fully read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    /// Fail with [`WelesError::Server`] unless the status is 2xx.
    pub fn error_for_status(self) -> WelesResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(WelesError::Server {
                status: self.status,
                body: self.body,
            })
        }
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> WelesResult<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| WelesError::Parse(format!("invalid JSON response: {}", e)))
    }
}

/// Blocking HTTP transport built on `ureq`.
pub struct UreqTransport {
    agent: ureq::Agent,
    base_url: Url,
}

impl UreqTransport {
    /// Create a transport for `base_url`. Timeouts are optional; without them
    /// the agent waits indefinitely.
    pub fn new(
        base_url: &str,
        timeout: Option<Duration>,
        connect_timeout: Option<Duration>,
    ) -> WelesResult<Self> {
        // Url::join drops the last segment unless the base ends with '/'.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| WelesError::invalid(format!("Invalid server URL '{}': {}", base_url, e)))?;

        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = connect_timeout {
            builder = builder.timeout_connect(connect_timeout);
        }

        Ok(Self {
            agent: builder.build(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> WelesResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| WelesError::invalid(format!("Failed to build URL for '{}': {}", path, e)))
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &OutboundRequest) -> WelesResult<HttpResponse> {
        let url = self.url_for(&request.path)?;
        info!("{} {}", request.method.as_str(), url);

        let call = self.agent.request(request.method.as_str(), url.as_str());
        let result = if request.is_multipart() {
            let body = MultipartBody::encode(request)?;
            let length = body.content_length();
            debug!(
                "Sending multipart body of {} bytes ({} files)",
                length,
                request.files.len()
            );
            call.set("Content-Type", &body.content_type())
                .set("Content-Length", &length.to_string())
                .send(body.into_reader())
        } else if request.fields.is_empty() && request.method == Method::Get {
            call.call()
        } else {
            call.send_form(&request.fields.form_pairs())
        };

        let response = match result {
            Ok(response) => response,
            // Status handling belongs to the caller.
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(e)) => {
                return Err(WelesError::Transport(e.to_string()));
            }
        };

        let status = response.status();
        let mut body = String::new();
        response
            .into_reader()
            .read_to_string(&mut body)
            .map_err(|e| WelesError::Transport(format!("Failed reading response body: {}", e)))?;

        debug!("Response {} ({} bytes)", status, body.len());
        Ok(HttpResponse { status, body })
    }
}
