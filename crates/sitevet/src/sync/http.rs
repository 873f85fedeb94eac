//! HTTP remote store client.
//!
//! Speaks a small JSON protocol: GET returns the current content and
//! version token (404 means no shared copy yet); PUT carries the content,
//! target branch, commit message, and an optional expected version token,
//! and answers 409/412 when the token no longer matches.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SitevetError};

use super::{RemoteRead, RemoteStore, WriteOutcome};

/// Bound on every remote call; a slow remote degrades to "pending", it
/// never hangs the review session.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const DEFAULT_BRANCH: &str = "main";

#[derive(Debug, Serialize)]
struct PutPayload<'a> {
    content: &'a str,
    branch: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_version: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ReadResponse {
    content: String,
    version: String,
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    version: String,
}

/// Remote store backed by an HTTP endpoint.
pub struct HttpRemote {
    client: Client,
    url: String,
    branch: String,
    token: Option<String>,
}

impl HttpRemote {
    /// Create a client for the given endpoint with the default timeout.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom timeout.
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SitevetError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            branch: DEFAULT_BRANCH.to_string(),
            token: None,
        })
    }

    /// Set the branch remote writes target.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Set a bearer token for authenticated endpoints.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn authed(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl RemoteStore for HttpRemote {
    fn read(&self) -> Result<RemoteRead> {
        let response = self
            .authed(self.client.get(&self.url))
            .send()
            .map_err(|e| SitevetError::Remote(format!("read failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            // A missing shared copy is a valid state, not an error.
            return Ok(RemoteRead::Absent);
        }
        if !status.is_success() {
            return Err(SitevetError::Remote(format!("read returned {}", status)));
        }

        let body: ReadResponse = response
            .json()
            .map_err(|e| SitevetError::Remote(format!("malformed read response: {}", e)))?;
        Ok(RemoteRead::Present {
            content: body.content,
            version: body.version,
        })
    }

    fn write(
        &self,
        content: &str,
        expected_version: Option<&str>,
        message: &str,
    ) -> Result<WriteOutcome> {
        let payload = PutPayload {
            content,
            branch: &self.branch,
            message,
            expected_version,
        };

        let response = self
            .authed(self.client.put(&self.url).json(&payload))
            .send()
            .map_err(|e| SitevetError::Remote(format!("write failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::CONFLICT || status == StatusCode::PRECONDITION_FAILED {
            let current = response
                .json::<WriteResponse>()
                .map(|r| r.version)
                .unwrap_or_default();
            return Ok(WriteOutcome::VersionMismatch { current });
        }
        if !status.is_success() {
            return Err(SitevetError::Remote(format!("write returned {}", status)));
        }

        let body: WriteResponse = response
            .json()
            .map_err(|e| SitevetError::Remote(format!("malformed write response: {}", e)))?;
        Ok(WriteOutcome::Committed {
            version: body.version,
        })
    }
}
