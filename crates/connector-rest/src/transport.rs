//! HTTP transport seam
//!
//! [`Transport`] executes exactly one HTTP exchange. Retry policy lives in
//! [`crate::executor`], so fakes only need to answer single requests.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use connector_core::ConnectorConfig;
use std::fmt;
use std::io::Read;
use std::time::Duration;
use thiserror::Error;

/// HTTP method used against the FE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully formed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestRequest {
    pub method: Method,
    pub uri: String,
    /// JSON body, sent as `application/json` in UTF-8
    pub body: Option<String>,
}

impl RestRequest {
    pub fn get(uri: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            uri: uri.into(),
            body: None,
        }
    }

    pub fn post_json(uri: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            uri: uri.into(),
            body: Some(body.into()),
        }
    }
}

/// Status line and full body of one response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestResponse {
    pub status: u16,
    pub body: String,
}

impl RestResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Per-attempt settings: timeouts and basic-auth credentials.
/// A `None` timeout leaves that phase unbounded.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestOptions {
    pub connect_timeout: Option<Duration>,
    pub read_timeout: Option<Duration>,
    pub user: String,
    pub password: String,
}

impl RequestOptions {
    pub fn from_config(config: &ConnectorConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout(),
            read_timeout: config.read_timeout(),
            user: config.user().to_string(),
            password: config.password().to_string(),
        }
    }

    /// Value of the `Authorization` header
    pub fn basic_auth(&self) -> String {
        let credentials = format!("{}:{}", self.user, self.password);
        format!("Basic {}", STANDARD.encode(credentials))
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("connect_timeout", &self.connect_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Failure below the HTTP layer: DNS, connect, timeout, broken body
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Executes a single HTTP request
pub trait Transport: Send + Sync {
    /// Any HTTP status counts as a response; only failures to obtain one are
    /// errors.
    fn execute(
        &self,
        request: &RestRequest,
        options: &RequestOptions,
    ) -> std::result::Result<RestResponse, TransportError>;
}

/// Blocking transport on top of `ureq`. Each call builds its own agent, so
/// no connection is reused between attempts.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl Transport for UreqTransport {
    fn execute(
        &self,
        request: &RestRequest,
        options: &RequestOptions,
    ) -> std::result::Result<RestResponse, TransportError> {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = options.connect_timeout {
            builder = builder.timeout_connect(timeout);
        }
        if let Some(timeout) = options.read_timeout {
            builder = builder.timeout_read(timeout);
        }
        let agent = builder.build();

        let call = agent
            .request(request.method.as_str(), &request.uri)
            .set("Authorization", &options.basic_auth());

        let result = match &request.body {
            Some(body) => call
                .set("Content-Type", "application/json; charset=UTF-8")
                .send_string(body),
            None => call.call(),
        };

        match result {
            Ok(response) => {
                let status = response.status();
                let mut body = String::new();
                response
                    .into_reader()
                    .read_to_string(&mut body)
                    .map_err(|e| TransportError(format!("read response body: {}", e)))?;
                Ok(RestResponse { status, body })
            }
            Err(ureq::Error::Status(status, response)) => Ok(RestResponse {
                status,
                body: response.into_string().unwrap_or_default(),
            }),
            Err(ureq::Error::Transport(transport)) => Err(TransportError(transport.to_string())),
        }
    }
}
