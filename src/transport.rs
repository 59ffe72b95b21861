//! The HTTP capability the client is built on.

use std::convert::TryFrom;
use std::time::Duration;

use http::header::HeaderName;
use http::Method;
use reqwest::blocking::Client as ReqwestClient;
use reqwest::header::HeaderValue;

use crate::TransportError;

/// A fully built request, ready to go on the wire.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(HeaderName, String)>,
    pub body: Vec<u8>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new<U: Into<String>>(method: Method, url: U) -> Self {
        HttpRequest {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: Vec::new(),
            timeout: None,
        }
    }

    pub fn header<V: Into<String>>(mut self, name: HeaderName, value: V) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn body<B: Into<Vec<u8>>>(mut self, body: B) -> Self {
        self.body = body.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// First value of the named header.
    pub fn header_value(&self, name: &HeaderName) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends one request and blocks until the response or the timeout.
///
/// Implementations must not retry; errors go back to the caller untouched.
pub trait Transport: Send {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

impl<T: Transport + Sync + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

/// [`Transport`] backed by `reqwest::blocking::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: ReqwestClient,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        ReqwestTransport::new()
    }
}

impl From<ReqwestClient> for ReqwestTransport {
    fn from(client: ReqwestClient) -> Self {
        ReqwestTransport::new_with_client(client)
    }
}

impl ReqwestTransport {
    /// Constructs a new `ReqwestTransport`.
    ///
    /// The inner client has no overall timeout; each [`HttpRequest`] carries
    /// its own, and bulk uploads carry none.
    ///
    /// # Panics
    ///
    /// Like `reqwest::blocking::Client::new()`, when the TLS backend cannot
    /// be initialized. Use [`ReqwestTransport::try_new`] to handle that.
    pub fn new() -> Self {
        ReqwestTransport::try_new().expect("TLS backend cannot be initialized")
    }

    /// Fallible [`ReqwestTransport::new`].
    pub fn try_new() -> Result<Self, TransportError> {
        let inner = ReqwestClient::builder().timeout(None).build()?;
        Ok(ReqwestTransport { inner })
    }

    /// Constructs a new `ReqwestTransport` with specifying inner client.
    pub fn new_with_client(client: ReqwestClient) -> Self {
        ReqwestTransport { inner: client }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.inner.request(request.method, &request.url);
        for (name, value) in request.headers {
            let value = HeaderValue::try_from(value)
                .map_err(|e| TransportError::InvalidHeader(format!("{}: {}", name, e)))?;
            builder = builder.header(name, value);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }
        let response = builder.send()?;
        let status = response.status().as_u16();
        let body = response.bytes()?.to_vec();
        Ok(HttpResponse { status, body })
    }
}
