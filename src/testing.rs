//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use http::header::CONTENT_TYPE;
use serde_json::Value;

use crate::transport::{HttpRequest, HttpResponse, Transport};
use crate::{Client, ManualClock, Params, Secrets, TransportError};

#[derive(Default)]
struct StubState {
    methods: HashMap<String, HttpResponse>,
    urls: HashMap<String, HttpResponse>,
    requests: Vec<HttpRequest>,
}

/// Transport answering canned responses, by API method name first and by
/// URL (query stripped) otherwise. Clones share state.
#[derive(Clone, Default)]
pub(crate) struct StubTransport {
    state: Arc<Mutex<StubState>>,
}

impl StubTransport {
    pub(crate) fn new() -> Self {
        Default::default()
    }

    fn state(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().unwrap()
    }

    pub(crate) fn on_method(&self, method: &str, reply: Value) {
        self.state().methods.insert(
            method.to_string(),
            HttpResponse {
                status: 200,
                body: reply.to_string().into_bytes(),
            },
        );
    }

    pub(crate) fn on_url(&self, url: &str, status: u16, body: &str) {
        self.state().urls.insert(
            url.to_string(),
            HttpResponse {
                status,
                body: body.as_bytes().to_vec(),
            },
        );
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.state().requests.clone()
    }

    /// Requests sent to `url`, query ignored.
    pub(crate) fn requests_to(&self, url: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| base_url(&r.url) == url)
            .collect()
    }

    pub(crate) fn calls_to(&self, method: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| api_method(r).as_deref() == Some(method))
            .count()
    }

    /// API method names in the order they were called.
    pub(crate) fn method_log(&self) -> Vec<String> {
        self.requests().iter().filter_map(api_method).collect()
    }
}

impl Transport for StubTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut state = self.state();
        state.requests.push(request.clone());
        let by_method = api_method(&request).and_then(|m| state.methods.get(&m).cloned());
        let reply = by_method.or_else(|| state.urls.get(base_url(&request.url)).cloned());
        reply.ok_or_else(|| TransportError::Status {
            status: 404,
            body: format!("no stub for {}", request.url),
        })
    }
}

fn base_url(url: &str) -> &str {
    url.splitn(2, '?').next().unwrap_or(url)
}

/// Every parameter a request carries in its query and form body.
pub(crate) fn request_params(request: &HttpRequest) -> Params {
    let mut params: Params = request
        .url
        .splitn(2, '?')
        .nth(1)
        .map(|q| serde_urlencoded::from_str(q).unwrap_or_default())
        .unwrap_or_default();
    let is_form = request.header_value(&CONTENT_TYPE) == Some("application/x-www-form-urlencoded");
    if is_form {
        if let Ok(body) = serde_urlencoded::from_bytes::<Params>(&request.body) {
            params.extend(body);
        }
    }
    params
}

fn api_method(request: &HttpRequest) -> Option<String> {
    request_params(request).remove("method")
}

/// Client wired to `stub` and a manual clock started at the current time.
pub(crate) fn client_with(stub: StubTransport) -> (Client, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(SystemTime::now()));
    let client = Client::new(Secrets::new("key", "secret"))
        .with_transport(stub)
        .with_clock(Arc::clone(&clock));
    (client, clock)
}
