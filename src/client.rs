use std::fmt;
use std::time::SystemTime;

use http::Method;
use serde_json::Value;

use crate::cache::{CacheConfig, CacheKey, ResponseCache};
use crate::clock::{Clock, SystemClock};
use crate::secrets::ActiveToken;
use crate::transport::{ReqwestTransport, Transport};
use crate::{AuthState, ClientConfig, RequestBuilder, Result, Secrets, Token};

const METHOD_NAMESPACE: &str = "vimeo.";

/// Client for one user account.
///
/// Holds the consumer credentials, at most one active token, the optional
/// response cache and the transport. A `Client` can move to another thread
/// but is not `Sync`: share one behind a `Mutex`, or run one client per
/// concurrent upload.
pub struct Client {
    secrets: Secrets,
    token: Option<ActiveToken>,
    config: ClientConfig,
    cache: Option<Box<dyn ResponseCache>>,
    transport: Box<dyn Transport>,
    clock: Box<dyn Clock>,
}

impl Client {
    /// Constructs a new `Client` with the default configuration.
    ///
    /// Requests go out through a fresh [`ReqwestTransport`](crate::transport::ReqwestTransport).
    pub fn new(secrets: Secrets) -> Self {
        Client::with_config(secrets, ClientConfig::default())
    }

    /// Constructs a new `Client`, enabling the configured cache if any.
    pub fn with_config(secrets: Secrets, config: ClientConfig) -> Self {
        let cache = config.cache.as_ref().map(CacheConfig::build);
        Client {
            secrets,
            token: None,
            config,
            cache,
            transport: Box::new(ReqwestTransport::new()),
            clock: Box::new(SystemClock),
        }
    }

    /// Start out with an access token, skipping the authorization flow.
    pub fn with_token(mut self, token: Token) -> Self {
        self.set_token(token);
        self
    }

    /// Replace the HTTP transport.
    pub fn with_transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Box::new(transport);
        self
    }

    /// Replace the time source.
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn secrets(&self) -> &Secrets {
        &self.secrets
    }

    // ------------------------------------------------------------------------
    // Token state

    /// Adopt an access token.
    pub fn set_token(&mut self, token: Token) {
        self.token = Some(ActiveToken::Access(token));
    }

    /// Adopt a request token, e.g. one kept in a web session between the
    /// authorization redirect and the callback.
    pub fn set_request_token(&mut self, token: Token) {
        self.token = Some(ActiveToken::Request(token));
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// The active token pair, whatever its phase.
    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref().map(ActiveToken::token)
    }

    pub fn auth_state(&self) -> AuthState {
        self.token
            .as_ref()
            .map_or(AuthState::NoToken, ActiveToken::state)
    }

    // ------------------------------------------------------------------------
    // Cache

    /// Enable the response cache, or switch to another backend.
    pub fn enable_cache(&mut self, config: CacheConfig) {
        tracing::debug!(kind = ?config.kind, expire = config.expire, "response cache enabled");
        self.cache = Some(config.build());
        self.config.cache = Some(config);
    }

    pub fn disable_cache(&mut self) {
        self.cache = None;
        self.config.cache = None;
    }

    /// Remove every entry of the active backend.
    pub fn clear_cache(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            cache.clear();
        }
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    pub(crate) fn cache_get(&mut self, key: &CacheKey, now: SystemTime) -> Option<Value> {
        self.cache.as_mut().and_then(|cache| cache.get(key, now))
    }

    pub(crate) fn cache_put(&mut self, key: &CacheKey, response: &Value, now: SystemTime) {
        if let Some(cache) = self.cache.as_mut() {
            cache.put(key, response, now);
        }
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    // ------------------------------------------------------------------------
    // Calls

    /// Start building a signed request to an arbitrary endpoint.
    ///
    /// Without [`RequestBuilder::api_method`] the raw body is returned, which
    /// is what the oauth endpoints need.
    pub fn request<U: Into<String>>(&mut self, verb: Method, url: U) -> RequestBuilder<'_> {
        RequestBuilder::new(self, verb, url.into())
    }

    /// Start building a call to an API method on the REST endpoint.
    ///
    /// `videos.getInfo` and `vimeo.videos.getInfo` name the same method.
    pub fn method<T: AsRef<str>>(&mut self, method: T) -> RequestBuilder<'_> {
        let method = qualify(method.as_ref());
        let url = self.config.rest_url.clone();
        RequestBuilder::new(self, Method::GET, url).api_method(method)
    }

    /// Call an API method with GET, allowing cached answers.
    ///
    /// # Errors
    ///
    /// See [`RequestBuilder::send`].
    pub fn call<T, I, K, V>(&mut self, method: T, params: I) -> Result<Value>
    where
        T: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.method(method).params(params).send_json()
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("secrets", &self.secrets)
            .field("auth_state", &self.auth_state())
            .field("config", &self.config)
            .field("cache_enabled", &self.cache_enabled())
            .finish()
    }
}

fn qualify(method: &str) -> String {
    if method.starts_with(METHOD_NAMESPACE) {
        method.to_string()
    } else {
        format!("{}{}", METHOD_NAMESPACE, method)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::testing::{client_with, StubTransport};

    fn assert_send<T: Send>() {}

    #[test]
    fn client_moves_between_threads() {
        assert_send::<Client>();

        let stub = StubTransport::new();
        stub.on_method("vimeo.test.null", json!({"stat": "ok"}));
        let (client, _) = client_with(stub.clone());
        let shared = std::sync::Arc::new(std::sync::Mutex::new(client));
        let worker = {
            let shared = std::sync::Arc::clone(&shared);
            std::thread::spawn(move || {
                let mut client = shared.lock().unwrap();
                client.call("test.null", Vec::<(String, String)>::new()).is_ok()
            })
        };
        assert!(worker.join().unwrap());
        assert_eq!(stub.calls_to("vimeo.test.null"), 1);
    }

    #[test]
    fn method_names_are_qualified() {
        assert_eq!(qualify("videos.getInfo"), "vimeo.videos.getInfo");
        assert_eq!(qualify("vimeo.videos.getInfo"), "vimeo.videos.getInfo");
    }

    #[test]
    fn token_phases() {
        let (mut client, _) = client_with(StubTransport::new());
        assert_eq!(client.auth_state(), AuthState::NoToken);
        assert!(client.token().is_none());

        client.set_request_token(Token::new("req", "reqsecret"));
        assert_eq!(client.auth_state(), AuthState::RequestTokenSet);

        client.set_token(Token::new("acc", "accsecret"));
        assert_eq!(client.auth_state(), AuthState::AccessTokenSet);
        assert_eq!(client.token(), Some(&Token::new("acc", "accsecret")));

        client.clear_token();
        assert_eq!(client.auth_state(), AuthState::NoToken);
    }

    #[test]
    fn constructed_with_token() {
        let client = Client::new(Secrets::new("key", "secret"))
            .with_transport(StubTransport::new())
            .with_token(Token::new("acc", "accsecret"));
        assert_eq!(client.auth_state(), AuthState::AccessTokenSet);
    }

    #[test]
    fn cache_switching_and_clearing() {
        let stub = StubTransport::new();
        stub.on_method("vimeo.people.getInfo", json!({"stat": "ok"}));
        let (mut client, _) = client_with(stub.clone());
        assert!(!client.cache_enabled());

        let tmp = TempDir::new().unwrap();
        client.enable_cache(CacheConfig::file(tmp.path()));
        client.call("people.getInfo", vec![("user_id", "1")]).unwrap();
        client.call("people.getInfo", vec![("user_id", "1")]).unwrap();
        assert_eq!(stub.calls_to("vimeo.people.getInfo"), 1);

        client.clear_cache();
        client.call("people.getInfo", vec![("user_id", "1")]).unwrap();
        assert_eq!(stub.calls_to("vimeo.people.getInfo"), 2);

        client.enable_cache(CacheConfig::memory());
        client.call("people.getInfo", vec![("user_id", "1")]).unwrap();
        assert_eq!(stub.calls_to("vimeo.people.getInfo"), 3);

        client.disable_cache();
        client.call("people.getInfo", vec![("user_id", "1")]).unwrap();
        assert_eq!(stub.calls_to("vimeo.people.getInfo"), 4);
        assert!(client.config().cache.is_none());
    }

    #[test]
    fn cache_from_config() {
        let config = ClientConfig::new().with_cache(CacheConfig::memory());
        let client = Client::with_config(Secrets::new("key", "secret"), config)
            .with_transport(StubTransport::new());
        assert!(client.cache_enabled());
    }
}
