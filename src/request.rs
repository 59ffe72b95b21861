use http::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use http::Method;
use serde_json::Value;

use crate::cache::CacheKey;
use crate::encode::encode;
use crate::transport::{HttpRequest, HttpResponse};
use crate::{
    Client, Error, OAuthParameters, Params, Result, Signer, TransportError, OAUTH_KEY_PREFIX,
    OAUTH_SIGNATURE_KEY,
};

const FORMAT_KEY: &str = "format";
const METHOD_KEY: &str = "method";
const STAT_OK: &str = "ok";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// What a call produced: a decoded envelope for API methods, or the raw
/// body for the oauth endpoints.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Json(Value),
    Text(String),
}

impl Reply {
    pub fn into_json(self) -> Result<Value> {
        match self {
            Reply::Json(value) => Ok(value),
            Reply::Text(text) => Ok(serde_json::from_str(&text)?),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Reply::Json(value) => value.to_string(),
            Reply::Text(text) => text,
        }
    }
}

/// A signed parameter set, split the way it goes on the wire.
#[derive(Debug, Clone)]
pub struct SignedParams {
    /// oauth_* parameters, `oauth_signature` included.
    pub oauth: Params,
    /// `format`, `method` and the call's own arguments.
    pub api: Params,
}

impl SignedParams {
    /// Union of both groups.
    pub fn all(&self) -> Params {
        let mut all = self.oauth.clone();
        all.extend(self.api.clone());
        all
    }

    /// `OAuth realm="",k1="v1",...` with every key and value encoded.
    pub fn authorization_header(&self) -> String {
        let mut header = String::from("OAuth realm=\"\"");
        for (k, v) in &self.oauth {
            header.push_str(&format!(",{}=\"{}\"", encode(k), encode(v)));
        }
        header
    }
}

/// Builds and sends one signed API call.
///
/// Obtained from [`Client::request`] or [`Client::method`].
pub struct RequestBuilder<'c> {
    client: &'c mut Client,
    verb: Method,
    url: String,
    method: Option<String>,
    params: Vec<(String, Option<String>)>,
    cache: bool,
    auth_header: bool,
    oauth: OAuthParameters,
    payload: Option<(String, Vec<u8>)>,
}

impl<'c> RequestBuilder<'c> {
    pub(crate) fn new(client: &'c mut Client, verb: Method, url: String) -> Self {
        RequestBuilder {
            client,
            verb,
            url,
            method: None,
            params: Vec::new(),
            cache: true,
            auth_header: true,
            oauth: OAuthParameters::new(),
            payload: None,
        }
    }

    /// Name the RPC method to dispatch. Without one, the call targets an
    /// oauth endpoint directly and the raw body is returned.
    pub fn api_method<T: Into<String>>(mut self, method: T) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Add a call argument. Keys starting with `oauth_` are merged into the
    /// oauth parameters instead (e.g. `oauth_callback`, `oauth_verifier`).
    pub fn param<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.params.push((key.into(), Some(value.into())));
        self
    }

    /// Add an argument that is dropped when `None`.
    pub fn optional_param<K, V>(mut self, key: K, value: Option<V>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.params.push((key.into(), value.map(Into::into)));
        self
    }

    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params.extend(
            params
                .into_iter()
                .map(|(k, v)| (k.into(), Some(v.into()))),
        );
        self
    }

    pub fn verb(mut self, verb: Method) -> Self {
        self.verb = verb;
        self
    }

    pub fn url<T: Into<String>>(mut self, url: T) -> Self {
        self.url = url.into();
        self
    }

    /// Allow answering from, and storing into, the response cache.
    pub fn cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Send the oauth parameters in the Authorization header (the default)
    /// rather than next to the API parameters.
    pub fn auth_header(mut self, auth_header: bool) -> Self {
        self.auth_header = auth_header;
        self
    }

    /// Pin nonce/timestamp or drop oauth_version.
    pub fn oauth_parameters(mut self, oauth: OAuthParameters) -> Self {
        self.oauth = oauth;
        self
    }

    /// Send `body` as the request body. The parameters then travel in the
    /// query string whatever the verb.
    pub fn payload<T: Into<String>>(mut self, content_type: T, body: Vec<u8>) -> Self {
        self.payload = Some((content_type.into(), body));
        self
    }

    /// Build and sign the parameter set.
    pub fn sign(&self) -> SignedParams {
        let token = self.client.token();
        let mut oauth = self.oauth.build(
            self.client.secrets().consumer_key(),
            token.map(|t| t.token.as_str()),
            self.client.clock().unix_timestamp(),
        );

        let mut api = Params::new();
        api.insert(FORMAT_KEY.to_string(), "json".to_string());
        if let Some(ref method) = self.method {
            api.insert(METHOD_KEY.to_string(), method.clone());
        }
        for (key, value) in &self.params {
            let value = match value {
                Some(v) => v.clone(),
                None => continue,
            };
            if key.starts_with(OAUTH_KEY_PREFIX) {
                oauth.insert(key.clone(), value);
            } else {
                api.insert(key.clone(), value);
            }
        }

        let mut union = oauth.clone();
        union.extend(api.clone());
        let signer = Signer::new(
            self.client.secrets().consumer_secret(),
            token.map(|t| t.secret.as_str()),
        );
        let signature = signer.generate_signature(&self.verb, &self.url, &union);
        oauth.insert(OAUTH_SIGNATURE_KEY.to_string(), signature);

        SignedParams { oauth, api }
    }

    /// Turn signed parameters into the wire request.
    ///
    /// # Errors
    ///
    /// [`TransportError::Encode`] when the parameters cannot be url-encoded.
    pub fn to_http(&self, signed: &SignedParams) -> Result<HttpRequest> {
        let transmitted = if self.auth_header {
            signed.api.clone()
        } else {
            signed.all()
        };
        let encoded = serde_urlencoded::to_string(&transmitted).map_err(TransportError::from)?;

        let separator = if self.url.contains('?') { '&' } else { '?' };
        let with_query = format!("{}{}{}", self.url, separator, encoded);

        let mut request = if let Some((ref content_type, ref body)) = self.payload {
            HttpRequest::new(self.verb.clone(), with_query)
                .header(CONTENT_TYPE, content_type.as_str())
                .body(body.clone())
        } else if self.verb == Method::GET {
            HttpRequest::new(self.verb.clone(), with_query)
        } else {
            HttpRequest::new(self.verb.clone(), self.url.clone())
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(encoded)
        };
        request = request
            .header(USER_AGENT, self.client.config().user_agent())
            .timeout(self.client.config().timeout());
        if self.auth_header {
            request = request.header(AUTHORIZATION, signed.authorization_header());
        }
        Ok(request)
    }

    /// Sign, consult the cache, dispatch and decode.
    ///
    /// # Errors
    ///
    /// [`Error::Api`] when the service answers with a non-`ok` status,
    /// [`Error::Transport`] on network failures and on HTTP errors without
    /// an error envelope.
    pub fn send(self) -> Result<Reply> {
        let signed = self.sign();
        let use_cache = self.cache && self.method.is_some() && self.client.cache_enabled();
        let cache_key = CacheKey::from_params(&signed.all());

        if use_cache {
            let now = self.client.clock().now();
            if let Some(cached) = self.client.cache_get(&cache_key, now) {
                tracing::debug!(method = ?self.method, "response served from cache");
                return Ok(Reply::Json(cached));
            }
        }

        let request = self.to_http(&signed)?;
        tracing::debug!(
            verb = %request.method,
            url = %self.url,
            method = ?self.method,
            "dispatching request"
        );
        let response = self.client.transport().send(request)?;

        let method = match self.method {
            Some(method) => method,
            None => {
                if !response.is_success() {
                    return Err(status_error(&response).into());
                }
                return Ok(Reply::Text(response.text()));
            }
        };

        let decoded: Value = match serde_json::from_slice(&response.body) {
            Ok(decoded) => decoded,
            Err(_) if !response.is_success() => return Err(status_error(&response).into()),
            Err(e) => return Err(e.into()),
        };

        if decoded.get("stat").and_then(Value::as_str) == Some(STAT_OK) {
            if use_cache {
                let now = self.client.clock().now();
                self.client.cache_put(&cache_key, &decoded, now);
            }
            return Ok(Reply::Json(decoded));
        }

        match decoded.get("err") {
            Some(err) => Err(Error::Api {
                method,
                code: err.get("code").map(text_of).unwrap_or_default(),
                msg: err.get("msg").map(text_of).unwrap_or_default(),
            }),
            None if !response.is_success() => Err(status_error(&response).into()),
            None => Err(Error::MalformedResponse {
                method,
                field: "stat",
            }),
        }
    }

    /// [`send`](Self::send), expecting a JSON envelope.
    pub fn send_json(self) -> Result<Value> {
        self.send()?.into_json()
    }

    /// [`send`](Self::send), expecting a raw body.
    pub fn send_text(self) -> Result<String> {
        Ok(self.send()?.into_text())
    }
}

fn status_error(response: &HttpResponse) -> TransportError {
    TransportError::Status {
        status: response.status,
        body: response.text(),
    }
}

/// Codes, ids and sizes come back as JSON strings or numbers.
pub(crate) fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
