use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use http::Method;
use sha1::Sha1;
use uuid::Uuid;

use crate::encode::{encode, encode_params};
use crate::{
    Params, OAUTH_CONSUMER_KEY, OAUTH_NONCE_KEY, OAUTH_SIGNATURE_METHOD_KEY, OAUTH_TIMESTAMP_KEY,
    OAUTH_TOKEN_KEY, OAUTH_VERSION_KEY,
};

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";

/// HMAC-SHA1 signer bound to one consumer secret and an optional token secret.
///
/// Signing is pure: the same inputs always give the same signature, no
/// matter in which order the parameters were inserted.
#[derive(Debug, Clone, Copy)]
pub struct Signer<'a> {
    consumer_secret: &'a str,
    token_secret: Option<&'a str>,
}

impl<'a> Signer<'a> {
    pub fn new(consumer_secret: &'a str, token_secret: Option<&'a str>) -> Self {
        Signer {
            consumer_secret,
            token_secret,
        }
    }

    /// `encode(consumer_secret)&encode(token_secret)`, with an empty token
    /// secret when no token is set.
    pub fn signing_key(&self) -> String {
        format!(
            "{}&{}",
            encode(self.consumer_secret),
            encode(self.token_secret.unwrap_or_default())
        )
    }

    /// Compute `oauth_signature` over `params` for a request to `url`.
    ///
    /// `params` must hold the whole union of oauth_* and API parameters,
    /// without `oauth_signature` itself.
    pub fn generate_signature(&self, method: &Method, url: &str, params: &Params) -> String {
        let base_string = base_string(method, url, params);
        let mut mac = Hmac::<Sha1>::new_from_slice(self.signing_key().as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(base_string.as_bytes());
        STANDARD.encode(mac.finalize().into_bytes())
    }
}

/// Build the signature base string: `METHOD&encode(url)&encode(query)`.
///
/// `Params` is ordered by key bytes, so the normalized query is identical
/// for equal parameter sets.
pub fn base_string(method: &Method, url: &str, params: &Params) -> String {
    let query = encode_params(params)
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    format!(
        "{}&{}&{}",
        method.as_str().to_uppercase(),
        encode(url),
        encode(&query)
    )
}

/// Fresh per-request nonce: a random 128-bit id rendered as hex.
pub fn generate_nonce() -> String {
    Uuid::new_v4().simple().to_string()
}

/// The protocol-level `oauth_*` parameters of one request.
///
/// Nonce and timestamp are generated per request unless pinned here.
#[derive(Debug, Clone)]
pub struct OAuthParameters {
    nonce: Option<String>,
    timestamp: Option<u64>,
    version: bool,
}

impl Default for OAuthParameters {
    fn default() -> Self {
        OAuthParameters::new()
    }
}

impl OAuthParameters {
    pub fn new() -> Self {
        OAuthParameters {
            nonce: None,
            timestamp: None,
            version: true,
        }
    }

    /// set the oauth_nonce value
    pub fn nonce<T>(self, nonce: T) -> Self
    where
        T: Into<String>,
    {
        OAuthParameters {
            nonce: Some(nonce.into()),
            ..self
        }
    }

    /// set the oauth_timestamp value
    pub fn timestamp<T>(self, timestamp: T) -> Self
    where
        T: Into<u64>,
    {
        OAuthParameters {
            timestamp: Some(timestamp.into()),
            ..self
        }
    }

    /// set the oauth_version value (boolean)
    ///
    /// # Note
    /// When the version has value `true` (the default), oauth_version will be
    /// set with "1.0". Otherwise, oauth_version will not be included.
    pub fn version<T>(self, version: T) -> Self
    where
        T: Into<bool>,
    {
        OAuthParameters {
            version: version.into(),
            ..self
        }
    }

    /// Materialize the oauth_* set for one request.
    pub fn build(&self, consumer_key: &str, token: Option<&str>, now: u64) -> Params {
        let mut params = Params::new();
        params.insert(OAUTH_CONSUMER_KEY.to_string(), consumer_key.to_string());
        if self.version {
            params.insert(OAUTH_VERSION_KEY.to_string(), OAUTH_VERSION.to_string());
        }
        params.insert(
            OAUTH_SIGNATURE_METHOD_KEY.to_string(),
            SIGNATURE_METHOD.to_string(),
        );
        params.insert(
            OAUTH_TIMESTAMP_KEY.to_string(),
            self.timestamp.unwrap_or(now).to_string(),
        );
        params.insert(
            OAUTH_NONCE_KEY.to_string(),
            self.nonce.clone().unwrap_or_else(generate_nonce),
        );
        if let Some(token) = token {
            params.insert(OAUTH_TOKEN_KEY.to_string(), token.to_string());
        }
        params
    }
}
