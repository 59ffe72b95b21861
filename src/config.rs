use std::convert::TryFrom;
use std::time::Duration;

use serde::Deserialize;

use crate::cache::CacheConfig;

pub const API_REST_URL: &str = "http://vimeo.com/api/rest/v2";
pub const API_AUTH_URL: &str = "http://vimeo.com/oauth/authorize";
pub const API_ACCESS_TOKEN_URL: &str = "http://vimeo.com/oauth/access_token";
pub const API_REQUEST_TOKEN_URL: &str = "http://vimeo.com/oauth/request_token";

/// Per-request timeout, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Chunk size used by [`UploadMode::Chunked`] when none is given.
pub const DEFAULT_CHUNK_SIZE: u64 = 1024 * 1024;

/// How file data reaches the upload endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadMode {
    /// One PUT carrying the whole file.
    Streaming,
    /// One signed POST per `chunk_size` bytes.
    Chunked {
        #[serde(default = "default_chunk_size")]
        chunk_size: u64,
    },
}

impl Default for UploadMode {
    fn default() -> Self {
        UploadMode::Streaming
    }
}

impl UploadMode {
    pub fn chunked() -> Self {
        UploadMode::Chunked {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub rest_url: String,
    pub authorize_url: String,
    pub access_token_url: String,
    pub request_token_url: String,
    /// Milliseconds. Zero is read as 1.
    pub timeout_ms: u64,
    /// Appended to the User-Agent. The service answers XML instead of JSON
    /// to some generic user agents, so one is always sent.
    pub app_name: String,
    pub upload_mode: UploadMode,
    pub cache: Option<CacheConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            rest_url: API_REST_URL.to_string(),
            authorize_url: API_AUTH_URL.to_string(),
            access_token_url: API_ACCESS_TOKEN_URL.to_string(),
            request_token_url: API_REQUEST_TOKEN_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            app_name: String::new(),
            upload_mode: UploadMode::default(),
            cache: None,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Default::default()
    }

    /// Point every endpoint at another host, keeping the standard paths.
    pub fn with_base_url<T: AsRef<str>>(self, base: T) -> Self {
        let base = base.as_ref().trim_end_matches('/');
        ClientConfig {
            rest_url: format!("{}/api/rest/v2", base),
            authorize_url: format!("{}/oauth/authorize", base),
            access_token_url: format!("{}/oauth/access_token", base),
            request_token_url: format!("{}/oauth/request_token", base),
            ..self
        }
    }

    pub fn with_app_name<T: Into<String>>(self, app_name: T) -> Self {
        ClientConfig {
            app_name: app_name.into(),
            ..self
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        ClientConfig {
            timeout_ms: u64::try_from(timeout.as_millis())
                .unwrap_or(u64::MAX)
                .max(1),
            ..self
        }
    }

    pub fn with_upload_mode(self, upload_mode: UploadMode) -> Self {
        ClientConfig {
            upload_mode,
            ..self
        }
    }

    pub fn with_cache(self, cache: CacheConfig) -> Self {
        ClientConfig {
            cache: Some(cache),
            ..self
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }

    pub fn user_agent(&self) -> String {
        format!(
            "Rust/{} {}",
            env!("CARGO_PKG_NAME"),
            self.app_name
        )
        .trim_end()
        .to_string()
    }
}

fn default_chunk_size() -> u64 {
    DEFAULT_CHUNK_SIZE
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::new();
        assert_eq!(config.rest_url, API_REST_URL);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.upload_mode, UploadMode::Streaming);
        assert_eq!(config.user_agent(), "Rust/vimeo-oauth1");
        assert!(config.cache.is_none());
    }

    #[test]
    fn sub_second_timeout_survives() {
        let config = ClientConfig::new().with_timeout(Duration::from_millis(500));
        assert_eq!(config.timeout(), Duration::from_millis(500));
        let config = ClientConfig::new().with_timeout(Duration::from_micros(10));
        assert_eq!(config.timeout(), Duration::from_millis(1));
        let config: ClientConfig = serde_json::from_str(r#"{"timeout_ms": 0}"#).unwrap();
        assert_eq!(config.timeout(), Duration::from_millis(1));
    }

    #[test]
    fn base_url_rewrites_endpoints() {
        let config = ClientConfig::new()
            .with_base_url("http://localhost:8080/")
            .with_app_name("MyApp");
        assert_eq!(config.rest_url, "http://localhost:8080/api/rest/v2");
        assert_eq!(config.authorize_url, "http://localhost:8080/oauth/authorize");
        assert_eq!(config.access_token_url, "http://localhost:8080/oauth/access_token");
        assert_eq!(config.request_token_url, "http://localhost:8080/oauth/request_token");
        assert_eq!(config.user_agent(), "Rust/vimeo-oauth1 MyApp");
    }

    #[test]
    fn deserialize_partial() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"app_name": "MyApp", "upload_mode": {"chunked": {}}, "cache": {"kind": "memory"}}"#,
        )
        .unwrap();
        assert_eq!(config.app_name, "MyApp");
        assert_eq!(config.upload_mode, UploadMode::chunked());
        assert_eq!(config.cache, Some(CacheConfig::memory()));
        assert_eq!(config.request_token_url, API_REQUEST_TOKEN_URL);
    }
}
