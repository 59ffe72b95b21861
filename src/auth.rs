//! Three-legged OAuth 1.0a authorization.
//!
//! ```text
//! NoToken --auth()--> RequestTokenSet --(user approves)--> get_access_token()
//!         --set_token()--> AccessTokenSet
//! ```
//!
//! The access token returned by [`Client::get_access_token`] is never adopted
//! implicitly; the caller stores it and hands it to [`Client::set_token`].

use http::Method;
use url::Url;

use crate::encode::encode;
use crate::token_reader::read_oauth_token;
use crate::{Client, Error, Result, TokenResponse, OAUTH_CALLBACK_KEY, OAUTH_TOKEN_KEY,
    OAUTH_VERIFIER_KEY};

/// Callback for clients that cannot receive a redirect.
pub const OUT_OF_BAND: &str = "oob";

const PERMISSION_KEY: &str = "permission";

/// Access level requested from the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Read,
    Write,
    Delete,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::Read => "read",
            Permission::Write => "write",
            Permission::Delete => "delete",
        }
    }
}

impl Default for Permission {
    fn default() -> Self {
        Permission::Read
    }
}

impl Client {
    /// Fetch a request token. Use [`OUT_OF_BAND`] when there is no callback.
    ///
    /// The oauth parameters travel in the query string and the call is never
    /// cached.
    pub fn get_request_token(&mut self, callback_url: &str) -> Result<TokenResponse> {
        let url = self.config().request_token_url.clone();
        tracing::debug!("requesting oauth request token");
        let body = self
            .request(Method::GET, url)
            .param(OAUTH_CALLBACK_KEY, callback_url)
            .cache(false)
            .auth_header(false)
            .send_text()?;
        Ok(read_oauth_token(&body)?)
    }

    /// URL of the page where the user approves `token`. No network involved.
    pub fn get_authorize_url(&self, token: &str, permission: Permission) -> String {
        match Url::parse(&self.config().authorize_url) {
            Ok(mut url) => {
                url.query_pairs_mut()
                    .append_pair(OAUTH_TOKEN_KEY, token)
                    .append_pair(PERMISSION_KEY, permission.as_str());
                url.into()
            }
            // relative or otherwise unparsable base
            Err(_) => format!(
                "{}?{}={}&{}={}",
                self.config().authorize_url,
                OAUTH_TOKEN_KEY,
                encode(token),
                PERMISSION_KEY,
                permission.as_str()
            ),
        }
    }

    /// Obtain a request token, adopt it, and return the URL the user has to
    /// visit to approve this application.
    pub fn auth(&mut self, permission: Permission, callback_url: &str) -> Result<String> {
        let response = self.get_request_token(callback_url)?;
        if !response.callback_confirmed() {
            tracing::debug!("callback not confirmed by the service");
        }
        let token = response.token();
        let url = self.get_authorize_url(&token.token, permission);
        self.set_request_token(token);
        Ok(url)
    }

    /// Exchange the active request token and the user's verifier for an
    /// access token.
    ///
    /// # Errors
    ///
    /// [`Error::NoToken`] when no request token is active.
    pub fn get_access_token(&mut self, verifier: &str) -> Result<TokenResponse> {
        if self.token().is_none() {
            return Err(Error::NoToken);
        }
        let url = self.config().access_token_url.clone();
        tracing::debug!("exchanging request token for access token");
        let body = self
            .request(Method::GET, url)
            .param(OAUTH_VERIFIER_KEY, verifier)
            .cache(false)
            .auth_header(true)
            .send_text()?;
        Ok(read_oauth_token(&body)?)
    }
}
