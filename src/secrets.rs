use std::fmt;

/// Consumer key and secret identifying the calling application.
#[derive(Clone)]
pub struct Secrets {
    consumer_key: String,
    consumer_secret: String,
}

impl Secrets {
    pub fn new<TKey, TSecret>(consumer_key: TKey, consumer_secret: TSecret) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        Secrets {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    pub fn consumer_secret(&self) -> &str {
        &self.consumer_secret
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .finish()
    }
}

/// An OAuth token and its secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub token: String,
    pub secret: String,
}

impl Token {
    pub fn new<TKey, TSecret>(token: TKey, secret: TSecret) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        Token {
            token: token.into(),
            secret: secret.into(),
        }
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("token", &self.token)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Where a client stands in the three-legged authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    NoToken,
    /// A request token is active; only the access token exchange is valid.
    RequestTokenSet,
    AccessTokenSet,
}

/// The token a client currently signs with, tagged by lifecycle phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ActiveToken {
    Request(Token),
    Access(Token),
}

impl ActiveToken {
    pub(crate) fn token(&self) -> &Token {
        match self {
            ActiveToken::Request(t) | ActiveToken::Access(t) => t,
        }
    }

    pub(crate) fn state(&self) -> AuthState {
        match self {
            ActiveToken::Request(_) => AuthState::RequestTokenSet,
            ActiveToken::Access(_) => AuthState::AccessTokenSet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static CONSUMER_KEY: &str = "<CONSUMER_KEY>";
    static CONSUMER_SECRET: &str = "<CONSUMER_SECRET>";
    static TOKEN: &str = "<ACCESS_TOKEN>";
    static TOKEN_SECRET: &str = "<TOKEN_SECRET>";

    #[test]
    fn debug_hides_secrets() {
        let secrets = Secrets::new(CONSUMER_KEY, CONSUMER_SECRET);
        let printed = format!("{:?}", secrets);
        assert!(printed.contains(CONSUMER_KEY));
        assert!(!printed.contains(CONSUMER_SECRET));

        let token = Token::new(TOKEN, TOKEN_SECRET);
        let printed = format!("{:?}", token);
        assert!(printed.contains(TOKEN));
        assert!(!printed.contains(TOKEN_SECRET));
    }

    #[test]
    fn active_token_phase() {
        let token = Token::new(TOKEN, TOKEN_SECRET);
        assert_eq!(
            ActiveToken::Request(token.clone()).state(),
            AuthState::RequestTokenSet
        );
        let access = ActiveToken::Access(token.clone());
        assert_eq!(access.state(), AuthState::AccessTokenSet);
        assert_eq!(access.token(), &token);
    }
}
