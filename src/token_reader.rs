use std::collections::HashMap;
use std::str::FromStr;

use serde::Deserialize;

use crate::{Token, TokenReaderError, TokenReaderResult, OAUTH_TOKEN_KEY};

const OAUTH_TOKEN_SECRET_KEY: &str = "oauth_token_secret";

const OAUTH_CALLBACK_CONFIRMED_KEY: &str = "oauth_callback_confirmed";

/// Represents response of token acquisition.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    /// OAuth Token
    pub oauth_token: String,
    /// OAuth Token Secret
    pub oauth_token_secret: String,
    /// Other contents
    #[serde(flatten)]
    pub remain: HashMap<String, String>,
}

impl TokenResponse {
    /// The token pair, ready for `Client::set_token`.
    pub fn token(&self) -> Token {
        Token::new(self.oauth_token.clone(), self.oauth_token_secret.clone())
    }

    /// Whether the service acknowledged the callback of a request token.
    pub fn callback_confirmed(&self) -> bool {
        self.remain
            .get(OAUTH_CALLBACK_CONFIRMED_KEY)
            .map_or(false, |v| v == "true")
    }
}

impl FromStr for TokenResponse {
    type Err = TokenReaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        read_oauth_token(s)
    }
}

/// Parse a `oauth_token=...&oauth_token_secret=...` body.
pub(crate) fn read_oauth_token(text: &str) -> TokenReaderResult<TokenResponse> {
    let mut destructured = url::form_urlencoded::parse(text.trim().as_bytes())
        .into_owned()
        .collect::<HashMap<String, String>>();
    let oauth_token = destructured.remove(OAUTH_TOKEN_KEY);
    let oauth_token_secret = destructured.remove(OAUTH_TOKEN_SECRET_KEY);
    match (oauth_token, oauth_token_secret) {
        (Some(t), Some(s)) => Ok(TokenResponse {
            oauth_token: t,
            oauth_token_secret: s,
            remain: destructured,
        }),
        (None, _) => Err(TokenReaderError::TokenKeyNotFound(
            OAUTH_TOKEN_KEY,
            text.to_string(),
        )),
        (_, _) => Err(TokenReaderError::TokenKeyNotFound(
            OAUTH_TOKEN_SECRET_KEY,
            text.to_string(),
        )),
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn parse_response_typical() {
        let resp_str_sample = "oauth_token=Z6eEdO8MOmk394WozF5oKyuAv855l4Mlqo7hhlSLik&oauth_token_secret=Kd75W4OQfb2oJTV0vzGzeXftVAwgMnEK9MumzYcM&oauth_callback_confirmed=true";
        for parsed in &[
            read_oauth_token(resp_str_sample).unwrap(),
            serde_urlencoded::from_str::<TokenResponse>(resp_str_sample).unwrap(),
        ] {
            assert_eq!(
                parsed.oauth_token,
                "Z6eEdO8MOmk394WozF5oKyuAv855l4Mlqo7hhlSLik"
            );
            assert_eq!(
                parsed.oauth_token_secret,
                "Kd75W4OQfb2oJTV0vzGzeXftVAwgMnEK9MumzYcM"
            );
            assert_eq!(parsed.remain.len(), 1);
            assert!(parsed.callback_confirmed());
        }
    }

    #[test]
    fn parse_response_edge() {
        let resp_str_sample = "oauth_token==&oauth_token_secret=&keyonly=&keyonly2&=&&";
        let parsed = read_oauth_token(resp_str_sample).unwrap();
        assert_eq!(parsed.oauth_token, "=");
        assert_eq!(parsed.oauth_token_secret, "");
        assert_eq!(parsed.remain.len(), 3);
        assert_eq!(parsed.remain.get("keyonly").unwrap(), "");
        assert_eq!(parsed.remain.get("keyonly2").unwrap(), "");
        assert_eq!(parsed.remain.get("").unwrap(), "");
        assert!(!parsed.callback_confirmed());
    }

    #[test]
    fn parse_decodes_values() {
        let parsed: TokenResponse = "oauth_token=a%2Fb&oauth_token_secret=c+d\n"
            .parse()
            .unwrap();
        assert_eq!(parsed.token(), Token::new("a/b", "c d"));
    }

    #[test]
    fn parse_minimal() {
        let parsed = read_oauth_token("oauth_token&oauth_token_secret").unwrap();
        assert_eq!(parsed.oauth_token, "");
        assert_eq!(parsed.oauth_token_secret, "");
        assert_eq!(parsed.remain.len(), 0);
    }

    #[test]
    fn parse_token_notfound() {
        let resp_str_sample = "oauth_token_secret=";
        match read_oauth_token(resp_str_sample) {
            Err(TokenReaderError::TokenKeyNotFound(key, resp_str)) => {
                assert_eq!(key, OAUTH_TOKEN_KEY);
                assert_eq!(resp_str, resp_str_sample)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parse_token_secret_notfound() {
        let resp_str_sample = "oauth_token=";
        match read_oauth_token(resp_str_sample) {
            Err(TokenReaderError::TokenKeyNotFound(key, resp_str)) => {
                assert_eq!(key, OAUTH_TOKEN_SECRET_KEY);
                assert_eq!(resp_str, resp_str_sample)
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
