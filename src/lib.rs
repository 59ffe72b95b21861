/*!
vimeo-oauth1: a blocking client for the Vimeo advanced API (REST v2), signed
with OAuth 1.0a.

# Overview

Every call is signed with HMAC-SHA1 using the consumer secret and, once one
is set, the token secret. API methods answer a JSON envelope
(`{"stat": "ok", ...}` or `{"stat": "fail", "err": {...}}`) which the client
unpacks into a [`serde_json::Value`] or an [`Error::Api`].

Successful GET answers can be cached in memory or on disk, see
[`CacheConfig`].

# How to use

## Basic usecase 1 - calling an API method

```rust,no_run
use vimeo_oauth1::{Client, Secrets, Token};

let secrets = Secrets::new("[CONSUMER_KEY]", "[CONSUMER_SECRET]");
let mut client = Client::new(secrets)
    .with_token(Token::new("[ACCESS_TOKEN]", "[TOKEN_SECRET]"));

let info = client.call("videos.getInfo", vec![("video_id", "1234")])?;
println!("{}", info["video"][0]["title"]);
# Ok::<(), vimeo_oauth1::Error>(())
```

## Basic usecase 2 - acquiring an access token

```rust,no_run
use std::io;
use vimeo_oauth1::{Client, Permission, Secrets, OUT_OF_BAND};

let mut client = Client::new(Secrets::new("[CONSUMER_KEY]", "[CONSUMER_SECRET]"));

// step 1: request token, adopted by the client
let url = client.auth(Permission::Write, OUT_OF_BAND)?;
println!("please access to: {}", url);

// step 2: the verifier shown to the user
let mut user_input = String::new();
io::stdin().read_line(&mut user_input)?;

// step 3: exchange, then adopt explicitly
let access = client.get_access_token(user_input.trim())?;
client.set_token(access.token());
# Ok::<(), vimeo_oauth1::Error>(())
```

## Basic usecase 3 - uploading a video

```rust,no_run
use vimeo_oauth1::{Client, ClientConfig, Secrets, Token, UploadMode, UploadOptions};

let config = ClientConfig::new().with_upload_mode(UploadMode::chunked());
let mut client = Client::with_config(Secrets::new("[CONSUMER_KEY]", "[CONSUMER_SECRET]"), config)
    .with_token(Token::new("[ACCESS_TOKEN]", "[TOKEN_SECRET]"));

let outcome = client.upload_file("holiday.mp4", UploadOptions::new())?;
for e in &outcome.integrity_errors {
    eprintln!("{}", e);
}
println!("video id: {}", outcome.video_id);
# Ok::<(), vimeo_oauth1::Error>(())
```
*/
mod auth;
pub mod cache;
mod client;
mod clock;
mod config;
pub mod encode;
mod error;
mod request;
mod secrets;
mod signer;
mod token_reader;
pub mod transport;
mod upload;

#[cfg(test)]
mod testing;

use std::collections::BTreeMap;

// exposed to external program
pub use auth::{Permission, OUT_OF_BAND};
pub use cache::{CacheConfig, CacheKind};
pub use client::Client;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    ClientConfig, UploadMode, API_ACCESS_TOKEN_URL, API_AUTH_URL, API_REQUEST_TOKEN_URL,
    API_REST_URL,
};
pub use error::{
    Error, IntegrityError, Result, TokenReaderError, TokenReaderResult, TransportError,
};
pub use request::{Reply, RequestBuilder, SignedParams};
pub use secrets::{AuthState, Secrets, Token};
pub use signer::{OAuthParameters, Signer};
pub use token_reader::TokenResponse;
pub use upload::{UploadOptions, UploadOutcome};

/// Request parameters, kept sorted by key.
pub type Params = BTreeMap<String, String>;

// exposed constant variables
/// Represents `oauth_callback`.
pub const OAUTH_CALLBACK_KEY: &str = "oauth_callback";
/// Represents `oauth_nonce`.
pub const OAUTH_NONCE_KEY: &str = "oauth_nonce";
/// Represents `oauth_timestamp`.
pub const OAUTH_TIMESTAMP_KEY: &str = "oauth_timestamp";
/// Represents `oauth_verifier`.
pub const OAUTH_VERIFIER_KEY: &str = "oauth_verifier";
/// Represents `oauth_version`.
pub const OAUTH_VERSION_KEY: &str = "oauth_version";

// crate-private constant variables
pub(crate) const OAUTH_KEY_PREFIX: &str = "oauth_";
pub(crate) const OAUTH_SIGNATURE_METHOD_KEY: &str = "oauth_signature_method";
pub(crate) const OAUTH_CONSUMER_KEY: &str = "oauth_consumer_key";
pub(crate) const OAUTH_TOKEN_KEY: &str = "oauth_token";
pub(crate) const OAUTH_SIGNATURE_KEY: &str = "oauth_signature";
