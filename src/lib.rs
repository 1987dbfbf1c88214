/*!
oauth1-handshake: OAuth 1.0a signing and the three-legged handshake.

# Overview

A [`Token`] holds the consumer credentials and the token obtained at each
handshake stage, and signs requests with HMAC-SHA1. A [`Handshake`] drives the
request token -> user authorization -> access token exchange over any
[`HttpClient`]; [`ReqwestHttpClient`] is provided.

# How to use

## Basic usecase 1 - signing an API call

```rust
use oauth1_handshake::{AuthMethod, Method, Token, TokenType};

let token = Token::new("[CONSUMER_KEY]", "[CONSUMER_SECRET]")
    .token("[ACCESS_TOKEN]", "[TOKEN_SECRET]")
    .token_type(TokenType::AccessToken);

let authorization = token.sign(
    "https://api.twitter.com/1.1/statuses/update.json",
    &Method::POST,
    AuthMethod::HttpHeader,
    &[("status", "Hello, Twitter!")],
);
assert!(authorization.starts_with("OAuth oauth_consumer_key="));
```

## Basic usecase 2 - Acquiring OAuth token & secret

```rust,no_run
use oauth1_handshake::{Handshake, ReqwestHttpClient, Token};
use url::Url;

# async fn run() -> oauth1_handshake::Result<()> {
let consumer = Token::new("[CONSUMER_KEY]", "[CONSUMER_SECRET]").callback("oob");
let browser = |url: &Url| println!("please access to: {}", url);
let mut handshake = Handshake::new(ReqwestHttpClient::new(), browser);

// step 1: acquire request token & token secret
let request_token = handshake
    .request_request_token(consumer, "https://api.twitter.com/oauth/request_token")
    .await?
    .into_token();
if !handshake.last_status().is_ok() {
    return Ok(());
}

// step 2. let the user authorize, then read the pin
handshake.request_user_authorization(&request_token, "https://api.twitter.com/oauth/authorize")?;
let pin = "[PIN]";

// step 3. acquire access token
let access_token = handshake
    .request_access_token(
        request_token.verifier(pin),
        "https://api.twitter.com/oauth/access_token",
    )
    .await?
    .into_token();
println!("status: {:?}, token: {}", handshake.last_status(), access_token.token_string());
# Ok(())
# }
```
*/
mod encoding;
mod error;
mod handshake;
mod http_client;
mod response;
mod signer;
mod token;

// exposed to external program
pub use encoding::{decode as percent_decode, encode as percent_encode};
pub use error::{Error, Result};
pub use handshake::{Handshake, HandshakeEvent};
pub use http::Method;
pub use http_client::{
    BrowserOpener, HttpClient, HttpClientConfig, HttpReply, ReqwestHttpClient, SignedRequest,
};
pub use response::{process_reply, HandshakeStatus, TokenResponse, TransportOutcome};
pub use signer::OAuthParameters;
pub use token::{
    AuthMethod, Token, TokenType, DETERMINISTIC_CONSUMER_KEY, DETERMINISTIC_NONCE,
    DETERMINISTIC_TIMESTAMP,
};

/// No extra parameters to sign.
pub const NO_PARAMS: &[(&str, &str)] = &[];

// exposed constant variables
/// Represents `oauth_callback`.
pub const OAUTH_CALLBACK_KEY: &str = "oauth_callback";
/// Represents `oauth_nonce`.
pub const OAUTH_NONCE_KEY: &str = "oauth_nonce";
/// Represents `oauth_timestamp`.
pub const OAUTH_TIMESTAMP_KEY: &str = "oauth_timestamp";
/// Represents `oauth_token`.
pub const OAUTH_TOKEN_KEY: &str = "oauth_token";
/// Represents `oauth_token_secret`.
pub const OAUTH_TOKEN_SECRET_KEY: &str = "oauth_token_secret";
/// Represents `oauth_verifier`.
pub const OAUTH_VERIFIER_KEY: &str = "oauth_verifier";
/// Represents `oauth_version`.
pub const OAUTH_VERSION_KEY: &str = "oauth_version";
/// Represents `realm`.
pub const REALM_KEY: &str = "realm";

// crate-private constant variables
pub(crate) const OAUTH_SIGNATURE_METHOD_KEY: &str = "oauth_signature_method";
pub(crate) const OAUTH_SIGNATURE_KEY: &str = "oauth_signature";
pub(crate) const OAUTH_CONSUMER_KEY: &str = "oauth_consumer_key";
