use std::borrow::Cow;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use http::Method;
use rand::{rngs::OsRng, RngCore};
use sha1::Sha1;
use tracing::{trace, warn};
use url::{form_urlencoded, Url};

use crate::encoding::encode;
use crate::token::{AuthMethod, Token, TokenType, DETERMINISTIC_NONCE, DETERMINISTIC_TIMESTAMP};
use crate::{
    OAUTH_CALLBACK_KEY, OAUTH_CONSUMER_KEY, OAUTH_NONCE_KEY, OAUTH_SIGNATURE_KEY,
    OAUTH_SIGNATURE_METHOD_KEY, OAUTH_TIMESTAMP_KEY, OAUTH_TOKEN_KEY, OAUTH_VERIFIER_KEY,
    OAUTH_VERSION_KEY, REALM_KEY,
};

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";
const HTTP_HEADER_PREFIX: &str = "OAuth ";

/// Optional overrides applied while signing.
///
/// Values set here take precedence over both freshly generated values and the
/// fixed values used for [`DETERMINISTIC_CONSUMER_KEY`](crate::DETERMINISTIC_CONSUMER_KEY).
#[derive(Debug, Clone, Default)]
pub struct OAuthParameters<'a> {
    nonce: Option<Cow<'a, str>>,
    realm: Option<Cow<'a, str>>,
    timestamp: Option<u64>,
}

impl<'a> OAuthParameters<'a> {
    pub fn new() -> Self {
        Default::default()
    }

    /// set the oauth_nonce value
    pub fn nonce<T>(self, nonce: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        OAuthParameters {
            nonce: Some(nonce.into()),
            ..self
        }
    }

    /// set the realm value
    ///
    /// # Note
    /// The realm is appended to the serialized parameters and never takes
    /// part in the signature.
    pub fn realm<T>(self, realm: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        OAuthParameters {
            realm: Some(realm.into()),
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

    fn resolve_timestamp(&self, token: &Token) -> String {
        match self.timestamp {
            Some(timestamp) => timestamp.to_string(),
            None if token.is_deterministic() => DETERMINISTIC_TIMESTAMP.to_string(),
            None => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default()
                .to_string(),
        }
    }

    fn resolve_nonce(&self, token: &Token) -> String {
        match self.nonce {
            Some(ref nonce) => nonce.to_string(),
            None if token.is_deterministic() => DETERMINISTIC_NONCE.to_string(),
            None => OsRng.next_u64().to_string(),
        }
    }
}

/// A request URL split into the pieces the signature needs.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RequestTarget {
    /// Scheme, authority and path; no query or fragment.
    base: String,
    /// The URL as it appears in a SASL response.
    full: String,
    query: Vec<(String, String)>,
}

impl RequestTarget {
    fn parse(request_url: &str) -> Self {
        match Url::parse(request_url) {
            Ok(url) => {
                let query = url
                    .query_pairs()
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect();
                let mut base = url.clone();
                base.set_query(None);
                base.set_fragment(None);
                RequestTarget {
                    base: base.to_string(),
                    full: url.to_string(),
                    query,
                }
            }
            Err(err) => {
                warn!(
                    url = request_url,
                    error = %err,
                    "invalid url, the signed request will probably be rejected"
                );
                let without_fragment = request_url.split('#').next().unwrap_or_default();
                let mut parts = without_fragment.splitn(2, '?');
                let base = parts.next().unwrap_or_default().to_string();
                let query = form_urlencoded::parse(parts.next().unwrap_or_default().as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect();
                RequestTarget {
                    base,
                    full: request_url.to_string(),
                    query,
                }
            }
        }
    }
}

pub(crate) fn sign(
    token: &Token,
    request_url: &str,
    method: &Method,
    auth_method: AuthMethod,
    extra_params: Vec<(String, String)>,
    parameters: &OAuthParameters,
) -> String {
    let target = RequestTarget::parse(request_url);

    // Step 1. oauth_* parameters, in emission order
    let mut oauth_params = vec![
        (OAUTH_CONSUMER_KEY, token.consumer_key().to_string()),
        (OAUTH_SIGNATURE_METHOD_KEY, SIGNATURE_METHOD.to_string()),
        (OAUTH_TIMESTAMP_KEY, parameters.resolve_timestamp(token)),
        (OAUTH_NONCE_KEY, parameters.resolve_nonce(token)),
        (OAUTH_VERSION_KEY, OAUTH_VERSION.to_string()),
    ];
    match token.get_type() {
        TokenType::Invalid => {
            oauth_params.push((OAUTH_CALLBACK_KEY, token.callback_url().to_string()));
        }
        TokenType::RequestToken => {
            oauth_params.push((OAUTH_TOKEN_KEY, token.token_string().to_string()));
            oauth_params.push((OAUTH_VERIFIER_KEY, token.verifier_string().to_string()));
        }
        TokenType::AccessToken => {
            oauth_params.push((OAUTH_TOKEN_KEY, token.token_string().to_string()));
        }
    }

    // Step 2. every signed parameter: oauth_*, url query, extra parameters
    let all_params = oauth_params
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .chain(target.query)
        .chain(extra_params)
        .collect::<Vec<_>>();

    // Step 3. signature
    let base_string = signature_base_string(method, &target.base, &all_params);
    trace!(base_string = %base_string, "oauth signature base string");
    let key = signing_key(token.consumer_secret(), token.token_secret());
    oauth_params.push((OAUTH_SIGNATURE_KEY, hmac_sha1(&key, &base_string)));

    // Step 4. serialize
    let mut serialized = match auth_method {
        AuthMethod::HttpHeader => HTTP_HEADER_PREFIX.to_string(),
        AuthMethod::Sasl => format!("{} {} ", method.as_str(), target.full),
    };
    serialized.push_str(
        &oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", k, encode(v)))
            .collect::<Vec<_>>()
            .join(","),
    );
    if let Some(ref realm) = parameters.realm {
        // OAuth oauth_...,realm="realm"
        serialized.push_str(&format!(",{}=\"{}\"", REALM_KEY, encode(realm)));
    }
    serialized
}

/// `METHOD&encoded-base-url&encoded-sorted-parameters`
fn signature_base_string(method: &Method, base_url: &str, params: &[(String, String)]) -> String {
    let mut pairs = params
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>();
    pairs.sort();
    format!(
        "{}&{}&{}",
        method.as_str(),
        encode(base_url),
        encode(&pairs.join("&"))
    )
}

fn signing_key(consumer_secret: &str, token_secret: &str) -> String {
    format!("{}&{}", encode(consumer_secret), encode(token_secret))
}

fn hmac_sha1(key: &str, message: &str) -> String {
    let mut mac =
        HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}
