use std::time::Duration;

use async_trait::async_trait;
use http::{header::AUTHORIZATION, Method};
use reqwest::{Client as ReqwestClient, RequestBuilder as ReqwestRequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::{AuthMethod, Result, Token, TransportOutcome};

/// A request ready to be sent: target plus `Authorization` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub method: Method,
    pub url: Url,
    pub authorization: String,
}

/// What the transport reports back for a [`SignedRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub outcome: TransportOutcome,
    pub body: String,
}

impl HttpReply {
    pub fn new<T: Into<String>>(outcome: TransportOutcome, body: T) -> Self {
        HttpReply {
            outcome,
            body: body.into(),
        }
    }

    /// A reply without a body.
    pub fn failed(outcome: TransportOutcome) -> Self {
        HttpReply::new(outcome, String::new())
    }
}

/// Sends handshake requests. Failures are reported in the reply, never retried.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, request: SignedRequest) -> HttpReply;
}

/// Opens the user authorization page. Fire and forget.
pub trait BrowserOpener {
    fn open(&self, url: &Url);
}

impl<F> BrowserOpener for F
where
    F: Fn(&Url),
{
    fn open(&self, url: &Url) {
        self(url)
    }
}

/// Settings for [`ReqwestHttpClient`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// Skip TLS certificate validation. Off unless explicitly enabled.
    pub accept_invalid_certs: bool,
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

/// [`HttpClient`] backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestHttpClient {
    inner: ReqwestClient,
}

impl From<ReqwestClient> for ReqwestHttpClient {
    fn from(client: ReqwestClient) -> Self {
        ReqwestHttpClient { inner: client }
    }
}

impl ReqwestHttpClient {
    /// Constructs a new `ReqwestHttpClient` with default settings.
    pub fn new() -> Self {
        Default::default()
    }

    /// Constructs a new `ReqwestHttpClient` from a [`HttpClientConfig`].
    ///
    /// # Errors
    ///
    /// This method fails if the TLS backend cannot be initialized.
    pub fn with_config(config: &HttpClientConfig) -> Result<Self> {
        let mut builder = ReqwestClient::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(ref user_agent) = config.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        if config.accept_invalid_certs {
            warn!("TLS certificate validation is disabled for the OAuth handshake client");
            builder = accept_invalid_certs(builder);
        }
        Ok(ReqwestHttpClient {
            inner: builder.build()?,
        })
    }

    /// Build a request signed with `token`, e.g. an API call made with an
    /// access token. `form` is sent as an urlencoded body and signed along
    /// with the URL query.
    pub fn signed_request<K, V>(
        &self,
        token: &Token,
        method: Method,
        url: Url,
        form: &[(K, V)],
    ) -> ReqwestRequestBuilder
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let authorization = token.sign(url.as_str(), &method, AuthMethod::HttpHeader, form);
        let builder = self
            .inner
            .request(method, url)
            .header(AUTHORIZATION, authorization);
        if form.is_empty() {
            builder
        } else {
            let pairs = form
                .iter()
                .map(|(k, v)| (k.as_ref(), v.as_ref()))
                .collect::<Vec<_>>();
            builder.form(&pairs)
        }
    }
}

#[cfg(any(feature = "native-tls", feature = "rustls-tls"))]
fn accept_invalid_certs(builder: reqwest::ClientBuilder) -> reqwest::ClientBuilder {
    builder.danger_accept_invalid_certs(true)
}

#[cfg(not(any(feature = "native-tls", feature = "rustls-tls")))]
fn accept_invalid_certs(builder: reqwest::ClientBuilder) -> reqwest::ClientBuilder {
    warn!("no TLS backend enabled, accept_invalid_certs has no effect");
    builder
}

impl From<&reqwest::Error> for TransportOutcome {
    fn from(err: &reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            TransportOutcome::from_status(status)
        } else if err.is_timeout() {
            TransportOutcome::TimedOut
        } else if err.is_connect() {
            TransportOutcome::ConnectionFailed
        } else if err.is_decode() || err.is_body() {
            TransportOutcome::ProtocolFailure
        } else {
            TransportOutcome::Other
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: SignedRequest) -> HttpReply {
        debug!(method = %request.method, url = %request.url, "dispatching oauth request");
        let sent = self
            .inner
            .request(request.method, request.url)
            .header(AUTHORIZATION, request.authorization)
            .send()
            .await;
        let response = match sent {
            Ok(response) => response,
            Err(err) => {
                debug!(error = %err, "oauth request failed");
                return HttpReply::failed(TransportOutcome::from(&err));
            }
        };
        let outcome = TransportOutcome::from_status(response.status());
        match response.text().await {
            Ok(body) => HttpReply::new(outcome, body),
            Err(err) => {
                debug!(error = %err, "oauth response body could not be read");
                HttpReply::failed(TransportOutcome::from(&err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TokenType;

    fn access_token() -> Token {
        Token::new("test_token", "consumersecret")
            .token("tokenstring", "tokensecret")
            .token_type(TokenType::AccessToken)
    }

    #[test]
    fn config_defaults_are_strict() {
        let config: HttpClientConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, HttpClientConfig::default());
        assert!(!config.accept_invalid_certs);

        let config: HttpClientConfig =
            serde_json::from_str(r#"{"accept_invalid_certs":true,"timeout_secs":30}"#).unwrap();
        assert!(config.accept_invalid_certs);
        assert_eq!(config.timeout_secs, Some(30));
        assert_eq!(config.user_agent, None);
    }

    #[test]
    fn client_from_config() {
        let config = HttpClientConfig {
            accept_invalid_certs: true,
            timeout_secs: Some(5),
            user_agent: Some("oauth1-handshake-test".to_string()),
        };
        assert!(ReqwestHttpClient::with_config(&config).is_ok());
    }

    #[test]
    fn closure_as_browser() {
        let opened = std::cell::RefCell::new(Vec::new());
        let browser = |url: &Url| opened.borrow_mut().push(url.to_string());
        browser.open(&Url::parse("https://example.com/authorize").unwrap());
        assert_eq!(*opened.borrow(), vec!["https://example.com/authorize"]);
    }

    #[test]
    fn signed_request_get_query() {
        let client = ReqwestHttpClient::new();
        let url = Url::parse("http://example.com/path?param1=123&param2=345").unwrap();
        let req = client
            .signed_request(&access_token(), Method::GET, url, &[] as &[(&str, &str)])
            .build()
            .unwrap();
        let header = req.headers().get(AUTHORIZATION).unwrap().to_str().unwrap();
        assert!(header.contains(r#"oauth_signature="lT%2F9sWSyfbt%2Fc%2BfoqYAHjtrlHWw%3D""#));
        assert!(req.body().is_none());
    }

    #[test]
    fn signed_request_post_form() {
        let client = ReqwestHttpClient::new();
        let url = Url::parse("http://example.com/path").unwrap();
        let req = client
            .signed_request(
                &access_token(),
                Method::POST,
                url,
                &[("param1", "123"), ("param2", "345")],
            )
            .build()
            .unwrap();
        let header = req.headers().get(AUTHORIZATION).unwrap().to_str().unwrap();
        assert!(header.contains(r#"oauth_signature="KgEjaHO%2Bs%2FNPQ7HMlVp7AdBYRUw%3D""#));
        let body = req.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, b"param1=123&param2=345");
    }
}
