use std::fmt;

use http::Method;

use crate::encoding;
use crate::signer::{self, OAuthParameters};

/// Consumer key that switches signing to fixed timestamp and nonce values,
/// so signatures become reproducible.
pub const DETERMINISTIC_CONSUMER_KEY: &str = "test_token";
/// `oauth_timestamp` used with [`DETERMINISTIC_CONSUMER_KEY`] (Feb 13, 2009, 23:31:30 GMT).
pub const DETERMINISTIC_TIMESTAMP: &str = "1234567890";
/// `oauth_nonce` used with [`DETERMINISTIC_CONSUMER_KEY`].
pub const DETERMINISTIC_NONCE: &str = "ABCDEF";

/// Stage of the three-legged handshake a [`Token`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenType {
    /// No token yet; used to ask for a request token.
    #[default]
    Invalid,
    /// Holds a request token awaiting user authorization.
    RequestToken,
    /// Fully authorized; signs ordinary API calls.
    AccessToken,
}

/// Output format of [`Token::sign`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AuthMethod {
    /// Value for the `Authorization:` header, prefixed with `OAuth `.
    #[default]
    HttpHeader,
    /// SASL initial response, prefixed with `<METHOD> <url> `.
    Sasl,
}

/// OAuth 1.0a credentials plus the handshake state they belong to.
///
/// A token is plain data; each handshake stage produces a new value carrying
/// the consumer credentials forward.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Token {
    token_type: TokenType,
    consumer_key: String,
    consumer_secret: String,
    callback_url: String,
    token: String,
    token_secret: String,
    verifier: String,
}

impl Token {
    pub fn new<TKey, TSecret>(consumer_key: TKey, consumer_secret: TSecret) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        Token {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            ..Default::default()
        }
    }

    // ------------------------------------------------------------------------
    // Chained construction

    /// Set the `oauth_callback` sent while requesting a request token.
    pub fn callback<T: Into<String>>(mut self, callback_url: T) -> Self {
        self.set_callback_url(callback_url);
        self
    }

    /// Set the token string and secret received from the provider.
    pub fn token<TKey, TSecret>(mut self, token: TKey, token_secret: TSecret) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        self.token = token.into();
        self.token_secret = token_secret.into();
        self
    }

    /// Set the verifier obtained from the user authorization step.
    pub fn verifier<T: AsRef<str>>(mut self, verifier: T) -> Self {
        self.set_verifier(verifier);
        self
    }

    pub fn token_type(mut self, token_type: TokenType) -> Self {
        self.token_type = token_type;
        self
    }

    // ------------------------------------------------------------------------
    // Setters

    pub fn set_type(&mut self, token_type: TokenType) {
        self.token_type = token_type;
    }

    pub fn set_consumer_key<T: Into<String>>(&mut self, consumer_key: T) {
        self.consumer_key = consumer_key.into();
    }

    pub fn set_consumer_secret<T: Into<String>>(&mut self, consumer_secret: T) {
        self.consumer_secret = consumer_secret.into();
    }

    pub fn set_callback_url<T: Into<String>>(&mut self, callback_url: T) {
        self.callback_url = callback_url.into();
    }

    pub fn set_token_string<T: Into<String>>(&mut self, token: T) {
        self.token = token.into();
    }

    pub fn set_token_secret<T: Into<String>>(&mut self, token_secret: T) {
        self.token_secret = token_secret.into();
    }

    /// Set the verifier. The value is percent-decoded, since it usually comes
    /// straight out of a callback query string.
    pub fn set_verifier<T: AsRef<str>>(&mut self, verifier: T) {
        self.verifier = encoding::decode(verifier.as_ref());
    }

    // ------------------------------------------------------------------------
    // Getters

    pub fn get_type(&self) -> TokenType {
        self.token_type
    }

    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    pub(crate) fn consumer_secret(&self) -> &str {
        &self.consumer_secret
    }

    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    pub fn token_string(&self) -> &str {
        &self.token
    }

    pub fn token_secret(&self) -> &str {
        &self.token_secret
    }

    pub fn verifier_string(&self) -> &str {
        &self.verifier
    }

    pub(crate) fn is_deterministic(&self) -> bool {
        self.consumer_key == DETERMINISTIC_CONSUMER_KEY
    }

    // ------------------------------------------------------------------------
    // Signing

    /// Sign a request and return the serialized OAuth parameters.
    ///
    /// `request_url` may carry its own query; those pairs are signed along
    /// with `extra_params` (form body or additional query parameters). Keys
    /// may repeat. An unparsable URL is logged and signed on a best-effort
    /// basis.
    ///
    /// ```
    /// use oauth1_handshake::{AuthMethod, Method, Token, TokenType, NO_PARAMS};
    ///
    /// let token = Token::new("test_token", "consumersecret")
    ///     .token("tokenstring", "tokensecret")
    ///     .token_type(TokenType::AccessToken);
    /// let header = token.sign(
    ///     "http://example.com/path?param1=123&param2=345",
    ///     &Method::GET,
    ///     AuthMethod::HttpHeader,
    ///     NO_PARAMS,
    /// );
    /// assert!(header.starts_with("OAuth "));
    /// assert!(header.contains(r#"oauth_signature="lT%2F9sWSyfbt%2Fc%2BfoqYAHjtrlHWw%3D""#));
    /// ```
    pub fn sign<K, V>(
        &self,
        request_url: &str,
        method: &Method,
        auth_method: AuthMethod,
        extra_params: &[(K, V)],
    ) -> String
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.sign_with(
            request_url,
            method,
            auth_method,
            extra_params,
            &OAuthParameters::new(),
        )
    }

    /// Same as [`Token::sign`], with explicit nonce/timestamp/realm overrides.
    pub fn sign_with<K, V>(
        &self,
        request_url: &str,
        method: &Method,
        auth_method: AuthMethod,
        extra_params: &[(K, V)],
        parameters: &OAuthParameters,
    ) -> String
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let extra = extra_params
            .iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
            .collect();
        signer::sign(self, request_url, method, auth_method, extra, parameters)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("token_type", &self.token_type)
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"[REDACTED]")
            .field("callback_url", &self.callback_url)
            .field("token", &self.token)
            .field("token_secret", &"[REDACTED]")
            .field("verifier", &self.verifier)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NO_PARAMS;

    fn access_token() -> Token {
        Token::new(DETERMINISTIC_CONSUMER_KEY, "consumersecret")
            .token("tokenstring", "tokensecret")
            .token_type(TokenType::AccessToken)
    }

    #[test]
    fn builder_and_setters() {
        let mut token = Token::new("key", "secret").callback("oob");
        assert_eq!(token.get_type(), TokenType::Invalid);
        assert_eq!(token.consumer_key(), "key");
        assert_eq!(token.callback_url(), "oob");
        assert_eq!(token.token_string(), "");

        token.set_token_string("abc");
        token.set_token_secret("xyz");
        token.set_type(TokenType::RequestToken);
        assert_eq!(token.token_string(), "abc");
        assert_eq!(token.token_secret(), "xyz");
        assert_eq!(token.get_type(), TokenType::RequestToken);
    }

    #[test]
    fn verifier_is_percent_decoded() {
        let token = Token::new("key", "secret").verifier("a%2Fb%3D");
        assert_eq!(token.verifier_string(), "a/b=");
    }

    #[test]
    fn debug_redacts_secrets() {
        let token =
            Token::new("my_key", "consumer_secret_value").token("tok", "token_secret_value");
        let debug_str = format!("{:?}", token);
        assert!(debug_str.contains("my_key"));
        assert!(debug_str.contains("tok"));
        assert!(!debug_str.contains("consumer_secret_value"));
        assert!(!debug_str.contains("token_secret_value"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn deterministic_signing_is_reproducible() {
        let token = access_token();
        let url = "http://example.com/path?param1=123&param2=345";
        let first = token.sign(url, &Method::GET, AuthMethod::HttpHeader, NO_PARAMS);
        let second = token.sign(url, &Method::GET, AuthMethod::HttpHeader, NO_PARAMS);
        assert_eq!(first, second);
        assert!(first.contains(r#"oauth_timestamp="1234567890""#));
        assert!(first.contains(r#"oauth_nonce="ABCDEF""#));
    }

    #[test]
    fn fresh_nonce_per_call() {
        let token = Token::new("key", "secret")
            .token("tokenstring", "tokensecret")
            .token_type(TokenType::AccessToken);
        let url = "http://example.com/path";
        let first = token.sign(url, &Method::GET, AuthMethod::HttpHeader, NO_PARAMS);
        let second = token.sign(url, &Method::GET, AuthMethod::HttpHeader, NO_PARAMS);
        assert_ne!(first, second);
    }

    #[test]
    fn concurrent_signing_on_shared_token() {
        let token = &access_token();
        let url = "http://example.com/path?param1=123&param2=345";
        let expected = token.sign(url, &Method::GET, AuthMethod::HttpHeader, NO_PARAMS);
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(move || {
                        token.sign(url, &Method::GET, AuthMethod::HttpHeader, NO_PARAMS)
                    })
                })
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }
}
