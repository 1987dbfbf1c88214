use std::collections::HashMap;

use http::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::encoding;
use crate::token::{Token, TokenType};
use crate::{OAUTH_TOKEN_KEY, OAUTH_TOKEN_SECRET_KEY};

/// Represents response of token acquisition.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenResponse {
    /// OAuth Token
    #[serde(default)]
    pub oauth_token: String,
    /// OAuth Token Secret
    #[serde(default)]
    pub oauth_token_secret: String,
    /// Other contents
    #[serde(flatten)]
    pub remain: HashMap<String, String>,
}

impl TokenResponse {
    /// Parse a `key1=value1&key2=value2` body. Empty segments and segments
    /// without `=` are skipped, values are percent-decoded, and missing token
    /// fields are left empty.
    pub fn parse(body: &str) -> Self {
        let mut destructured = body
            .split('&')
            .filter(|segment| !segment.is_empty())
            .filter_map(|segment| {
                let mut iter = segment.splitn(2, '=');
                match (iter.next(), iter.next()) {
                    (Some(key), Some(value)) => Some((key.to_string(), encoding::decode(value))),
                    _ => None,
                }
            })
            .collect::<HashMap<String, String>>();
        TokenResponse {
            oauth_token: destructured.remove(OAUTH_TOKEN_KEY).unwrap_or_default(),
            oauth_token_secret: destructured
                .remove(OAUTH_TOKEN_SECRET_KEY)
                .unwrap_or_default(),
            remain: destructured,
        }
    }

    /// Both token fields are present and non-empty.
    pub fn is_complete(&self) -> bool {
        !self.oauth_token.is_empty() && !self.oauth_token_secret.is_empty()
    }
}

/// How the transport finished a request, independent of any HTTP library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportOutcome {
    Success,
    AccessDenied,
    OperationNotPermitted,
    NotFound,
    AuthenticationRequired,
    /// A 4xx status without a more specific meaning.
    UnknownContent,
    /// The response could not be read or decoded.
    ProtocolFailure,
    ConnectionFailed,
    TimedOut,
    /// 5xx status.
    ServerError,
    Other,
}

impl TransportOutcome {
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            s if s.is_success() => TransportOutcome::Success,
            StatusCode::UNAUTHORIZED | StatusCode::PROXY_AUTHENTICATION_REQUIRED => {
                TransportOutcome::AuthenticationRequired
            }
            StatusCode::FORBIDDEN => TransportOutcome::AccessDenied,
            StatusCode::METHOD_NOT_ALLOWED => TransportOutcome::OperationNotPermitted,
            StatusCode::NOT_FOUND | StatusCode::GONE => TransportOutcome::NotFound,
            s if s.is_client_error() => TransportOutcome::UnknownContent,
            s if s.is_server_error() => TransportOutcome::ServerError,
            _ => TransportOutcome::Other,
        }
    }

    /// Collapse the outcome into the handshake error taxonomy.
    pub fn classify(self) -> HandshakeStatus {
        match self {
            TransportOutcome::Success => HandshakeStatus::NoError,
            TransportOutcome::AccessDenied
            | TransportOutcome::OperationNotPermitted
            | TransportOutcome::NotFound
            | TransportOutcome::AuthenticationRequired
            | TransportOutcome::UnknownContent
            | TransportOutcome::ProtocolFailure => HandshakeStatus::RequestUnauthorized,
            TransportOutcome::ConnectionFailed
            | TransportOutcome::TimedOut
            | TransportOutcome::ServerError
            | TransportOutcome::Other => HandshakeStatus::NetworkError,
        }
    }
}

/// Result of the latest handshake exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HandshakeStatus {
    #[default]
    NoError,
    /// Transport failure not attributable to the request itself.
    NetworkError,
    /// The provider rejected the credentials, or the response lacks token fields.
    RequestUnauthorized,
}

impl HandshakeStatus {
    pub fn is_ok(self) -> bool {
        self == HandshakeStatus::NoError
    }
}

/// Apply a provider reply to the token that was in flight.
///
/// Token string and secret are copied from the body even on failure; the
/// type only advances (`Invalid` -> `RequestToken` -> `AccessToken`) when the
/// exchange succeeded.
pub fn process_reply(
    previous: Token,
    outcome: TransportOutcome,
    body: &str,
) -> (Token, HandshakeStatus, TokenResponse) {
    let mut status = outcome.classify();
    let response = TokenResponse::parse(body);
    if status.is_ok() && !response.is_complete() {
        status = HandshakeStatus::RequestUnauthorized;
    }
    debug!(?outcome, ?status, "oauth token response received");

    let mut token = previous;
    token.set_token_string(response.oauth_token.as_str());
    token.set_token_secret(response.oauth_token_secret.as_str());
    if status.is_ok() {
        match token.get_type() {
            TokenType::Invalid => token.set_type(TokenType::RequestToken),
            TokenType::RequestToken => token.set_type(TokenType::AccessToken),
            TokenType::AccessToken => {}
        }
    }
    (token, status, response)
}
