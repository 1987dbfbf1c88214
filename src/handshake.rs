use http::Method;
use tracing::debug;
use url::Url;

use crate::response::process_reply;
use crate::{
    AuthMethod, BrowserOpener, Error, HandshakeStatus, HttpClient, HttpReply, Result,
    SignedRequest, Token, TokenResponse, TokenType, NO_PARAMS, OAUTH_TOKEN_KEY,
};

/// Emitted once a handshake exchange completes, carrying the resulting token.
///
/// Check [`Handshake::last_status`] to know whether the token advanced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeEvent {
    RequestTokenReceived(Token),
    AccessTokenReceived(Token),
}

impl HandshakeEvent {
    pub fn token(&self) -> &Token {
        match self {
            HandshakeEvent::RequestTokenReceived(token)
            | HandshakeEvent::AccessTokenReceived(token) => token,
        }
    }

    pub fn into_token(self) -> Token {
        match self {
            HandshakeEvent::RequestTokenReceived(token)
            | HandshakeEvent::AccessTokenReceived(token) => token,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    RequestToken,
    AccessToken,
}

/// Drives the three-legged OAuth 1.0a handshake.
///
/// One handshake stage is in flight at a time; run concurrent handshakes on
/// separate `Handshake` values.
#[derive(Debug)]
pub struct Handshake<C, B> {
    client: C,
    browser: B,
    method: Method,
    pending: Option<Stage>,
    token: Token,
    last_status: HandshakeStatus,
    last_response: Option<TokenResponse>,
}

impl<C, B> Handshake<C, B>
where
    C: HttpClient,
    B: BrowserOpener,
{
    pub fn new(client: C, browser: B) -> Self {
        Handshake {
            client,
            browser,
            method: Method::GET,
            pending: None,
            token: Token::default(),
            last_status: HandshakeStatus::NoError,
            last_response: None,
        }
    }

    /// Use `method` for the request-token and access-token calls (GET by default).
    pub fn with_method(self, method: Method) -> Self {
        Handshake { method, ..self }
    }

    /// Status of the latest completed exchange.
    pub fn last_status(&self) -> HandshakeStatus {
        self.last_status
    }

    /// Parameters of the latest provider reply, including non-token fields.
    pub fn last_response(&self) -> Option<&TokenResponse> {
        self.last_response.as_ref()
    }

    /// The token currently held by the handshake.
    pub fn token(&self) -> &Token {
        &self.token
    }

    // ------------------------------------------------------------------------
    // Step 1. request token

    /// Sign a request-token call without sending it. The token is reset to
    /// [`TokenType::Invalid`], so its callback URL is signed.
    ///
    /// # Errors
    ///
    /// This method fails whenever supplied url cannot be parsed.
    pub fn prepare_request_token(&mut self, token: Token, url: &str) -> Result<SignedRequest> {
        let token = token.token_type(TokenType::Invalid);
        self.prepare(Stage::RequestToken, token, url)
    }

    /// Ask the provider for a request token.
    ///
    /// # Errors
    ///
    /// This method fails whenever supplied url cannot be parsed. Provider
    /// and network failures are reported through [`Handshake::last_status`].
    pub async fn request_request_token(
        &mut self,
        token: Token,
        url: &str,
    ) -> Result<HandshakeEvent> {
        let request = self.prepare_request_token(token, url)?;
        self.dispatch(request).await
    }

    // ------------------------------------------------------------------------
    // Step 2. user authorization

    /// Open the provider's authorization page for `token` and return the URL
    /// that was opened.
    ///
    /// # Errors
    ///
    /// This method fails if `token` is not a request token with a token
    /// string, or if `authorization_url` cannot be parsed.
    pub fn request_user_authorization(
        &self,
        token: &Token,
        authorization_url: &str,
    ) -> Result<Url> {
        ensure_request_token(token)?;
        let mut url = parse_url(authorization_url)?;
        url.query_pairs_mut()
            .append_pair(OAUTH_TOKEN_KEY, token.token_string());
        debug!(url = %url, "opening user authorization page");
        self.browser.open(&url);
        Ok(url)
    }

    // ------------------------------------------------------------------------
    // Step 3. access token

    /// Sign an access-token call without sending it.
    ///
    /// # Errors
    ///
    /// This method fails if `token` is not a request token with a token
    /// string, or if `url` cannot be parsed.
    pub fn prepare_access_token(&mut self, token: Token, url: &str) -> Result<SignedRequest> {
        ensure_request_token(&token)?;
        self.prepare(Stage::AccessToken, token, url)
    }

    /// Exchange a verified request token for an access token.
    ///
    /// # Errors
    ///
    /// Same as [`Handshake::prepare_access_token`]. Provider and network
    /// failures are reported through [`Handshake::last_status`].
    pub async fn request_access_token(
        &mut self,
        token: Token,
        url: &str,
    ) -> Result<HandshakeEvent> {
        let request = self.prepare_access_token(token, url)?;
        self.dispatch(request).await
    }

    // ------------------------------------------------------------------------
    // Completion

    /// Complete the prepared stage with the transport's reply.
    ///
    /// # Errors
    ///
    /// This method fails if no stage was prepared.
    pub fn handle_reply(&mut self, reply: HttpReply) -> Result<HandshakeEvent> {
        let stage = self.pending.take().ok_or(Error::NoPendingStage)?;
        let previous = std::mem::take(&mut self.token);
        let (token, status, response) = process_reply(previous, reply.outcome, &reply.body);
        self.token = token.clone();
        self.last_status = status;
        self.last_response = Some(response);
        Ok(match stage {
            Stage::RequestToken => HandshakeEvent::RequestTokenReceived(token),
            Stage::AccessToken => HandshakeEvent::AccessTokenReceived(token),
        })
    }

    fn prepare(&mut self, stage: Stage, token: Token, url: &str) -> Result<SignedRequest> {
        let url = parse_url(url)?;
        let authorization =
            token.sign(url.as_str(), &self.method, AuthMethod::HttpHeader, NO_PARAMS);
        self.token = token;
        self.pending = Some(stage);
        Ok(SignedRequest {
            method: self.method.clone(),
            url,
            authorization,
        })
    }

    async fn dispatch(&mut self, request: SignedRequest) -> Result<HandshakeEvent> {
        let reply = self.client.execute(request).await;
        self.handle_reply(reply)
    }
}

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|err| Error::InvalidUrl(url.to_string(), err))
}

fn ensure_request_token(token: &Token) -> Result<()> {
    if token.get_type() != TokenType::RequestToken {
        return Err(Error::Precondition("token is not a request token"));
    }
    if token.token_string().is_empty() {
        return Err(Error::Precondition("request token has no oauth_token"));
    }
    Ok(())
}
