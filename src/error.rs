use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Contract violations and setup failures.
///
/// Provider rejections and network outages are not errors; they are
/// reported as a [`HandshakeStatus`](crate::HandshakeStatus).
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid url {0} : {1}")]
    InvalidUrl(String, #[source] url::ParseError),
    #[error("handshake precondition violated : {0}")]
    Precondition(&'static str),
    #[error("no handshake stage is waiting for a reply")]
    NoPendingStage,
    #[error("http client setup failed : {0}")]
    Reqwest(#[from] reqwest::Error),
}
