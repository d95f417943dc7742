use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the whole application.
///
/// The first three variants map directly to HTTP status codes at the server
/// boundary (400, 404, 500). The remaining variants cover the transport layer
/// and surface as 500 if they ever reach a response.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing input, detected before any persistence attempt
    #[error("{0}")]
    Validation(String),

    /// A referenced product or order does not exist
    #[error("{0}")]
    NotFound(String),

    /// Underlying storage failure. The detail is logged server-side and never
    /// sent to clients.
    #[error("storage failure: {0}")]
    Persistence(String),

    /// The peer closed the connection before a full message was read
    #[error("connection reset by peer")]
    ConnectionReset,

    /// The server did not answer a client request
    #[error("no response from server")]
    NoResponse,

    #[error("failed to parse HTTP message: {0}")]
    HttpParse(#[from] httparse::Error),

    #[error("router misconfigured: {0}")]
    Router(#[from] matchit::InsertError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status code this error should surface as
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::NotFound(_) => 404,
            _ => 500,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Error {
        Error::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Error {
        Error::NotFound(msg.into())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Validation(format!("invalid JSON body: {}", err))
    }
}
