use std::fmt;
use std::io;
use thiserror::Error;

/// Connection-level failure. Always fatal to the current connection and
/// never retried internally; the caller decides whether to reconnect.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Dial failed: {0}")]
    Dial(io::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Operation timed out")]
    Timeout,

    #[error("Connection closed by peer")]
    Closed,
}

/// Malformed or unexpected traffic from the peer. After one of these the
/// framing state cannot be trusted, so they are fatal to the connection too.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Payload of {0} bytes exceeds the 65535-byte wire limit")]
    PayloadTooLarge(usize),

    #[error("Bad packet magic: {0:?}")]
    BadMagic([u8; 4]),

    #[error("Expected {expected}, got response code {code}")]
    UnexpectedResponse { expected: &'static str, code: u32 },

    #[error("Expected {expected} NUL-delimited fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("Text field is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("Echo response did not match the request payload")]
    EchoMismatch,
}

/// A well-formed error response from the job server. Non-fatal: the
/// connection stays usable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    pub code: String,
    pub message: String,
}

impl ServerError {
    /// Parse an error-response payload of the form `code NUL message`.
    /// A payload without a separator becomes a bare message.
    pub fn from_payload(payload: &[u8]) -> Self {
        match payload.iter().position(|&b| b == 0) {
            Some(i) => ServerError {
                code: String::from_utf8_lossy(&payload[..i]).into_owned(),
                message: String::from_utf8_lossy(&payload[i + 1..]).into_owned(),
            },
            None => ServerError {
                code: String::new(),
                message: String::from_utf8_lossy(payload).into_owned(),
            },
        }
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.code.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for ServerError {}

/// Top-level failure type for every jobwire operation.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("{0}")]
    Server(#[from] ServerError),

    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),
}

// The tokio-util Decoder contract routes raw IO failures through here.
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Transport(TransportError::Io(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_rendering() {
        let err = ServerError::from_payload(b"4\0no such option");
        assert_eq!(err.code, "4");
        assert_eq!(err.message, "no such option");
        assert_eq!(err.to_string(), "4: no such option");
    }

    #[test]
    fn test_server_error_without_separator() {
        let err = ServerError::from_payload(b"queue unavailable");
        assert!(err.code.is_empty());
        assert_eq!(err.to_string(), "queue unavailable");
    }

    #[test]
    fn test_server_error_through_top_level_error() {
        let err = Error::from(ServerError::from_payload(b"4\0no such option"));
        assert_eq!(err.to_string(), "4: no such option");
    }

    #[test]
    fn test_io_error_maps_to_transport() {
        let err = Error::from(io::Error::new(io::ErrorKind::BrokenPipe, "pipe"));
        assert!(matches!(err, Error::Transport(TransportError::Io(_))));
    }
}
