use std::fmt;
use std::io;

/// Parse/protocol errors from the HTTP layer, as a closed enum rather
/// than strings.
#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    /// The peer closed the connection before a complete request arrived.
    ConnectionClosed,
    /// The start line exceeded `Config::max_start_line` or was malformed
    /// past recovery (not just a dropped header line).
    StartLine,
    /// Header section exceeded `Config::max_header_bytes` or
    /// `Config::max_header_lines`.
    HeadersTooLarge,
    /// `Content-Length` present but not a valid non-negative integer.
    InvalidContentLength,
    /// Body would exceed `Config::max_body_bytes`.
    BodyTooLarge,
    /// A chunk-size line, chunk data, or the chunked terminator was
    /// malformed. Trailers are read and validated, not assumed away.
    Chunk,
    /// The request line named an HTTP version this crate doesn't speak.
    UnsupportedVersion,
    /// The request line's method token didn't match one of the seven
    /// known verbs.
    UnknownMethod,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {err}"),
            Error::ConnectionClosed => write!(f, "connection closed before a full request arrived"),
            Error::StartLine => write!(f, "malformed or oversized request line"),
            Error::HeadersTooLarge => write!(f, "header section too large"),
            Error::InvalidContentLength => write!(f, "invalid Content-Length"),
            Error::BodyTooLarge => write!(f, "request body too large"),
            Error::Chunk => write!(f, "malformed chunked transfer-coding"),
            Error::UnsupportedVersion => write!(f, "unsupported HTTP version"),
            Error::UnknownMethod => write!(f, "unrecognized HTTP method"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl Error {
    /// The status this error should be reported to the peer with, when a
    /// response can still be written (i.e. nothing's been sent yet).
    pub fn status(&self) -> super::Status {
        use super::Status;
        match self {
            Error::Io(_) | Error::ConnectionClosed => Status::BadRequest,
            Error::StartLine => Status::UriTooLong,
            Error::HeadersTooLarge => Status::RequestHeaderFieldsTooLarge,
            Error::InvalidContentLength => Status::LengthRequired,
            Error::BodyTooLarge => Status::PayloadTooLarge,
            Error::Chunk => Status::BadRequest,
            Error::UnsupportedVersion => Status::HttpVersionNotSupported,
            Error::UnknownMethod => Status::MethodNotAllowed,
        }
    }
}
