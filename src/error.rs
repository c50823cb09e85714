//! The crate-wide error type, composed from each component's local error
//! enum via `From` rather than strings, so callers can match on a failure
//! kind instead of parsing a message.

use std::fmt;

/// Any failure surfaced by a public `ember_http` operation.
#[derive(Debug)]
pub enum Error {
    /// Readiness demultiplexer or raw syscall failure.
    Reactor(crate::reactor::Error),
    /// Socket facade failure.
    Net(crate::net::Error),
    /// HTTP parse/protocol failure.
    Http(crate::http::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Reactor(err) => write!(f, "{err}"),
            Error::Net(err) => write!(f, "{err}"),
            Error::Http(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Reactor(err) => Some(err),
            Error::Net(err) => Some(err),
            Error::Http(err) => Some(err),
        }
    }
}

impl From<crate::reactor::Error> for Error {
    fn from(err: crate::reactor::Error) -> Error {
        Error::Reactor(err)
    }
}

impl From<crate::net::Error> for Error {
    fn from(err: crate::net::Error) -> Error {
        Error::Net(err)
    }
}

impl From<crate::http::Error> for Error {
    fn from(err: crate::http::Error) -> Error {
        Error::Http(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Net(crate::net::Error::Io(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
