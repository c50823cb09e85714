use std::fmt;
use std::io;

/// Errors from the socket facade layer.
#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    /// A `Stream`/`Listener` was handed to a reactor other than the one its
    /// handle is registered with.
    WrongReactor,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "socket error: {err}"),
            Error::WrongReactor => write!(f, "socket used with a reactor it wasn't registered on"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::WrongReactor => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<crate::reactor::Error> for Error {
    fn from(err: crate::reactor::Error) -> Error {
        match err {
            crate::reactor::Error::Io(err) => Error::Io(err),
            crate::reactor::Error::WrongReactor => Error::WrongReactor,
        }
    }
}
