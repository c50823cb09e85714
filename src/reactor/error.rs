use std::fmt;
use std::io;

/// Errors surfaced by the reactor layer, distinct from the raw `io::Error`
/// the `sys` layer deals in so callers can match on them without string
/// comparison.
#[derive(Debug)]
pub enum Error {
    /// The underlying `epoll_ctl`/`epoll_wait` call failed.
    Io(io::Error),
    /// A handle created on one reactor was registered against another.
    /// Handles are move-only and single-reactor for their whole lifetime
    /// (spec's Data Model), so this only happens if a caller is juggling
    /// more than one `Reactor` by hand.
    WrongReactor,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "reactor I/O error: {err}"),
            Error::WrongReactor => write!(f, "handle registered against a different reactor"),
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
