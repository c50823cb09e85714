//! The socket facade: move-only, non-blocking TCP handles built on
//! `std::net`, the way `queen-io`'s `net::tcp` wraps `std::net::TcpStream`
//! rather than hand-rolling a socket type from raw fds.

mod addr;
mod error;
mod listener;
mod stream;

pub use addr::Address;
pub use error::Error;
pub use listener::Listener;
pub use stream::Stream;

use std::os::unix::io::RawFd;

/// An opaque handle to an OS stream endpoint (spec's Data Model §3):
/// exactly the raw fd, with no ambient authority beyond what owning it
/// grants. [`Listener`] and [`Stream`] are the only things that hold one.
pub type Handle = RawFd;
