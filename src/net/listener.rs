use std::cell::Cell;
use std::io;
use std::net::SocketAddr;
use std::os::unix::io::{AsRawFd, RawFd};

use crate::sys::socket;

use super::{Address, Stream};

/// Guards against a handle created for one reactor being registered with
/// another — the same role `SelectorId` plays in `queen-io`'s `net::tcp`.
#[derive(Default)]
struct ReactorGuard(Cell<Option<usize>>);

impl ReactorGuard {
    fn associate(&self, reactor_id: usize) -> io::Result<()> {
        match self.0.get() {
            None => {
                self.0.set(Some(reactor_id));
                Ok(())
            }
            Some(id) if id == reactor_id => Ok(()),
            Some(_) => Err(io::Error::new(
                io::ErrorKind::Other,
                "handle already registered with a different reactor",
            )),
        }
    }
}

/// A bound, listening, non-blocking TCP socket.
pub struct Listener {
    socket: socket2::Socket,
    guard: ReactorGuard,
}

impl Listener {
    /// Binds and starts listening on `addr` with the given backlog.
    pub fn bind(addr: Address, backlog: i32) -> io::Result<Listener> {
        let socket = socket::listen(addr.to_socket_addr(), backlog)?;
        Ok(Listener {
            socket,
            guard: ReactorGuard::default(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket
            .local_addr()?
            .as_socket()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "non-IP local address"))
    }

    /// Associates this listener with a reactor. Idempotent for the same
    /// reactor; an error if a different one is supplied.
    pub(crate) fn associate(&self, reactor_id: usize) -> io::Result<()> {
        self.guard.associate(reactor_id)
    }

    /// Accepts one pending connection. Returns `WouldBlock` if nothing is
    /// pending yet; the caller suspends on read-readiness and retries.
    pub fn accept(&self) -> io::Result<(Stream, SocketAddr)> {
        let (fd, addr) = socket::accept4(self.socket.as_raw_fd())?;
        let stream = unsafe { socket::stream_from_raw(fd) };
        Ok((Stream::from_std(stream), addr))
    }
}

impl AsRawFd for Listener {
    fn as_raw_fd(&self) -> RawFd {
        self.socket.as_raw_fd()
    }
}
