use std::io;
use std::net::SocketAddr;
use std::os::unix::io::{AsRawFd, RawFd};

use crate::net::{Address, Listener};
use crate::reactor::Direction;
use crate::scheduler;

use super::stream::{AsyncStream, Readiness};

/// An async-capable listening socket: [`accept`](AsyncListener::accept)
/// suspends the calling task instead of returning `WouldBlock`.
pub struct AsyncListener {
    inner: Listener,
}

impl AsyncListener {
    pub fn bind(addr: Address, backlog: i32) -> io::Result<AsyncListener> {
        let inner = Listener::bind(addr, backlog)?;
        inner.associate(scheduler::current_reactor_id())?;
        Ok(AsyncListener { inner })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Accepts the next incoming connection, suspending until one is
    /// pending if none is available yet.
    pub async fn accept(&self) -> io::Result<(AsyncStream, SocketAddr)> {
        loop {
            match self.inner.accept() {
                Ok((stream, addr)) => return Ok((AsyncStream::new(stream)?, addr)),
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    Readiness::new(self.as_raw_fd(), Direction::Read).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl AsRawFd for AsyncListener {
    fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }
}

impl Drop for AsyncListener {
    fn drop(&mut self) {
        let _ = scheduler::unregister_io(self.as_raw_fd());
    }
}
