use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::os::unix::io::{AsRawFd, RawFd};
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::net::Stream;
use crate::reactor::Direction;
use crate::scheduler;

/// Suspends the current task until `fd` is ready for `direction`.
///
/// Registers interest on first poll and assumes readiness on the next one:
/// correct as long as a task only ever awaits one `Readiness` at a time per
/// fd, which every method in this module upholds.
pub(super) struct Readiness {
    fd: RawFd,
    direction: Direction,
    registered: bool,
}

impl Readiness {
    pub(super) fn new(fd: RawFd, direction: Direction) -> Readiness {
        Readiness { fd, direction, registered: false }
    }
}

impl Future for Readiness {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.registered {
            return Poll::Ready(());
        }
        // Errors here mean the reactor's `epoll_ctl` call itself failed
        // (e.g. the fd was already closed); there is no useful way to
        // surface that from inside a `Future::poll`, so the next real I/O
        // attempt on the same fd will fail and report it properly.
        let _ = scheduler::register_io(self.fd, self.direction, cx.waker().clone());
        self.registered = true;
        Poll::Pending
    }
}

/// An async-capable TCP stream: [`read`](AsyncStream::read) and
/// [`write`](AsyncStream::write) suspend on readiness rather than
/// returning `WouldBlock`.
pub struct AsyncStream {
    inner: Stream,
}

impl AsyncStream {
    pub(crate) fn new(inner: Stream) -> io::Result<AsyncStream> {
        inner.associate(scheduler::current_reactor_id())?;
        Ok(AsyncStream { inner })
    }

    pub fn connect(addr: SocketAddr) -> impl Future<Output = io::Result<AsyncStream>> {
        std::future::ready(Stream::connect(addr).and_then(AsyncStream::new))
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.inner.peer_addr()
    }

    pub async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.inner.read(buf) {
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    Readiness::new(self.as_raw_fd(), Direction::Read).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    pub async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        loop {
            match self.inner.write(buf) {
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    Readiness::new(self.as_raw_fd(), Direction::Write).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Writes the entire buffer, looping over partial writes.
    pub async fn write_all(&mut self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            let n = self.write(buf).await?;
            if n == 0 {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "write returned 0 bytes"));
            }
            buf = &buf[n..];
        }
        Ok(())
    }

    pub fn shutdown(&self, how: std::net::Shutdown) -> io::Result<()> {
        self.inner.shutdown(how)
    }
}

impl AsRawFd for AsyncStream {
    fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }
}

impl Drop for AsyncStream {
    fn drop(&mut self) {
        let _ = scheduler::unregister_io(self.as_raw_fd());
    }
}
