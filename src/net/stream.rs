use std::cell::Cell;
use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::net::TcpStream;
use std::os::unix::io::{AsRawFd, RawFd};

/// See [`super::listener::Listener`]'s copy of this guard; duplicated
/// rather than shared because the two types have no other reason to know
/// about each other.
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

/// A non-blocking TCP stream, move-only, with no buffering of its own —
/// partial reads/writes are returned straight to the caller, same as the
/// original's `ClientSocket::read`/`write`.
pub struct Stream {
    inner: TcpStream,
    guard: ReactorGuard,
}

impl Stream {
    pub(crate) fn from_std(inner: TcpStream) -> Stream {
        inner.set_nonblocking(true).expect("fresh socket accepts nonblocking flag");
        Stream {
            inner,
            guard: ReactorGuard::default(),
        }
    }

    pub fn connect(addr: SocketAddr) -> io::Result<Stream> {
        // std's `connect` blocks until the handshake completes or fails;
        // outbound connections aren't part of the server-side spec this
        // crate implements, so that's acceptable here.
        let inner = TcpStream::connect(addr)?;
        Ok(Stream::from_std(inner))
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.inner.peer_addr()
    }

    pub(crate) fn associate(&self, reactor_id: usize) -> io::Result<()> {
        self.guard.associate(reactor_id)
    }

    /// Non-blocking read. `WouldBlock` means "no data right now", not an
    /// error; the async adapter suspends on read-readiness and retries.
    pub fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }

    /// Non-blocking write. `WouldBlock` means "the send buffer is full".
    pub fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    pub fn shutdown(&self, how: std::net::Shutdown) -> io::Result<()> {
        self.inner.shutdown(how)
    }
}

impl AsRawFd for Stream {
    fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }
}
