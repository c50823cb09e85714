//! Listener construction and `accept4`, the two places a plain `std::net`
//! socket isn't quite enough: we want `SO_REUSEADDR` set before `bind` and
//! the accepted peer socket to come back already non-blocking and
//! close-on-exec in one syscall, the way the original server socket did.

use std::io;
use std::mem::MaybeUninit;
use std::net::SocketAddr;
use std::os::unix::io::{FromRawFd, RawFd};

use socket2::{Domain, Protocol, Socket, Type};

use super::syscall;

/// Builds a listening, non-blocking TCP socket bound to `addr` with
/// `SO_REUSEADDR` set, mirroring `ServerSocket::listen` in the original.
pub fn listen(addr: SocketAddr, backlog: i32) -> io::Result<Socket> {
    let domain = if addr.is_ipv6() { Domain::IPV6 } else { Domain::IPV4 };
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog)?;
    socket.set_nonblocking(true)?;
    Ok(socket)
}

/// `accept4(fd, ..., SOCK_NONBLOCK | SOCK_CLOEXEC)`: accepts one pending
/// connection, returning the raw accepted fd and its peer address.
///
/// A `WouldBlock` error here means nothing is pending; callers suspend on
/// read-readiness and retry rather than treating it as fatal.
pub fn accept4(fd: RawFd) -> io::Result<(RawFd, SocketAddr)> {
    let mut storage: MaybeUninit<libc::sockaddr_storage> = MaybeUninit::zeroed();
    let mut len = std::mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;

    let accepted = syscall!(accept4(
        fd,
        storage.as_mut_ptr() as *mut libc::sockaddr,
        &mut len,
        libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC,
    ))?;

    let storage = unsafe { storage.assume_init() };
    let addr = sockaddr_to_std(&storage, len)?;

    Ok((accepted, addr))
}

fn sockaddr_to_std(storage: &libc::sockaddr_storage, len: libc::socklen_t) -> io::Result<SocketAddr> {
    // Safety: `accept4` filled in exactly `len` bytes of a valid
    // `sockaddr_in`/`sockaddr_in6` for an AF_INET/AF_INET6 socket, which is
    // all this crate ever creates.
    let sockaddr = unsafe { socket2::SockAddr::new(*storage, len) };
    sockaddr
        .as_socket()
        .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "accepted a non-IP socket"))
}

/// Wraps a raw accepted fd as an owned [`std::net::TcpStream`].
///
/// # Safety
/// `fd` must be a freshly `accept4`-ed, otherwise-unowned socket fd.
pub unsafe fn stream_from_raw(fd: RawFd) -> std::net::TcpStream {
    std::net::TcpStream::from_raw_fd(fd)
}
