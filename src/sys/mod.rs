//! Raw, `unsafe`-at-the-edges bindings onto the POSIX syscalls the rest of
//! the crate is built on: `epoll(7)` and the handful of socket/fd flags
//! needed to run everything non-blocking.

pub mod epoll;
pub mod socket;

/// Runs a libc call, turning a `-1` return into `io::Error::last_os_error()`.
///
/// Retries automatically on `EINTR` so callers never have to special-case
/// signal interruption themselves.
macro_rules! syscall {
    ($fn:ident ( $($arg:expr),* $(,)* ) ) => {{
        loop {
            let res = unsafe { libc::$fn($($arg, )*) };
            if res == -1 {
                let err = std::io::Error::last_os_error();
                if err.kind() == std::io::ErrorKind::Interrupted {
                    continue;
                }
                break Err(err);
            }
            break Ok(res);
        }
    }};
}

pub(crate) use syscall;
