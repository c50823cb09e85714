use std::io;
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use libc::{c_int, EPOLLERR, EPOLLET, EPOLLHUP, EPOLLIN, EPOLLONESHOT, EPOLLOUT, EPOLLPRI, EPOLLRDHUP};

use super::syscall;
use crate::reactor::{Direction, RawInterest};

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// Thin wrapper around a single `epoll` file descriptor.
pub struct RawEpoll {
    id: usize,
    epfd: RawFd,
}

impl RawEpoll {
    pub fn new() -> io::Result<RawEpoll> {
        let epfd = syscall!(epoll_create1(libc::EPOLL_CLOEXEC))?;
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(RawEpoll { id, epfd })
    }

    /// Identity of this instance; used to catch a socket being registered
    /// with two different reactors at once.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn add(&self, fd: RawFd, token: usize, interest: RawInterest) -> io::Result<()> {
        let mut ev = libc::epoll_event {
            events: to_epoll_bits(interest, true),
            u64: token as u64,
        };
        syscall!(epoll_ctl(self.epfd, libc::EPOLL_CTL_ADD, fd, &mut ev))?;
        Ok(())
    }

    pub fn modify(&self, fd: RawFd, token: usize, interest: RawInterest) -> io::Result<()> {
        let mut ev = libc::epoll_event {
            events: to_epoll_bits(interest, true),
            u64: token as u64,
        };
        syscall!(epoll_ctl(self.epfd, libc::EPOLL_CTL_MOD, fd, &mut ev))?;
        Ok(())
    }

    pub fn delete(&self, fd: RawFd) -> io::Result<()> {
        // the event argument is ignored by EPOLL_CTL_DEL on Linux but older
        // kernels require a non-null pointer.
        let mut ev = libc::epoll_event { events: 0, u64: 0 };
        syscall!(epoll_ctl(self.epfd, libc::EPOLL_CTL_DEL, fd, &mut ev))?;
        Ok(())
    }

    /// Blocks up to `timeout` waiting for readiness, appending every fired
    /// `(token, direction)` pair to `out`. A `None` timeout blocks forever.
    pub fn wait(&self, out: &mut Vec<(usize, Direction)>, timeout: Option<Duration>) -> io::Result<()> {
        let timeout_ms = timeout
            .map(|d| std::cmp::min(d.as_millis(), c_int::MAX as u128) as c_int)
            .unwrap_or(-1);

        let mut buf: Vec<libc::epoll_event> = vec![libc::epoll_event { events: 0, u64: 0 }; 1024];

        let n = syscall!(epoll_wait(
            self.epfd,
            buf.as_mut_ptr(),
            buf.len() as c_int,
            timeout_ms
        ))?;

        for ev in &buf[..n as usize] {
            let token = ev.u64 as usize;
            let bits = ev.events as c_int;

            if bits & (EPOLLIN | EPOLLPRI) != 0 {
                out.push((token, Direction::Read));
            }
            if bits & EPOLLOUT != 0 {
                out.push((token, Direction::Write));
            }
            // a hangup or error is reported on whichever direction(s) were
            // being watched, so surface it on both — the caller re-checks
            // the actual I/O result rather than trusting the notification.
            if bits & (EPOLLHUP | EPOLLRDHUP | EPOLLERR) != 0 {
                out.push((token, Direction::Read));
                out.push((token, Direction::Write));
            }
        }

        Ok(())
    }
}

fn to_epoll_bits(interest: RawInterest, edge_triggered: bool) -> u32 {
    let mut bits = 0;
    if interest.read {
        bits |= EPOLLIN;
    }
    if interest.write {
        bits |= EPOLLOUT;
    }
    if edge_triggered {
        bits |= EPOLLET;
        bits |= EPOLLONESHOT;
    }
    bits as u32
}

impl AsRawFd for RawEpoll {
    fn as_raw_fd(&self) -> RawFd {
        self.epfd
    }
}

impl Drop for RawEpoll {
    fn drop(&mut self) {
        unsafe {
            let _ = libc::close(self.epfd);
        }
    }
}
