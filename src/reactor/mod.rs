//! The readiness demultiplexer: a single-threaded wrapper around one
//! `epoll` instance, edge-triggered, one-shot per fire.
//!
//! A `Reactor` never polls the kernel itself from the outside; the
//! `Scheduler` drives it by calling [`Reactor::poll`] once per iteration of
//! its main loop and waking whatever task was waiting on the handles that
//! fired.

use std::collections::HashMap;
use std::io;
use std::os::unix::io::RawFd;
use std::task::Waker;
use std::time::Duration;

use crate::sys::epoll::RawEpoll;

pub mod error;

pub use error::Error;

/// Which half of a full-duplex stream a registration cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

/// The bare read/write interest bits the `sys` layer converts into kernel
/// event flags. Kept separate from [`Direction`] because a single
/// `epoll_ctl` call registers both halves at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawInterest {
    pub read: bool,
    pub write: bool,
}

impl RawInterest {
    fn is_empty(&self) -> bool {
        !self.read && !self.write
    }
}

#[derive(Default)]
struct Watch {
    added: bool,
    read: Option<Waker>,
    write: Option<Waker>,
}

impl Watch {
    fn raw_interest(&self) -> RawInterest {
        RawInterest {
            read: self.read.is_some(),
            write: self.write.is_some(),
        }
    }
}

/// The reactor itself: one `epoll` fd plus the table of who is waiting on
/// what. Not `Send`/`Sync` — the whole crate is single-threaded by design,
/// see spec's Non-goals.
pub struct Reactor {
    epoll: RawEpoll,
    watches: HashMap<RawFd, Watch>,
    events: Vec<(usize, Direction)>,
}

impl Reactor {
    pub fn new() -> io::Result<Reactor> {
        Ok(Reactor {
            epoll: RawEpoll::new()?,
            watches: HashMap::new(),
            events: Vec::new(),
        })
    }

    /// Identity of the underlying `epoll` fd, used by handles to refuse
    /// registering with a reactor other than the one they were created on.
    pub fn id(&self) -> usize {
        self.epoll.id()
    }

    /// Records interest in `direction` on `fd`, waking `waker` the next time
    /// it fires. Replaces any previously registered waker for the same
    /// fd/direction pair (the caller is expected to have already been woken
    /// or to be re-arming after a `WouldBlock`).
    pub fn register(&mut self, fd: RawFd, direction: Direction, waker: Waker) -> io::Result<()> {
        let watch = self.watches.entry(fd).or_default();
        match direction {
            Direction::Read => watch.read = Some(waker),
            Direction::Write => watch.write = Some(waker),
        }

        let interest = watch.raw_interest();
        if watch.added {
            self.epoll.modify(fd, fd as usize, interest)
        } else {
            self.epoll.add(fd, fd as usize, interest)?;
            watch.added = true;
            Ok(())
        }
    }

    /// Drops all interest in `fd`, removing it from the `epoll` set
    /// entirely. Called when the owning handle is closed.
    pub fn unregister(&mut self, fd: RawFd) -> io::Result<()> {
        if let Some(watch) = self.watches.remove(&fd) {
            if watch.added {
                self.epoll.delete(fd)?;
            }
        }
        Ok(())
    }

    /// True while at least one fd has live interest registered; the
    /// scheduler uses this to decide whether blocking forever (no ready
    /// tasks, no timers) would actually deadlock.
    pub fn has_watchers(&self) -> bool {
        self.watches.values().any(|w| !w.raw_interest().is_empty())
    }

    /// Blocks for up to `timeout`, waking every task whose registered
    /// direction fired. A `None` timeout blocks until at least one event
    /// arrives.
    pub fn poll(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.events.clear();
        self.epoll.wait(&mut self.events, timeout)?;

        // Drain into a local buffer first: waking a task can re-enter
        // `register` (an immediate re-poll), which would otherwise borrow
        // `self.watches` mutably while we're still iterating the same map.
        let fired = std::mem::take(&mut self.events);

        for (token, direction) in fired {
            let fd = token as RawFd;
            let waker = match self.watches.get_mut(&fd) {
                Some(watch) => match direction {
                    Direction::Read => watch.read.take(),
                    Direction::Write => watch.write.take(),
                },
                None => None,
            };

            if let Some(waker) = waker {
                waker.wake();
            }
        }

        self.events = Vec::new();
        Ok(())
    }
}
