//! The scheduler: the single-threaded main loop tying the ready queue, the
//! timer heap and the [`Reactor`](crate::reactor::Reactor) together.
//!
//! Shaped closely after the C++ reference's `Scheduler::__run` loop
//! (`platform/coro_platform/scheduler.cpp`): drain whatever is ready, move
//! any timers whose deadline has passed into the ready queue, compute how
//! long `epoll_wait` may block for (zero if anything is ready, the next
//! timer's remaining time otherwise, forever if there are no timers),
//! block in the reactor, and repeat until there is nothing left to do.

use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use std::fmt;
use std::future::Future;
use std::os::unix::io::RawFd;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

use slab::Slab;

use crate::reactor::{Direction, Reactor};
use crate::task::{self, JoinHandle, Task, TaskId};

type TimerId = usize;

struct TimerEntry {
    deadline: Instant,
    id: TimerId,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline
    }
}
impl Eq for TimerEntry {}
impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.deadline.cmp(&other.deadline)
    }
}

struct Inner {
    reactor: Reactor,
    tasks: Slab<Rc<RefCell<Task>>>,
    ready: task::SharedReadyQueue,
    timer_heap: BinaryHeap<Reverse<TimerEntry>>,
    timer_wakers: Slab<Option<Waker>>,
}

thread_local! {
    static CURRENT: RefCell<Option<Rc<RefCell<Inner>>>> = RefCell::new(None);
}

/// The scheduler: owns the reactor and the task table, and drives both
/// from [`Scheduler::run`]. Not `Send`/`Sync`; exactly one lives per
/// thread, matching the original's process-wide singleton.
pub struct Scheduler {
    inner: Rc<RefCell<Inner>>,
}

impl Scheduler {
    pub fn new() -> std::io::Result<Scheduler> {
        let inner = Rc::new(RefCell::new(Inner {
            reactor: Reactor::new()?,
            tasks: Slab::new(),
            ready: Rc::new(RefCell::new(VecDeque::new())),
            timer_heap: BinaryHeap::new(),
            timer_wakers: Slab::new(),
        }));
        Ok(Scheduler { inner })
    }

    /// Spawns `future` as a new top-level task, returning a handle to
    /// observe its result. Must be called while this scheduler is current
    /// (i.e. from within [`Scheduler::run`], or before it with the same
    /// scheduler active via [`Scheduler::enter`]).
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let entry = inner.tasks.vacant_entry();
        let id = entry.key();
        let (task, handle) = Task::spawn(id, future);
        entry.insert(Rc::new(RefCell::new(task)));
        inner.ready.borrow_mut().push_back(id);
        handle
    }

    /// Runs the main loop until there is nothing left scheduled: no ready
    /// tasks, no pending timers, and no reactor registrations. Typical
    /// servers never reach this (the accept loop is itself a perpetually
    /// re-arming task), so in practice this returns only in tests or when
    /// every spawned task has voluntarily finished.
    pub fn run(&self) {
        let _guard = self.enter();
        loop {
            self.drain_ready();

            let inner = self.inner.borrow();
            let nothing_left = inner.tasks.is_empty()
                && inner.timer_heap.is_empty()
                && !inner.reactor.has_watchers();
            if nothing_left {
                break;
            }
            drop(inner);

            self.poll_reactor();
        }
    }

    fn drain_ready(&self) {
        loop {
            let next = self.inner.borrow().ready.borrow_mut().pop_front();
            let Some(id) = next else { break };

            let ready_queue = self.inner.borrow().ready.clone();
            let waker = task::waker(id, ready_queue);
            let mut cx = Context::from_waker(&waker);

            // clone the task's own Rc out and drop the borrow of `inner`
            // before polling: the task may call `spawn`/`sleep`/register
            // I/O interest from inside, each of which needs its own borrow
            // of `inner`.
            let task_rc = match self.inner.borrow().tasks.get(id) {
                Some(task_rc) => task_rc.clone(),
                None => continue,
            };
            let done = task_rc.borrow_mut().poll(&mut cx);

            if done {
                self.inner.borrow_mut().tasks.try_remove(id);
            }
        }
    }

    fn poll_reactor(&self) {
        let timeout = self.next_timeout();
        {
            let mut inner = self.inner.borrow_mut();
            // ignore poll errors at the top level; a misbehaving fd
            // shouldn't take the whole scheduler down. Individual
            // operations surface their own errors to the task that owns
            // the handle.
            let _ = inner.reactor.poll(timeout);
        }
        self.fire_timers();
    }

    fn next_timeout(&self) -> Option<Duration> {
        let inner = self.inner.borrow();
        if !inner.ready.borrow().is_empty() {
            return Some(Duration::ZERO);
        }
        match inner.timer_heap.peek() {
            Some(Reverse(entry)) => {
                let now = Instant::now();
                Some(entry.deadline.saturating_duration_since(now))
            }
            None => None,
        }
    }

    fn fire_timers(&self) {
        let now = Instant::now();
        let mut inner = self.inner.borrow_mut();
        let mut fired = Vec::new();
        while let Some(Reverse(entry)) = inner.timer_heap.peek() {
            if entry.deadline > now {
                break;
            }
            let Reverse(entry) = inner.timer_heap.pop().unwrap();
            fired.push(entry.id);
        }
        for id in fired {
            if let Some(waker) = inner.timer_wakers.get_mut(id).and_then(Option::take) {
                waker.wake();
            }
        }
    }

    /// Makes this scheduler the thread's current one for the duration of
    /// the returned guard. `Scheduler::run` does this automatically.
    pub fn enter(&self) -> EnterGuard {
        CURRENT.with(|cell| {
            let previous = cell.borrow_mut().replace(self.inner.clone());
            EnterGuard { previous }
        })
    }
}

/// Restores the previously-current scheduler (if any) on drop.
pub struct EnterGuard {
    previous: Option<Rc<RefCell<Inner>>>,
}

impl Drop for EnterGuard {
    fn drop(&mut self) {
        CURRENT.with(|cell| {
            *cell.borrow_mut() = self.previous.take();
        });
    }
}

fn with_current<R>(f: impl FnOnce(&Rc<RefCell<Inner>>) -> R) -> R {
    CURRENT.with(|cell| {
        let borrow = cell.borrow();
        let inner = borrow.as_ref().expect("no Scheduler is currently running");
        f(inner)
    })
}

/// Spawns onto the currently-running scheduler. Panics if called outside
/// of one (there is exactly one scheduler per thread, entered via
/// [`Scheduler::run`]).
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + 'static,
    F::Output: 'static,
{
    with_current(|inner| {
        let mut inner = inner.borrow_mut();
        let entry = inner.tasks.vacant_entry();
        let id = entry.key();
        let (task, handle) = Task::spawn(id, future);
        entry.insert(Rc::new(RefCell::new(task)));
        inner.ready.borrow_mut().push_back(id);
        handle
    })
}

/// Registers interest on `fd` with the current scheduler's reactor.
pub(crate) fn register_io(fd: RawFd, direction: Direction, waker: Waker) -> std::io::Result<()> {
    with_current(|inner| inner.borrow_mut().reactor.register(fd, direction, waker))
}

/// Drops all interest in `fd` from the current scheduler's reactor.
pub(crate) fn unregister_io(fd: RawFd) -> std::io::Result<()> {
    with_current(|inner| inner.borrow_mut().reactor.unregister(fd))
}

/// The id of the current scheduler's reactor, for cross-reactor-use checks.
pub(crate) fn current_reactor_id() -> usize {
    with_current(|inner| inner.borrow().reactor.id())
}

/// A future that resolves once, at or after `deadline`.
pub struct Sleep {
    deadline: Instant,
    timer_id: Option<TimerId>,
}

impl Future for Sleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if Instant::now() >= self.deadline {
            return Poll::Ready(());
        }

        with_current(|inner| {
            let mut inner = inner.borrow_mut();
            let id = match self.timer_id {
                Some(id) => id,
                None => {
                    let id = inner.timer_wakers.insert(None);
                    inner.timer_heap.push(Reverse(TimerEntry {
                        deadline: self.deadline,
                        id,
                    }));
                    self.timer_id = Some(id);
                    id
                }
            };
            inner.timer_wakers[id] = Some(cx.waker().clone());
        });

        Poll::Pending
    }
}

/// Suspends the current task until `deadline`.
pub fn sleep_until(deadline: Instant) -> Sleep {
    Sleep { deadline, timer_id: None }
}

/// Suspends the current task for `duration`.
pub fn sleep(duration: Duration) -> Sleep {
    sleep_until(Instant::now() + duration)
}

/// Error returned by [`timeout`] when the timer elapses first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed;

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "deadline elapsed")
    }
}

impl std::error::Error for Elapsed {}

/// Races `future` against a `duration` timer: resolves to the future's
/// output if it finishes first, or `Err(Elapsed)` if the timer fires
/// first. No general task-cancellation is implied or added; losing the
/// race simply stops polling `future`.
pub fn timeout<F>(duration: Duration, future: F) -> Timeout<F>
where
    F: Future,
{
    Timeout {
        future,
        sleep: sleep(duration),
    }
}

pub struct Timeout<F> {
    future: F,
    sleep: Sleep,
}

impl<F: Future> Future for Timeout<F> {
    type Output = Result<F::Output, Elapsed>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // SAFETY: neither field is moved out of; standard pin-projection
        // for a struct with no `Drop` impl of its own.
        let this = unsafe { self.get_unchecked_mut() };
        let future = unsafe { Pin::new_unchecked(&mut this.future) };
        if let Poll::Ready(value) = future.poll(cx) {
            return Poll::Ready(Ok(value));
        }

        let sleep = unsafe { Pin::new_unchecked(&mut this.sleep) };
        if sleep.poll(cx).is_ready() {
            return Poll::Ready(Err(Elapsed));
        }

        Poll::Pending
    }
}
