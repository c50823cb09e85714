//! A boxed, single-threaded future plus the bookkeeping the scheduler
//! needs to resume it. Shaped after the C++ reference's coroutine
//! `Task<T>` (`platform/coro_platform/Task.hpp`): a task owns its return
//! value and hands it to whoever is `.await`-ing its `JoinHandle`, exactly
//! once, exactly the way `final_suspend` resumes the parent continuation.
//!
//! The waker is hand-rolled rather than built on `std::task::Wake` because
//! `Wake` requires `Arc` (`Send + Sync`); this executor never leaves one
//! thread, so an `Rc`-backed `RawWaker` avoids the atomic overhead for no
//! loss of safety.

use std::any::Any;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

pub type TaskId = usize;

/// Why a task's result never arrived.
#[derive(Debug)]
pub enum JoinError {
    /// The task's future panicked while being polled.
    Panicked,
    /// The task was dropped from the scheduler's table before completing
    /// (only possible if the scheduler itself is torn down early).
    Cancelled,
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinError::Panicked => write!(f, "task panicked"),
            JoinError::Cancelled => write!(f, "task dropped before completing"),
        }
    }
}

impl std::error::Error for JoinError {}

type ReadyQueue = Rc<RefCell<VecDeque<TaskId>>>;

enum Slot<T> {
    Pending(Option<Waker>),
    Ready(Result<T, JoinError>),
    Taken,
}

/// The shared state between a task and the [`JoinHandle`] awaiting it.
struct Shared<T> {
    slot: Slot<T>,
}

/// A future yielding the spawned task's output (or [`JoinError`] if it
/// panicked), resolving exactly once.
pub struct JoinHandle<T> {
    shared: Rc<RefCell<Shared<T>>>,
}

impl<T> Future for JoinHandle<T> {
    type Output = Result<T, JoinError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut shared = self.shared.borrow_mut();
        match std::mem::replace(&mut shared.slot, Slot::Taken) {
            Slot::Pending(_) => {
                shared.slot = Slot::Pending(Some(cx.waker().clone()));
                Poll::Pending
            }
            Slot::Ready(result) => Poll::Ready(result),
            Slot::Taken => panic!("JoinHandle polled after completion"),
        }
    }
}

/// One scheduled unit of work: a boxed future plus the id the scheduler
/// uses to look it up again when its waker fires.
pub struct Task {
    id: TaskId,
    future: Option<Pin<Box<dyn FnMut(&mut Context<'_>) -> Poll<()>>>>,
}

impl Task {
    /// Wraps `future` so that on completion it writes its output into
    /// `shared` and wakes anyone polling the matching `JoinHandle`.
    pub fn spawn<F>(id: TaskId, future: F) -> (Task, JoinHandle<F::Output>)
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let shared = Rc::new(RefCell::new(Shared {
            slot: Slot::Pending(None),
        }));

        let mut future = Box::pin(future);
        let driver_shared = shared.clone();

        let driver = move |cx: &mut Context<'_>| -> Poll<()> {
            if matches!(driver_shared.borrow().slot, Slot::Ready(_)) {
                return Poll::Ready(());
            }

            let poll_result = panic::catch_unwind(AssertUnwindSafe(|| future.as_mut().poll(cx)));

            let outcome = match poll_result {
                Ok(Poll::Pending) => return Poll::Pending,
                Ok(Poll::Ready(value)) => Ok(value),
                Err(payload) => Err(panic_to_join_error(payload)),
            };

            let mut shared = driver_shared.borrow_mut();
            let waker = match std::mem::replace(&mut shared.slot, Slot::Ready(outcome)) {
                Slot::Pending(waker) => waker,
                _ => None,
            };
            drop(shared);
            if let Some(waker) = waker {
                waker.wake();
            }
            Poll::Ready(())
        };

        (
            Task {
                id,
                future: Some(Box::pin(driver)),
            },
            JoinHandle { shared },
        )
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Polls the task once. Returns `true` if it has finished and can be
    /// dropped from the scheduler's table.
    pub fn poll(&mut self, cx: &mut Context<'_>) -> bool {
        let done = match &mut self.future {
            Some(driver) => matches!(driver.as_mut().poll(cx), Poll::Ready(())),
            None => true,
        };
        if done {
            self.future = None;
        }
        done
    }
}

fn panic_to_join_error(_payload: Box<dyn Any + Send>) -> JoinError {
    JoinError::Panicked
}

/// Builds a `std::task::Waker` that pushes `id` onto `queue` and requests a
/// wakeup, backed by an `Rc` clone rather than an `Arc`.
pub fn waker(id: TaskId, queue: ReadyQueue) -> Waker {
    let data = Rc::into_raw(Rc::new((id, queue))) as *const ();
    unsafe { Waker::from_raw(RawWaker::new(data, &VTABLE)) }
}

type WakerData = (TaskId, ReadyQueue);

unsafe fn clone_raw(data: *const ()) -> RawWaker {
    let rc = Rc::from_raw(data as *const WakerData);
    let cloned = rc.clone();
    std::mem::forget(rc);
    RawWaker::new(Rc::into_raw(cloned) as *const (), &VTABLE)
}

unsafe fn wake_raw(data: *const ()) {
    let rc = Rc::from_raw(data as *const WakerData);
    schedule(&rc);
}

unsafe fn wake_by_ref_raw(data: *const ()) {
    let rc = Rc::from_raw(data as *const WakerData);
    schedule(&rc);
    std::mem::forget(rc);
}

unsafe fn drop_raw(data: *const ()) {
    drop(Rc::from_raw(data as *const WakerData));
}

fn schedule(rc: &Rc<WakerData>) {
    let (id, queue) = rc.as_ref();
    let mut queue = queue.borrow_mut();
    if !queue.contains(id) {
        queue.push_back(*id);
    }
}

static VTABLE: RawWakerVTable = RawWakerVTable::new(clone_raw, wake_raw, wake_by_ref_raw, drop_raw);

pub(crate) type SharedReadyQueue = ReadyQueue;
