//! Async socket adapter: wraps the plain, synchronous [`net`](crate::net)
//! facade in `Future`-returning methods that suspend on reactor readiness
//! instead of returning `WouldBlock` to the caller.
//!
//! Shaped after `async_read`/`async_write`/`__async_accept`
//! (`library/coro_sockets/coro_helper.cpp`) in the C++ reference: try the
//! operation once, and if it would block, register interest and suspend
//! until the reactor says it's worth trying again — looping rather than
//! assuming one retry suffices, since a spurious wakeup or a competing
//! read can still leave the fd not actually ready.

mod listener;
mod stream;

pub use listener::AsyncListener;
pub use stream::AsyncStream;
