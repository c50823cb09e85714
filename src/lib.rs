//! A single-threaded, edge-triggered async I/O runtime and HTTP/1.1 engine.
//!
//! Two tightly-coupled halves, leaf-first:
//!
//!   - [`reactor`], [`net`], [`task`], [`scheduler`], [`io`] — the runtime:
//!     an `epoll`-backed readiness demultiplexer, a non-blocking socket
//!     facade, a cooperative task/scheduler pair, and the async adapter
//!     bridging the two.
//!   - [`http`] — a streaming HTTP/1.1 request reader and response writer
//!     built entirely on the runtime above, plus the per-connection driver
//!     loop and server bootstrap.
//!
//! [`collab`] holds interfaces that stay external to the core on purpose
//! (form/JSON body ingestion); nothing in `http` depends on it.
//!
//! # Example
//!
//! ```no_run
//! use ember_http::http::{Config, Response, Status};
//! use ember_http::net::Address;
//! use ember_http::scheduler::Scheduler;
//!
//! fn handle(request: ember_http::http::Request, _config: &Config) -> Response {
//!     Response::with_body(Status::Ok, format!("hello, {}\n", request.target))
//! }
//!
//! let scheduler = Scheduler::new().expect("epoll available");
//! let _guard = scheduler.enter();
//! scheduler.spawn(ember_http::http::serve(Address::port(7000), 128, Config::default(), handle));
//! scheduler.run();
//! ```

pub mod collab;
mod error;
pub mod http;
pub mod io;
pub mod net;
pub mod reactor;
pub mod scheduler;
pub mod task;

mod sys;

pub use error::{Error, Result};
