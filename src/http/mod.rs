//! The HTTP/1.1 engine built on top of [`crate::io`] and
//! [`crate::scheduler`] — header/value model, request reader, response
//! writer, and the per-connection driver loop that ties them together.
//!
//! Shaped after the `library/http` tree and
//! `library/coro_http/coro_http_reader.cpp` /
//! `coro_http_writer.cpp` in the C++ reference, with the connection loop
//! itself mirroring `example/coro_example/coro_http_example.cpp`'s
//! `handle_connection`.

mod config;
mod error;
mod headers;
mod method;
mod reader;
mod request;
mod response;
mod status;
mod version;
mod writer;

pub use config::{Config, ConfigBuilder};
pub use error::Error;
pub use headers::Headers;
pub use method::{Method, UnknownMethod};
pub use reader::Reader;
pub use request::Request;
pub use response::{Body, Response};
pub use status::Status;
pub use version::Version;
pub use writer::write_response;

use std::rc::Rc;

use crate::io::{AsyncListener, AsyncStream};
use crate::net::Address;

/// The one routing extension point the core exposes: given a parsed
/// request and the server's configuration, produce a response. Anything
/// beyond straight-line dispatch (path routing, form/JSON ingestion) is a
/// collaborator's concern, not the core's — see [`crate::collab`].
pub trait Handler {
    fn call(&self, request: Request, config: &Config) -> Response;
}

impl<F> Handler for F
where
    F: Fn(Request, &Config) -> Response,
{
    fn call(&self, request: Request, config: &Config) -> Response {
        self(request, config)
    }
}

/// Connection driver: services one accepted stream until the peer
/// disconnects, a keep-alive-ending response is sent, or a parse/IO error
/// forces the connection closed.
///
/// Mirrors `handle_connection`'s `while (true) { ... }` loop in
/// `coro_http_example.cpp`: a fresh [`Reader`] per request (but one
/// persistent buffer, owned by the reader across iterations — see
/// [`Reader::read_request`]'s pipelining note), a keep-alive decision read
/// off the parsed request, the handler invoked, the response written with
/// that decision forced onto its `Connection` header, and a swallowed
/// close error at the very end.
pub async fn serve_connection<H: Handler>(mut stream: AsyncStream, config: Config, handler: Rc<H>) {
    let mut reader = Reader::new(config);

    loop {
        let request = match reader.read_request(&mut stream).await {
            Ok(request) => request,
            Err(Error::ConnectionClosed) => break,
            Err(err) => {
                log::warn!("closing connection after request parse error: {err}");
                break;
            }
        };

        let keep_alive = request.keep_alive();
        let suppress_body = request.method.suppresses_response_body();
        let response = handler.call(request, &config);

        if let Err(err) = write_response(&mut stream, &response, &config, keep_alive, suppress_body).await {
            log::warn!("closing connection after response write error: {err}");
            break;
        }

        if !keep_alive {
            break;
        }
    }

    let _ = stream.shutdown(std::net::Shutdown::Both);
}

/// Server bootstrap: binds and listens on `addr`, then loops forever
/// accepting connections and spawning a [`serve_connection`] task per
/// stream. Must be called from inside [`crate::scheduler::Scheduler::run`]
/// (or before it, with the scheduler entered) since it calls
/// [`crate::scheduler::spawn`] internally.
pub async fn serve<H>(addr: Address, backlog: i32, config: Config, handler: H) -> std::io::Result<()>
where
    H: Handler + 'static,
{
    let listener = AsyncListener::bind(addr, backlog)?;
    let handler = Rc::new(handler);
    match listener.local_addr() {
        Ok(local) => log::info!("listening on {local}"),
        Err(err) => log::warn!("listening (local address unavailable: {err})"),
    }

    loop {
        let (stream, peer) = listener.accept().await?;
        log::debug!("accepted connection from {peer}");
        let handler = handler.clone();
        crate::scheduler::spawn(async move {
            serve_connection(stream, config, handler).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Scheduler;
    use std::cell::RefCell;

    fn echo_handler(request: Request, _config: &Config) -> Response {
        Response::with_body(Status::Ok, request.body)
    }

    #[test]
    fn serves_one_request_and_closes() {
        let scheduler = Scheduler::new().expect("scheduler");
        let _guard = scheduler.enter();

        let listener = AsyncListener::bind(Address::port(0), 16).expect("bind");
        let local = listener.local_addr().expect("local addr");

        let config = Config::default();
        let handler = Rc::new(echo_handler as fn(Request, &Config) -> Response);

        crate::scheduler::spawn(async move {
            let (stream, _peer) = listener.accept().await.expect("accept");
            serve_connection(stream, config, handler).await;
        });

        // Everything here runs on the same single thread as the server
        // task, so the client side must suspend cooperatively too (a real
        // blocking `TcpStream` would starve the reactor of a chance to ever
        // run the accept).
        let response: Rc<RefCell<Option<Vec<u8>>>> = Rc::new(RefCell::new(None));
        crate::scheduler::spawn({
            let response = response.clone();
            async move {
                let mut client = AsyncStream::connect(local).await.expect("connect");
                client
                    .write_all(b"POST /echo HTTP/1.1\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello")
                    .await
                    .expect("write");

                let mut buf = Vec::new();
                let mut block = [0u8; 256];
                loop {
                    let n = client.read(&mut block).await.expect("read");
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&block[..n]);
                }
                *response.borrow_mut() = Some(buf);
            }
        });

        scheduler.run();

        let buf = response.borrow().clone().expect("response captured");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.ends_with("hello"));
    }
}
