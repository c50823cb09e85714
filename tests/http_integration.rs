//! End-to-end tests driving the HTTP engine over real non-blocking
//! loopback sockets plus a live [`Scheduler`] — no mocked reactor, since
//! the behavior under test is the interaction between the reactor and the
//! scheduler.

use std::cell::RefCell;
use std::rc::Rc;

use ember_http::http::{Config, Request, Response, Status};
use ember_http::io::AsyncStream;
use ember_http::net::Address;
use ember_http::scheduler::Scheduler;

/// Spawns the server side of one connection handled by `handler`, connects
/// a client, sends `raw_request` verbatim, reads the response to EOF (the
/// server always closes after a non-keep-alive response, which every
/// request below asks for), and returns the captured bytes.
fn round_trip(raw_request: &'static [u8], handler: fn(Request, &Config) -> Response) -> Vec<u8> {
    let scheduler = Scheduler::new().expect("epoll available in test environment");
    let _guard = scheduler.enter();

    let listener = ember_http::io::AsyncListener::bind(Address::port(0), 16).expect("bind loopback");
    let local = listener.local_addr().expect("local addr");
    let config = Config::default();
    let handler = Rc::new(handler);

    scheduler.spawn(async move {
        let (stream, _peer) = listener.accept().await.expect("accept");
        ember_http::http::serve_connection(stream, config, handler).await;
    });

    let captured: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
    scheduler.spawn({
        let captured = captured.clone();
        async move {
            let mut client = AsyncStream::connect(local).await.expect("connect");
            client.write_all(raw_request).await.expect("write request");

            let mut block = [0u8; 512];
            loop {
                let n = client.read(&mut block).await.expect("read response");
                if n == 0 {
                    break;
                }
                captured.borrow_mut().extend_from_slice(&block[..n]);
            }
        }
    });

    scheduler.run();
    Rc::try_unwrap(captured).unwrap_or_else(|_| panic!("client task still holds a reference")).into_inner()
}

fn echo_handler(request: Request, _config: &Config) -> Response {
    Response::with_body(Status::Ok, request.body)
}

fn header_probe_handler(request: Request, _config: &Config) -> Response {
    let host = request.headers.get("host").unwrap_or("").to_owned();
    let a = request.headers.get("a").unwrap_or("").to_owned();
    Response::with_body(Status::Ok, format!("{}|{}|{}", request.target, host, a))
}

/// A header-only GET request.
#[test]
fn header_only_get() {
    let response = round_trip(b"GET /index HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n", header_probe_handler);
    let text = String::from_utf8(response).expect("utf8 response");
    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.contains("content-length: 9\r\n") || text.contains("Content-Length: 9\r\n"));
    assert!(text.ends_with("/index|x|"));
}

/// S2 — POST with Content-Length.
#[test]
fn post_with_content_length() {
    let response = round_trip(
        b"POST /e HTTP/1.1\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
        echo_handler,
    );
    let text = String::from_utf8(response).expect("utf8 response");
    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.ends_with("hello"));
}

/// S3 — chunked decode: the handler echoes the decoded body back fixed-length,
/// so a correct chunk decode shows up directly in the response body.
#[test]
fn chunked_request_decodes_correctly() {
    let response = round_trip(
        b"POST /e HTTP/1.1\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n",
        echo_handler,
    );
    let text = String::from_utf8(response).expect("utf8 response");
    assert!(text.ends_with("Wikipedia"));
}

/// S4 — duplicate headers are comma-joined in insertion order.
#[test]
fn duplicate_headers_are_joined() {
    fn handler(request: Request, _: &Config) -> Response {
        Response::with_body(Status::Ok, request.headers.get("a").unwrap_or("").to_owned())
    }

    let response = round_trip(b"GET / HTTP/1.1\r\nA: 1\r\nA: 2\r\nA: 3\r\nConnection: close\r\n\r\n", handler);
    let text = String::from_utf8(response).expect("utf8 response");
    assert!(text.ends_with("1, 2, 3"));
}

/// S5 — a header section over the configured limit closes the connection
/// without a response, rather than reporting a structured HTTP error.
#[test]
fn oversize_headers_close_without_response() {
    let scheduler = Scheduler::new().expect("epoll available in test environment");
    let _guard = scheduler.enter();

    let listener = ember_http::io::AsyncListener::bind(Address::port(0), 16).expect("bind loopback");
    let local = listener.local_addr().expect("local addr");
    let config = Config::builder().max_header_bytes(256).build();
    let handler = Rc::new(echo_handler as fn(Request, &Config) -> Response);

    scheduler.spawn(async move {
        let (stream, _peer) = listener.accept().await.expect("accept");
        ember_http::http::serve_connection(stream, config, handler).await;
    });

    let captured: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
    scheduler.spawn({
        let captured = captured.clone();
        async move {
            let mut client = AsyncStream::connect(local).await.expect("connect");
            let mut oversize_request = b"GET / HTTP/1.1\r\n".to_vec();
            for i in 0..100 {
                oversize_request.extend_from_slice(format!("X-Pad-{i}: {}\r\n", "x".repeat(20)).as_bytes());
            }
            oversize_request.extend_from_slice(b"\r\n");
            client.write_all(&oversize_request).await.expect("write request");

            let mut block = [0u8; 512];
            loop {
                let n = client.read(&mut block).await.expect("read response");
                if n == 0 {
                    break;
                }
                captured.borrow_mut().extend_from_slice(&block[..n]);
            }
        }
    });

    scheduler.run();
    let captured = Rc::try_unwrap(captured).unwrap_or_else(|_| panic!("still referenced")).into_inner();
    assert!(captured.is_empty(), "connection should close without writing a response");
}

/// S6 — a chunked response slices the body into `read_block`-sized chunks
/// and terminates with the zero-length chunk.
#[test]
fn chunked_response_framing() {
    use ember_http::http::Body;

    fn handler(_: Request, _: &Config) -> Response {
        let mut response = Response::new(Status::Ok);
        response.body = Body::Chunked(b"lineA\nlineB\n".to_vec());
        response
    }

    let scheduler = Scheduler::new().expect("epoll available in test environment");
    let _guard = scheduler.enter();

    let listener = ember_http::io::AsyncListener::bind(Address::port(0), 16).expect("bind loopback");
    let local = listener.local_addr().expect("local addr");
    let config = Config::builder().read_block(3).build();
    let handler_rc = Rc::new(handler as fn(Request, &Config) -> Response);

    scheduler.spawn(async move {
        let (stream, _peer) = listener.accept().await.expect("accept");
        ember_http::http::serve_connection(stream, config, handler_rc).await;
    });

    let captured: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
    scheduler.spawn({
        let captured = captured.clone();
        async move {
            let mut client = AsyncStream::connect(local).await.expect("connect");
            client
                .write_all(b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n")
                .await
                .expect("write request");

            let mut block = [0u8; 512];
            loop {
                let n = client.read(&mut block).await.expect("read response");
                if n == 0 {
                    break;
                }
                captured.borrow_mut().extend_from_slice(&block[..n]);
            }
        }
    });

    scheduler.run();
    let captured = Rc::try_unwrap(captured).unwrap_or_else(|_| panic!("still referenced")).into_inner();
    let text = String::from_utf8(captured).expect("utf8 response");
    assert!(text.contains("transfer-encoding: chunked\r\n") || text.contains("Transfer-Encoding: chunked\r\n"));
    assert!(text.ends_with("0\r\n\r\n"));
    assert!(text.contains("3\r\nlin\r\n"));
}

/// I7 — keep-alive idempotence: an HTTP/1.1 request with no `Connection`
/// header keeps the connection open for a second request on the same
/// stream (the config default is `true`).
#[test]
fn keep_alive_defaults_to_true_for_http11() {
    let scheduler = Scheduler::new().expect("epoll available in test environment");
    let _guard = scheduler.enter();

    let listener = ember_http::io::AsyncListener::bind(Address::port(0), 16).expect("bind loopback");
    let local = listener.local_addr().expect("local addr");
    let config = Config::default();
    let handler = Rc::new(echo_handler as fn(Request, &Config) -> Response);

    scheduler.spawn(async move {
        let (stream, _peer) = listener.accept().await.expect("accept");
        ember_http::http::serve_connection(stream, config, handler).await;
    });

    let captured: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
    scheduler.spawn({
        let captured = captured.clone();
        async move {
            let mut client = AsyncStream::connect(local).await.expect("connect");

            client
                .write_all(b"POST /e HTTP/1.1\r\nContent-Length: 3\r\n\r\none")
                .await
                .expect("write first request");

            // Pipeline the second request right after: the reader must not
            // have eaten into it while framing the first body (Q1).
            client
                .write_all(b"POST /e HTTP/1.1\r\nContent-Length: 3\r\nConnection: close\r\n\r\ntwo")
                .await
                .expect("write second request");

            let mut block = [0u8; 512];
            loop {
                let n = client.read(&mut block).await.expect("read response");
                if n == 0 {
                    break;
                }
                captured.borrow_mut().extend_from_slice(&block[..n]);
            }
        }
    });

    scheduler.run();
    let captured = Rc::try_unwrap(captured).unwrap_or_else(|_| panic!("still referenced")).into_inner();
    let text = String::from_utf8(captured).expect("utf8 response");

    // Both responses arrived on the single connection, in order.
    let first = text.find("one").expect("first echo present");
    let second = text.find("two").expect("second echo present");
    assert!(first < second);
}
