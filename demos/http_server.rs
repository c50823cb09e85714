//! A small end-to-end server wiring [`Scheduler`] + [`http::serve`] + a
//! handler closure together, grounded on
//! `example/coro_example/coro_http_example.cpp`'s `handle_connection`:
//! a couple of GET routes, a streamed GET route exercising chunked
//! responses, and a POST echo route that switches to chunked once the
//! body is larger than one `read_block`.

use std::fmt::Write as _;

use ember_http::http::{Body, Config, Request, Response, Status};
use ember_http::net::Address;
use ember_http::scheduler::Scheduler;

fn handle(request: Request, config: &Config) -> Response {
    match (request.method.as_str(), request.target.as_str()) {
        ("GET", "/" | "/index") => {
            text_response(Status::Ok, "Hello from ember-http!\n".to_owned())
        }
        ("GET", "/stream") => {
            let mut body = String::new();
            for i in 0..1000 {
                let _ = writeln!(body, "line {i}");
            }
            chunked_response(Status::Ok, body.into_bytes())
        }
        ("POST", "/echo") => {
            if request.body.len() > config.read_block {
                chunked_response(Status::Ok, request.body)
            } else {
                text_response(Status::Ok, String::from_utf8_lossy(&request.body).into_owned())
            }
        }
        (_, path) => text_response(Status::NotFound, format!("path {path} not found\n")),
    }
}

fn text_response(status: Status, body: String) -> Response {
    Response::with_body(status, body)
        .header("server", "ember-http/0.1")
        .header("content-type", "text/plain; charset=utf-8")
}

fn chunked_response(status: Status, body: Vec<u8>) -> Response {
    let mut response = Response::new(status);
    response.body = Body::Chunked(body);
    response
        .header("server", "ember-http/0.1")
        .header("content-type", "text/plain; charset=utf-8")
}

fn main() -> std::io::Result<()> {
    env_logger::init();

    let scheduler = Scheduler::new()?;
    let _guard = scheduler.enter();

    let addr = Address::port(7000);
    log::info!("ember-http demo server starting on {addr}");

    scheduler.spawn(async move {
        if let Err(err) = ember_http::http::serve(addr, 128, Config::default(), handle).await {
            log::error!("server loop exited: {err}");
        }
    });

    scheduler.run();
    Ok(())
}
