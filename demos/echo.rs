//! Exercises the runtime directly, with no HTTP involved — shaped after
//! `example/coro_example/coro_echo.cpp`: greet the client, then echo
//! back whatever it sends until it sends `q\n` or disconnects.

use ember_http::io::AsyncListener;
use ember_http::net::Address;
use ember_http::scheduler::Scheduler;

async fn handle_client(mut stream: ember_http::io::AsyncStream) {
    let peer = stream.peer_addr().map(|a| a.to_string()).unwrap_or_else(|_| "?".to_owned());
    log::info!("new client from {peer}");

    if stream.write_all(b"Hello dude, press q <enter> to quit\n").await.is_err() {
        return;
    }

    let mut buf = [0u8; 4096];
    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) | Err(_) => {
                log::info!("client {peer} disconnected");
                return;
            }
            Ok(n) => n,
        };

        if n == 2 && buf[0] == b'q' {
            log::info!("client {peer} quit");
            return;
        }

        if stream.write_all(&buf[..n]).await.is_err() {
            return;
        }
    }
}

fn main() -> std::io::Result<()> {
    env_logger::init();

    let scheduler = Scheduler::new()?;
    let _guard = scheduler.enter();

    let addr = Address::port(7000);
    let listener = AsyncListener::bind(addr, 128)?;
    log::info!("echo demo listening on {addr}");

    scheduler.spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _peer)) => {
                    ember_http::scheduler::spawn(handle_client(stream));
                }
                Err(err) => {
                    log::error!("accept failed: {err}");
                    break;
                }
            }
        }
    });

    scheduler.run();
    Ok(())
}
