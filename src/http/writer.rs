use crate::http::{Body, Config, Error, Headers, Response};
use crate::io::AsyncStream;

/// Serializes a [`Response`] onto `stream`.
///
/// `keep_alive` is decided by the connection driver, not the handler: the
/// writer always emits an explicit `Connection` header reflecting it,
/// overwriting anything the handler set, the same way the original's
/// `write_response` (`library/coro_http/coro_http_writer.cpp`) forces
/// `content-length`/`connection` to match the framing it actually used
/// rather than trusting the caller's headers. A chunked body forces
/// `connection: keep-alive` instead, regardless of `keep_alive` — matching
/// `write_chunked`'s unconditional `r.headers.set("connection",
/// "keep-alive")` in the same reference.
pub async fn write_response(
    stream: &mut AsyncStream,
    response: &Response,
    config: &Config,
    keep_alive: bool,
    suppress_body: bool,
) -> Result<(), Error> {
    let mut headers: Headers = response.headers.clone();
    headers.remove("content-length");
    headers.remove("transfer-encoding");

    match &response.body {
        Body::Fixed(bytes) => {
            headers.set("connection", if keep_alive { "keep-alive" } else { "close" });
            headers.set("content-length", bytes.len().to_string());
        }
        Body::Chunked(_) => {
            headers.set("connection", "keep-alive");
            headers.set("transfer-encoding", "chunked");
        }
    }

    let mut head = Vec::new();
    head.extend_from_slice(format!("{} {}\r\n", response.version, response.status).as_bytes());
    for (name, value) in headers.iter() {
        head.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
    }
    head.extend_from_slice(b"\r\n");
    stream.write_all(&head).await?;

    if suppress_body {
        return Ok(());
    }

    match &response.body {
        Body::Fixed(bytes) => {
            if !bytes.is_empty() {
                stream.write_all(bytes).await?;
            }
        }
        Body::Chunked(body) => {
            let read_block = config.read_block.max(1);
            for chunk in body.chunks(read_block) {
                stream.write_all(format!("{:x}\r\n", chunk.len()).as_bytes()).await?;
                stream.write_all(chunk).await?;
                stream.write_all(b"\r\n").await?;
            }
            stream.write_all(b"0\r\n\r\n").await?;
        }
    }

    Ok(())
}
