use super::{Headers, Status, Version};

/// A response a handler builds and hands back to the connection driver.
/// Body framing (`Content-Length` vs `chunked`) is decided by
/// [`super::writer`] at write time, not here — the response only says
/// whether the caller wants chunking, via [`Body::Chunked`].
#[derive(Debug, Clone)]
pub struct Response {
    pub version: Version,
    pub status: Status,
    pub headers: Headers,
    pub body: Body,
}

/// The response body, or a request to stream it chunked.
#[derive(Debug, Clone)]
pub enum Body {
    Fixed(Vec<u8>),
    /// Written using `Transfer-Encoding: chunked`. The writer slices this
    /// into `Config::read_block`-sized chunks itself (spec.md §4.7); the
    /// handler hands over the whole body, not pre-sliced pieces.
    Chunked(Vec<u8>),
}

impl Response {
    pub fn new(status: Status) -> Response {
        Response {
            version: Version::Http11,
            status,
            headers: Headers::new(),
            body: Body::Fixed(Vec::new()),
        }
    }

    pub fn with_body(status: Status, body: impl Into<Vec<u8>>) -> Response {
        let mut response = Response::new(status);
        response.body = Body::Fixed(body.into());
        response
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Response {
        self.headers.set(name, value);
        self
    }
}
