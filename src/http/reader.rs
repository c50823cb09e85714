use crate::http::{Config, Error, Headers, Method, Request, Version};
use crate::io::AsyncStream;

/// Reads complete requests off a connection, one at a time.
///
/// Owns the only buffer for the connection: bytes read past the end of one
/// request (the next request, if the peer pipelined) stay in the buffer
/// for the following [`Reader::read_request`] call rather than being
/// discarded. Shaped after the C++ reference's `HttpReader`
/// (`library/coro_http/coro_http_reader.cpp`), whose
/// `read_until_double_crlf`/`read_exact`/`decode_chunked_body` this
/// mirrors, with that one deliberate behavioral change.
pub struct Reader {
    config: Config,
    buf: Vec<u8>,
}

impl Reader {
    pub fn new(config: Config) -> Reader {
        Reader { config, buf: Vec::new() }
    }

    /// Reads and parses the next request from `stream`, blocking
    /// (suspending) until a full request (headers plus, if present, a
    /// fully-decoded body) has arrived.
    pub async fn read_request(&mut self, stream: &mut AsyncStream) -> Result<Request, Error> {
        let header_end = self.read_headers(stream).await?;
        let header_bytes: Vec<u8> = self.buf.drain(..header_end).collect();

        let (method, target, version, mut headers) = parse_start_line_and_headers(&header_bytes, &self.config)?;

        let body = if headers.is_chunked() {
            self.read_chunked_body(stream, &mut headers).await?
        } else {
            match headers.content_length().map_err(|_| Error::InvalidContentLength)? {
                Some(len) => self.read_fixed_body(stream, len).await?,
                None => Vec::new(),
            }
        };

        Ok(Request { method, target, version, headers, body })
    }

    /// Reads until the buffer contains a full header block (ending in
    /// `\r\n\r\n`), returning the number of bytes that block occupies
    /// (including the terminator). Everything after stays buffered.
    async fn read_headers(&mut self, stream: &mut AsyncStream) -> Result<usize, Error> {
        loop {
            // Checked before the delimiter scan: an oversized accumulator is
            // rejected even if it happens to contain a complete header block
            // (e.g. the whole thing arrived in one read). The limit applies
            // to the accumulator's size, not to "no terminator was found yet".
            if self.buf.len() > self.config.max_header_bytes {
                return Err(Error::HeadersTooLarge);
            }
            if let Some(idx) = find_double_crlf(&self.buf) {
                return Ok(idx + 4);
            }
            let had_data = !self.buf.is_empty();
            let n = self.fill(stream).await?;
            if n == 0 {
                return Err(if had_data { Error::StartLine } else { Error::ConnectionClosed });
            }
        }
    }

    async fn read_fixed_body(&mut self, stream: &mut AsyncStream, len: u64) -> Result<Vec<u8>, Error> {
        if len > self.config.max_body_bytes {
            return Err(Error::BodyTooLarge);
        }
        let len = len as usize;
        self.ensure(stream, len).await?;
        Ok(self.buf.drain(..len).collect())
    }

    async fn read_chunked_body(&mut self, stream: &mut AsyncStream, headers: &mut Headers) -> Result<Vec<u8>, Error> {
        let mut body = Vec::new();

        loop {
            let line_end = self.read_line(stream).await?;
            let line: Vec<u8> = self.buf.drain(..line_end).collect();
            let line = trim_crlf(&line);

            let size_token = match line.iter().position(|&b| b == b';') {
                Some(idx) => &line[..idx],
                None => line,
            };
            let size_str = std::str::from_utf8(size_token).map_err(|_| Error::Chunk)?.trim();
            let size = usize::from_str_radix(size_str, 16).map_err(|_| Error::Chunk)?;

            if size == 0 {
                self.read_trailers(stream, headers).await?;
                break;
            }

            if body.len() as u64 + size as u64 > self.config.max_body_bytes {
                return Err(Error::BodyTooLarge);
            }

            self.ensure(stream, size + 2).await?;
            let chunk: Vec<u8> = self.buf.drain(..size).collect();
            let terminator: Vec<u8> = self.buf.drain(..2).collect();
            if terminator != b"\r\n" {
                return Err(Error::Chunk);
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }

    /// Reads trailer lines until the blank line terminating the chunked
    /// body, folding any trailer headers into `headers` the same way the
    /// header section is parsed. A malformed terminator is a `Chunk`
    /// error, not a silent desync.
    async fn read_trailers(&mut self, stream: &mut AsyncStream, headers: &mut Headers) -> Result<(), Error> {
        loop {
            let line_end = self.read_line(stream).await?;
            let line: Vec<u8> = self.buf.drain(..line_end).collect();
            let line = trim_crlf(&line);
            if line.is_empty() {
                return Ok(());
            }
            if let Some(idx) = line.iter().position(|&b| b == b':') {
                let name = std::str::from_utf8(&line[..idx]).map_err(|_| Error::Chunk)?.trim();
                let value = std::str::from_utf8(&line[idx + 1..]).map_err(|_| Error::Chunk)?.trim();
                if !name.is_empty() {
                    headers.append(name, value);
                }
            }
            // a trailer line with no colon is silently dropped, same as a
            // malformed header line during the main header parse.
        }
    }

    /// Ensures the buffer holds at least one full `\r\n`-terminated line,
    /// returning its length including the terminator.
    async fn read_line(&mut self, stream: &mut AsyncStream) -> Result<usize, Error> {
        loop {
            if self.buf.len() > self.config.max_header_bytes {
                return Err(Error::Chunk);
            }
            if let Some(idx) = find_crlf(&self.buf) {
                return Ok(idx + 2);
            }
            if self.fill(stream).await? == 0 {
                return Err(Error::ConnectionClosed);
            }
        }
    }

    /// Ensures the buffer holds at least `want` bytes.
    async fn ensure(&mut self, stream: &mut AsyncStream, want: usize) -> Result<(), Error> {
        while self.buf.len() < want {
            if self.fill(stream).await? == 0 {
                return Err(Error::ConnectionClosed);
            }
        }
        Ok(())
    }

    async fn fill(&mut self, stream: &mut AsyncStream) -> Result<usize, Error> {
        let mut block = vec![0u8; self.config.read_block];
        let n = stream.read(&mut block).await?;
        self.buf.extend_from_slice(&block[..n]);
        Ok(n)
    }
}

fn trim_crlf(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r\n".as_slice())
        .or_else(|| line.strip_suffix(b"\n"))
        .unwrap_or(line)
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

fn find_double_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn parse_start_line_and_headers(block: &[u8], config: &Config) -> Result<(Method, String, Version, Headers), Error> {
    let end = find_crlf(block).ok_or(Error::StartLine)?;
    let start_line = &block[..end];
    if start_line.len() > config.max_start_line {
        return Err(Error::StartLine);
    }

    let start_line = std::str::from_utf8(start_line).map_err(|_| Error::StartLine)?;
    let mut parts = start_line.split(' ').filter(|s| !s.is_empty());
    let method = parts.next().ok_or(Error::StartLine)?;
    let target = parts.next().ok_or(Error::StartLine)?;
    let version = parts.next().ok_or(Error::StartLine)?;
    if parts.next().is_some() {
        return Err(Error::StartLine);
    }

    let version = Version::parse(version);
    if version == Version::Unknown {
        return Err(Error::UnsupportedVersion);
    }

    let method: Method = method.parse().map_err(|_| Error::UnknownMethod)?;

    let rest = &block[end + 2..];
    let headers = parse_headers(rest, config)?;

    Ok((method, target.to_owned(), version, headers))
}

fn parse_headers(block: &[u8], config: &Config) -> Result<Headers, Error> {
    let mut headers = Headers::new();
    let mut folded: Vec<String> = Vec::new();

    for raw_line in block.split(|&b| b == b'\n') {
        let raw_line = raw_line.strip_suffix(b"\r").unwrap_or(raw_line);
        if raw_line.is_empty() {
            continue;
        }

        let Ok(text) = std::str::from_utf8(raw_line) else {
            // a header line with invalid UTF-8 is silently dropped rather
            // than failing the whole request, the same tolerant handling
            // the original gives a header line with no colon.
            continue;
        };

        if (text.starts_with(' ') || text.starts_with('\t')) && !folded.is_empty() {
            let last = folded.last_mut().expect("checked non-empty above");
            last.push(' ');
            last.push_str(text.trim());
        } else {
            folded.push(text.to_owned());
        }
    }

    if folded.len() > config.max_header_lines {
        return Err(Error::HeadersTooLarge);
    }

    for line in folded {
        match line.find(':') {
            Some(idx) => {
                let name = line[..idx].trim();
                let value = line[idx + 1..].trim();
                if name.is_empty() {
                    continue;
                }
                headers.append(name, value);
            }
            None => continue,
        }
    }

    Ok(headers)
}
