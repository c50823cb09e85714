use std::fmt;

/// The HTTP version on a request or status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    Http10,
    Http11,
    Unknown,
}

impl Version {
    pub fn as_str(self) -> &'static str {
        match self {
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
            Version::Unknown => "HTTP/?.?",
        }
    }

    pub fn parse(s: &str) -> Version {
        match s {
            "HTTP/1.0" => Version::Http10,
            "HTTP/1.1" => Version::Http11,
            _ => Version::Unknown,
        }
    }

    /// Whether this version defaults to a persistent connection absent an
    /// explicit `Connection` header.
    pub fn keep_alive_by_default(self) -> bool {
        matches!(self, Version::Http11)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
