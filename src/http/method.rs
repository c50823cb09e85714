use std::fmt;
use std::str::FromStr;

/// An HTTP request method: one of the seven verbs this crate recognizes.
/// Unlike the original's `parse_http_method` fallback, an unrecognized
/// token is rejected rather than carried through as a method — matching
/// `is_invalid_method`'s reject-and-throw path in the C++ reference
/// (`library/http/http_request.cpp`), and spec.md §3's invariant that a
/// successfully parsed request always has `method != UNKNOWN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
        }
    }

    /// True for methods whose response must never carry a body
    /// (`HEAD`), used by the response writer to skip writing one even if
    /// the handler supplied it.
    pub fn suppresses_response_body(&self) -> bool {
        matches!(self, Method::Head)
    }
}

/// The request-line token didn't match one of the seven known verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownMethod;

impl fmt::Display for UnknownMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized HTTP method")
    }
}

impl std::error::Error for UnknownMethod {}

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Method, Self::Err> {
        Ok(match s {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "HEAD" => Method::Head,
            "OPTIONS" => Method::Options,
            "PATCH" => Method::Patch,
            _ => return Err(UnknownMethod),
        })
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
