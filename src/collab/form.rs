use std::fmt;

use super::{BodyDecoder, QueryMap};

/// Errors a [`BodyDecoder`] implementation can report.
#[derive(Debug)]
pub enum FormError {
    /// `Content-Type: multipart/form-data` with no `boundary=` parameter.
    MissingBoundary,
    /// A percent-encoded byte sequence was not valid UTF-8.
    InvalidEncoding,
    /// This decoder doesn't understand the given `Content-Type` at all.
    UnsupportedContentType,
    /// JSON ingestion is not implemented by this collaborator (see
    /// [`super`]'s module docs): no JSON crate is part of this crate's
    /// dependency stack, so this is a permanent "not supported", not a
    /// parse failure.
    Json,
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::MissingBoundary => write!(f, "multipart/form-data body with no boundary parameter"),
            FormError::InvalidEncoding => write!(f, "invalid percent-encoding in form body"),
            FormError::UnsupportedContentType => write!(f, "unsupported content-type for form decoding"),
            FormError::Json => write!(f, "JSON body ingestion is not supported by this collaborator"),
        }
    }
}

impl std::error::Error for FormError {}

/// Decodes `application/x-www-form-urlencoded` bodies, the one body
/// format the original's collaborator path actually parsed end to end.
/// `multipart/form-data` is recognized only far enough to report
/// [`FormError::MissingBoundary`] when appropriate; `application/json`
/// always reports [`FormError::Json`] (see that variant's docs).
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlEncodedForm;

impl BodyDecoder for UrlEncodedForm {
    fn decode(&self, content_type: &str, body: &[u8]) -> Result<QueryMap, FormError> {
        let media_type = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        match media_type.as_str() {
            "application/x-www-form-urlencoded" => decode_urlencoded(body),
            "multipart/form-data" => {
                if has_boundary(content_type) {
                    // The core's body bytes are the raw, framed body; a
                    // real multipart split is beyond what this thin,
                    // deliberately minimal collaborator implements.
                    Err(FormError::UnsupportedContentType)
                } else {
                    Err(FormError::MissingBoundary)
                }
            }
            "application/json" => Err(FormError::Json),
            _ => Err(FormError::UnsupportedContentType),
        }
    }
}

fn has_boundary(content_type: &str) -> bool {
    content_type
        .split(';')
        .skip(1)
        .any(|param| param.trim().to_ascii_lowercase().starts_with("boundary="))
}

fn decode_urlencoded(body: &[u8]) -> Result<QueryMap, FormError> {
    let mut out = QueryMap::new();
    if body.is_empty() {
        return Ok(out);
    }

    for pair in body.split(|&b| b == b'&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = match pair.iter().position(|&b| b == b'=') {
            Some(idx) => (&pair[..idx], &pair[idx + 1..]),
            None => (pair, &pair[0..0]),
        };
        let key = percent_decode(key)?;
        let value = percent_decode(value)?;
        out.entry(key).or_default().push(value);
    }

    Ok(out)
}

/// Decodes `%XX` escapes and `+` as space, per
/// `application/x-www-form-urlencoded`'s grammar.
fn percent_decode(input: &[u8]) -> Result<String, FormError> {
    let mut out = Vec::with_capacity(input.len());
    let mut iter = input.iter().copied();

    while let Some(byte) = iter.next() {
        match byte {
            b'+' => out.push(b' '),
            b'%' => {
                let hi = iter.next().ok_or(FormError::InvalidEncoding)?;
                let lo = iter.next().ok_or(FormError::InvalidEncoding)?;
                let hex = [hi, lo];
                let hex_str = std::str::from_utf8(&hex).map_err(|_| FormError::InvalidEncoding)?;
                let value = u8::from_str_radix(hex_str, 16).map_err(|_| FormError::InvalidEncoding)?;
                out.push(value);
            }
            other => out.push(other),
        }
    }

    String::from_utf8(out).map_err(|_| FormError::InvalidEncoding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_simple_pairs() {
        let decoded = UrlEncodedForm.decode(
            "application/x-www-form-urlencoded",
            b"name=Ada+Lovelace&tag=math&tag=computing",
        ).expect("decode");

        assert_eq!(decoded.get("name").map(Vec::as_slice), Some(["Ada Lovelace".to_string()].as_slice()));
        assert_eq!(
            decoded.get("tag").map(Vec::as_slice),
            Some(["math".to_string(), "computing".to_string()].as_slice())
        );
    }

    #[test]
    fn decodes_percent_escapes() {
        let decoded = UrlEncodedForm.decode("application/x-www-form-urlencoded", b"q=a%26b").expect("decode");
        assert_eq!(decoded.get("q").map(Vec::as_slice), Some(["a&b".to_string()].as_slice()));
    }

    #[test]
    fn rejects_multipart_without_boundary() {
        let err = UrlEncodedForm.decode("multipart/form-data", b"").unwrap_err();
        assert!(matches!(err, FormError::MissingBoundary));
    }

    #[test]
    fn json_is_explicitly_unsupported() {
        let err = UrlEncodedForm.decode("application/json", b"{}").unwrap_err();
        assert!(matches!(err, FormError::Json));
    }
}
