use indexmap::IndexMap;
use std::fmt;

/// A case-insensitive, insertion-ordered header map.
///
/// Names are stored lowercased (the wire never distinguishes `Content-Type`
/// from `content-type`, so there is no reason to keep the original casing
/// around); [`IndexMap`] preserves first-seen order for when headers are
/// re-serialized. Grounded on the original's `HttpHeaders`
/// (`library/http/http_headers.hpp`), whose custom hash/eq functors did
/// the same case folding by hand.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    entries: IndexMap<String, String>,
}

impl Headers {
    pub fn new() -> Headers {
        Headers { entries: IndexMap::new() }
    }

    /// Inserts `value` under `name`, replacing whatever was there.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.entries.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Appends `value` to `name`, comma-joining with any existing value —
    /// the tolerant duplicate-header handling the request reader relies
    /// on (a repeated header is equivalent to one comma-separated value
    /// per RFC 7230 §3.2.2).
    pub fn append(&mut self, name: &str, value: &str) {
        let key = name.to_ascii_lowercase();
        match self.entries.get_mut(&key) {
            Some(existing) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            None => {
                self.entries.insert(key, value.to_owned());
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.shift_remove(&name.to_ascii_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses the `Content-Length` header, if present. A non-numeric
    /// value is a hard parse error rather than being ignored.
    pub fn content_length(&self) -> Result<Option<u64>, ()> {
        match self.get("content-length") {
            None => Ok(None),
            Some(value) => value.trim().parse::<u64>().map(Some).map_err(|_| ()),
        }
    }

    /// True if `Transfer-Encoding` names `chunked` as (or among) its
    /// codings. Per RFC 7230, `chunked` must be the last coding listed;
    /// this crate only supports `chunked` itself, so anything else listed
    /// alongside it is rejected by the reader, not here.
    pub fn is_chunked(&self) -> bool {
        self.get("transfer-encoding")
            .map(|v| v.split(',').any(|tok| tok.trim().eq_ignore_ascii_case("chunked")))
            .unwrap_or(false)
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.iter() {
            writeln!(f, "{name}: {value}")?;
        }
        Ok(())
    }
}
