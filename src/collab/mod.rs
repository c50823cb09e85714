//! Collaborator interfaces that stay outside the HTTP core on purpose: the
//! core hands a request body to these as raw bytes and never calls into
//! them itself. Form/JSON body ingestion lived folded into a single rich
//! request reader in the C++ reference this crate draws from
//! (`json_helper/json_to_http.*`, `example/http_example/http_request.hpp`);
//! here the core stays the bare reader and this module exposes the richer
//! behavior as an explicit, opt-in trait instead of a second parser.

mod form;

pub use form::{FormError, UrlEncodedForm};

/// `mapping[name -> list[value]]` — a single key can legitimately repeat
/// (an HTML form with several `<input name="tag">` fields, a multi-value
/// query string), so collapsing to one value per name would silently drop
/// data.
pub type QueryMap = indexmap::IndexMap<String, Vec<String>>;

/// Decodes a raw request body into a [`QueryMap`] given its declared
/// `Content-Type`.
pub trait BodyDecoder {
    fn decode(&self, content_type: &str, body: &[u8]) -> Result<QueryMap, FormError>;
}
