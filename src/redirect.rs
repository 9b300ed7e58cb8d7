//! Gateway redirect receiver
//!
//! The payment provider sends the browser back to the return page with a
//! handful of free-text query parameters. They are parsed exactly once into
//! an immutable [`RedirectParameters`] record. Parsing never fails: a
//! malformed or absent query string yields all-empty fields and the
//! reconciler degrades to plain backend polling.

use serde::Serialize;
use url::form_urlencoded;

/// Parameters carried on the inbound redirect URL, canonicalized.
///
/// All fields are trimmed; absent parameters are empty strings.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RedirectParameters {
    /// Primary transaction identifier, cleaned of provider-concatenated
    /// garbage. Falls back to `reference_number` when absent.
    pub reference: String,
    /// Alternate identifier some provider responses use instead of
    /// `reference`. Forwarded to the backend as received.
    pub reference_number: String,
    /// Gateway session token, forwarded opaquely.
    pub session_id: String,
    /// Provider-native result code. The only field consulted for the
    /// initial outcome hint.
    pub response_code: String,
    /// Optional provider message, used as a fallback display string.
    pub message: String,
}

impl RedirectParameters {
    /// Parse a raw query string (with or without a leading `?`).
    ///
    /// Accepts the alias spellings seen in the wild: `sessionid` for
    /// `sessionId` and `responsecode` for `responseCode`. Later duplicates
    /// do not overwrite an already-captured value.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);

        let mut params = RedirectParameters::default();
        let mut raw_reference = String::new();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.to_lowercase().as_str() {
                "reference" if raw_reference.is_empty() => raw_reference = value.to_string(),
                "referencenumber" if params.reference_number.is_empty() => {
                    params.reference_number = value.to_string()
                }
                "sessionid" if params.session_id.is_empty() => {
                    params.session_id = value.to_string()
                }
                "responsecode" if params.response_code.is_empty() => {
                    params.response_code = value.to_string()
                }
                "message" if params.message.is_empty() => params.message = value.to_string(),
                _ => {}
            }
        }

        let cleaned = clean_ref(&raw_reference);
        params.reference = if cleaned.is_empty() {
            clean_ref(&params.reference_number)
        } else {
            cleaned
        };
        params
    }

    /// Parse the query component of a full URL. A URL with no query (or one
    /// that fails to parse at all) yields empty parameters.
    pub fn from_url(url: &str) -> Self {
        match url::Url::parse(url) {
            Ok(parsed) => Self::from_query(parsed.query().unwrap_or("")),
            Err(_) => Self::from_query(url),
        }
    }
}

/// Truncate a reference at the first `?` or `&`.
///
/// Some provider redirects concatenate their own query string onto the
/// reference value without encoding it; everything after the first
/// separator is theirs, not ours. Idempotent.
pub fn clean_ref(reference: &str) -> String {
    let reference = reference.trim();
    let end = reference
        .find(['?', '&'])
        .unwrap_or(reference.len());
    reference[..end].to_string()
}
