//! IRI handling at the HTTP boundary. The store only ever sees serialized strings.

use crate::error::{Result, UrlShareError};
use percent_encoding::percent_decode_str;
use url::{form_urlencoded, Url};

/// Parse an admin-supplied target into canonical absolute form.
///
/// Absolute IRIs are kept as they are (modulo normalization); relative
/// references are resolved against `base`.
pub fn canonical_target(raw: &str, base: &Url) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(UrlShareError::InvalidInput("toIri is required".into()));
    }
    base.join(raw)
        .map_err(|e| UrlShareError::InvalidInput(format!("toIri {raw:?} is not a valid IRI: {e}")))
}

/// Re-parse a stored target. Failure means the persisted data is bad, not the request.
pub fn parse_stored(key: &str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|source| UrlShareError::MalformedTarget {
        key: key.to_string(),
        value: value.to_string(),
        source,
    })
}

/// Append every pair of `request_query` to the target's own query.
///
/// Existing pairs are left untouched, so a repeated name ends up with both values.
pub fn merge_query(target: &mut Url, request_query: Option<&str>) {
    let Some(query) = request_query else {
        return;
    };
    let pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    if pairs.is_empty() {
        return;
    }
    target.query_pairs_mut().extend_pairs(pairs);
}

/// The key used for short addressing: the last non-empty path segment,
/// percent-decoded so it matches keys stored from form input.
pub fn short_key(path: &str) -> Option<String> {
    let segment = path.rsplit('/').find(|segment| !segment.is_empty())?;
    percent_decode_str(segment)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}
