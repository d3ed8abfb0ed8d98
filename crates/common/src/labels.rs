//! Metric label helpers that keep series cardinality bounded.

/// Collapse identifier-like path segments into placeholders.
///
/// A segment is replaced only when it matches as a whole:
/// - all ASCII digits → `{id}`
/// - 36 characters of hex digits and dashes → `{uuid}`
/// - 32 hex digits → `{hash}`
///
/// `"/records/456/reviews"` → `"/records/{id}/reviews"`.
pub fn normalize_route(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if is_numeric_id(segment) {
                "{id}"
            } else if is_uuid_like(segment) {
                "{uuid}"
            } else if is_hash_like(segment) {
                "{hash}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Map an HTTP status code to its class, e.g. `404` → `"4xx"`.
pub fn error_class(status: u16) -> String {
    format!("{}xx", status / 100)
}

fn is_numeric_id(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn is_uuid_like(segment: &str) -> bool {
    segment.len() == 36
        && segment
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f' | b'-'))
}

fn is_hash_like(segment: &str) -> bool {
    segment.len() == 32 && segment.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
