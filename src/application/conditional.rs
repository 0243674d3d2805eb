//! HTTP conditional-request validators for the post collection.
//!
//! A list response is versioned by `(total rows, max modification instant)`.
//! That pair maps to a weak ETag and an RFC 1123 `Last-Modified` date, and a
//! request whose `If-None-Match` / `If-Modified-Since` reproduce either value
//! byte-for-byte is answered 304. Comparison is exact string equality:
//! clients replay our values verbatim, so anything more lenient only adds
//! ways to be wrong.

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::application::repos::CollectionVersion;

/// IMF-fixdate (RFC 1123) in UTC, e.g. `Mon, 15 Jan 2024 12:30:45 GMT`.
const IMF_FIXDATE: &[BorrowedFormatItem<'static>] = format_description!(
    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);

/// Client-supplied conditional headers, already decoded to strings.
/// Malformed header values are treated as absent by the extraction layer.
#[derive(Debug, Clone, Default)]
pub struct ConditionalHeaders {
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
}

impl ConditionalHeaders {
    pub fn is_empty(&self) -> bool {
        self.if_none_match.is_none() && self.if_modified_since.is_none()
    }
}

/// Freshly computed validators for one collection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validators {
    pub etag: String,
    pub last_modified_http: Option<String>,
}

impl Validators {
    /// Derive validators from the collection's aggregate state.
    ///
    /// The ETag timestamp component is 0 for an empty collection; the
    /// `Last-Modified` header is omitted entirely in that case. A timestamp
    /// that cannot be formatted falls back to an absent header rather than
    /// failing the request.
    pub fn from_version(version: &CollectionVersion) -> Self {
        let unix_seconds = version
            .max_modified_at
            .map(OffsetDateTime::unix_timestamp)
            .unwrap_or(0);
        let etag = format!("W/\"{}-{}\"", version.total, unix_seconds);
        let last_modified_http = version.max_modified_at.and_then(format_http_date);
        Self {
            etag,
            last_modified_http,
        }
    }

    /// True iff the request's validators match the current state:
    /// `If-None-Match` equals the ETag, or `Last-Modified` is present and
    /// `If-Modified-Since` equals it.
    pub fn is_not_modified(&self, conditional: &ConditionalHeaders) -> bool {
        if conditional.if_none_match.as_deref() == Some(self.etag.as_str()) {
            return true;
        }
        match (&self.last_modified_http, &conditional.if_modified_since) {
            (Some(current), Some(requested)) => current == requested,
            _ => false,
        }
    }
}

fn format_http_date(instant: OffsetDateTime) -> Option<String> {
    instant.to_offset(UtcOffset::UTC).format(IMF_FIXDATE).ok()
}
