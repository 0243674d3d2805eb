//! Domain entities mirrored from persistent storage.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A blog post as stored in the durable store.
///
/// The slug doubles as the public identifier; timestamps are always UTC.
/// Records round-trip through the byte-cache as JSON, so serialization must
/// stay symmetric with deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The list-endpoint projection of a post: everything except the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummaryRecord {
    pub slug: String,
    pub title: String,
    pub summary: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<PostRecord> for PostSummaryRecord {
    fn from(post: PostRecord) -> Self {
        Self {
            slug: post.slug,
            title: post.title,
            summary: post.summary,
            created_at: post.created_at,
        }
    }
}
