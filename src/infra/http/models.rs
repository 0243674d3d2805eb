//! Request/response bodies and header extraction for the blog API.

use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE, IF_MODIFIED_SINCE, IF_NONE_MATCH};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::application::conditional::ConditionalHeaders;
use crate::cache::IdentityHint;

#[derive(Debug, Deserialize)]
pub struct PostListQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PostCreateRequest {
    pub title: String,
    pub summary: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct PostUpdateRequest {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RestoreRequestItem {
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub body: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct RestoreResponse {
    pub ok: bool,
    pub count: u64,
}

/// Pull the caller identity from `Authorization` (preferred) or `Cookie`.
/// The raw value is hashed immediately and used only to segment cache keys.
pub fn identity_hint_from(headers: &HeaderMap) -> Option<IdentityHint> {
    headers
        .get(AUTHORIZATION)
        .or_else(|| headers.get(COOKIE))
        .and_then(|value| value.to_str().ok())
        .map(IdentityHint::new)
}

/// Decode the conditional request headers; undecodable values count as
/// absent, so a garbled validator falls back to an unconditional request.
pub fn conditional_from(headers: &HeaderMap) -> ConditionalHeaders {
    let header_string = |name| {
        headers
            .get(name)
            .and_then(|value: &axum::http::HeaderValue| value.to_str().ok())
            .map(str::to_string)
    };
    ConditionalHeaders {
        if_none_match: header_string(IF_NONE_MATCH),
        if_modified_since: header_string(IF_MODIFIED_SINCE),
    }
}
