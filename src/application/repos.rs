//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::application::pagination::OffsetPage;
use crate::domain::entities::{PostRecord, PostSummaryRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Aggregate state of the post collection, queried per list-read to derive
/// HTTP validators. `max_modified_at` is `None` for an empty collection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectionVersion {
    pub total: u64,
    pub max_modified_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub body: String,
}

/// Partial update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct UpdatePostParams {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub body: Option<String>,
}

/// One post in a full-collection restore. `created_at` is honored when
/// provided so restored archives keep meaningful validator timestamps.
#[derive(Debug, Clone)]
pub struct RestorePostParams {
    pub slug: String,
    pub title: String,
    pub summary: String,
    pub body: String,
    pub created_at: Option<OffsetDateTime>,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Row count plus latest modification instant, in one round trip.
    async fn collection_version(&self) -> Result<CollectionVersion, RepoError>;

    /// One page of summaries ordered by modification time descending.
    async fn list_page(&self, page: OffsetPage) -> Result<Vec<PostSummaryRecord>, RepoError>;

    /// Every post with full bodies, newest first. Backup path only.
    async fn list_all(&self) -> Result<Vec<PostRecord>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(
        &self,
        slug: &str,
        params: UpdatePostParams,
    ) -> Result<PostRecord, RepoError>;

    async fn delete_post(&self, slug: &str) -> Result<(), RepoError>;

    /// Replace the whole collection in one transaction; returns the number
    /// of posts written.
    async fn replace_all(&self, posts: Vec<RestorePostParams>) -> Result<u64, RepoError>;
}
