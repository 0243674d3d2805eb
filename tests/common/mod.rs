//! Shared fixtures: an in-memory post repository and cache backends with
//! controllable failure modes.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use vetrina::application::pagination::OffsetPage;
use vetrina::application::posts::PostService;
use vetrina::application::repos::{
    CollectionVersion, CreatePostParams, PostsRepo, PostsWriteRepo, RepoError, RestorePostParams,
    UpdatePostParams,
};
use vetrina::cache::{ByteCache, CacheBackend, CacheConfig, CacheError, MemoryBackend};
use vetrina::domain::entities::{PostRecord, PostSummaryRecord};

/// In-memory stand-in for the Postgres repositories, with query counters so
/// tests can observe which paths hit the store.
#[derive(Default)]
pub struct MemoryPostsRepo {
    posts: Mutex<Vec<PostRecord>>,
    pub version_queries: AtomicUsize,
    pub page_queries: AtomicUsize,
    pub find_queries: AtomicUsize,
}

impl MemoryPostsRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_directly(&self, post: PostRecord) {
        self.posts.lock().await.push(post);
    }

    pub fn version_query_count(&self) -> usize {
        self.version_queries.load(Ordering::SeqCst)
    }

    pub fn page_query_count(&self) -> usize {
        self.page_queries.load(Ordering::SeqCst)
    }

    pub fn find_query_count(&self) -> usize {
        self.find_queries.load(Ordering::SeqCst)
    }
}

pub fn sample_post(slug: &str) -> PostRecord {
    let now = OffsetDateTime::now_utc();
    PostRecord {
        slug: slug.to_string(),
        title: format!("Title for {slug}"),
        summary: format!("Summary for {slug}"),
        body: format!("Body for {slug}"),
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl PostsRepo for MemoryPostsRepo {
    async fn collection_version(&self) -> Result<CollectionVersion, RepoError> {
        self.version_queries.fetch_add(1, Ordering::SeqCst);
        let posts = self.posts.lock().await;
        Ok(CollectionVersion {
            total: posts.len() as u64,
            max_modified_at: posts.iter().map(|post| post.updated_at).max(),
        })
    }

    async fn list_page(&self, page: OffsetPage) -> Result<Vec<PostSummaryRecord>, RepoError> {
        self.page_queries.fetch_add(1, Ordering::SeqCst);
        let posts = self.posts.lock().await;
        let mut ordered: Vec<PostRecord> = posts.clone();
        ordered.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(ordered
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .map(PostSummaryRecord::from)
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<PostRecord>, RepoError> {
        let posts = self.posts.lock().await;
        let mut ordered = posts.clone();
        ordered.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(ordered)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError> {
        self.find_queries.fetch_add(1, Ordering::SeqCst);
        let posts = self.posts.lock().await;
        Ok(posts.iter().find(|post| post.slug == slug).cloned())
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryPostsRepo {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut posts = self.posts.lock().await;
        if posts.iter().any(|post| post.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: "blog_posts_pkey".to_string(),
            });
        }
        let now = OffsetDateTime::now_utc();
        let post = PostRecord {
            slug: params.slug,
            title: params.title,
            summary: params.summary,
            body: params.body,
            created_at: now,
            updated_at: now,
        };
        posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(
        &self,
        slug: &str,
        params: UpdatePostParams,
    ) -> Result<PostRecord, RepoError> {
        let mut posts = self.posts.lock().await;
        let post = posts
            .iter_mut()
            .find(|post| post.slug == slug)
            .ok_or(RepoError::NotFound)?;
        if let Some(title) = params.title {
            post.title = title;
        }
        if let Some(summary) = params.summary {
            post.summary = summary;
        }
        if let Some(body) = params.body {
            post.body = body;
        }
        post.updated_at = OffsetDateTime::now_utc();
        Ok(post.clone())
    }

    async fn delete_post(&self, slug: &str) -> Result<(), RepoError> {
        let mut posts = self.posts.lock().await;
        let before = posts.len();
        posts.retain(|post| post.slug != slug);
        if posts.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn replace_all(&self, incoming: Vec<RestorePostParams>) -> Result<u64, RepoError> {
        let mut posts = self.posts.lock().await;
        let now = OffsetDateTime::now_utc();
        *posts = incoming
            .into_iter()
            .map(|params| PostRecord {
                slug: params.slug,
                title: params.title,
                summary: params.summary,
                body: params.body,
                created_at: params.created_at.unwrap_or(now),
                updated_at: params.created_at.unwrap_or(now),
            })
            .collect();
        Ok(posts.len() as u64)
    }
}

/// A backend where every operation fails, for fail-open assertions.
pub struct FailingBackend;

#[async_trait]
impl CacheBackend for FailingBackend {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Err(CacheError::backend("backend unavailable"))
    }

    async fn set(&self, _key: &str, _value: &[u8], _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::backend("backend unavailable"))
    }

    async fn delete_by_prefix(&self, _prefix: &str) -> Result<u64, CacheError> {
        Err(CacheError::backend("backend unavailable"))
    }
}

pub fn test_cache_config() -> CacheConfig {
    CacheConfig::default()
}

pub fn memory_cache() -> Arc<ByteCache> {
    Arc::new(ByteCache::with_backend(
        Arc::new(MemoryBackend::new()),
        Duration::from_secs(1),
    ))
}

pub fn failing_cache() -> Arc<ByteCache> {
    Arc::new(ByteCache::with_backend(
        Arc::new(FailingBackend),
        Duration::from_secs(1),
    ))
}

pub fn disabled_cache() -> Arc<ByteCache> {
    Arc::new(ByteCache::disabled())
}

pub fn service_with(repo: Arc<MemoryPostsRepo>, cache: Arc<ByteCache>) -> PostService {
    PostService::new(repo.clone(), repo, cache, test_cache_config())
}
