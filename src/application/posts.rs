//! Post read/write service: the cache-aside orchestration core.
//!
//! Reads compose the key builder, the byte-cache, the conditional validators,
//! and the repositories; writes go straight to the store and then clear the
//! whole blog namespace. Cache failures of any kind degrade to the uncached
//! path and are only logged and counted.

use std::sync::Arc;

use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::application::conditional::{ConditionalHeaders, Validators};
use crate::application::pagination::{CONTENT_RANGE_UNIT, OffsetPage, content_range};
use crate::application::repos::{
    CreatePostParams, PostsRepo, PostsWriteRepo, RepoError, RestorePostParams, UpdatePostParams,
};
use crate::cache::{ByteCache, CacheConfig, CacheKeys, IdentityHint};
use crate::domain::entities::{PostRecord, PostSummaryRecord};
use crate::domain::posts::derive_slug;

const SOURCE: &str = "application::posts";

/// One page of the list endpoint, either fresh from the store or replayed
/// from the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage {
    pub items: Vec<PostSummaryRecord>,
    pub total: u64,
    pub content_range: String,
}

/// Outcome of a list read.
///
/// `Cached` intentionally carries no validators: a cache hit skips the store
/// query that validators are derived from, so a matching conditional request
/// served from cache still answers 200. Conditional requests never take the
/// cache path in the first place (see [`PostService::list_page`]).
#[derive(Debug, Clone, PartialEq)]
pub enum ListOutcome {
    NotModified(Validators),
    Fresh {
        page: ListPage,
        validators: Validators,
    },
    Cached(ListPage),
}

/// Typed envelope for cached list pages. Deserialization failures surface as
/// `CacheError::Payload` and are treated as misses by the orchestrator.
#[derive(Debug, Serialize, Deserialize)]
struct CachedListPage {
    items: Vec<PostSummaryRecord>,
    total: u64,
    content_range: String,
}

/// Command for creating a post; the slug is derived from the title.
#[derive(Debug, Clone)]
pub struct CreatePostCommand {
    pub title: String,
    pub summary: String,
    pub body: String,
}

pub struct PostService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    cache: Arc<ByteCache>,
    cache_config: CacheConfig,
    keys: CacheKeys,
}

impl PostService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        cache: Arc<ByteCache>,
        cache_config: CacheConfig,
    ) -> Self {
        let keys = CacheKeys::new(cache_config.key_prefix.clone());
        Self {
            reader,
            writer,
            cache,
            cache_config,
            keys,
        }
    }

    /// Serve one list page.
    ///
    /// Requests carrying conditional headers bypass the cache entirely so a
    /// 304 is always judged against the live store, never against a stale
    /// cached payload. Everything else tries the cache first; on a miss the
    /// store is queried and validators are computed. If the request's
    /// validators already match, the read short-circuits to 304 *without*
    /// populating (that response was never fully computed); otherwise the
    /// page is cached and returned fresh.
    pub async fn list_page(
        &self,
        page: OffsetPage,
        conditional: &ConditionalHeaders,
        identity: Option<&IdentityHint>,
    ) -> Result<ListOutcome, RepoError> {
        let key = self.keys.blog_list(page.page, page.page_size, identity);

        if conditional.is_empty() {
            match self.cache.get_json::<CachedListPage>(&key).await {
                Ok(Some(cached)) => {
                    counter!("vetrina_cache_hit_total", "namespace" => "list").increment(1);
                    return Ok(ListOutcome::Cached(ListPage {
                        items: cached.items,
                        total: cached.total,
                        content_range: cached.content_range,
                    }));
                }
                Ok(None) => {
                    counter!("vetrina_cache_miss_total", "namespace" => "list").increment(1);
                }
                Err(err) => {
                    counter!("vetrina_cache_error_total", "namespace" => "list").increment(1);
                    debug!(target = SOURCE, key = %key, error = %err, "cache read failed, treating as miss");
                }
            }
        }

        let version = self.reader.collection_version().await?;
        let validators = Validators::from_version(&version);
        if validators.is_not_modified(conditional) {
            return Ok(ListOutcome::NotModified(validators));
        }

        let items = self.reader.list_page(page).await?;
        let list_page = ListPage {
            content_range: content_range(
                CONTENT_RANGE_UNIT,
                page.offset(),
                items.len(),
                version.total,
            ),
            total: version.total,
            items,
        };

        let envelope = CachedListPage {
            items: list_page.items.clone(),
            total: list_page.total,
            content_range: list_page.content_range.clone(),
        };
        let ttl = self.cache_config.ttl_for(identity);
        if let Err(err) = self.cache.set_json(&key, &envelope, ttl).await {
            counter!("vetrina_cache_error_total", "namespace" => "list").increment(1);
            debug!(target = SOURCE, key = %key, error = %err, "cache populate failed");
        }

        Ok(ListOutcome::Fresh {
            page: list_page,
            validators,
        })
    }

    /// Fetch one post, cache-aside by slug and identity hint.
    ///
    /// Absence is a `NotFound` error and is never cached.
    pub async fn get_post(
        &self,
        slug: &str,
        identity: Option<&IdentityHint>,
    ) -> Result<PostRecord, RepoError> {
        let key = self.keys.blog_post(slug, identity);

        match self.cache.get_json::<PostRecord>(&key).await {
            Ok(Some(post)) => {
                counter!("vetrina_cache_hit_total", "namespace" => "post").increment(1);
                return Ok(post);
            }
            Ok(None) => {
                counter!("vetrina_cache_miss_total", "namespace" => "post").increment(1);
            }
            Err(err) => {
                counter!("vetrina_cache_error_total", "namespace" => "post").increment(1);
                debug!(target = SOURCE, key = %key, error = %err, "cache read failed, treating as miss");
            }
        }

        let post = self
            .reader
            .find_by_slug(slug)
            .await?
            .ok_or(RepoError::NotFound)?;

        let ttl = self.cache_config.ttl_for(identity);
        if let Err(err) = self.cache.set_json(&key, &post, ttl).await {
            counter!("vetrina_cache_error_total", "namespace" => "post").increment(1);
            debug!(target = SOURCE, key = %key, error = %err, "cache populate failed");
        }

        Ok(post)
    }

    /// Every post with full bodies, newest first. Bypasses the cache.
    pub async fn backup(&self) -> Result<Vec<PostRecord>, RepoError> {
        self.reader.list_all().await
    }

    pub async fn create_post(&self, command: CreatePostCommand) -> Result<PostRecord, RepoError> {
        let slug = derive_slug(&command.title);
        let post = self
            .writer
            .create_post(CreatePostParams {
                slug,
                title: command.title,
                summary: command.summary,
                body: command.body,
            })
            .await?;
        self.invalidate_collection().await;
        Ok(post)
    }

    pub async fn update_post(
        &self,
        slug: &str,
        params: UpdatePostParams,
    ) -> Result<PostRecord, RepoError> {
        let post = self.writer.update_post(slug, params).await?;
        self.invalidate_collection().await;
        Ok(post)
    }

    pub async fn delete_post(&self, slug: &str) -> Result<(), RepoError> {
        self.writer.delete_post(slug).await?;
        self.invalidate_collection().await;
        Ok(())
    }

    /// Replace the whole collection from a backup dump.
    pub async fn restore(&self, posts: Vec<RestorePostParams>) -> Result<u64, RepoError> {
        let count = self.writer.replace_all(posts).await?;
        self.invalidate_collection().await;
        Ok(count)
    }

    /// Clear every blog cache entry after a committed write. Runs exactly
    /// once per mutation and never fails the write: an unreachable cache
    /// means the entries expire on their own TTL instead.
    async fn invalidate_collection(&self) {
        let prefix = self.keys.blog_prefix();
        match self.cache.delete_by_prefix(&prefix).await {
            Ok(deleted) => {
                counter!("vetrina_cache_invalidate_total").increment(1);
                debug!(target = SOURCE, prefix = %prefix, deleted, "invalidated blog cache");
            }
            Err(err) => {
                counter!("vetrina_cache_error_total", "namespace" => "invalidate").increment(1);
                warn!(target = SOURCE, prefix = %prefix, error = %err, "cache invalidation failed");
            }
        }
    }
}
