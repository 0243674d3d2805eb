use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::pagination::OffsetPage;
use crate::application::repos::{
    CollectionVersion, CreatePostParams, PostsRepo, PostsWriteRepo, RepoError, RestorePostParams,
    UpdatePostParams,
};
use crate::domain::entities::{PostRecord, PostSummaryRecord};
use crate::domain::posts::seed_posts;

use super::PostgresRepositories;
use crate::infra::db::map_sqlx_error;

#[derive(sqlx::FromRow)]
struct PostRow {
    slug: String,
    title: String,
    summary: String,
    body: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            slug: row.slug,
            title: row.title,
            summary: row.summary,
            body: row.body,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostSummaryRow {
    slug: String,
    title: String,
    summary: String,
    created_at: OffsetDateTime,
}

impl From<PostSummaryRow> for PostSummaryRecord {
    fn from(row: PostSummaryRow) -> Self {
        Self {
            slug: row.slug,
            title: row.title,
            summary: row.summary,
            created_at: row.created_at,
        }
    }
}

const POST_COLUMNS: &str = "slug, title, summary, body, created_at, updated_at";

impl PostgresRepositories {
    /// Insert the demo posts when the table is empty. Returns the number of
    /// rows written.
    pub async fn seed_posts_if_empty(&self) -> Result<u64, RepoError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM blog_posts")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        if count > 0 {
            return Ok(0);
        }

        let mut tx = self.begin().await.map_err(map_sqlx_error)?;
        let mut written = 0;
        for (slug, title, summary, body) in seed_posts() {
            sqlx::query("INSERT INTO blog_posts (slug, title, summary, body) VALUES ($1, $2, $3, $4)")
                .bind(slug)
                .bind(title)
                .bind(summary)
                .bind(body)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
            written += 1;
        }
        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(written)
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn collection_version(&self) -> Result<CollectionVersion, RepoError> {
        let (count, max_modified_at): (i64, Option<OffsetDateTime>) =
            sqlx::query_as("SELECT COUNT(*), MAX(updated_at) FROM blog_posts")
                .fetch_one(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        Ok(CollectionVersion {
            total: Self::convert_count(count)?,
            max_modified_at,
        })
    }

    async fn list_page(&self, page: OffsetPage) -> Result<Vec<PostSummaryRecord>, RepoError> {
        let rows: Vec<PostSummaryRow> = sqlx::query_as(
            "SELECT slug, title, summary, created_at FROM blog_posts \
             ORDER BY updated_at DESC OFFSET $1 LIMIT $2",
        )
        .bind(page.offset() as i64)
        .bind(i64::from(page.limit()))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostSummaryRecord::from).collect())
    }

    async fn list_all(&self) -> Result<Vec<PostRecord>, RepoError> {
        let rows: Vec<PostRow> = sqlx::query_as(&format!(
            "SELECT {POST_COLUMNS} FROM blog_posts ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError> {
        let row: Option<PostRow> = sqlx::query_as(&format!(
            "SELECT {POST_COLUMNS} FROM blog_posts WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }
}

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let row: PostRow = sqlx::query_as(&format!(
            "INSERT INTO blog_posts (slug, title, summary, body) \
             VALUES ($1, $2, $3, $4) RETURNING {POST_COLUMNS}"
        ))
        .bind(&params.slug)
        .bind(&params.title)
        .bind(&params.summary)
        .bind(&params.body)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_post(
        &self,
        slug: &str,
        params: UpdatePostParams,
    ) -> Result<PostRecord, RepoError> {
        let row: Option<PostRow> = sqlx::query_as(&format!(
            "UPDATE blog_posts SET \
                 title = COALESCE($2, title), \
                 summary = COALESCE($3, summary), \
                 body = COALESCE($4, body), \
                 updated_at = now() \
             WHERE slug = $1 RETURNING {POST_COLUMNS}"
        ))
        .bind(slug)
        .bind(params.title)
        .bind(params.summary)
        .bind(params.body)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(PostRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_post(&self, slug: &str) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE slug = $1")
            .bind(slug)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn replace_all(&self, posts: Vec<RestorePostParams>) -> Result<u64, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM blog_posts")
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        let mut written = 0;
        for post in posts {
            sqlx::query(
                "INSERT INTO blog_posts (slug, title, summary, body, created_at) \
                 VALUES ($1, $2, $3, $4, COALESCE($5, now()))",
            )
            .bind(&post.slug)
            .bind(&post.title)
            .bind(&post.summary)
            .bind(&post.body)
            .bind(post.created_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
            written += 1;
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(written)
    }
}
