//! Blog post handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_RANGE, ETAG, LAST_MODIFIED};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::application::conditional::Validators;
use crate::application::pagination::OffsetPage;
use crate::application::posts::{CreatePostCommand, ListOutcome, ListPage};
use crate::application::repos::{RestorePostParams, UpdatePostParams};

use crate::infra::http::HttpState;
use crate::infra::http::error::{ApiError, repo_to_api};
use crate::infra::http::models::*;

const X_TOTAL_COUNT: HeaderName = HeaderName::from_static("x-total-count");

/// Freshness advertised on every 200 list response, cache hit or miss.
const LIST_CACHE_CONTROL: &str = "public, max-age=60, stale-while-revalidate=120";

pub async fn list_posts(
    State(state): State<HttpState>,
    Query(query): Query<PostListQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let page = OffsetPage::clamped(
        query.page,
        query.page_size,
        state.default_page_size,
        state.max_page_size,
    );
    let conditional = conditional_from(&headers);
    let identity = identity_hint_from(&headers);

    let outcome = state
        .posts
        .list_page(page, &conditional, identity.as_ref())
        .await
        .map_err(repo_to_api)?;

    Ok(list_response(outcome))
}

fn list_response(outcome: ListOutcome) -> Response {
    match outcome {
        ListOutcome::NotModified(validators) => {
            let mut response = StatusCode::NOT_MODIFIED.into_response();
            apply_validators(response.headers_mut(), &validators);
            response
        }
        ListOutcome::Fresh { page, validators } => {
            let mut response = page_response(page);
            apply_validators(response.headers_mut(), &validators);
            response
        }
        ListOutcome::Cached(page) => page_response(page),
    }
}

fn page_response(page: ListPage) -> Response {
    let ListPage {
        items,
        total,
        content_range,
    } = page;
    let mut response = (StatusCode::OK, Json(items)).into_response();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&total.to_string()) {
        headers.insert(X_TOTAL_COUNT, value);
    }
    if let Ok(value) = HeaderValue::from_str(&content_range) {
        headers.insert(CONTENT_RANGE, value);
    }
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(LIST_CACHE_CONTROL));
    response
}

/// 304 responses still carry freshly computed validators so the client's
/// cached ones stay in sync.
fn apply_validators(headers: &mut HeaderMap, validators: &Validators) {
    if let Ok(value) = HeaderValue::from_str(&validators.etag) {
        headers.insert(ETAG, value);
    }
    if let Some(last_modified) = validators.last_modified_http.as_deref()
        && let Ok(value) = HeaderValue::from_str(last_modified)
    {
        headers.insert(LAST_MODIFIED, value);
    }
}

pub async fn get_post(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let identity = identity_hint_from(&headers);
    let post = state
        .posts
        .get_post(&slug, identity.as_ref())
        .await
        .map_err(repo_to_api)?;
    Ok(Json(post).into_response())
}

pub async fn create_post(
    State(state): State<HttpState>,
    Json(payload): Json<PostCreateRequest>,
) -> Result<Response, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::bad_request("title cannot be empty", None));
    }

    let post = state
        .posts
        .create_post(CreatePostCommand {
            title: payload.title,
            summary: payload.summary,
            body: payload.body,
        })
        .await
        .map_err(repo_to_api)?;

    Ok((StatusCode::CREATED, Json(post)).into_response())
}

pub async fn update_post(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
    Json(payload): Json<PostUpdateRequest>,
) -> Result<Response, ApiError> {
    let post = state
        .posts
        .update_post(
            &slug,
            UpdatePostParams {
                title: payload.title,
                summary: payload.summary,
                body: payload.body,
            },
        )
        .await
        .map_err(repo_to_api)?;

    Ok(Json(post).into_response())
}

pub async fn delete_post(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    state.posts.delete_post(&slug).await.map_err(repo_to_api)?;
    Ok(Json(OkResponse { ok: true }).into_response())
}

pub async fn backup_posts(State(state): State<HttpState>) -> Result<Response, ApiError> {
    let posts = state.posts.backup().await.map_err(repo_to_api)?;
    Ok(Json(posts).into_response())
}

pub async fn restore_posts(
    State(state): State<HttpState>,
    Json(payload): Json<Vec<RestoreRequestItem>>,
) -> Result<Response, ApiError> {
    let posts = payload
        .into_iter()
        .map(|item| RestorePostParams {
            slug: item.slug,
            title: item.title,
            summary: item.summary,
            body: item.body,
            created_at: item.created_at,
        })
        .collect();

    let count = state.posts.restore(posts).await.map_err(repo_to_api)?;
    Ok(Json(RestoreResponse { ok: true, count }).into_response())
}
