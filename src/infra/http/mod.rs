//! HTTP surface: router, shared state, handlers.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::application::posts::PostService;

#[derive(Clone)]
pub struct HttpState {
    pub posts: Arc<PostService>,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route(
            "/api/blog",
            get(handlers::list_posts).post(handlers::create_post),
        )
        .route("/api/blog/backup", get(handlers::backup_posts))
        .route("/api/blog/restore", post(handlers::restore_posts))
        .route(
            "/api/blog/{slug}",
            get(handlers::get_post)
                .put(handlers::update_post)
                .delete(handlers::delete_post),
        )
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .with_state(state)
}
