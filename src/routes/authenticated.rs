use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Pages under the guard's protected prefixes. The guard only checks that a
/// credential is present; the blog API is the one that rejects a stale one,
/// and the API client turns that 401 into a redirect to the login page.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /posts?page=..&q=..
        // Paginated, searchable listing (10 posts per page).
        .route("/posts", get(handlers::list_posts))
        // POST /posts/create
        // The post-creation form. Blank fields are rejected before the API is called.
        .route("/posts/create", post(handlers::create_post))
}
