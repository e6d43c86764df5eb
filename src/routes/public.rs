use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a session credential. Note that `/login` and
/// `/register` are still subject to the navigation guard: a browser whose
/// session the blog API accepts is sent on to the home page instead.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe; excluded from the navigation guard.
        .route("/health", get(|| async { "ok" }))
        // GET/POST /login
        .route("/login", get(handlers::login_form).post(handlers::login))
        // GET/POST /register
        .route(
            "/register",
            get(handlers::register_form).post(handlers::register),
        )
        // POST /logout
        // Always ends on the login page, even if the blog API call fails.
        .route("/logout", post(handlers::logout))
}
