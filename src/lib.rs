use axum::{
    Json, Router,
    extract::FromRef,
    http::{HeaderName, StatusCode},
    middleware,
    response::IntoResponse,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod client;
pub mod config;
pub mod guard;
pub mod handlers;
pub mod models;
pub mod navigation;
pub mod session;

// Public routes and pages behind the protected prefixes.
pub mod routes;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use client::{ApiClient, ApiError, ApiSession, RequestOptions};
pub use config::AppConfig;
pub use guard::{Decision, NavigationGuard, RouteClass, RouteConfig, SessionVerifier};

/// ApiDoc
///
/// OpenAPI document for the gateway's own routes, served at
/// `/api-docs/openapi.json` and browsable under `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::login_form, handlers::register_form, handlers::login, handlers::register,
        handlers::logout, handlers::list_posts, handlers::create_post
    ),
    components(
        schemas(
            models::Post, models::PostsView, models::CreatePostRequest, models::LoginRequest,
            models::RegisterRequest, models::FormView, models::SessionResponse,
            models::ErrorBody,
        )
    ),
    tags(
        (name = "blog-frontend", description = "Session-gated gateway in front of the blog API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable state for every request: the configuration, the
/// navigation guard and the blog API client.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub guard: NavigationGuard,
    pub api: ApiClient,
}

impl AppState {
    /// Production wiring: the guard verifies sessions against the blog API itself.
    pub fn new(config: AppConfig) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config)?;
        let verifier = Arc::new(api.clone());
        Ok(Self::with_verifier(config, api, verifier))
    }

    /// Wiring with an explicit session verifier.
    pub fn with_verifier(
        config: AppConfig,
        api: ApiClient,
        verifier: guard::VerifierState,
    ) -> Self {
        let guard = NavigationGuard::new(config.routes.clone(), verifier);
        Self { config, guard, api }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(models::ErrorBody {
            error: "not found".to_string(),
        }),
    )
}

/// create_router
///
/// Assembles the routes, wraps all of them (fallback included, so `/` is
/// guarded too) in the navigation guard, then adds request ids, tracing and CORS.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes())
        .fallback(not_found)
        // Applied after every route and the fallback are registered.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guard::navigation_guard,
        ))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one HTTP request, correlated by the `x-request-id` header.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
