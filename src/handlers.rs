use crate::{
    AppState,
    client::ApiError,
    models::{
        self, CreatePostRequest, ErrorBody, FormView, ListPostsQuery, LoginRequest, PostsView,
        RegisterRequest, SessionResponse,
    },
    navigation::NavigationSlot,
    session::{self, SessionCredential},
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

/// Converts an `ApiError` into the response for the browser. When the client
/// already asked for a navigation (the 401 sentinel), that navigation wins and
/// no error message is produced.
fn error_response(slot: &NavigationSlot, err: ApiError) -> Response {
    if err.is_handled() {
        if let Some(target) = slot.target() {
            return Redirect::to(&target).into_response();
        }
    }
    err.into_response()
}

// --- Session Forms ---

/// login_form
///
/// [Public Route] Describes the login form.
#[utoipa::path(
    get,
    path = "/login",
    responses((status = 200, description = "Login form", body = FormView))
)]
pub async fn login_form() -> Json<FormView> {
    Json(FormView {
        title: "Sign in".to_string(),
        action: "/login".to_string(),
        fields: vec!["email".to_string(), "password".to_string()],
    })
}

/// register_form
///
/// [Public Route] Describes the registration form.
#[utoipa::path(
    get,
    path = "/register",
    responses((status = 200, description = "Registration form", body = FormView))
)]
pub async fn register_form() -> Json<FormView> {
    Json(FormView {
        title: "Create an account".to_string(),
        action: "/register".to_string(),
        fields: vec![
            "username".to_string(),
            "email".to_string(),
            "password".to_string(),
            "full_name".to_string(),
        ],
    })
}

/// login
///
/// [Public Route] Forwards the credentials to the blog API and hands the
/// session cookie it issues on to the browser.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionResponse),
        (status = 401, description = "Invalid email or password", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Response {
    let slot = NavigationSlot::new();
    let api = state.api.session(None, slot.clone());

    match api.login(&payload).await {
        Ok((data, credential)) => {
            tracing::info!("login succeeded");
            let jar = match credential {
                Some(value) => jar.add(session::session_cookie(&state.config, value)),
                None => {
                    tracing::warn!("blog API accepted the login but set no session cookie");
                    jar
                }
            };
            (jar, Json(SessionResponse { data })).into_response()
        }
        Err(e) => error_response(&slot, e),
    }
}

/// register
///
/// [Public Route] Creates an account through the blog API.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered", body = SessionResponse),
        (status = 422, description = "Rejected by the blog API", body = ErrorBody)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RegisterRequest>,
) -> Response {
    let slot = NavigationSlot::new();
    let api = state.api.session(None, slot.clone());

    match api.register(&payload).await {
        Ok((data, credential)) => {
            tracing::info!(username = %payload.username, "registration succeeded");
            let jar = match credential {
                Some(value) => jar.add(session::session_cookie(&state.config, value)),
                None => jar,
            };
            (jar, Json(SessionResponse { data })).into_response()
        }
        Err(e) => error_response(&slot, e),
    }
}

/// logout
///
/// [Any Route] Tells the blog API to end the session (best effort), drops the
/// cookie and sends the browser to the login page.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 303, description = "Redirect to the login page"))
)]
pub async fn logout(
    State(state): State<AppState>,
    credential: SessionCredential,
    jar: CookieJar,
) -> Response {
    let slot = NavigationSlot::new();
    state.api.session(credential.0, slot.clone()).logout().await;

    let target = slot.target().unwrap_or_else(|| state.config.login_path.clone());
    let jar = session::clear_session(jar, &state.config);
    (jar, Redirect::to(&target)).into_response()
}

// --- Posts ---

/// list_posts
///
/// [Authenticated Route] One page of posts plus the pagination state.
#[utoipa::path(
    get,
    path = "/posts",
    params(ListPostsQuery),
    responses(
        (status = 200, description = "Posts page", body = PostsView),
        (status = 303, description = "Session expired, redirect to login")
    )
)]
pub async fn list_posts(
    State(state): State<AppState>,
    credential: SessionCredential,
    Query(query): Query<ListPostsQuery>,
) -> Response {
    let slot = NavigationSlot::new();
    let api = state.api.session(credential.0, slot.clone());
    let search = query.search().map(str::to_string);

    match api
        .list_posts(query.page(), models::DEFAULT_PAGE_SIZE, search.as_deref())
        .await
    {
        Ok(page) => Json(PostsView::new(page, search)).into_response(),
        Err(e) => error_response(&slot, e),
    }
}

/// create_post
///
/// [Authenticated Route] Submits the post-creation form.
#[utoipa::path(
    post,
    path = "/posts/create",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Created", body = models::Post),
        (status = 422, description = "Missing fields", body = ErrorBody),
        (status = 303, description = "Session expired, redirect to login")
    )
)]
pub async fn create_post(
    State(state): State<AppState>,
    credential: SessionCredential,
    Json(payload): Json<CreatePostRequest>,
) -> Response {
    let slot = NavigationSlot::new();
    let api = state.api.session(credential.0, slot.clone());

    match api.create_post(&payload).await {
        Ok(post) => {
            tracing::info!(post_id = post.id, "post created");
            (StatusCode::CREATED, Json(post)).into_response()
        }
        Err(e) => error_response(&slot, e),
    }
}
