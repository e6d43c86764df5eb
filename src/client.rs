use async_trait::async_trait;
use axum::{
    Json,
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Serialize, de::DeserializeOwned};
use url::Url;

use crate::{
    config::AppConfig,
    guard::SessionVerifier,
    models::{CreatePostRequest, ErrorBody, LoginRequest, Post, PostsPage, RegisterRequest},
    navigation::NavigatorState,
};

/// Path (relative to the API base) of the cheap protected call used to check a session.
const VERIFY_PATH: &str = "/posts?page=1&page_size=1";

/// ApiError
///
/// Everything that can go wrong talking to the blog API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, timeout, DNS...).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// The API answered 401. A navigation to the login page has already been
    /// requested; callers must not report this to the user a second time.
    #[error("Authentication required")]
    AuthenticationRequired,
    /// Input rejected before any request was made.
    #[error("{0}")]
    Validation(String),
    /// Any other non-success answer, with the message to show the user.
    #[error("{message}")]
    Server { status: StatusCode, message: String },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// True for the sentinel that has already been handled by navigating to login.
    pub fn is_handled(&self) -> bool {
        matches!(self, ApiError::AuthenticationRequired)
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Network(_) => StatusCode::BAD_GATEWAY,
            ApiError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Server { status, .. } => *status,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match &self {
            ApiError::Network(e) => {
                tracing::error!(error = %e, "blog API unreachable");
                "The blog service is unavailable. Please try again later.".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

/// RequestOptions
///
/// Per-call overrides for [`ApiSession::fetch`]. Headers set here replace the
/// defaults (content type, session cookie) of the same name.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Option<Method>,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl RequestOptions {
    pub fn post() -> Self {
        Self {
            method: Some(Method::POST),
            ..Self::default()
        }
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, ApiError> {
        let encoded =
            serde_json::to_string(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        self.body = Some(encoded);
        Ok(self)
    }

    pub fn header(mut self, name: header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// ApiClient
///
/// Shared, cheaply clonable handle on the blog API: one pooled HTTP client,
/// the base URL and the session cookie name. Per-request work goes through
/// [`ApiClient::session`].
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    cookie_name: String,
    login_path: String,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.api_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            cookie_name: config.session_cookie.clone(),
            login_path: config.login_path.clone(),
        })
    }

    /// endpoint
    ///
    /// Absolute URLs pass through untouched; anything else is appended to the
    /// base URL (keeping its path, unlike `Url::join`).
    pub fn endpoint(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.base_url.as_str().trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }

    fn cookie_header(&self, credential: &str) -> Result<HeaderValue, ApiError> {
        HeaderValue::from_str(&format!("{}={}", self.cookie_name, credential))
            .map_err(|_| ApiError::InvalidRequest("session credential is not a valid header".into()))
    }

    /// Binds a session credential and a navigator for the duration of one request.
    pub fn session(&self, credential: Option<String>, navigator: NavigatorState) -> ApiSession {
        ApiSession {
            client: self.clone(),
            credential: credential.filter(|value| !value.is_empty()),
            navigator,
        }
    }

    /// probe
    ///
    /// Raw call to the verification endpoint. No 401 navigation here: the
    /// caller decides what a failed check means.
    async fn probe(&self, credential: Option<&str>) -> Result<StatusCode, ApiError> {
        let mut request = self
            .http
            .get(self.endpoint(VERIFY_PATH))
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(credential) = credential {
            request = request.header(header::COOKIE, self.cookie_header(credential)?);
        }
        let response = request.send().await?;
        Ok(response.status())
    }
}

#[async_trait]
impl SessionVerifier for ApiClient {
    async fn verify(&self, credential: &str) -> Result<(), ApiError> {
        let status = self.probe(Some(credential)).await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::Server {
                status,
                message: format!("session rejected with status {status}"),
            })
        }
    }
}

/// ApiSession
///
/// One browser request's view of the blog API: the shared client plus that
/// request's session credential and navigator.
pub struct ApiSession {
    client: ApiClient,
    credential: Option<String>,
    navigator: NavigatorState,
}

impl ApiSession {
    /// fetch
    ///
    /// Sends a request with the session cookie and `Content-Type: application/json`
    /// attached (either can be overridden through `options.headers`). A 401 requests
    /// a navigation to the login page and fails with `AuthenticationRequired`; any
    /// other response is returned undecoded.
    pub async fn fetch(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.client.endpoint(path);
        let method = options.method.unwrap_or(Method::GET);

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        if let Some(credential) = &self.credential {
            headers.insert(header::COOKIE, self.client.cookie_header(credential)?);
        }
        // Replaces defaults by name, keeps every value of a multi-valued override.
        headers.extend(options.headers);

        let mut request = self.client.http.request(method.clone(), &url).headers(headers);
        if let Some(body) = options.body {
            request = request.body(body);
        }

        let response = request.send().await?;
        tracing::debug!(%method, url = %url, status = %response.status(), "blog API call");

        if response.status() == StatusCode::UNAUTHORIZED {
            self.navigator.navigate(&self.client.login_path);
            return Err(ApiError::AuthenticationRequired);
        }
        Ok(response)
    }

    /// list_posts
    ///
    /// One page of published posts, optionally filtered by `query` (trimmed,
    /// omitted when blank).
    pub async fn list_posts(
        &self,
        page: u32,
        page_size: u32,
        query: Option<&str>,
    ) -> Result<PostsPage, ApiError> {
        let mut params = vec![("page", page.to_string()), ("page_size", page_size.to_string())];
        if let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) {
            params.push(("q", q.to_string()));
        }
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();

        let response = self
            .fetch(&format!("/posts?{encoded}"), RequestOptions::default())
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::Server {
                status: response.status(),
                message: "Failed to fetch posts".to_string(),
            });
        }
        decode(response, "Failed to fetch posts").await
    }

    /// create_post
    ///
    /// Blank fields are rejected locally with "Please fill in all fields"
    /// and never reach the API.
    pub async fn create_post(&self, post: &CreatePostRequest) -> Result<Post, ApiError> {
        if !post.is_complete() {
            return Err(ApiError::Validation("Please fill in all fields".to_string()));
        }
        let response = self
            .fetch("/posts/create", RequestOptions::post().json(post)?)
            .await?;
        if !response.status().is_success() {
            return Err(server_error(response, "Failed to create post").await);
        }
        decode(response, "Failed to create post").await
    }

    /// login
    ///
    /// Not routed through `fetch`: a 401 here means wrong credentials, not an
    /// expired session. Returns the user data and the session credential the
    /// API set, if any.
    pub async fn login(
        &self,
        request: &LoginRequest,
    ) -> Result<(serde_json::Value, Option<String>), ApiError> {
        self.post_credentials("/auth/login", request, "Login failed")
            .await
    }

    /// register
    pub async fn register(
        &self,
        request: &RegisterRequest,
    ) -> Result<(serde_json::Value, Option<String>), ApiError> {
        self.post_credentials("/auth/register", request, "Registration failed")
            .await
    }

    async fn post_credentials<T: Serialize>(
        &self,
        path: &str,
        body: &T,
        fallback: &str,
    ) -> Result<(serde_json::Value, Option<String>), ApiError> {
        let response = self
            .client
            .http
            .post(self.client.endpoint(path))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(server_error(response, fallback).await);
        }

        let set_cookies: Vec<String> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_owned)
            .collect();
        let credential = crate::session::credential_from_set_cookie(
            set_cookies.iter().map(String::as_str),
            &self.client.cookie_name,
        );

        let data = decode::<serde_json::Value>(response, fallback).await?;
        Ok((data, credential))
    }

    /// logout
    ///
    /// Fire-and-forget: the API call may fail, the navigation to the login
    /// page happens regardless.
    pub async fn logout(&self) {
        let mut request = self.client.http.post(self.client.endpoint("/auth/logout"));
        if let Some(credential) = &self.credential {
            match self.client.cookie_header(credential) {
                Ok(value) => request = request.header(header::COOKIE, value),
                Err(e) => tracing::warn!(error = %e, "dropping unusable session credential"),
            }
        }
        match request.send().await {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!(status = %response.status(), "logout rejected by blog API");
            }
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "logout error"),
        }
        self.navigator.navigate(&self.client.login_path);
    }

    /// is_authenticated
    ///
    /// True only when the API accepts the current credential. Errors of any
    /// kind count as "not authenticated".
    pub async fn is_authenticated(&self) -> bool {
        match self.client.probe(self.credential.as_deref()).await {
            Ok(status) => status.is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "authentication probe failed");
                false
            }
        }
    }
}

/// Reads a success body. A body that arrives but does not decode is the
/// API's fault, not the network's: it becomes a 502 `Server` error carrying
/// `fallback`.
async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
    fallback: &str,
) -> Result<T, ApiError> {
    let status = response.status();
    response.json::<T>().await.map_err(|e| {
        if e.is_decode() {
            tracing::warn!(error = %e, %status, "unreadable blog API response");
            ApiError::Server {
                status: StatusCode::BAD_GATEWAY,
                message: fallback.to_string(),
            }
        } else {
            ApiError::Network(e)
        }
    })
}

/// Turns a failed response into `ApiError::Server`, preferring the API's own
/// `error` message over `fallback`.
async fn server_error(response: reqwest::Response, fallback: &str) -> ApiError {
    let status = response.status();
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .map(|body| body.error)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| fallback.to_string());
    ApiError::Server { status, message }
}
