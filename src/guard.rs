use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{AppState, client::ApiError, session};

/// RouteConfig
///
/// The path prefixes the navigation guard classifies requests against.
/// Passed into the guard at construction time rather than read from globals.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteConfig {
    /// Pages an authenticated user has no reason to visit (login, register).
    pub public_prefixes: Vec<String>,
    /// Pages that require a session credential.
    pub protected_prefixes: Vec<String>,
    /// Paths the guard never inspects: docs, health checks, static assets.
    pub excluded_prefixes: Vec<String>,
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            public_prefixes: vec!["/login".to_string(), "/register".to_string()],
            protected_prefixes: vec!["/posts".to_string()],
            excluded_prefixes: vec![
                "/health".to_string(),
                "/static".to_string(),
                "/favicon.ico".to_string(),
                "/swagger-ui".to_string(),
                "/api-docs".to_string(),
            ],
        }
    }
}

/// RouteClass
///
/// Every request path falls into exactly one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    Protected,
    Root,
    Other,
}

impl RouteConfig {
    /// classify
    ///
    /// `/` is always `Root`. Excluded prefixes short-circuit to `Other`.
    /// Protected prefixes are consulted before public ones, so a path matching
    /// both lists is treated as protected.
    pub fn classify(&self, path: &str) -> RouteClass {
        if path == "/" {
            return RouteClass::Root;
        }
        if matches_any(&self.excluded_prefixes, path) {
            return RouteClass::Other;
        }
        if matches_any(&self.protected_prefixes, path) {
            return RouteClass::Protected;
        }
        if matches_any(&self.public_prefixes, path) {
            return RouteClass::Public;
        }
        RouteClass::Other
    }
}

fn matches_any(prefixes: &[String], path: &str) -> bool {
    prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
}

/// Decision
///
/// The guard's verdict for a single navigation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectToLogin,
    RedirectToHome,
}

/// Outcome of the remote session check. `NotChecked` is used whenever the
/// decision table does not call for verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verification {
    NotChecked,
    Verified,
    Failed,
}

impl RouteClass {
    /// Whether a request of this class with a credential present needs a remote check.
    pub fn needs_verification(self) -> bool {
        matches!(self, RouteClass::Public | RouteClass::Root)
    }
}

/// decide
///
/// The decision table as a pure function. `Verification::NotChecked` on a
/// public or root path with a credential is treated like a failed check.
pub fn decide(class: RouteClass, has_credential: bool, verification: Verification) -> Decision {
    let verified = verification == Verification::Verified;
    match (class, has_credential) {
        (RouteClass::Protected, false) => Decision::RedirectToLogin,
        (RouteClass::Protected, true) => Decision::Allow,
        (RouteClass::Public, false) => Decision::Allow,
        (RouteClass::Public, true) if verified => Decision::RedirectToHome,
        (RouteClass::Public, true) => Decision::Allow,
        (RouteClass::Root, false) => Decision::RedirectToLogin,
        (RouteClass::Root, true) if verified => Decision::RedirectToHome,
        (RouteClass::Root, true) => Decision::RedirectToLogin,
        (RouteClass::Other, _) => Decision::Allow,
    }
}

/// SessionVerifier
///
/// Asks the remote API whether a session credential is still accepted.
/// Any `Err` is treated by the guard as a failed verification.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<(), ApiError>;
}

/// The shared handle the guard holds on its verifier.
pub type VerifierState = Arc<dyn SessionVerifier>;

/// NavigationGuard
///
/// Stateless per request: nothing about a previous verification is remembered,
/// so every public or root navigation with a credential costs one remote call.
#[derive(Clone)]
pub struct NavigationGuard {
    routes: RouteConfig,
    verifier: VerifierState,
}

impl NavigationGuard {
    pub fn new(routes: RouteConfig, verifier: VerifierState) -> Self {
        Self { routes, verifier }
    }

    /// evaluate
    ///
    /// Classifies `path`, performs the remote check only when the decision
    /// depends on it, and returns the verdict. Never fails: verification
    /// errors are logged and folded into the "failed" branch.
    pub async fn evaluate(&self, path: &str, credential: Option<&str>) -> Decision {
        let class = self.routes.classify(path);
        let credential = credential.filter(|value| !value.is_empty());

        let verification = match credential {
            Some(token) if class.needs_verification() => match self.verifier.verify(token).await {
                Ok(()) => Verification::Verified,
                Err(e) => {
                    tracing::warn!(path, error = %e, "session verification failed");
                    Verification::Failed
                }
            },
            _ => Verification::NotChecked,
        };

        let decision = decide(class, credential.is_some(), verification);
        tracing::debug!(path, ?class, ?verification, ?decision, "navigation guard");
        decision
    }
}

/// navigation_guard
///
/// Axum middleware wrapping the whole router. Reads the session cookie,
/// asks the `NavigationGuard` for a verdict and either runs the inner
/// service or redirects to the login or home page: 307 for page loads, 303
/// for anything else so that a form submission lands on a GET.
pub async fn navigation_guard(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(request.headers());
    let credential = session::credential_from_jar(&jar, &state.config.session_cookie);
    let path = request.uri().path().to_owned();
    let page_load = request.method() == Method::GET || request.method() == Method::HEAD;

    let decision = state.guard.evaluate(&path, credential.as_deref()).await;

    let target = match decision {
        Decision::Allow => return next.run(request).await,
        Decision::RedirectToLogin => &state.config.login_path,
        Decision::RedirectToHome => &state.config.home_path,
    };
    if page_load {
        Redirect::temporary(target).into_response()
    } else {
        Redirect::to(target).into_response()
    }
}
