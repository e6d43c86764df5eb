use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::config::AppConfig;

/// SessionCredential
///
/// The opaque session credential carried by the browser's cookie, if any.
/// Nothing about the value is checked locally; the blog API is the only
/// authority on whether it is still good.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionCredential(pub Option<String>);

impl SessionCredential {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_present(&self) -> bool {
        self.0.is_some()
    }
}

/// Extractor for `SessionCredential`. Infallible: a missing cookie is simply
/// an absent credential, and the navigation guard has already decided
/// whether the request may proceed without one.
impl<S> FromRequestParts<S> for SessionCredential
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(Self(credential_from_jar(&jar, &config.session_cookie)))
    }
}

/// Reads the session cookie. An empty value counts as no credential at all.
pub fn credential_from_jar(jar: &CookieJar, cookie_name: &str) -> Option<String> {
    jar.get(cookie_name)
        .map(Cookie::value)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// The browser-facing session cookie holding `value`.
pub fn session_cookie(config: &AppConfig, value: String) -> Cookie<'static> {
    Cookie::build((config.session_cookie.clone(), value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .build()
}

/// Removes the session cookie from `jar`.
pub fn clear_session(jar: CookieJar, config: &AppConfig) -> CookieJar {
    jar.remove(Cookie::build((config.session_cookie.clone(), "")).path("/"))
}

/// Picks the session credential out of the `Set-Cookie` headers of a blog API
/// response, so that it can be handed on to the browser.
pub fn credential_from_set_cookie<'a, I>(headers: I, cookie_name: &str) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    headers
        .into_iter()
        .filter_map(|raw| Cookie::parse(raw.to_owned()).ok())
        .find(|cookie| cookie.name() == cookie_name)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty())
}
