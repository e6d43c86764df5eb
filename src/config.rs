use std::{env, time::Duration};

use url::Url;

use crate::guard::RouteConfig;

/// AppConfig
///
/// Holds the gateway's entire configuration state. Loaded once at startup and
/// never mutated afterwards; handlers and middleware pull it out of the shared
/// state via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and fail-fast checks.
    pub env: Env,
    // Base URL of the blog API, e.g. `http://localhost:8080/api`.
    pub api_base_url: Url,
    // Address the HTTP listener binds to.
    pub bind_addr: String,
    // Name of the cookie carrying the session credential.
    pub session_cookie: String,
    // Whether cookies relayed to the browser carry the `Secure` flag.
    pub cookie_secure: bool,
    // Timeout applied to every outbound call to the blog API.
    pub api_timeout: Duration,
    // Where unauthenticated navigations are sent.
    pub login_path: String,
    // Default landing page for authenticated users.
    pub home_path: String,
    // Public/protected/excluded path prefixes consulted by the navigation guard.
    pub routes: RouteConfig,
}

/// Env
///
/// Defines the runtime context: pretty logs and relaxed defaults locally,
/// JSON logs and mandatory settings in production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const LOCAL_API_BASE_URL: &str = "http://localhost:8080/api";
const DEFAULT_SESSION_COOKIE: &str = "auth_token";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

impl Default for AppConfig {
    /// Local values usable without any environment variables, primarily for tests.
    fn default() -> Self {
        Self {
            env: Env::Local,
            api_base_url: Url::parse(LOCAL_API_BASE_URL).expect("static url is valid"),
            bind_addr: "0.0.0.0:3000".to_string(),
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
            cookie_secure: false,
            api_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            login_path: "/login".to_string(),
            home_path: "/posts".to_string(),
            routes: RouteConfig::default(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics if `API_BASE_URL` is missing in production, or if any provided
    /// value cannot be parsed. A gateway pointed at the wrong backend must not
    /// start.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let base_url = match env {
            Env::Production => env::var("API_BASE_URL")
                .expect("FATAL: API_BASE_URL must be set in production."),
            Env::Local => {
                env::var("API_BASE_URL").unwrap_or_else(|_| LOCAL_API_BASE_URL.to_string())
            }
        };
        let api_base_url = Url::parse(&base_url).expect("FATAL: API_BASE_URL is not a valid URL");

        let api_timeout = env::var("API_TIMEOUT_SECS")
            .ok()
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .expect("FATAL: API_TIMEOUT_SECS must be a whole number of seconds")
            })
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        // Production cookies default to Secure; local HTTP development does not.
        let cookie_secure = env_bool("COOKIE_SECURE").unwrap_or(env == Env::Production);

        let defaults = RouteConfig::default();
        let routes = RouteConfig {
            public_prefixes: env_list("PUBLIC_ROUTES").unwrap_or(defaults.public_prefixes),
            protected_prefixes: env_list("PROTECTED_ROUTES")
                .unwrap_or(defaults.protected_prefixes),
            excluded_prefixes: defaults.excluded_prefixes,
        };

        Self {
            env,
            api_base_url,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            session_cookie: env::var("SESSION_COOKIE")
                .unwrap_or_else(|_| DEFAULT_SESSION_COOKIE.to_string()),
            cookie_secure,
            api_timeout: Duration::from_secs(api_timeout),
            routes,
            ..Self::default()
        }
    }
}

fn env_bool(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

// Comma separated list; blank entries are dropped. An unset or empty variable yields None.
fn env_list(key: &str) -> Option<Vec<String>> {
    let raw = env::var(key).ok()?;
    let items: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    (!items.is_empty()).then_some(items)
}
