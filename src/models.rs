use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// Number of posts shown per listing page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

// --- Blog API Schemas (as returned by the backend) ---

/// Post
///
/// A blog post as the blog API serializes it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub content: String,
    // Older posts may have been stored without an author.
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// PostsPage
///
/// One page of the backend listing: `GET /posts?page=..&page_size=..&q=..`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct PostsPage {
    #[serde(default)]
    pub items: Vec<Post>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

/// ErrorBody
///
/// The `{ "error": "..." }` shape used by the blog API and echoed by this gateway.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorBody {
    pub error: String,
}

// --- Request Payloads ---

/// ListPostsQuery
///
/// Query parameters accepted by the gateway's `GET /posts`.
#[derive(Debug, Clone, Deserialize, Default, utoipa::IntoParams)]
pub struct ListPostsQuery {
    /// 1-based page number; defaults to 1.
    pub page: Option<u32>,
    /// Free-text search over title and content.
    pub q: Option<String>,
}

impl ListPostsQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// The trimmed search text, or `None` when blank.
    pub fn search(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

/// CreatePostRequest
///
/// Payload of the post-creation form (POST /posts/create).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub author: String,
}

impl CreatePostRequest {
    /// All three fields are required and must contain more than whitespace.
    pub fn is_complete(&self) -> bool {
        [&self.title, &self.content, &self.author]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

/// LoginRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// RegisterRequest
///
/// Forwarded as-is to the blog API's registration endpoint. The password is
/// never logged.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

// --- View Models (Output) ---

/// PostsView
///
/// Everything the listing page needs to render: the current page of posts,
/// the search text it was produced for, and the pagination controls' state.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct PostsView {
    pub posts: Vec<Post>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u32,
    pub query: Option<String>,
    pub has_previous: bool,
    pub has_next: bool,
}

impl PostsView {
    pub fn new(page: PostsPage, query: Option<String>) -> Self {
        let total_pages = total_pages(page.total, page.page_size);
        let current = page.page.max(1);
        Self {
            posts: page.items,
            page: current,
            page_size: page.page_size,
            total: page.total,
            total_pages,
            query,
            has_previous: current > 1,
            has_next: current < total_pages,
        }
    }
}

/// Number of pages needed for `total` items, never less than one so the
/// listing always has a page to show (even an empty one).
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 1;
    }
    let pages = total.div_ceil(u64::from(page_size)).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// FormView
///
/// Describes one of the session forms (login, register) for the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct FormView {
    pub title: String,
    pub action: String,
    pub fields: Vec<String>,
}

/// SessionResponse
///
/// Body returned after a successful login or registration: whatever user data
/// the blog API chose to send back.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
}
