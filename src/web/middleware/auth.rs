use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;

use crate::services::sessions;

pub const SESSION_COOKIE: &str = "session_token";

#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub id: String,
}

/// The viewer on routes that render for anonymous visitors too, like
/// profile pages and search.
#[derive(Clone, Debug)]
pub struct Viewer(pub Option<AuthenticatedUser>);

impl Viewer {
    pub fn account_id(&self) -> Option<&str> {
        self.0.as_ref().map(|u| u.id.as_str())
    }
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)
        .and_then(|hv| hv.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split("; ")
                .find_map(|c| c.strip_prefix(&format!("{SESSION_COOKIE}=")))
        })
        .map(|token| token.to_string())
}

async fn lookup_viewer(pool: &SqlitePool, headers: &HeaderMap) -> Option<AuthenticatedUser> {
    let token = session_token(headers)?;
    match sessions::account_for_token(pool, &token).await {
        Ok(Some(id)) => Some(AuthenticatedUser { id }),
        Ok(None) => None,
        Err(e) => {
            tracing::warn!("Session lookup failed: {}", e);
            None
        }
    }
}

/// Requires a live session; anonymous callers are bounced to the login
/// page. Injects `AuthenticatedUser` into request extensions.
pub async fn require_auth(
    State(pool): State<SqlitePool>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(user) = lookup_viewer(&pool, request.headers()).await {
        request.extensions_mut().insert(user);
        return next.run(request).await;
    }
    Redirect::to("/login").into_response()
}

/// Always lets the request through, injecting `Viewer` with whatever the
/// session cookie resolved to. Used by routes that are anonymous-viewable.
pub async fn viewer_context(
    State(pool): State<SqlitePool>,
    mut request: Request,
    next: Next,
) -> Response {
    let viewer = Viewer(lookup_viewer(&pool, request.headers()).await);
    request.extensions_mut().insert(viewer);
    next.run(request).await
}
