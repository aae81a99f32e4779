use axum::extract::FromRef;
use sqlx::SqlitePool;

pub mod middleware;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    /// Origin used when building absolute links, e.g. share URLs on
    /// profile pages. No trailing slash.
    pub base_url: String,
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}
