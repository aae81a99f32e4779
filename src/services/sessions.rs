use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::database::session_repo;
use crate::error::DomainResult;

const SESSION_DAYS: i64 = 14;

/// Opens a session for a freshly authenticated account and returns the
/// opaque token that goes into the cookie.
pub async fn start(pool: &SqlitePool, account_id: &str) -> DomainResult<String> {
    let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
    let now = Utc::now();
    let expires_at = now + Duration::days(SESSION_DAYS);
    session_repo::insert_session(
        pool,
        &token,
        account_id,
        &now.to_rfc3339(),
        &expires_at.to_rfc3339(),
    )
    .await?;
    Ok(token)
}

/// Resolves a cookie token to an account id, ignoring expired sessions.
pub async fn account_for_token(pool: &SqlitePool, token: &str) -> DomainResult<Option<String>> {
    let now = Utc::now().to_rfc3339();
    let session = session_repo::load_live_session(pool, token, &now).await?;
    Ok(session.map(|s| s.account_id))
}

pub async fn end(pool: &SqlitePool, token: &str) -> DomainResult<()> {
    session_repo::delete_session(pool, token).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{memory_pool, seed_account};

    #[tokio::test]
    async fn session_round_trip() {
        let pool = memory_pool().await;
        seed_account(&pool, "a", "alice").await;

        let token = start(&pool, "a").await.unwrap();
        assert_eq!(
            account_for_token(&pool, &token).await.unwrap().as_deref(),
            Some("a")
        );

        end(&pool, &token).await.unwrap();
        assert!(account_for_token(&pool, &token).await.unwrap().is_none());
        assert!(account_for_token(&pool, "bogus").await.unwrap().is_none());
    }
}
