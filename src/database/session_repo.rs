use sqlx::SqlitePool;

use crate::models::SessionRow;

const SQL_INSERT_SESSION: &str = r#"
INSERT INTO sessions (token, account_id, created_at, expires_at)
VALUES (?1, ?2, ?3, ?4)
"#;

pub async fn insert_session(
    pool: &SqlitePool,
    token: &str,
    account_id: &str,
    created_at: &str,
    expires_at: &str,
) -> sqlx::Result<()> {
    sqlx::query(SQL_INSERT_SESSION)
        .bind(token)
        .bind(account_id)
        .bind(created_at)
        .bind(expires_at)
        .execute(pool)
        .await?;
    Ok(())
}

// Timestamps are RFC 3339 UTC, so string comparison orders correctly.
const SQL_LOAD_LIVE_SESSION: &str = r#"
SELECT token, account_id, created_at, expires_at
FROM sessions
WHERE token = ?1
  AND expires_at > ?2
LIMIT 1
"#;

pub async fn load_live_session(
    pool: &SqlitePool,
    token: &str,
    now: &str,
) -> sqlx::Result<Option<SessionRow>> {
    sqlx::query_as::<_, SessionRow>(SQL_LOAD_LIVE_SESSION)
        .bind(token)
        .bind(now)
        .fetch_optional(pool)
        .await
}

const SQL_DELETE_SESSION: &str = r#"
DELETE FROM sessions WHERE token = ?1
"#;

pub async fn delete_session(pool: &SqlitePool, token: &str) -> sqlx::Result<()> {
    sqlx::query(SQL_DELETE_SESSION).bind(token).execute(pool).await?;
    Ok(())
}
