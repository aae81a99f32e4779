use sqlx::{SqliteConnection, SqlitePool};

use crate::models::FriendRequestRow;

pub struct NewFriendRequest<'a> {
    pub id: &'a str,
    pub sender_id: &'a str,
    pub receiver_id: &'a str,
    pub created_at: &'a str,
}

const SQL_INSERT_REQUEST: &str = r#"
INSERT INTO friend_requests (
  id,
  sender_id,
  receiver_id,
  status,
  created_at
) VALUES (?1, ?2, ?3, 'active', ?4)
"#;

pub async fn insert_request(
    pool: &SqlitePool,
    request: NewFriendRequest<'_>,
) -> sqlx::Result<()> {
    sqlx::query(SQL_INSERT_REQUEST)
        .bind(request.id)
        .bind(request.sender_id)
        .bind(request.receiver_id)
        .bind(request.created_at)
        .execute(pool)
        .await?;
    Ok(())
}

const SQL_LOAD_REQUEST: &str = r#"
SELECT id, sender_id, receiver_id, status, created_at, resolved_at
FROM friend_requests
WHERE id = ?1
LIMIT 1
"#;

pub async fn load_request(
    pool: &SqlitePool,
    request_id: &str,
) -> sqlx::Result<Option<FriendRequestRow>> {
    sqlx::query_as::<_, FriendRequestRow>(SQL_LOAD_REQUEST)
        .bind(request_id)
        .fetch_optional(pool)
        .await
}

const SQL_FIND_ACTIVE: &str = r#"
SELECT id, sender_id, receiver_id, status, created_at, resolved_at
FROM friend_requests
WHERE sender_id = ?1
  AND receiver_id = ?2
  AND status = 'active'
LIMIT 1
"#;

pub async fn find_active(
    pool: &SqlitePool,
    sender_id: &str,
    receiver_id: &str,
) -> sqlx::Result<Option<FriendRequestRow>> {
    sqlx::query_as::<_, FriendRequestRow>(SQL_FIND_ACTIVE)
        .bind(sender_id)
        .bind(receiver_id)
        .fetch_optional(pool)
        .await
}

const SQL_LIST_PENDING_FOR_RECEIVER: &str = r#"
SELECT id, sender_id, receiver_id, status, created_at, resolved_at
FROM friend_requests
WHERE receiver_id = ?1
  AND status = 'active'
ORDER BY created_at DESC
"#;

pub async fn list_pending_for_receiver(
    pool: &SqlitePool,
    receiver_id: &str,
) -> sqlx::Result<Vec<FriendRequestRow>> {
    sqlx::query_as::<_, FriendRequestRow>(SQL_LIST_PENDING_FOR_RECEIVER)
        .bind(receiver_id)
        .fetch_all(pool)
        .await
}

const SQL_MARK_TRANSITION: &str = r#"
UPDATE friend_requests
SET status = ?2,
    resolved_at = ?3
WHERE id = ?1
  AND status = 'active'
"#;

// Guarded transition: the WHERE clause makes concurrent accept/decline/cancel
// race losers affect zero rows instead of double-resolving the request.
pub async fn mark_transition(
    conn: &mut SqliteConnection,
    request_id: &str,
    new_status: &str,
    resolved_at: &str,
) -> sqlx::Result<u64> {
    let result = sqlx::query(SQL_MARK_TRANSITION)
        .bind(request_id)
        .bind(new_status)
        .bind(resolved_at)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
