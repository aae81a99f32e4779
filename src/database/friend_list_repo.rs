use sqlx::{SqliteConnection, SqlitePool};

use crate::models::AccountRow;

const SQL_ENSURE_FRIEND_LIST: &str = r#"
INSERT OR IGNORE INTO friend_lists (owner_id) VALUES (?1)
"#;

pub async fn ensure_friend_list(conn: &mut SqliteConnection, owner_id: &str) -> sqlx::Result<()> {
    sqlx::query(SQL_ENSURE_FRIEND_LIST)
        .bind(owner_id)
        .execute(conn)
        .await?;
    Ok(())
}

const SQL_INSERT_MEMBER: &str = r#"
INSERT OR IGNORE INTO friend_list_members (owner_id, friend_id) VALUES (?1, ?2)
"#;

// Writes both directions of the membership. Callers must hold a transaction
// so the relation never becomes visible one-sided.
pub async fn insert_membership_pair(
    conn: &mut SqliteConnection,
    owner_id: &str,
    friend_id: &str,
) -> sqlx::Result<()> {
    sqlx::query(SQL_INSERT_MEMBER)
        .bind(owner_id)
        .bind(friend_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(SQL_INSERT_MEMBER)
        .bind(friend_id)
        .bind(owner_id)
        .execute(conn)
        .await?;
    Ok(())
}

const SQL_DELETE_MEMBER: &str = r#"
DELETE FROM friend_list_members WHERE owner_id = ?1 AND friend_id = ?2
"#;

pub async fn delete_membership_pair(
    conn: &mut SqliteConnection,
    owner_id: &str,
    friend_id: &str,
) -> sqlx::Result<()> {
    sqlx::query(SQL_DELETE_MEMBER)
        .bind(owner_id)
        .bind(friend_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(SQL_DELETE_MEMBER)
        .bind(friend_id)
        .bind(owner_id)
        .execute(conn)
        .await?;
    Ok(())
}

const SQL_IS_MEMBER: &str = r#"
SELECT COUNT(*) FROM friend_list_members WHERE owner_id = ?1 AND friend_id = ?2
"#;

pub async fn is_member(pool: &SqlitePool, owner_id: &str, friend_id: &str) -> sqlx::Result<bool> {
    let count: i64 = sqlx::query_scalar(SQL_IS_MEMBER)
        .bind(owner_id)
        .bind(friend_id)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

const SQL_LOAD_MEMBERS: &str = r#"
SELECT a.id, a.email, a.username, a.password_hash, a.profile_image, a.hide_email, a.created_at
FROM friend_list_members m
JOIN accounts a ON a.id = m.friend_id
WHERE m.owner_id = ?1
ORDER BY a.username COLLATE NOCASE
"#;

pub async fn load_members(pool: &SqlitePool, owner_id: &str) -> sqlx::Result<Vec<AccountRow>> {
    sqlx::query_as::<_, AccountRow>(SQL_LOAD_MEMBERS)
        .bind(owner_id)
        .fetch_all(pool)
        .await
}
