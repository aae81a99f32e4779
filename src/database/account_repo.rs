use sqlx::SqlitePool;

use crate::models::AccountRow;

pub struct NewAccount<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub username: &'a str,
    pub password_hash: &'a str,
    pub profile_image: Option<&'a str>,
    pub hide_email: bool,
    pub created_at: &'a str,
}

const SQL_INSERT_ACCOUNT: &str = r#"
INSERT INTO accounts (
  id,
  email,
  username,
  password_hash,
  profile_image,
  hide_email,
  created_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#;

pub async fn insert_account(pool: &SqlitePool, account: NewAccount<'_>) -> sqlx::Result<()> {
    sqlx::query(SQL_INSERT_ACCOUNT)
        .bind(account.id)
        .bind(account.email)
        .bind(account.username)
        .bind(account.password_hash)
        .bind(account.profile_image)
        .bind(account.hide_email as i64)
        .bind(account.created_at)
        .execute(pool)
        .await?;
    Ok(())
}

const SQL_LOAD_ACCOUNT: &str = r#"
SELECT id, email, username, password_hash, profile_image, hide_email, created_at
FROM accounts
WHERE id = ?1
LIMIT 1
"#;

pub async fn load_account(pool: &SqlitePool, account_id: &str) -> sqlx::Result<Option<AccountRow>> {
    sqlx::query_as::<_, AccountRow>(SQL_LOAD_ACCOUNT)
        .bind(account_id)
        .fetch_optional(pool)
        .await
}

// The email column is COLLATE NOCASE, so equality here is case-insensitive.
const SQL_LOAD_ACCOUNT_BY_EMAIL: &str = r#"
SELECT id, email, username, password_hash, profile_image, hide_email, created_at
FROM accounts
WHERE email = ?1
LIMIT 1
"#;

pub async fn load_account_by_email(
    pool: &SqlitePool,
    email: &str,
) -> sqlx::Result<Option<AccountRow>> {
    sqlx::query_as::<_, AccountRow>(SQL_LOAD_ACCOUNT_BY_EMAIL)
        .bind(email)
        .fetch_optional(pool)
        .await
}

const SQL_LOAD_ACCOUNT_BY_USERNAME: &str = r#"
SELECT id, email, username, password_hash, profile_image, hide_email, created_at
FROM accounts
WHERE username = ?1
LIMIT 1
"#;

pub async fn load_account_by_username(
    pool: &SqlitePool,
    username: &str,
) -> sqlx::Result<Option<AccountRow>> {
    sqlx::query_as::<_, AccountRow>(SQL_LOAD_ACCOUNT_BY_USERNAME)
        .bind(username)
        .fetch_optional(pool)
        .await
}

const SQL_SEARCH_ACCOUNTS: &str = r#"
SELECT DISTINCT id, email, username, password_hash, profile_image, hide_email, created_at
FROM accounts
WHERE email LIKE '%' || ?1 || '%' ESCAPE '\'
   OR username LIKE '%' || ?1 || '%' ESCAPE '\'
"#;

// SQLite LIKE is case-insensitive for ASCII, which matches the
// case-insensitive-searchable contract on email and username. The query is
// a literal substring, so its LIKE metacharacters get escaped.
pub async fn search_accounts(pool: &SqlitePool, query: &str) -> sqlx::Result<Vec<AccountRow>> {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    sqlx::query_as::<_, AccountRow>(SQL_SEARCH_ACCOUNTS)
        .bind(escaped)
        .fetch_all(pool)
        .await
}

pub struct ProfileChanges<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub profile_image: Option<&'a str>,
    pub hide_email: bool,
}

const SQL_UPDATE_PROFILE: &str = r#"
UPDATE accounts
SET email = ?2,
    username = ?3,
    profile_image = ?4,
    hide_email = ?5
WHERE id = ?1
"#;

pub async fn update_profile(
    pool: &SqlitePool,
    account_id: &str,
    changes: ProfileChanges<'_>,
) -> sqlx::Result<u64> {
    let result = sqlx::query(SQL_UPDATE_PROFILE)
        .bind(account_id)
        .bind(changes.email)
        .bind(changes.username)
        .bind(changes.profile_image)
        .bind(changes.hide_email as i64)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
