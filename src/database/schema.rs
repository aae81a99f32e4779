use sqlx::SqlitePool;

// Bootstrap DDL, applied at startup and by the test pools. Statements are
// idempotent so repeated startups against the same file are safe.
const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS accounts (
  id TEXT PRIMARY KEY,
  email TEXT NOT NULL UNIQUE COLLATE NOCASE,
  username TEXT NOT NULL UNIQUE COLLATE NOCASE,
  password_hash TEXT NOT NULL,
  profile_image TEXT,
  hide_email INTEGER NOT NULL DEFAULT 1,
  created_at TEXT NOT NULL
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS friend_lists (
  owner_id TEXT PRIMARY KEY REFERENCES accounts(id)
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS friend_list_members (
  owner_id TEXT NOT NULL REFERENCES accounts(id),
  friend_id TEXT NOT NULL REFERENCES accounts(id),
  PRIMARY KEY (owner_id, friend_id),
  CHECK (owner_id <> friend_id)
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS friend_requests (
  id TEXT PRIMARY KEY,
  sender_id TEXT NOT NULL REFERENCES accounts(id),
  receiver_id TEXT NOT NULL REFERENCES accounts(id),
  status TEXT NOT NULL DEFAULT 'active',
  created_at TEXT NOT NULL,
  resolved_at TEXT,
  CHECK (sender_id <> receiver_id),
  CHECK (status IN ('active', 'cancelled', 'accepted', 'declined'))
)
"#,
    // Backstop for the single-active-request invariant: a concurrent double
    // send loses here even if both pass the service-level pre-check.
    r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_friend_requests_one_active
ON friend_requests (sender_id, receiver_id)
WHERE status = 'active'
"#,
    r#"
CREATE INDEX IF NOT EXISTS idx_friend_requests_receiver
ON friend_requests (receiver_id, status)
"#,
    r#"
CREATE TABLE IF NOT EXISTS sessions (
  token TEXT PRIMARY KEY,
  account_id TEXT NOT NULL REFERENCES accounts(id),
  created_at TEXT NOT NULL,
  expires_at TEXT NOT NULL
)
"#,
];

pub async fn init_schema(pool: &SqlitePool) -> sqlx::Result<()> {
    for statement in SCHEMA_STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
