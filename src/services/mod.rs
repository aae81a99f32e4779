pub mod accounts;
pub mod friend_requests;
pub mod friends;
pub mod relationship;
pub mod sessions;

#[cfg(test)]
pub(crate) mod testing {
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    use crate::database::{account_repo, schema};

    // A single connection keeps every query on the same in-memory database.
    pub async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        schema::init_schema(&pool).await.expect("schema");
        pool
    }

    pub async fn seed_account(pool: &SqlitePool, id: &str, username: &str) {
        account_repo::insert_account(
            pool,
            account_repo::NewAccount {
                id,
                email: &format!("{username}@example.com"),
                username,
                password_hash: "x",
                profile_image: None,
                hide_email: true,
                created_at: "2026-01-01T00:00:00+00:00",
            },
        )
        .await
        .expect("seed account");
    }
}
