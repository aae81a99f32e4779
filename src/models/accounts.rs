#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRow {
    pub id: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub profile_image: Option<String>,
    pub hide_email: i64,
    pub created_at: String,
}
