#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRow {
    pub token: String,
    pub account_id: String,
    pub created_at: String,
    pub expires_at: String,
}
