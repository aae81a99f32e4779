#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FriendRequestRow {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub status: String, // active|cancelled|accepted|declined
    pub created_at: String,
    pub resolved_at: Option<String>,
}
