use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct PasswordResetToken {
    pub token: String,
    pub user_id: i32,
    pub expires_at: DateTime<Utc>,
}

impl PasswordResetToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
