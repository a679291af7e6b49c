use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Partecipazione di un utente a un evento, unica per (evento, utente)
#[derive(Serialize, Deserialize, Debug, Clone, FromRow)]
pub struct EventParticipation {
    pub event_id: String,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
}
