//! EventInvitation entity - Invito a un evento spedito per email

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Serialize, Deserialize, Debug, Clone, FromRow)]
pub struct EventInvitation {
    pub invitation_id: i32,
    pub event_id: String,
    pub email: String, // sempre minuscola
    pub token: String, // uuid v4
    pub invited_by: i32,
    pub created_at: DateTime<Utc>,
    pub accepted: bool,
    pub accepted_at: Option<DateTime<Utc>>,
}
