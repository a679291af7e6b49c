//! Event entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Serialize, Deserialize, Debug, Clone, FromRow)]
pub struct Event {
    pub event_id: String, // uuid v4 in forma testuale
    pub title: String,
    pub description: Option<String>,
    pub address_id: Option<i32>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub creator_id: i32,
    pub shareable_link: bool,
    pub event_shared: bool,
    pub invitation_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Evento visto solo come fascia occupata, con il numero di membri coinvolti
#[derive(Debug, Clone, FromRow)]
pub struct BusySlot {
    pub event_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub busy_members: i64,
}
