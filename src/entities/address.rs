//! Address entity - Indirizzi salvati dagli utenti e usati dagli eventi

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Serialize, Deserialize, Debug, Clone, FromRow)]
pub struct Address {
    pub address_id: i32,
    pub address_line: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Indirizzo visto dal suo proprietario, con l'etichetta (es. Home, Work)
#[derive(Debug, Clone, FromRow)]
pub struct OwnedAddress {
    #[sqlx(flatten)]
    pub address: Address,
    pub label: Option<String>,
}
