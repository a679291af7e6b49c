//! Circle entity - Gruppo di utenti con cui condividere eventi

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Serialize, Deserialize, Debug, Clone, FromRow)]
pub struct Circle {
    pub circle_id: i32,
    pub name: String,
    pub creator_id: Option<i32>, // NULL se il creatore ha cancellato l'account
    /// Cerchia creata automaticamente alla prima generazione del link di invito
    pub is_invitation_circle: bool,
    pub linked_event_id: Option<String>,
}
